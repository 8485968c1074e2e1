//! Idempotent find-or-create of cloud resources
//!
//! Every resource owned by a cluster is identified by a filter that must match
//! at most one resource. [`ensure`] lists by that filter and:
//!
//! - creates (and tags) the resource when nothing matches
//! - adopts the single match without touching it
//! - fails with [`Error::AmbiguousResource`] on several matches
//!
//! No lock is taken. Two passes racing on the same filter can both see zero
//! matches; the loser's create then fails with [`Error::AlreadyExists`] and
//! the resource is re-listed and adopted. Backends that accept duplicate names
//! end up with two resources, which the next pass reports as ambiguous.

use async_trait::async_trait;
use tracing::{debug, info};

use capox_cloud::{
    Network, NetworkClient, NetworkCreateOpts, NetworkListOpts, Port, PortCreateOpts,
    PortListOpts, SecurityGroup, SecurityGroupCreateOpts, SecurityGroupListOpts, Subnet,
    SubnetCreateOpts, SubnetListOpts,
};
use capox_common::{Error, ResourceKind, Result, ROUTER_INTERFACE_OWNER};

/// A resource that can be looked up by a unique filter and created on demand
#[async_trait]
pub trait EnsureRequest: Send + Sync {
    /// The cloud entity produced
    type Resource: Send + Sync;

    /// Kind of resource
    fn kind(&self) -> ResourceKind;

    /// Name given to a created resource
    fn name(&self) -> &str;

    /// Human readable form of the lookup filter
    fn filter(&self) -> String;

    /// Tags applied after creation; empty skips tagging
    fn tags(&self) -> &[String];

    /// ID of `resource`
    fn id(resource: &Self::Resource) -> &str;

    /// Resources matching the filter
    async fn list(&self, client: &dyn NetworkClient) -> Result<Vec<Self::Resource>>;

    /// Create the resource
    async fn create(&self, client: &dyn NetworkClient) -> Result<Self::Resource>;
}

/// Pick the single match, `None` when there is nothing to adopt
fn single<R: EnsureRequest>(request: &R, mut found: Vec<R::Resource>) -> Result<Option<R::Resource>> {
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        count => Err(Error::ambiguous(request.kind(), request.filter(), count)),
    }
}

/// Find the resource described by `request`, creating it when absent
pub async fn ensure<R: EnsureRequest>(client: &dyn NetworkClient, request: &R) -> Result<R::Resource> {
    let kind = request.kind();

    if let Some(existing) = single(request, request.list(client).await?)? {
        debug!(%kind, id = R::id(&existing), filter = %request.filter(), "Adopting existing resource");
        return Ok(existing);
    }

    let created = match request.create(client).await {
        Ok(created) => created,
        Err(err) if err.is_already_exists() => {
            debug!(%kind, name = request.name(), "Create lost a race, re-listing");
            return match single(request, request.list(client).await?)? {
                Some(existing) => Ok(existing),
                None => Err(err),
            };
        }
        Err(err) => return Err(err),
    };

    let id = R::id(&created);
    if !request.tags().is_empty() {
        client
            .replace_resource_tags(kind.tag_collection(), id, request.tags())
            .await?;
    }
    info!(%kind, name = request.name(), id, "Created cloud resource");
    Ok(created)
}

/// Attach `subnet_id` to `router_id` unless a router port already sits in it
///
/// Empty IDs make this a no-op.
pub async fn ensure_router_interface(
    client: &dyn NetworkClient,
    router_id: &str,
    subnet_id: &str,
) -> Result<()> {
    if router_id.is_empty() || subnet_id.is_empty() {
        return Ok(());
    }

    let router_ports = client
        .list_ports(&PortListOpts {
            device_id: router_id.to_string(),
            device_owner: ROUTER_INTERFACE_OWNER.to_string(),
            ..Default::default()
        })
        .await?;
    if router_ports.iter().any(|p| p.has_ip_in_subnet(subnet_id)) {
        debug!(router_id, subnet_id, "Router interface already present");
        return Ok(());
    }

    client.add_router_interface(router_id, subnet_id).await?;
    info!(router_id, subnet_id, "Added router interface");
    Ok(())
}

// =============================================================================
// Requests
// =============================================================================

/// Network looked up by name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkRequest {
    /// Network name
    pub name: String,
    /// Tags applied after creation
    pub tags: Vec<String>,
}

#[async_trait]
impl EnsureRequest for NetworkRequest {
    type Resource = Network;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Network
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self) -> String {
        format!("name={}", self.name)
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn id(resource: &Network) -> &str {
        &resource.id
    }

    async fn list(&self, client: &dyn NetworkClient) -> Result<Vec<Network>> {
        client
            .list_networks(&NetworkListOpts {
                name: self.name.clone(),
            })
            .await
    }

    async fn create(&self, client: &dyn NetworkClient) -> Result<Network> {
        client
            .create_network(&NetworkCreateOpts {
                name: self.name.clone(),
                admin_state_up: true,
            })
            .await
    }
}

/// Subnet looked up by network and CIDR
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubnetRequest {
    /// Owning network
    pub network_id: String,
    /// Address range
    pub cidr: String,
    /// Name given on creation
    pub name: String,
    /// Description given on creation
    pub description: String,
    /// Whether DHCP is enabled on creation
    pub enable_dhcp: bool,
    /// Tags applied after creation
    pub tags: Vec<String>,
}

#[async_trait]
impl EnsureRequest for SubnetRequest {
    type Resource = Subnet;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Subnet
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self) -> String {
        format!("network={} cidr={}", self.network_id, self.cidr)
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn id(resource: &Subnet) -> &str {
        &resource.id
    }

    async fn list(&self, client: &dyn NetworkClient) -> Result<Vec<Subnet>> {
        client
            .list_subnets(&SubnetListOpts {
                network_id: self.network_id.clone(),
                cidr: self.cidr.clone(),
            })
            .await
    }

    async fn create(&self, client: &dyn NetworkClient) -> Result<Subnet> {
        client
            .create_subnet(&SubnetCreateOpts {
                network_id: self.network_id.clone(),
                name: self.name.clone(),
                cidr: self.cidr.clone(),
                ip_version: 4,
                enable_dhcp: self.enable_dhcp,
                description: self.description.clone(),
            })
            .await
    }
}

/// Security group looked up by name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecurityGroupRequest {
    /// Group name
    pub name: String,
    /// Description given on creation
    pub description: String,
    /// Tags applied after creation
    pub tags: Vec<String>,
}

#[async_trait]
impl EnsureRequest for SecurityGroupRequest {
    type Resource = SecurityGroup;

    fn kind(&self) -> ResourceKind {
        ResourceKind::SecurityGroup
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self) -> String {
        format!("name={}", self.name)
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn id(resource: &SecurityGroup) -> &str {
        &resource.id
    }

    async fn list(&self, client: &dyn NetworkClient) -> Result<Vec<SecurityGroup>> {
        client
            .list_security_groups(&SecurityGroupListOpts {
                name: self.name.clone(),
            })
            .await
    }

    async fn create(&self, client: &dyn NetworkClient) -> Result<SecurityGroup> {
        client
            .create_security_group(&SecurityGroupCreateOpts {
                name: self.name.clone(),
                description: self.description.clone(),
            })
            .await
    }
}

/// Port looked up by name and network
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortRequest {
    /// Port name
    pub name: String,
    /// Description given on creation
    pub description: String,
    /// Network the port sits on
    pub network_id: String,
    /// Security groups applied on creation
    pub security_groups: Vec<String>,
    /// Administrative state on creation
    pub admin_state_up: bool,
    /// Tags applied after creation
    pub tags: Vec<String>,
}

#[async_trait]
impl EnsureRequest for PortRequest {
    type Resource = Port;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Port
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self) -> String {
        format!("name={} network={}", self.name, self.network_id)
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn id(resource: &Port) -> &str {
        &resource.id
    }

    async fn list(&self, client: &dyn NetworkClient) -> Result<Vec<Port>> {
        client
            .list_ports(&PortListOpts {
                name: self.name.clone(),
                network_id: self.network_id.clone(),
                ..Default::default()
            })
            .await
    }

    async fn create(&self, client: &dyn NetworkClient) -> Result<Port> {
        client
            .create_port(&PortCreateOpts {
                name: self.name.clone(),
                description: self.description.clone(),
                network_id: self.network_id.clone(),
                admin_state_up: self.admin_state_up,
                security_groups: self.security_groups.clone(),
            })
            .await
    }
}
