//! Test doubles and fixtures
//!
//! [`FakeCloud`] is a stateful in-memory backend implementing every
//! collaborator trait, so that repeated passes observe what earlier passes
//! created. [`MockNetClient`] and [`MockScope`] are for tests that pin exact
//! call counts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use mockall::mock;
use serde_json::Value;

use capox_cloud::config_reader::nested_string;
use capox_cloud::identity::IDENTITY_BACKEND;
use capox_cloud::networking::merge_allowed_address_pairs;
use capox_cloud::secrets::build_secret;
use capox_cloud::{
    AddressPair, AppCredentialCreateOpts, ApplicationCredential, AuthenticatedUser, ClientScope,
    ConfigReader, CreateOutcome, FixedIp, IdentityClient, Network, NetworkClient,
    NetworkCreateOpts, NetworkListOpts, NetworkingService, NewSecret, Port, PortCreateOpts,
    PortListOpts, SecretStore, SecurityGroup, SecurityGroupCreateOpts, SecurityGroupListOpts,
    Subnet, SubnetCreateOpts, SubnetListOpts,
};
use capox_common::config::ConfigObjectKey;
use capox_common::crd::{
    BastionSpec, BastionStatus, Cluster, ClusterExtensionsSpec, ClusterNetwork,
    ClusterNetworkingSpec, ClusterSpec, NetworkRanges, NetworkStatusWithSubnets,
    OpenStackCluster, OpenStackClusterSpec, OpenStackClusterStatus, RouterStatus,
    SecurityGroupStatus,
};
use capox_common::{Error, ResourceKind, Result, ROUTER_INTERFACE_OWNER};

mock! {
    pub NetClient {}

    #[async_trait]
    impl NetworkClient for NetClient {
        async fn list_networks(&self, opts: &NetworkListOpts) -> Result<Vec<Network>>;
        async fn create_network(&self, opts: &NetworkCreateOpts) -> Result<Network>;
        async fn list_subnets(&self, opts: &SubnetListOpts) -> Result<Vec<Subnet>>;
        async fn create_subnet(&self, opts: &SubnetCreateOpts) -> Result<Subnet>;
        async fn list_security_groups(&self, opts: &SecurityGroupListOpts) -> Result<Vec<SecurityGroup>>;
        async fn create_security_group(&self, opts: &SecurityGroupCreateOpts) -> Result<SecurityGroup>;
        async fn list_ports(&self, opts: &PortListOpts) -> Result<Vec<Port>>;
        async fn create_port(&self, opts: &PortCreateOpts) -> Result<Port>;
        async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()>;
        async fn replace_resource_tags(&self, collection: &str, id: &str, tags: &[String]) -> Result<Vec<String>>;
    }
}

mock! {
    pub Scope {}

    impl ClientScope for Scope {
        fn network_client(&self) -> Result<Arc<dyn NetworkClient>>;
        fn networking_service(&self) -> Result<Arc<dyn NetworkingService>>;
        fn identity_client(&self) -> Result<Arc<dyn IdentityClient>>;
        fn project_id(&self) -> String;
        fn service_endpoint(&self, service: &str) -> Result<String>;
        fn identity_endpoint(&self) -> String;
        fn region_name(&self) -> String;
    }
}

/// Everything the fake backend has seen and stores
#[derive(Default)]
pub struct FakeState {
    pub networks: Vec<Network>,
    pub subnets: Vec<Subnet>,
    pub security_groups: Vec<SecurityGroup>,
    pub ports: Vec<Port>,
    pub creates: HashMap<ResourceKind, usize>,
    pub tag_calls: Vec<(String, String, Vec<String>)>,
    pub allow_all_groups: Vec<String>,
    pub address_pair_updates: Vec<(String, Vec<AddressPair>)>,
    /// Next create of this kind loses a race: the resource appears, the call fails
    pub race_on_create: Option<ResourceKind>,
    /// Created ports get no address
    pub ports_without_ips: bool,
    /// Allow-all rule updates fail
    pub allow_all_failure: bool,
    next_id: usize,
    next_ip: u8,

    pub identity_unavailable: bool,
    pub user: Option<AuthenticatedUser>,
    pub identity_calls: usize,
    pub credentials_issued: usize,

    pub secrets: BTreeMap<(String, String), Secret>,
    pub secret_calls: usize,
    /// Next secret create finds the secret already there
    pub secret_race: bool,

    pub config_objects: BTreeMap<(String, String), Value>,

    pub project_id: String,
    pub endpoints: BTreeMap<String, String>,
    pub identity_endpoint: String,
    pub region: String,
}

impl FakeState {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn count_create(&mut self, kind: ResourceKind) {
        *self.creates.entry(kind).or_default() += 1;
    }

    /// Whether this create should lose a race
    fn lose_race(&mut self, kind: ResourceKind) -> bool {
        if self.race_on_create == Some(kind) {
            self.race_on_create = None;
            true
        } else {
            false
        }
    }

    fn allocate_ip(&mut self) -> String {
        self.next_ip = self.next_ip.saturating_add(10);
        format!("10.0.0.{}", self.next_ip)
    }
}

/// Stateful in-memory backend shared by every handle cloned from it
#[derive(Clone, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCloud {
    /// A healthy backend authenticated as user `u1` in `project-1`
    pub fn new() -> Self {
        let cloud = Self::default();
        {
            let mut state = cloud.state();
            state.project_id = "project-1".to_string();
            state.user = Some(AuthenticatedUser {
                id: "u1".to_string(),
                name: "admin".to_string(),
            });
            state.identity_endpoint = "https://keystone.example.com:5000/v3".to_string();
            state.region = "RegionOne".to_string();
        }
        cloud
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake cloud lock poisoned")
    }

    pub fn creates(&self, kind: ResourceKind) -> usize {
        self.state().creates.get(&kind).copied().unwrap_or_default()
    }

    pub fn total_creates(&self) -> usize {
        self.state().creates.values().sum()
    }

    /// Store the platform cluster config object with the given public VIP
    pub fn set_public_vip(&self, vip: Value) {
        let key = ConfigObjectKey::default();
        self.state().config_objects.insert(
            (key.namespace, key.name),
            serde_json::json!({ "data": { "cluster_attrs": { "public_vip": vip } } }),
        );
    }

    /// Seed a server port on `network_id`
    pub fn add_instance_port(&self, instance_id: &str, network_id: &str) -> String {
        let mut state = self.state();
        let id = state.id("port");
        let ip = state.allocate_ip();
        state.ports.push(Port {
            id: id.clone(),
            name: format!("{}-0", instance_id),
            network_id: network_id.to_string(),
            device_id: instance_id.to_string(),
            device_owner: "compute:nova".to_string(),
            fixed_ips: vec![FixedIp {
                subnet_id: "subnet-cluster".to_string(),
                ip_address: ip,
            }],
            admin_state_up: true,
            ..Default::default()
        });
        id
    }

    pub fn port(&self, id: &str) -> Option<Port> {
        self.state().ports.iter().find(|p| p.id == id).cloned()
    }
}

#[async_trait]
impl NetworkClient for FakeCloud {
    async fn list_networks(&self, opts: &NetworkListOpts) -> Result<Vec<Network>> {
        Ok(self.state().networks.iter().filter(|n| opts.matches(n)).cloned().collect())
    }

    async fn create_network(&self, opts: &NetworkCreateOpts) -> Result<Network> {
        let mut state = self.state();
        state.count_create(ResourceKind::Network);
        let network = Network {
            id: state.id("net"),
            name: opts.name.clone(),
            admin_state_up: opts.admin_state_up,
            tags: Vec::new(),
        };
        state.networks.push(network.clone());
        if state.lose_race(ResourceKind::Network) {
            return Err(Error::already_exists(ResourceKind::Network, &opts.name));
        }
        Ok(network)
    }

    async fn list_subnets(&self, opts: &SubnetListOpts) -> Result<Vec<Subnet>> {
        Ok(self.state().subnets.iter().filter(|s| opts.matches(s)).cloned().collect())
    }

    async fn create_subnet(&self, opts: &SubnetCreateOpts) -> Result<Subnet> {
        let mut state = self.state();
        state.count_create(ResourceKind::Subnet);
        let subnet = Subnet {
            id: state.id("subnet"),
            name: opts.name.clone(),
            network_id: opts.network_id.clone(),
            cidr: opts.cidr.clone(),
            tags: Vec::new(),
        };
        state.subnets.push(subnet.clone());
        if state.lose_race(ResourceKind::Subnet) {
            return Err(Error::already_exists(ResourceKind::Subnet, &opts.name));
        }
        Ok(subnet)
    }

    async fn list_security_groups(&self, opts: &SecurityGroupListOpts) -> Result<Vec<SecurityGroup>> {
        Ok(self
            .state()
            .security_groups
            .iter()
            .filter(|g| opts.matches(g))
            .cloned()
            .collect())
    }

    async fn create_security_group(&self, opts: &SecurityGroupCreateOpts) -> Result<SecurityGroup> {
        let mut state = self.state();
        state.count_create(ResourceKind::SecurityGroup);
        let group = SecurityGroup {
            id: state.id("sg"),
            name: opts.name.clone(),
            description: opts.description.clone(),
            tags: Vec::new(),
        };
        state.security_groups.push(group.clone());
        if state.lose_race(ResourceKind::SecurityGroup) {
            return Err(Error::already_exists(ResourceKind::SecurityGroup, &opts.name));
        }
        Ok(group)
    }

    async fn list_ports(&self, opts: &PortListOpts) -> Result<Vec<Port>> {
        Ok(self.state().ports.iter().filter(|p| opts.matches(p)).cloned().collect())
    }

    async fn create_port(&self, opts: &PortCreateOpts) -> Result<Port> {
        let mut state = self.state();
        state.count_create(ResourceKind::Port);
        let fixed_ips = if state.ports_without_ips {
            Vec::new()
        } else {
            vec![FixedIp {
                subnet_id: "subnet-cluster".to_string(),
                ip_address: state.allocate_ip(),
            }]
        };
        let port = Port {
            id: state.id("port"),
            name: opts.name.clone(),
            network_id: opts.network_id.clone(),
            fixed_ips,
            admin_state_up: opts.admin_state_up,
            security_groups: opts.security_groups.clone(),
            ..Default::default()
        };
        state.ports.push(port.clone());
        if state.lose_race(ResourceKind::Port) {
            return Err(Error::already_exists(ResourceKind::Port, &opts.name));
        }
        Ok(port)
    }

    async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()> {
        let mut state = self.state();
        state.count_create(ResourceKind::RouterInterface);
        let id = state.id("port");
        state.ports.push(Port {
            id,
            device_id: router_id.to_string(),
            device_owner: ROUTER_INTERFACE_OWNER.to_string(),
            fixed_ips: vec![FixedIp {
                subnet_id: subnet_id.to_string(),
                ip_address: "10.244.0.1".to_string(),
            }],
            ..Default::default()
        });
        Ok(())
    }

    async fn replace_resource_tags(
        &self,
        collection: &str,
        id: &str,
        tags: &[String],
    ) -> Result<Vec<String>> {
        let mut state = self.state();
        state
            .tag_calls
            .push((collection.to_string(), id.to_string(), tags.to_vec()));
        match collection {
            "networks" => state
                .networks
                .iter_mut()
                .filter(|n| n.id == id)
                .for_each(|n| n.tags = tags.to_vec()),
            "ports" => state
                .ports
                .iter_mut()
                .filter(|p| p.id == id)
                .for_each(|p| p.tags = tags.to_vec()),
            _ => {}
        }
        Ok(tags.to_vec())
    }
}

#[async_trait]
impl NetworkingService for FakeCloud {
    async fn list_instance_ports(&self, instance_id: &str, network_id: &str) -> Result<Vec<Port>> {
        Ok(self
            .state()
            .ports
            .iter()
            .filter(|p| p.device_id == instance_id && p.network_id == network_id)
            .cloned()
            .collect())
    }

    async fn ensure_allowed_address_pairs(&self, port: &Port, pairs: &[AddressPair]) -> Result<bool> {
        let mut state = self.state();
        let stored = state
            .ports
            .iter_mut()
            .find(|p| p.id == port.id)
            .ok_or_else(|| Error::cloud("update port", format!("port {} not found", port.id)))?;
        match merge_allowed_address_pairs(&stored.allowed_address_pairs, pairs) {
            Some(merged) => {
                stored.allowed_address_pairs = merged.clone();
                state.address_pair_updates.push((port.id.clone(), merged));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ensure_allow_all_security_group_rules(&self, group_id: &str) -> Result<()> {
        let mut state = self.state();
        if state.allow_all_failure {
            return Err(Error::cloud("create security group rule", "quota exceeded"));
        }
        state.allow_all_groups.push(group_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl IdentityClient for FakeCloud {
    async fn create_application_credential(
        &self,
        user_id: &str,
        opts: &AppCredentialCreateOpts,
    ) -> Result<ApplicationCredential> {
        let mut state = self.state();
        state.identity_calls += 1;
        state.credentials_issued += 1;
        let id = state.id("cred");
        Ok(ApplicationCredential {
            secret: format!("{}-secret-for-{}", id, user_id),
            id,
            name: opts.name.clone(),
        })
    }

    async fn current_user(&self) -> Result<Option<AuthenticatedUser>> {
        let mut state = self.state();
        state.identity_calls += 1;
        Ok(state.user.clone())
    }
}

impl ClientScope for FakeCloud {
    fn network_client(&self) -> Result<Arc<dyn NetworkClient>> {
        Ok(Arc::new(self.clone()))
    }

    fn networking_service(&self) -> Result<Arc<dyn NetworkingService>> {
        Ok(Arc::new(self.clone()))
    }

    fn identity_client(&self) -> Result<Arc<dyn IdentityClient>> {
        let mut state = self.state();
        state.identity_calls += 1;
        if state.identity_unavailable {
            return Err(Error::unavailable(IDENTITY_BACKEND, "no identity endpoint in catalog"));
        }
        Ok(Arc::new(self.clone()))
    }

    fn project_id(&self) -> String {
        self.state().project_id.clone()
    }

    fn service_endpoint(&self, service: &str) -> Result<String> {
        self.state()
            .endpoints
            .get(service)
            .cloned()
            .ok_or_else(|| Error::cloud("service catalog", format!("no endpoint for {}", service)))
    }

    fn identity_endpoint(&self) -> String {
        self.state().identity_endpoint.clone()
    }

    fn region_name(&self) -> String {
        self.state().region.clone()
    }
}

#[async_trait]
impl SecretStore for FakeCloud {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let mut state = self.state();
        state.secret_calls += 1;
        Ok(state
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create(&self, secret: NewSecret) -> Result<CreateOutcome> {
        let mut state = self.state();
        state.secret_calls += 1;
        let key = (secret.namespace.clone(), secret.name.clone());
        if state.secret_race {
            state.secret_race = false;
            state.secrets.insert(key, build_secret(&secret));
            return Ok(CreateOutcome::AlreadyExists);
        }
        if state.secrets.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.secrets.insert(key, build_secret(&secret));
        Ok(CreateOutcome::Created)
    }
}

#[async_trait]
impl ConfigReader for FakeCloud {
    async fn read_field(&self, key: &ConfigObjectKey, path: &[String]) -> Result<Option<String>> {
        let state = self.state();
        match state
            .config_objects
            .get(&(key.namespace.clone(), key.name.clone()))
        {
            Some(obj) => nested_string(obj, path),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// CAPI cluster `tenant-a/demo` with pod range `10.244.0.0/16`
pub fn sample_cluster() -> Cluster {
    let mut cluster = Cluster::new(
        "demo",
        ClusterSpec {
            cluster_network: Some(ClusterNetwork {
                pods: Some(NetworkRanges {
                    cidr_blocks: vec!["10.244.0.0/16".to_string()],
                }),
            }),
        },
    );
    cluster.metadata.namespace = Some("tenant-a".to_string());
    cluster
}

/// Resource name of [`sample_cluster`]
pub const SAMPLE_RESOURCE: &str = "tenant-a-demo";

/// OpenStack cluster with a ready network, router and security groups
pub fn sample_osc() -> OpenStackCluster {
    let mut osc = OpenStackCluster::new(
        "demo",
        OpenStackClusterSpec {
            tags: vec!["env:test".to_string()],
            bastion: None,
            extensions: Some(ClusterExtensionsSpec {
                networking: Some(ClusterNetworkingSpec {
                    kube_network_plugin: "cilium".to_string(),
                }),
                ..Default::default()
            }),
        },
    );
    osc.metadata.namespace = Some("tenant-a".to_string());
    osc.status = Some(OpenStackClusterStatus {
        network: Some(NetworkStatusWithSubnets {
            id: "net-cluster".to_string(),
            name: "k8s-clusterapi-cluster-tenant-a-demo".to_string(),
            subnets: Vec::new(),
        }),
        router: Some(RouterStatus {
            id: "router-1".to_string(),
            name: String::new(),
        }),
        control_plane_security_group: Some(SecurityGroupStatus {
            id: "sg-cp".to_string(),
            name: String::new(),
        }),
        worker_security_group: Some(SecurityGroupStatus {
            id: "sg-worker".to_string(),
            name: String::new(),
        }),
        ..Default::default()
    });
    osc
}

/// [`sample_osc`] with a flannel plugin
pub fn flannel_osc() -> OpenStackCluster {
    let mut osc = sample_osc();
    if let Some(networking) = osc
        .spec
        .extensions
        .as_mut()
        .and_then(|e| e.networking.as_mut())
    {
        networking.kube_network_plugin = "flannel".to_string();
    }
    osc
}

/// [`sample_osc`] with an enabled bastion at `ip`
pub fn osc_with_bastion(ip: &str) -> OpenStackCluster {
    let mut osc = sample_osc();
    osc.spec.bastion = Some(BastionSpec { enabled: None });
    if let Some(status) = osc.status.as_mut() {
        status.bastion = Some(BastionStatus {
            id: "srv-bastion".to_string(),
            ip: ip.to_string(),
        });
    }
    osc
}

/// Status of `osc`, panicking when absent
pub fn status_of(osc: &OpenStackCluster) -> &OpenStackClusterStatus {
    osc.status
        .as_ref()
        .unwrap_or_else(|| panic!("{} should have a status", osc.name_any()))
}
