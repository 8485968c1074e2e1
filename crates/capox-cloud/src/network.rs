//! Network API contract
//!
//! Entities mirror the Neutron representation closely enough that a transport
//! can decode responses straight into them. List filters treat an empty field
//! as "match anything"; creates are single attempts with no internal retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use capox_common::Result;

/// A network
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    /// Network ID
    pub id: String,
    /// Network name
    pub name: String,
    /// Administrative state
    pub admin_state_up: bool,
    /// Resource tags
    pub tags: Vec<String>,
}

/// A subnet
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subnet {
    /// Subnet ID
    pub id: String,
    /// Subnet name
    pub name: String,
    /// Owning network
    pub network_id: String,
    /// Address range
    pub cidr: String,
    /// Resource tags
    pub tags: Vec<String>,
}

/// A security group
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroup {
    /// Security group ID
    pub id: String,
    /// Security group name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Resource tags
    pub tags: Vec<String>,
}

/// An address assigned to a port
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedIp {
    /// Subnet the address belongs to
    pub subnet_id: String,
    /// The address
    pub ip_address: String,
}

/// A secondary address a port may send and receive traffic for
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressPair {
    /// Permitted address
    pub ip_address: String,
    /// Permitted MAC address, empty for the port's own MAC
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mac_address: String,
}

impl AddressPair {
    /// Pair for `ip_address` on the port's own MAC
    pub fn for_ip(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            mac_address: String::new(),
        }
    }
}

/// A port
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    /// Port ID
    pub id: String,
    /// Port name
    pub name: String,
    /// Network the port sits on
    pub network_id: String,
    /// Device (server, router) the port is attached to
    pub device_id: String,
    /// Kind of device, e.g. `network:router_interface`
    pub device_owner: String,
    /// Addresses assigned to the port
    pub fixed_ips: Vec<FixedIp>,
    /// Secondary addresses the port may use
    pub allowed_address_pairs: Vec<AddressPair>,
    /// Administrative state
    pub admin_state_up: bool,
    /// Security groups applied to the port
    pub security_groups: Vec<String>,
    /// Resource tags
    pub tags: Vec<String>,
}

impl Port {
    /// First assigned address, if any
    pub fn first_fixed_ip(&self) -> Option<&str> {
        self.fixed_ips
            .first()
            .map(|ip| ip.ip_address.as_str())
            .filter(|ip| !ip.is_empty())
    }

    /// Whether any assigned address belongs to `subnet_id`
    pub fn has_ip_in_subnet(&self, subnet_id: &str) -> bool {
        self.fixed_ips.iter().any(|ip| ip.subnet_id == subnet_id)
    }
}

fn field_matches(filter: &str, value: &str) -> bool {
    filter.is_empty() || filter == value
}

/// Network list filter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkListOpts {
    /// Exact name
    pub name: String,
}

impl NetworkListOpts {
    /// Whether `network` passes the filter
    pub fn matches(&self, network: &Network) -> bool {
        field_matches(&self.name, &network.name)
    }
}

/// Subnet list filter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubnetListOpts {
    /// Owning network
    pub network_id: String,
    /// Exact CIDR
    pub cidr: String,
}

impl SubnetListOpts {
    /// Whether `subnet` passes the filter
    pub fn matches(&self, subnet: &Subnet) -> bool {
        field_matches(&self.network_id, &subnet.network_id) && field_matches(&self.cidr, &subnet.cidr)
    }
}

/// Security group list filter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecurityGroupListOpts {
    /// Exact name
    pub name: String,
}

impl SecurityGroupListOpts {
    /// Whether `group` passes the filter
    pub fn matches(&self, group: &SecurityGroup) -> bool {
        field_matches(&self.name, &group.name)
    }
}

/// Port list filter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortListOpts {
    /// Exact name
    pub name: String,
    /// Network the port sits on
    pub network_id: String,
    /// Attached device
    pub device_id: String,
    /// Kind of attached device
    pub device_owner: String,
}

impl PortListOpts {
    /// Whether `port` passes the filter
    pub fn matches(&self, port: &Port) -> bool {
        field_matches(&self.name, &port.name)
            && field_matches(&self.network_id, &port.network_id)
            && field_matches(&self.device_id, &port.device_id)
            && field_matches(&self.device_owner, &port.device_owner)
    }
}

/// Parameters for creating a network
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkCreateOpts {
    /// Network name
    pub name: String,
    /// Administrative state
    pub admin_state_up: bool,
}

/// Parameters for creating a subnet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubnetCreateOpts {
    /// Owning network
    pub network_id: String,
    /// Subnet name
    pub name: String,
    /// Address range
    pub cidr: String,
    /// IP version (4 or 6)
    pub ip_version: u8,
    /// Whether the cloud hands out addresses over DHCP
    pub enable_dhcp: bool,
    /// Free-form description
    pub description: String,
}

/// Parameters for creating a security group
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecurityGroupCreateOpts {
    /// Security group name
    pub name: String,
    /// Free-form description
    pub description: String,
}

/// Parameters for creating a port
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortCreateOpts {
    /// Port name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Network to create the port on
    pub network_id: String,
    /// Administrative state
    pub admin_state_up: bool,
    /// Security groups applied to the port
    pub security_groups: Vec<String>,
}

/// Low-level network API
///
/// Implementations wrap a single authenticated endpoint. Every call is one
/// request; failures come back as [`capox_common::Error::Cloud`] unless the
/// backend reports a name conflict, which maps to
/// [`capox_common::Error::AlreadyExists`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// List networks passing `opts`
    async fn list_networks(&self, opts: &NetworkListOpts) -> Result<Vec<Network>>;

    /// Create a network
    async fn create_network(&self, opts: &NetworkCreateOpts) -> Result<Network>;

    /// List subnets passing `opts`
    async fn list_subnets(&self, opts: &SubnetListOpts) -> Result<Vec<Subnet>>;

    /// Create a subnet
    async fn create_subnet(&self, opts: &SubnetCreateOpts) -> Result<Subnet>;

    /// List security groups passing `opts`
    async fn list_security_groups(&self, opts: &SecurityGroupListOpts) -> Result<Vec<SecurityGroup>>;

    /// Create a security group
    async fn create_security_group(&self, opts: &SecurityGroupCreateOpts) -> Result<SecurityGroup>;

    /// List ports passing `opts`
    async fn list_ports(&self, opts: &PortListOpts) -> Result<Vec<Port>>;

    /// Create a port
    async fn create_port(&self, opts: &PortCreateOpts) -> Result<Port>;

    /// Attach `subnet_id` to `router_id`
    async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()>;

    /// Replace every tag of a resource in `collection` (e.g. `networks`)
    async fn replace_resource_tags(
        &self,
        collection: &str,
        id: &str,
        tags: &[String],
    ) -> Result<Vec<String>>;
}
