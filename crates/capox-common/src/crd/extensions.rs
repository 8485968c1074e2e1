//! Extension records attached to the OpenStack cluster and machine resources
//!
//! The status side is consumed by bootstrap and configuration tooling. Every
//! sub-record is a plain struct so that once the status exists, all of its
//! nested records exist too.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::KUBE_NETWORK_PLUGIN_CILIUM;

// =============================================================================
// Cluster spec
// =============================================================================

/// Provider knobs consumed by bootstrap and controller layers
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterExtensionsSpec {
    /// Pod networking plugin selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking: Option<ClusterNetworkingSpec>,
    /// Host interfaces used by the networking plugin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_interfaces: Option<ClusterNetworkInterfacesSpec>,
    /// OpenStack specific knobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_stack: Option<ClusterOpenStackSpec>,
}

impl ClusterExtensionsSpec {
    /// Configured pod networking plugin, empty when unset
    pub fn kube_network_plugin(&self) -> &str {
        self.networking
            .as_ref()
            .map(|n| n.kube_network_plugin.as_str())
            .unwrap_or_default()
    }

    /// Whether the plugin needs the dedicated VPC CNI network stack
    pub fn requires_vpc_cni(&self) -> bool {
        self.kube_network_plugin()
            .eq_ignore_ascii_case(KUBE_NETWORK_PLUGIN_CILIUM)
    }
}

/// Pod networking plugin selection
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetworkingSpec {
    /// Either `cilium` or `flannel`
    pub kube_network_plugin: String,
}

/// Host interfaces used by the networking plugin
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetworkInterfacesSpec {
    /// Interface used by flannel
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flannel: String,
}

/// OpenStack specific knobs (currently none)
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ClusterOpenStackSpec {}

// =============================================================================
// Cluster status
// =============================================================================

/// Infrastructure-derived facts published for bootstrap tooling
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionsStatus {
    /// Networking plugin facts
    #[serde(default)]
    pub networking: ClusterNetworkingStatus,
    /// VIP addresses
    #[serde(default)]
    pub load_balancers: ClusterLoadBalancersStatus,
    /// Platform service facts
    #[serde(default)]
    pub platform: ClusterPlatformStatus,
    /// OpenStack account facts
    #[serde(default)]
    pub open_stack: ClusterOpenStackStatus,
    /// Service endpoint hosts
    #[serde(default)]
    pub endpoints: ClusterEndpointsStatus,
}

impl ExtensionsStatus {
    /// Materialise the status tree on first touch and hand it out
    ///
    /// Existing values are kept as they are.
    pub fn ensure_initialized(slot: &mut Option<ExtensionsStatus>) -> &mut ExtensionsStatus {
        slot.get_or_insert_with(ExtensionsStatus::default)
    }
}

/// Networking plugin facts
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ClusterNetworkingStatus {
    /// VPC CNI stack created for cilium
    #[serde(default)]
    pub cilium: CiliumNetworkingStatus,
}

/// VPC CNI stack created for cilium
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct CiliumNetworkingStatus {
    /// Project owning the stack
    #[serde(rename = "projectID", default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    /// Subnet pods get their addresses from
    #[serde(
        rename = "defaultSubnetID",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub default_subnet_id: String,
    /// Security groups applied to pod ports
    #[serde(
        rename = "securityGroupIDs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub security_group_ids: Vec<String>,
    /// Whether the CNI admission webhook is enabled
    #[serde(rename = "webhookEnable", default, skip_serializing_if = "Option::is_none")]
    pub webhook_enable: Option<bool>,
}

/// VIP addresses of the cluster front ends
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLoadBalancersStatus {
    /// Control plane keepalived VIP
    #[serde(default)]
    pub control_plane: VipRecord,
    /// Ingress keepalived VIP
    #[serde(default)]
    pub ingress: VipRecord,
    /// Registry VIP (shares the ingress front end)
    #[serde(default)]
    pub harbor: VipRecord,
}

/// A virtual IP address
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct VipRecord {
    /// The address, empty until the backing port has one
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vip: String,
}

/// Platform service facts
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ClusterPlatformStatus {
    /// Time server
    #[serde(default)]
    pub ntp: PlatformNtpStatus,
    /// Management (bastion) access
    #[serde(default)]
    pub management: PlatformManagementStatus,
}

/// Time server
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PlatformNtpStatus {
    /// NTP server address
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,
}

/// Management (bastion) access
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PlatformManagementStatus {
    /// Bastion address, empty when no bastion is enabled
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vip: String,
}

/// OpenStack account facts
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOpenStackStatus {
    /// Public (floating) management VIP from the platform cluster config
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mgmt: String,
    /// Identity service host
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keystone: String,
    /// Block storage service host
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cinder: String,
    /// Compute service host
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nova: String,
    /// Network service host
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub neutron: String,
    /// Project name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    /// Project domain name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_domain: String,
    /// Application credential issued for the cluster
    #[serde(default)]
    pub app_credential: AppCredentialStatus,
    /// Region name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
}

/// Reference to the secret holding the cluster application credential
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AppCredentialStatus {
    /// Secret name, stable once set
    #[serde(rename = "ref", default, skip_serializing_if = "String::is_empty")]
    pub ref_: String,
}

/// Hosts of the OpenStack service endpoints
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ClusterEndpointsStatus {
    /// Identity
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keystone: String,
    /// Block storage
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cinder: String,
    /// Compute
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nova: String,
    /// Network
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub neutron: String,
}

// =============================================================================
// Machine spec
// =============================================================================

/// Machine scoped knobs
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineExtensionsSpec {
    /// Host interfaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_interfaces: Option<MachineNetworkInterfacesSpec>,
    /// VIP participation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancers: Option<MachineLoadBalancersSpec>,
    /// Memory reservation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MachineMemorySpec>,
}

/// Host interfaces of a machine
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct MachineNetworkInterfacesSpec {
    /// Interface keepalived binds to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keepalived: String,
}

/// Which cluster VIPs a machine may take over
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct MachineLoadBalancersSpec {
    /// Machine takes part in the control plane VIP
    #[serde(rename = "controlPlaneVIP", default)]
    pub control_plane_vip: bool,
    /// Machine takes part in the ingress VIP
    #[serde(rename = "ingressVIP", default)]
    pub ingress_vip: bool,
}

impl MachineLoadBalancersSpec {
    /// Whether the machine takes part in any VIP
    pub fn participates(&self) -> bool {
        self.control_plane_vip || self.ingress_vip
    }
}

/// Memory reservation
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct MachineMemorySpec {
    /// Reserved memory, e.g. `-512`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reserved: String,
}
