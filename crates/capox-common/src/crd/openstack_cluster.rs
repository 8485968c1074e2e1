//! OpenStackCluster view
//!
//! The provider owns this resource. The engine reads the network, router,
//! security group and bastion facts it publishes and writes
//! `status.extensions`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::extensions::{ClusterExtensionsSpec, ExtensionsStatus};

/// Desired state of an OpenStack-backed cluster
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "OpenStackCluster",
    namespaced,
    status = "OpenStackClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct OpenStackClusterSpec {
    /// Tags added to every resource created for the cluster
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Bastion host configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion: Option<BastionSpec>,

    /// Extension knobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ClusterExtensionsSpec>,
}

impl OpenStackClusterSpec {
    /// Whether a bastion is requested
    ///
    /// A bastion block without an explicit `enabled` flag counts as enabled.
    pub fn bastion_enabled(&self) -> bool {
        self.bastion
            .as_ref()
            .map(|b| b.enabled.unwrap_or(true))
            .unwrap_or(false)
    }
}

/// Bastion host configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct BastionSpec {
    /// Whether the bastion is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Observed state of an OpenStack-backed cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenStackClusterStatus {
    /// Cluster network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkStatusWithSubnets>,

    /// Cluster router
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterStatus>,

    /// Security group of control plane machines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_security_group: Option<SecurityGroupStatus>,

    /// Security group of worker machines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_security_group: Option<SecurityGroupStatus>,

    /// Security group of the bastion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion_security_group: Option<SecurityGroupStatus>,

    /// Bastion host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion: Option<BastionStatus>,

    /// Facts published by the extensions engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ExtensionsStatus>,
}

impl OpenStackClusterStatus {
    /// ID of the cluster network, empty until it is ready
    pub fn network_id(&self) -> &str {
        self.network
            .as_ref()
            .map(|n| n.id.as_str())
            .unwrap_or_default()
    }

    /// ID of the cluster router, empty until it is ready
    pub fn router_id(&self) -> &str {
        self.router
            .as_ref()
            .map(|r| r.id.as_str())
            .unwrap_or_default()
    }

    /// Sorted, deduplicated IDs of the control plane, worker and bastion groups
    pub fn security_group_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = [
            &self.control_plane_security_group,
            &self.worker_security_group,
            &self.bastion_security_group,
        ]
        .into_iter()
        .flatten()
        .filter(|sg| !sg.id.is_empty())
        .map(|sg| sg.id.clone())
        .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// The control plane security group as a list, empty when not ready
    pub fn control_plane_security_groups(&self) -> Vec<String> {
        self.control_plane_security_group
            .as_ref()
            .filter(|sg| !sg.id.is_empty())
            .map(|sg| vec![sg.id.clone()])
            .unwrap_or_default()
    }
}

/// A network and its subnets
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct NetworkStatusWithSubnets {
    /// Network ID
    pub id: String,
    /// Network name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Subnets of the network
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetStatus>,
}

/// A subnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct SubnetStatus {
    /// Subnet ID
    pub id: String,
    /// Subnet name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Subnet CIDR
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr: String,
    /// Subnet tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A router
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct RouterStatus {
    /// Router ID
    pub id: String,
    /// Router name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// A security group
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct SecurityGroupStatus {
    /// Security group ID
    pub id: String,
    /// Security group name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// A bastion host
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct BastionStatus {
    /// Server ID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Address the bastion is reachable on
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip: String,
}
