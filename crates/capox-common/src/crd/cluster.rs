//! Cluster API `Cluster` view
//!
//! Only the pod network ranges are read; everything else on the object is
//! owned by Cluster API and ignored here.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of a Cluster API cluster, as far as this engine cares
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cluster.x-k8s.io",
    version = "v1beta2",
    kind = "Cluster",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Cluster network configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_network: Option<ClusterNetwork>,
}

/// Network ranges of the workload cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetwork {
    /// Pod network ranges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<NetworkRanges>,
}

/// A list of CIDR blocks
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRanges {
    /// CIDR blocks, first entry is the primary range
    #[serde(default)]
    pub cidr_blocks: Vec<String>,
}

impl Cluster {
    /// Pod CIDR blocks, empty when the cluster network is not configured
    pub fn pod_cidr_blocks(&self) -> &[String] {
        self.spec
            .cluster_network
            .as_ref()
            .and_then(|n| n.pods.as_ref())
            .map(|p| p.cidr_blocks.as_slice())
            .unwrap_or_default()
    }
}
