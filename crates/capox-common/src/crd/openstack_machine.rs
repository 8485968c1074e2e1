//! OpenStackMachine view

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::extensions::{MachineExtensionsSpec, MachineLoadBalancersSpec};

/// Desired state of an OpenStack-backed machine
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "OpenStackMachine",
    namespaced,
    status = "OpenStackMachineStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct OpenStackMachineSpec {
    /// Extension knobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<MachineExtensionsSpec>,
}

/// Observed state of an OpenStack-backed machine
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct OpenStackMachineStatus {
    /// Compute instance backing the machine
    #[serde(rename = "instanceID", default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl OpenStackMachine {
    /// Compute instance ID, `None` until the server exists
    pub fn instance_id(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.instance_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// VIP participation flags, `None` when the machine opts out entirely
    pub fn load_balancers(&self) -> Option<&MachineLoadBalancersSpec> {
        self.spec
            .extensions
            .as_ref()
            .and_then(|e| e.load_balancers.as_ref())
    }
}
