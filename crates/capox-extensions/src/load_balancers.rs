//! Keepalived VIPs of the control plane and ingress front ends

use tracing::{debug, error};

use capox_cloud::{ClientScope, ConfigReader};
use capox_common::crd::{Cluster, ExtensionsStatus, OpenStackCluster};
use capox_common::names::{cluster_resource_name, deduplicate_strings};
use capox_common::{ExtensionsConfig, Result, KEEPALIVED_TAG};

use crate::vip::{ensure_vip_port, VipPortInput};

/// Role of a keepalived VIP
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VipRole {
    /// Kubernetes API front end
    ControlPlane,
    /// Ingress (and registry) front end
    Ingress,
}

impl VipRole {
    fn tag(self) -> &'static str {
        match self {
            VipRole::ControlPlane => "controlplane",
            VipRole::Ingress => "ingress",
        }
    }

    fn description(self, resource_name: &str) -> String {
        match self {
            VipRole::ControlPlane => {
                format!("Control plane keepalived VIP port for cluster {}", resource_name)
            }
            VipRole::Ingress => format!("Ingress keepalived VIP port for cluster {}", resource_name),
        }
    }
}

/// Port reserved for the `role` VIP of a cluster
///
/// Both VIPs sit behind the control plane security group.
pub fn keepalived_port(role: VipRole, resource_name: &str, osc: &OpenStackCluster) -> VipPortInput {
    let status = osc.status.as_ref();
    VipPortInput {
        name: format!("{}-{}-keepalived", resource_name, role.tag()),
        description: role.description(resource_name),
        network_id: status.map(|s| s.network_id().to_string()).unwrap_or_default(),
        tags: deduplicate_strings(&osc.spec.tags, [KEEPALIVED_TAG, resource_name, role.tag()]),
        security_groups: status
            .map(|s| s.control_plane_security_groups())
            .unwrap_or_default(),
    }
}

/// Public VIP from the platform cluster config, empty when unavailable
pub async fn public_vip(reader: &dyn ConfigReader, config: &ExtensionsConfig) -> String {
    match reader
        .read_field(&config.cluster_config, &config.public_vip_path)
        .await
    {
        Ok(Some(vip)) => vip,
        Ok(None) => {
            debug!(
                namespace = %config.cluster_config.namespace,
                name = %config.cluster_config.name,
                "No public VIP in cluster config"
            );
            String::new()
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch public VIP from cluster config");
            String::new()
        }
    }
}

/// Reserve both keepalived VIPs and publish their addresses
///
/// VIP fields are only overwritten with non-empty addresses. The registry
/// shares the ingress VIP.
pub async fn reconcile_load_balancers(
    reader: &dyn ConfigReader,
    config: &ExtensionsConfig,
    scope: &dyn ClientScope,
    cluster: &Cluster,
    osc: &OpenStackCluster,
    ext: &mut ExtensionsStatus,
) -> Result<()> {
    let resource_name = cluster_resource_name(cluster);
    let client = scope.network_client()?;

    let control_plane = ensure_vip_port(
        client.as_ref(),
        &keepalived_port(VipRole::ControlPlane, &resource_name, osc),
    )
    .await?;
    if !control_plane.is_empty() {
        ext.load_balancers.control_plane.vip = control_plane;
    }

    ext.open_stack.mgmt = public_vip(reader, config).await;

    let ingress = ensure_vip_port(
        client.as_ref(),
        &keepalived_port(VipRole::Ingress, &resource_name, osc),
    )
    .await?;
    if !ingress.is_empty() {
        ext.load_balancers.ingress.vip = ingress.clone();
    }
    ext.load_balancers.harbor.vip = ingress;
    Ok(())
}
