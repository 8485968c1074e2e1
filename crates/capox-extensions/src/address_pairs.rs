//! Allowed address pairs that let machines take over cluster VIPs

use kube::ResourceExt;
use tracing::debug;

use capox_cloud::{AddressPair, ClientScope};
use capox_common::crd::{ExtensionsStatus, MachineLoadBalancersSpec, OpenStackCluster, OpenStackMachine};
use capox_common::Result;

/// VIPs a machine must be allowed to answer for
///
/// Control plane first, then ingress, each only when the machine opts in
/// and the cluster already has that VIP.
pub fn desired_address_pairs(
    flags: &MachineLoadBalancersSpec,
    cluster_ext: &ExtensionsStatus,
) -> Vec<AddressPair> {
    let lb = &cluster_ext.load_balancers;
    [
        (flags.control_plane_vip, &lb.control_plane.vip),
        (flags.ingress_vip, &lb.ingress.vip),
    ]
    .into_iter()
    .filter(|(wanted, vip)| *wanted && !vip.is_empty())
    .map(|(_, vip)| AddressPair::for_ip(vip.as_str()))
    .collect()
}

/// Merge the desired VIP pairs into every port of the machine on the cluster network
///
/// Nothing happens until the machine has a server, the cluster has a network
/// and the machine takes part in at least one published VIP.
pub async fn reconcile_allowed_address_pairs(
    scope: &dyn ClientScope,
    machine: &OpenStackMachine,
    osc: &OpenStackCluster,
) -> Result<()> {
    let Some(flags) = machine.load_balancers().filter(|lb| lb.participates()) else {
        return Ok(());
    };
    let Some(instance_id) = machine.instance_id() else {
        debug!(machine = %machine.name_any(), "Instance not created yet");
        return Ok(());
    };
    let Some(status) = osc.status.as_ref() else {
        return Ok(());
    };
    let Some(cluster_ext) = status.extensions.as_ref() else {
        return Ok(());
    };
    let network_id = status.network_id();
    if network_id.is_empty() {
        return Ok(());
    }

    let pairs = desired_address_pairs(flags, cluster_ext);
    if pairs.is_empty() {
        return Ok(());
    }

    let networking = scope.networking_service()?;
    let ports = networking.list_instance_ports(instance_id, network_id).await?;
    for port in &ports {
        if networking.ensure_allowed_address_pairs(port, &pairs).await? {
            debug!(port = %port.id, instance = instance_id, "Updated allowed address pairs");
        }
    }
    Ok(())
}
