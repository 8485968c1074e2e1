//! Dedicated pod network stack for the cilium plugin
//!
//! Cilium in VPC CNI mode hands pods addresses from a cloud subnet, so the
//! cluster needs its own network, a subnet covering the pod range attached to
//! the cluster router, and a fully open security group for pod ports.

use kube::ResourceExt;
use tracing::{debug, info};

use capox_cloud::ClientScope;
use capox_common::crd::{Cluster, ExtensionsStatus, OpenStackCluster};
use capox_common::names::{cluster_resource_name, deduplicate_strings};
use capox_common::{Error, Result, VPC_CNI_TAG};

use crate::ensure::{ensure, ensure_router_interface, NetworkRequest, SecurityGroupRequest, SubnetRequest};

/// IDs of the VPC CNI network and subnet
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkStack {
    /// Network ID
    pub network_id: String,
    /// Subnet ID
    pub subnet_id: String,
}

#[derive(Debug)]
struct StackConfig {
    network_name: String,
    subnet_cidr: String,
    router_id: String,
    tags: Vec<String>,
}

fn stack_config(cluster: &Cluster, osc: &OpenStackCluster) -> Result<StackConfig> {
    let base = cluster_resource_name(cluster);
    let cluster_name = osc.name_any();

    let subnet_cidr = cluster
        .pod_cidr_blocks()
        .first()
        .filter(|cidr| !cidr.is_empty())
        .cloned()
        .ok_or_else(|| {
            Error::not_ready_for(
                &cluster_name,
                "clusterNetwork.pods.cidrBlocks is empty, cannot size the VPC CNI subnet",
            )
        })?;

    let router_id = osc
        .status
        .as_ref()
        .map(|s| s.router_id().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            Error::not_ready_for(
                &cluster_name,
                "router ID is not ready, cannot attach the VPC CNI subnet",
            )
        })?;

    Ok(StackConfig {
        network_name: format!("{}-vpc-cni", base),
        subnet_cidr,
        router_id,
        tags: deduplicate_strings(&osc.spec.tags, [VPC_CNI_TAG, base.as_str()]),
    })
}

/// Ensure the VPC CNI security group exists and admits all traffic
///
/// Returns the group ID.
pub async fn ensure_vpc_cni_security_group(scope: &dyn ClientScope, cluster: &Cluster) -> Result<String> {
    let name = format!("{}-vpc-cni-secgroup", cluster_resource_name(cluster));
    let client = scope.network_client()?;

    let group = ensure(
        client.as_ref(),
        &SecurityGroupRequest {
            description: format!("VPC CNI security group for {}", name),
            name,
            tags: Vec::new(),
        },
    )
    .await?;

    scope
        .networking_service()?
        .ensure_allow_all_security_group_rules(&group.id)
        .await?;
    Ok(group.id)
}

/// Ensure the VPC CNI network, subnet and router interface exist
///
/// `None` when the cluster does not configure networking at all.
pub async fn ensure_vpc_cni_network(
    scope: &dyn ClientScope,
    cluster: &Cluster,
    osc: &OpenStackCluster,
) -> Result<Option<NetworkStack>> {
    if osc
        .spec
        .extensions
        .as_ref()
        .and_then(|e| e.networking.as_ref())
        .is_none()
    {
        return Ok(None);
    }

    let config = stack_config(cluster, osc)?;
    let client = scope.network_client()?;

    let network = ensure(
        client.as_ref(),
        &NetworkRequest {
            name: config.network_name.clone(),
            tags: config.tags.clone(),
        },
    )
    .await?;

    let subnet = ensure(
        client.as_ref(),
        &SubnetRequest {
            network_id: network.id.clone(),
            cidr: config.subnet_cidr.clone(),
            name: format!("{}-subnet", config.network_name),
            description: format!("VPC CNI subnet for {}", config.network_name),
            enable_dhcp: false,
            tags: Vec::new(),
        },
    )
    .await?;

    ensure_router_interface(client.as_ref(), &config.router_id, &subnet.id).await?;

    Ok(Some(NetworkStack {
        network_id: network.id,
        subnet_id: subnet.id,
    }))
}

/// Publish the VPC CNI facts for clusters running cilium
///
/// Each sub-step runs only while its status field is still empty, so a
/// converged cluster costs no cloud calls beyond the project lookup.
pub async fn reconcile_networking(
    scope: &dyn ClientScope,
    cluster: &Cluster,
    osc: &OpenStackCluster,
    ext: &mut ExtensionsStatus,
) -> Result<()> {
    let requires_vpc_cni = osc
        .spec
        .extensions
        .as_ref()
        .is_some_and(|e| e.requires_vpc_cni());
    if !requires_vpc_cni {
        debug!("networking plugin does not need a VPC CNI stack");
        return Ok(());
    }

    let cilium = &mut ext.networking.cilium;
    cilium.project_id = scope.project_id();

    if cilium.security_group_ids.is_empty() {
        let group_id = ensure_vpc_cni_security_group(scope, cluster).await?;
        info!(group_id = %group_id, "Published VPC CNI security group");
        cilium.security_group_ids = vec![group_id];
    }

    if cilium.default_subnet_id.is_empty() {
        if let Some(stack) = ensure_vpc_cni_network(scope, cluster, osc).await? {
            info!(
                network_id = %stack.network_id,
                subnet_id = %stack.subnet_id,
                "Published VPC CNI subnet"
            );
            cilium.default_subnet_id = stack.subnet_id;
        }
    }
    Ok(())
}
