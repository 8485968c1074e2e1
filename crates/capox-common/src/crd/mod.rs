//! Custom resource views used by the extensions engine
//!
//! These are partial projections of the Cluster API and OpenStack provider
//! resources: only the fields the engine reads or publishes are modelled.

mod cluster;
mod extensions;
mod openstack_cluster;
mod openstack_machine;

pub use cluster::{Cluster, ClusterNetwork, ClusterSpec, NetworkRanges};
pub use extensions::{
    AppCredentialStatus, CiliumNetworkingStatus, ClusterEndpointsStatus, ClusterExtensionsSpec,
    ClusterLoadBalancersStatus, ClusterNetworkInterfacesSpec, ClusterNetworkingSpec,
    ClusterNetworkingStatus, ClusterOpenStackSpec, ClusterOpenStackStatus, ClusterPlatformStatus,
    ExtensionsStatus, MachineExtensionsSpec, MachineLoadBalancersSpec, MachineMemorySpec,
    MachineNetworkInterfacesSpec, PlatformManagementStatus, PlatformNtpStatus, VipRecord,
};
pub use openstack_cluster::{
    BastionSpec, BastionStatus, NetworkStatusWithSubnets, OpenStackCluster, OpenStackClusterSpec,
    OpenStackClusterStatus, RouterStatus, SecurityGroupStatus, SubnetStatus,
};
pub use openstack_machine::{OpenStackMachine, OpenStackMachineSpec, OpenStackMachineStatus};
