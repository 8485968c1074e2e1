//! Common types for OpenStack cluster extensions: CRD views, errors, naming and configuration

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod names;

pub use config::ExtensionsConfig;
pub use error::{Error, ResourceKind};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Networking plugin that requires the auxiliary VPC CNI network stack
pub const KUBE_NETWORK_PLUGIN_CILIUM: &str = "cilium";

/// Device owner of Neutron ports that bind a subnet to a router
pub const ROUTER_INTERFACE_OWNER: &str = "network:router_interface";

/// Tag marking resources that back a keepalived VIP
pub const KEEPALIVED_TAG: &str = "keepalived";

/// Tag marking resources of the VPC CNI stack
pub const VPC_CNI_TAG: &str = "vpc-cni";
