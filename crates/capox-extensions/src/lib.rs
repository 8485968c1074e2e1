//! Convergence of OpenStack cluster extension resources
//!
//! Each pass brings the auxiliary cloud resources of one cluster (keepalived
//! VIP ports, the VPC CNI network stack, an application credential) to their
//! desired state and publishes the facts bootstrap tooling needs under
//! `status.extensions`. Every step is idempotent: the list-then-create
//! [`ensure`] primitive adopts existing resources instead of duplicating them.

#![deny(missing_docs)]

pub mod address_pairs;
pub mod app_credential;
pub mod controller;
pub mod ensure;
pub mod load_balancers;
pub mod platform;
pub mod vip;
pub mod vpc_cni;

#[cfg(test)]
mod testing;

pub use controller::{reconcile_cluster_extensions, reconcile_machine_extensions, Context, ContextBuilder};
pub use ensure::{ensure, EnsureRequest};
