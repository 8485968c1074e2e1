//! Higher-level networking operations
//!
//! These are provided by the networking service of the surrounding provider.
//! [`merge_allowed_address_pairs`] captures the merge contract implementations
//! follow when they update a port.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use capox_common::Result;

use crate::network::{AddressPair, Port};

/// Networking service of the surrounding provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NetworkingService: Send + Sync {
    /// Ports of `instance_id` that sit on `network_id`
    async fn list_instance_ports(&self, instance_id: &str, network_id: &str) -> Result<Vec<Port>>;

    /// Make sure `port` allows every pair in `pairs`
    ///
    /// Returns whether the port had to be updated.
    async fn ensure_allowed_address_pairs(&self, port: &Port, pairs: &[AddressPair]) -> Result<bool>;

    /// Make sure `group_id` admits all traffic in both directions
    async fn ensure_allow_all_security_group_rules(&self, group_id: &str) -> Result<()>;
}

/// Additive union of `existing` and `desired`
///
/// Existing pairs keep their position; missing desired pairs are appended in
/// order. A desired pair without a MAC is satisfied by any existing pair for
/// the same address. Returns `None` when `existing` already covers `desired`.
pub fn merge_allowed_address_pairs(
    existing: &[AddressPair],
    desired: &[AddressPair],
) -> Option<Vec<AddressPair>> {
    let mut merged = existing.to_vec();
    for pair in desired {
        let covered = merged.iter().any(|have| {
            have.ip_address == pair.ip_address
                && (pair.mac_address.is_empty() || have.mac_address == pair.mac_address)
        });
        if !covered {
            merged.push(pair.clone());
        }
    }
    (merged.len() != existing.len()).then_some(merged)
}
