//! Per-pass client scope

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use capox_common::Result;

use crate::identity::IdentityClient;
use crate::network::NetworkClient;
use crate::networking::NetworkingService;

/// Authenticated view of one cloud project
///
/// A scope is built by the embedding controller for each pass and hands out
/// the clients that pass uses. Client construction is cheap and may be
/// repeated by every step.
#[cfg_attr(test, automock)]
pub trait ClientScope: Send + Sync {
    /// Low-level network API
    fn network_client(&self) -> Result<Arc<dyn NetworkClient>>;

    /// Higher-level networking service
    fn networking_service(&self) -> Result<Arc<dyn NetworkingService>>;

    /// Identity API
    ///
    /// Fails with [`capox_common::Error::BackendUnavailable`] when identity
    /// operations cannot be performed with this scope.
    fn identity_client(&self) -> Result<Arc<dyn IdentityClient>>;

    /// Project the scope is authenticated against
    fn project_id(&self) -> String;

    /// Public endpoint of `service` (e.g. `nova`) from the service catalog
    fn service_endpoint(&self, service: &str) -> Result<String>;

    /// Identity endpoint the scope authenticated with
    fn identity_endpoint(&self) -> String;

    /// Region of the scope
    fn region_name(&self) -> String;
}
