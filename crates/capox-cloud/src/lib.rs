//! Collaborator contracts consumed by the extensions engine
//!
//! The engine never talks HTTP itself. Cloud access goes through the traits in
//! [`network`], [`identity`] and [`networking`], handed out per pass by a
//! [`ClientScope`]. Kubernetes access goes through [`SecretStore`] and
//! [`ConfigReader`], which ship with `kube`-backed implementations.

#![deny(missing_docs)]

pub mod config_reader;
pub mod identity;
pub mod network;
pub mod networking;
pub mod scope;
pub mod secrets;

#[cfg(test)]
mod api_server;

pub use config_reader::{ConfigReader, KubeConfigReader};
pub use identity::{AppCredentialCreateOpts, ApplicationCredential, AuthenticatedUser, IdentityClient};
pub use network::{
    AddressPair, FixedIp, Network, NetworkClient, NetworkCreateOpts, NetworkListOpts, Port,
    PortCreateOpts, PortListOpts, SecurityGroup, SecurityGroupCreateOpts, SecurityGroupListOpts,
    Subnet, SubnetCreateOpts, SubnetListOpts,
};
pub use networking::NetworkingService;
pub use scope::ClientScope;
pub use secrets::{CreateOutcome, KubeSecretStore, NewSecret, SecretStore};
