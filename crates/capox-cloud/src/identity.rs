//! Identity API contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use capox_common::Result;

/// Backend name reported by [`capox_common::Error::BackendUnavailable`] for identity
pub const IDENTITY_BACKEND: &str = "identity";

/// A freshly issued application credential
///
/// The secret is only returned on creation and cannot be read back later.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationCredential {
    /// Credential ID
    pub id: String,
    /// Credential name
    pub name: String,
    /// Credential secret
    pub secret: String,
}

impl std::fmt::Debug for ApplicationCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationCredential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Parameters for issuing an application credential
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppCredentialCreateOpts {
    /// Credential name
    pub name: String,
    /// Free-form description
    pub description: String,
}

/// The user the scope authenticated as
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatedUser {
    /// User ID
    pub id: String,
    /// User name
    pub name: String,
}

/// Identity API
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Issue an application credential owned by `user_id`
    async fn create_application_credential(
        &self,
        user_id: &str,
        opts: &AppCredentialCreateOpts,
    ) -> Result<ApplicationCredential>;

    /// User carried by the current authentication result
    ///
    /// `None` when the authentication result holds no user at all.
    async fn current_user(&self) -> Result<Option<AuthenticatedUser>>;
}
