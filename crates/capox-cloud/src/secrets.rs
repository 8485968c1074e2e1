//! Secret storage

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{Api, PostParams};
use kube::Client;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use capox_common::Result;

/// A secret to be created
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NewSecret {
    /// Target namespace
    pub namespace: String,
    /// Secret name
    pub name: String,
    /// Payload keyed by file name
    pub data: BTreeMap<String, String>,
    /// Labels attached to the secret
    pub labels: BTreeMap<String, String>,
}

impl std::fmt::Debug for NewSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewSecret")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .field("labels", &self.labels)
            .finish()
    }
}

/// Result of a create call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The secret was created by this call
    Created,
    /// A secret with the same name already exists
    AlreadyExists,
}

/// Namespaced secret storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret, `None` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    /// Create a secret
    async fn create(&self, secret: NewSecret) -> Result<CreateOutcome>;
}

/// Build the Kubernetes object for `secret`
pub fn build_secret(secret: &NewSecret) -> Secret {
    let data = secret
        .data
        .iter()
        .map(|(k, v)| (k.clone(), ByteString(v.as_bytes().to_vec())))
        .collect();

    Secret {
        metadata: ObjectMeta {
            name: Some(secret.name.clone()),
            namespace: Some(secret.namespace.clone()),
            labels: (!secret.labels.is_empty()).then(|| secret.labels.clone()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(data),
        ..Default::default()
    }
}

/// [`SecretStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    /// Create a store using `client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, secret: NewSecret) -> Result<CreateOutcome> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &secret.namespace);
        match api.create(&PostParams::default(), &build_secret(&secret)).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(kube::Error::Api(e)) if e.code == 409 => {
                debug!(namespace = %secret.namespace, name = %secret.name, "Secret already exists");
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }
}
