//! Reads single fields from externally owned configuration objects

use async_trait::async_trait;
use kube::api::{Api, DynamicObject};
use kube::discovery::ApiResource;
use kube::Client;
use serde_json::Value;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use capox_common::config::ConfigObjectKey;
use capox_common::{Error, Result};

/// Generic read of one string field from a loosely typed object
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigReader: Send + Sync {
    /// Value at `path` inside the object named by `key`
    ///
    /// `None` when the object or the field does not exist.
    async fn read_field(&self, key: &ConfigObjectKey, path: &[String]) -> Result<Option<String>>;
}

/// Walk `path` through nested maps and return the string found there
///
/// Missing keys and explicit nulls resolve to `None`. Reaching a non-map on
/// the way, or a non-string at the end, is a [`Error::Serialization`].
pub fn nested_string(value: &Value, path: &[String]) -> Result<Option<String>> {
    let mut current = value;
    for (depth, segment) in path.iter().enumerate() {
        let map = current.as_object().ok_or_else(|| {
            Error::serialization(format!(
                "{} is not a map",
                display_path(&path[..depth])
            ))
        })?;
        match map.get(segment) {
            Some(Value::Null) | None => return Ok(None),
            Some(next) => current = next,
        }
    }
    match current {
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(Error::serialization(format!(
            "{} is {}, expected a string",
            display_path(path),
            json_type(other)
        ))),
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        ".".to_string()
    } else {
        format!(".{}", path.join("."))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

/// Build the dynamic API resource addressed by `key`
pub fn api_resource(key: &ConfigObjectKey) -> ApiResource {
    ApiResource {
        group: key.group.clone(),
        version: key.version.clone(),
        api_version: key.api_version(),
        kind: key.kind.clone(),
        plural: key.resource.clone(),
    }
}

/// [`ConfigReader`] backed by the Kubernetes dynamic API
#[derive(Clone)]
pub struct KubeConfigReader {
    client: Client,
}

impl KubeConfigReader {
    /// Create a reader using `client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigReader for KubeConfigReader {
    async fn read_field(&self, key: &ConfigObjectKey, path: &[String]) -> Result<Option<String>> {
        let ar = api_resource(key);
        let api: Api<DynamicObject> = if key.namespace.is_empty() {
            Api::all_with(self.client.clone(), &ar)
        } else {
            Api::namespaced_with(self.client.clone(), &key.namespace, &ar)
        };

        match api.get(&key.name).await {
            Ok(obj) => nested_string(&obj.data, path),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                debug!(
                    kind = %key.kind,
                    namespace = %key.namespace,
                    name = %key.name,
                    "Config object not found"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
