//! Engine configuration
//!
//! All fixed lookup keys used during a pass live here. Defaults match the
//! management platform the engine was built for and can be overridden through
//! environment variables.

use std::env;

/// Environment variable overriding [`ConfigObjectKey::namespace`]
pub const ENV_CLUSTER_CONFIG_NAMESPACE: &str = "CAPOX_CLUSTER_CONFIG_NAMESPACE";
/// Environment variable overriding [`ConfigObjectKey::name`]
pub const ENV_CLUSTER_CONFIG_NAME: &str = "CAPOX_CLUSTER_CONFIG_NAME";
/// Environment variable overriding [`ExtensionsConfig::public_vip_path`] (dot separated)
pub const ENV_PUBLIC_VIP_PATH: &str = "CAPOX_PUBLIC_VIP_PATH";
/// Environment variable overriding [`ExtensionsConfig::app_credential_secret_suffix`]
pub const ENV_APP_CREDENTIAL_SECRET_SUFFIX: &str = "CAPOX_APP_CREDENTIAL_SECRET_SUFFIX";

/// Structured key of an externally owned, loosely typed configuration object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigObjectKey {
    /// API group
    pub group: String,
    /// API version
    pub version: String,
    /// Plural resource name
    pub resource: String,
    /// Kind
    pub kind: String,
    /// Namespace; empty for cluster-scoped objects
    pub namespace: String,
    /// Object name
    pub name: String,
}

impl ConfigObjectKey {
    /// `group/version`, or just `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl Default for ConfigObjectKey {
    fn default() -> Self {
        Self {
            group: "servicecatalog.ecp.com".to_string(),
            version: "v1".to_string(),
            resource: "configs".to_string(),
            kind: "Config".to_string(),
            namespace: "ems".to_string(),
            name: "clusterconfig".to_string(),
        }
    }
}

/// Configuration shared by every reconcile pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionsConfig {
    /// Object holding platform-level cluster attributes
    pub cluster_config: ConfigObjectKey,
    /// Field path of the public (floating) control plane VIP inside `cluster_config`
    pub public_vip_path: Vec<String>,
    /// Suffix appended to the cluster resource name to form the app credential secret name
    pub app_credential_secret_suffix: String,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            cluster_config: ConfigObjectKey::default(),
            public_vip_path: vec![
                "data".to_string(),
                "cluster_attrs".to_string(),
                "public_vip".to_string(),
            ],
            app_credential_secret_suffix: "openstack-app-cred".to_string(),
        }
    }
}

impl ExtensionsConfig {
    /// Build the configuration from defaults overridden by environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(ns) = non_empty(ENV_CLUSTER_CONFIG_NAMESPACE) {
            config.cluster_config.namespace = ns;
        }
        if let Some(name) = non_empty(ENV_CLUSTER_CONFIG_NAME) {
            config.cluster_config.name = name;
        }
        if let Some(path) = non_empty(ENV_PUBLIC_VIP_PATH) {
            config.public_vip_path = path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(suffix) = non_empty(ENV_APP_CREDENTIAL_SECRET_SUFFIX) {
            config.app_credential_secret_suffix = suffix;
        }
        config
    }

    /// Name of the secret holding the application credential of a cluster
    pub fn app_credential_secret_name(&self, cluster_resource_name: &str) -> String {
        format!(
            "{}-{}",
            cluster_resource_name, self.app_credential_secret_suffix
        )
    }
}
