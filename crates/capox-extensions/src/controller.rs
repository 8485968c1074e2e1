//! Cluster and machine extension passes
//!
//! A pass runs its steps strictly in order against one object. The first
//! failing step aborts the pass, but status written by earlier steps is kept
//! on the object so the next pass resumes from it. Persisting the mutated
//! status is left to the embedding controller.

use std::sync::Arc;

use kube::{Client, ResourceExt};
use tracing::{debug, instrument};

use capox_cloud::{ClientScope, ConfigReader, KubeConfigReader, KubeSecretStore, SecretStore};
use capox_common::crd::{Cluster, ExtensionsStatus, OpenStackCluster, OpenStackClusterStatus, OpenStackMachine};
use capox_common::{ExtensionsConfig, Result};

use crate::address_pairs::reconcile_allowed_address_pairs;
use crate::app_credential::reconcile_app_credential;
use crate::load_balancers::reconcile_load_balancers;
use crate::platform::{reconcile_endpoints, reconcile_platform};
use crate::vpc_cni::reconcile_networking;

/// Shared dependencies of every pass
pub struct Context {
    /// Secret storage for application credentials
    pub secrets: Arc<dyn SecretStore>,
    /// Reader for the platform cluster config object
    pub config_reader: Arc<dyn ConfigReader>,
    /// Fixed lookup keys
    pub config: ExtensionsConfig,
}

impl Context {
    /// Create a builder for constructing a Context
    pub fn builder(client: Client) -> ContextBuilder {
        ContextBuilder::new(client)
    }

    /// Create a context backed by `client` with configuration from the environment
    pub fn new(client: Client) -> Self {
        Self::builder(client).build()
    }

    /// Create a context from explicit collaborators
    #[cfg(test)]
    pub fn for_testing(secrets: Arc<dyn SecretStore>, config_reader: Arc<dyn ConfigReader>) -> Self {
        Self {
            secrets,
            config_reader,
            config: ExtensionsConfig::default(),
        }
    }
}

/// Builder for constructing [`Context`] instances
///
/// ```text
/// let ctx = Context::builder(client)
///     .config(ExtensionsConfig::from_env())
///     .build();
/// ```
pub struct ContextBuilder {
    client: Client,
    secrets: Option<Arc<dyn SecretStore>>,
    config_reader: Option<Arc<dyn ConfigReader>>,
    config: Option<ExtensionsConfig>,
}

impl ContextBuilder {
    fn new(client: Client) -> Self {
        Self {
            client,
            secrets: None,
            config_reader: None,
            config: None,
        }
    }

    /// Override the secret store
    pub fn secret_store(mut self, secrets: Arc<dyn SecretStore>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Override the config reader
    pub fn config_reader(mut self, reader: Arc<dyn ConfigReader>) -> Self {
        self.config_reader = Some(reader);
        self
    }

    /// Override the configuration (defaults to [`ExtensionsConfig::from_env`])
    pub fn config(mut self, config: ExtensionsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    pub fn build(self) -> Context {
        Context {
            secrets: self
                .secrets
                .unwrap_or_else(|| Arc::new(KubeSecretStore::new(self.client.clone()))),
            config_reader: self
                .config_reader
                .unwrap_or_else(|| Arc::new(KubeConfigReader::new(self.client.clone()))),
            config: self.config.unwrap_or_else(ExtensionsConfig::from_env),
        }
    }
}

/// Converge the extension resources of a cluster and publish their facts
///
/// Steps: load balancer VIPs, CNI networking, platform facts, service
/// endpoints, application credential.
#[instrument(skip_all, fields(cluster = %osc.name_any()))]
pub async fn reconcile_cluster_extensions(
    ctx: &Context,
    scope: &dyn ClientScope,
    cluster: &Cluster,
    osc: &mut OpenStackCluster,
) -> Result<()> {
    let status = osc.status.get_or_insert_with(OpenStackClusterStatus::default);
    let mut ext = std::mem::take(ExtensionsStatus::ensure_initialized(&mut status.extensions));

    let result = run_cluster_steps(ctx, scope, cluster, osc, &mut ext).await;

    if result.is_ok() {
        debug!(
            control_plane_vip = %ext.load_balancers.control_plane.vip,
            project_id = %ext.networking.cilium.project_id,
            "Reconciled cluster extensions"
        );
    }
    osc.status
        .get_or_insert_with(OpenStackClusterStatus::default)
        .extensions = Some(ext);
    result
}

async fn run_cluster_steps(
    ctx: &Context,
    scope: &dyn ClientScope,
    cluster: &Cluster,
    osc: &OpenStackCluster,
    ext: &mut ExtensionsStatus,
) -> Result<()> {
    reconcile_load_balancers(
        ctx.config_reader.as_ref(),
        &ctx.config,
        scope,
        cluster,
        osc,
        ext,
    )
    .await?;
    reconcile_networking(scope, cluster, osc, ext).await?;
    reconcile_platform(osc, ext);
    reconcile_endpoints(scope, ext);
    reconcile_app_credential(ctx.secrets.as_ref(), &ctx.config, scope, cluster, osc, ext).await
}

/// Converge the extension resources of a machine
#[instrument(skip_all, fields(machine = %machine.name_any(), cluster = %osc.name_any()))]
pub async fn reconcile_machine_extensions(
    scope: &dyn ClientScope,
    machine: &OpenStackMachine,
    osc: &OpenStackCluster,
) -> Result<()> {
    reconcile_allowed_address_pairs(scope, machine, osc).await
}
