//! Application credential issued for each cluster
//!
//! The credential lets in-cluster components call the cloud without the
//! provider's own identity. It is issued once and stored as a `clouds.yaml`
//! secret next to the OpenStackCluster; afterwards the status reference alone
//! proves the work is done.

use std::collections::BTreeMap;

use kube::ResourceExt;
use minijinja::{context, Environment};
use tracing::{debug, info};

use capox_cloud::{AppCredentialCreateOpts, ClientScope, CreateOutcome, NewSecret, SecretStore};
use capox_common::crd::{Cluster, ExtensionsStatus, OpenStackCluster};
use capox_common::names::{cluster_resource_name, description};
use capox_common::{Error, ExtensionsConfig, Result};

/// Secret key holding the rendered cloud configuration
pub const CLOUDS_YAML_KEY: &str = "clouds.yaml";

/// Secret key holding the CA bundle
pub const CACERT_KEY: &str = "cacert";

/// Label carrying the application credential ID
pub const CREDENTIAL_ID_LABEL: &str = "creId";

const CLOUDS_YAML_TEMPLATE: &str = include_str!("../templates/clouds.yaml");

/// Values substituted into the cloud configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloudsYaml<'a> {
    /// Cloud entry name
    pub cluster_name: &'a str,
    /// Identity endpoint
    pub auth_url: &'a str,
    /// Application credential ID
    pub credential_id: &'a str,
    /// Application credential secret
    pub credential_secret: &'a str,
    /// Region name
    pub region: &'a str,
}

/// Render the `clouds.yaml` document for an application credential
pub fn render_clouds_yaml(values: &CloudsYaml<'_>) -> Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_template(CLOUDS_YAML_KEY, CLOUDS_YAML_TEMPLATE)
        .map_err(|e| Error::template(format!("invalid clouds.yaml template: {}", e)))?;

    env.get_template(CLOUDS_YAML_KEY)
        .map_err(|e| Error::template(format!("template not found: {}", e)))?
        .render(context! {
            cluster_name => values.cluster_name,
            auth_url => values.auth_url,
            credential_id => values.credential_id,
            credential_secret => values.credential_secret,
            region => values.region,
        })
        .map_err(|e| Error::template(format!("failed to render clouds.yaml: {}", e)))
}

/// Issue the cluster application credential once and record its secret
pub async fn reconcile_app_credential(
    secrets: &dyn SecretStore,
    config: &ExtensionsConfig,
    scope: &dyn ClientScope,
    cluster: &Cluster,
    osc: &OpenStackCluster,
    ext: &mut ExtensionsStatus,
) -> Result<()> {
    let resource_name = cluster_resource_name(cluster);
    let secret_name = config.app_credential_secret_name(&resource_name);
    let record = &mut ext.open_stack.app_credential;

    if record.ref_ == secret_name {
        debug!(secret = %secret_name, "Application credential already recorded");
        return Ok(());
    }

    let namespace = osc.namespace().unwrap_or_default();
    if secrets.get(&namespace, &secret_name).await?.is_some() {
        debug!(secret = %secret_name, "Adopting existing application credential secret");
        record.ref_ = secret_name;
        return Ok(());
    }

    let identity = match scope.identity_client() {
        Ok(identity) => identity,
        Err(e) if e.is_unavailable() => {
            debug!(error = %e, "Identity client unavailable, skipping application credential");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let user = identity
        .current_user()
        .await?
        .filter(|u| !u.id.is_empty())
        .ok_or_else(|| Error::identity("missing user ID in authentication result"))?;

    let credential = identity
        .create_application_credential(
            &user.id,
            &AppCredentialCreateOpts {
                name: format!("{}-appcred", resource_name),
                description: description(&resource_name),
            },
        )
        .await?;

    let identity_endpoint = scope.identity_endpoint();
    let region = scope.region_name();
    let clouds_yaml = render_clouds_yaml(&CloudsYaml {
        cluster_name: &resource_name,
        auth_url: &identity_endpoint,
        credential_id: &credential.id,
        credential_secret: &credential.secret,
        region: &region,
    })?;

    let outcome = secrets
        .create(NewSecret {
            namespace: namespace.clone(),
            name: secret_name.clone(),
            data: BTreeMap::from([
                (CLOUDS_YAML_KEY.to_string(), clouds_yaml),
                (CACERT_KEY.to_string(), "\n".to_string()),
            ]),
            labels: BTreeMap::from([(CREDENTIAL_ID_LABEL.to_string(), credential.id.clone())]),
        })
        .await?;

    match outcome {
        CreateOutcome::Created => info!(
            secret = %secret_name,
            %namespace,
            credential_id = %credential.id,
            "Stored application credential"
        ),
        CreateOutcome::AlreadyExists => debug!(
            secret = %secret_name,
            "Application credential secret appeared concurrently, adopting it"
        ),
    }
    record.ref_ = secret_name;
    Ok(())
}
