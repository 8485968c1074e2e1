//! Naming and tagging conventions for cloud resources created on behalf of a cluster

use std::collections::HashSet;

use kube::ResourceExt;

use crate::crd::Cluster;

/// Stable base name for every cloud resource owned by `cluster`
///
/// Resources are looked up by names derived from this value, so it must not
/// change for the lifetime of the cluster.
pub fn cluster_resource_name(cluster: &Cluster) -> String {
    format!(
        "{}-{}",
        cluster.namespace().unwrap_or_default(),
        cluster.name_any()
    )
}

/// Description attached to resources created for a cluster
pub fn description(cluster_resource_name: &str) -> String {
    format!(
        "Created by cluster-api-provider-openstack cluster {}",
        cluster_resource_name
    )
}

/// Merge `initial` and `extras` keeping the first occurrence of each value
///
/// Empty strings are dropped.
pub fn deduplicate_strings<I, E>(initial: I, extras: E) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    E: IntoIterator,
    E::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for value in initial
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .chain(extras.into_iter().map(|v| v.as_ref().to_string()))
    {
        if value.is_empty() || seen.contains(&value) {
            continue;
        }
        seen.insert(value.clone());
        result.push(value);
    }
    result
}
