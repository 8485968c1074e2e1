//! Platform access and service endpoint facts

use tracing::debug;
use url::{ParseError, Url};

use capox_cloud::ClientScope;
use capox_common::crd::{ClusterEndpointsStatus, ExtensionsStatus, OpenStackCluster};

/// OpenStack services whose endpoint hosts are published
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenStackService {
    /// Identity
    Keystone,
    /// Block storage
    Cinder,
    /// Compute
    Nova,
    /// Network
    Neutron,
}

impl OpenStackService {
    /// Resolution order
    pub const ALL: [OpenStackService; 4] = [
        OpenStackService::Keystone,
        OpenStackService::Cinder,
        OpenStackService::Nova,
        OpenStackService::Neutron,
    ];

    /// Name in the service catalog
    pub fn catalog_name(self) -> &'static str {
        match self {
            OpenStackService::Keystone => "keystone",
            OpenStackService::Cinder => "cinder",
            OpenStackService::Nova => "nova",
            OpenStackService::Neutron => "neutron",
        }
    }

    fn slot(self, endpoints: &mut ClusterEndpointsStatus) -> &mut String {
        match self {
            OpenStackService::Keystone => &mut endpoints.keystone,
            OpenStackService::Cinder => &mut endpoints.cinder,
            OpenStackService::Nova => &mut endpoints.nova,
            OpenStackService::Neutron => &mut endpoints.neutron,
        }
    }
}

/// Publish the management address: the bastion IP while a bastion is enabled
pub fn reconcile_platform(osc: &OpenStackCluster, ext: &mut ExtensionsStatus) {
    ext.platform.management.vip = if osc.spec.bastion_enabled() {
        osc.status
            .as_ref()
            .and_then(|s| s.bastion.as_ref())
            .map(|b| b.ip.clone())
            .unwrap_or_default()
    } else {
        String::new()
    };
}

/// Publish the host of every resolvable service endpoint
///
/// Lookup failures and empty endpoints leave the previous value in place.
pub fn reconcile_endpoints(scope: &dyn ClientScope, ext: &mut ExtensionsStatus) {
    for service in OpenStackService::ALL {
        let name = service.catalog_name();
        let endpoint = match scope.service_endpoint(name) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                debug!(service = name, error = %e, "Failed to resolve service endpoint");
                continue;
            }
        };
        if endpoint.is_empty() {
            continue;
        }
        *service.slot(&mut ext.endpoints) = endpoint_host(&endpoint);
    }
}

/// Host part of `endpoint`
///
/// Scheme-less paths such as `keystone.example.com/v3` have no host and give
/// an empty string. Malformed values are returned unchanged, including a
/// leading `host:port` without a scheme. IPv6 hosts lose their brackets.
pub fn endpoint_host(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        Ok(url) => url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
            .unwrap_or_default(),
        Err(ParseError::RelativeUrlWithoutBase) if !first_segment_has_colon(endpoint) => String::new(),
        Err(_) => endpoint.to_string(),
    }
}

fn first_segment_has_colon(endpoint: &str) -> bool {
    endpoint.split('/').next().is_some_and(|segment| segment.contains(':'))
}
