//! Error types for the extensions engine
//!
//! Errors carry the context needed to tell configuration faults apart from
//! conditions the surrounding control loop will clear by retrying.

use std::fmt;

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Kind of cloud resource managed through list-then-create
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Neutron network
    Network,
    /// Neutron subnet
    Subnet,
    /// Neutron security group
    SecurityGroup,
    /// Neutron port
    Port,
    /// Router interface binding a subnet to a router
    RouterInterface,
}

impl ResourceKind {
    /// Collection name used by the resource tagging API
    pub fn tag_collection(&self) -> &'static str {
        match self {
            ResourceKind::Network => "networks",
            ResourceKind::Subnet => "subnets",
            ResourceKind::SecurityGroup => "security-groups",
            ResourceKind::Port => "ports",
            ResourceKind::RouterInterface => "routers",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Network => "network",
            ResourceKind::Subnet => "subnet",
            ResourceKind::SecurityGroup => "security group",
            ResourceKind::Port => "port",
            ResourceKind::RouterInterface => "router interface",
        };
        f.write_str(name)
    }
}

/// Main error type for extension reconciliation
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Cloud API call failed
    #[error("cloud error [{operation}]: {message}")]
    Cloud {
        /// Operation that failed (e.g., "create network")
        operation: String,
        /// Description of what failed
        message: String,
    },

    /// A create call lost the race against another creator
    #[error("{kind} {name:?} already exists")]
    AlreadyExists {
        /// Kind of the conflicting resource
        kind: ResourceKind,
        /// Name of the conflicting resource
        name: String,
    },

    /// A lookup that must be unique matched several resources
    #[error("found {count} {kind} resources matching {filter}, refusing to pick one")]
    AmbiguousResource {
        /// Kind of resource looked up
        kind: ResourceKind,
        /// Human readable filter (name, CIDR, ...)
        filter: String,
        /// Number of matches
        count: usize,
    },

    /// A resource this step depends on does not exist yet
    #[error("prerequisite not ready for {cluster}: {message}")]
    PrerequisiteNotReady {
        /// Cluster being reconciled
        cluster: String,
        /// What is missing
        message: String,
    },

    /// A VIP port was resolved but carries no address
    #[error("VIP port {port} has no fixed IP")]
    NoFixedIp {
        /// ID of the port
        port: String,
    },

    /// A backend is not configured for this scope
    #[error("{backend} unavailable: {message}")]
    BackendUnavailable {
        /// Backend name (e.g., "identity")
        backend: String,
        /// Why it is unavailable
        message: String,
    },

    /// The authentication result does not identify a user
    #[error("identity error: {message}")]
    Identity {
        /// Description of what is wrong
        message: String,
    },

    /// A document did not have the expected shape
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },

    /// Rendering a generated document failed
    #[error("template error: {message}")]
    Template {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a cloud API error for the given operation
    pub fn cloud(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Cloud {
            operation: operation.into(),
            message: msg.into(),
        }
    }

    /// Create an already-exists conflict
    pub fn already_exists(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Create an ambiguous-resource error
    pub fn ambiguous(kind: ResourceKind, filter: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousResource {
            kind,
            filter: filter.into(),
            count,
        }
    }

    /// Create a prerequisite error without cluster context
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::PrerequisiteNotReady {
            cluster: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a prerequisite error with cluster context
    pub fn not_ready_for(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::PrerequisiteNotReady {
            cluster: cluster.into(),
            message: msg.into(),
        }
    }

    /// Create a backend-unavailable error
    pub fn unavailable(backend: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            message: msg.into(),
        }
    }

    /// Create an identity error
    pub fn identity(msg: impl Into<String>) -> Self {
        Self::Identity {
            message: msg.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    /// Whether a create failed because the resource is already there
    pub fn is_already_exists(&self) -> bool {
        match self {
            Error::AlreadyExists { .. } => true,
            Error::Kube {
                source: kube::Error::Api(ae),
            } => ae.code == 409,
            _ => false,
        }
    }

    /// Whether the step depending on this error should be skipped rather than failed
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::BackendUnavailable { .. })
    }

    /// Check if this error is retryable
    ///
    /// Ambiguous lookups and malformed documents need a configuration fix.
    /// Everything else may clear on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code) && ae.code != 409
            ),
            Error::Cloud { .. } => true,
            Error::AlreadyExists { .. } => true,
            Error::AmbiguousResource { .. } => false,
            Error::PrerequisiteNotReady { .. } => true,
            Error::NoFixedIp { .. } => true,
            Error::BackendUnavailable { .. } => true,
            Error::Identity { .. } => false,
            Error::Serialization { .. } => false,
            Error::Template { .. } => false,
        }
    }

    /// Get the cluster name if this error is associated with a specific cluster
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Error::PrerequisiteNotReady { cluster, .. } => Some(cluster),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16) -> Error {
        Error::from(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "Test".to_string(),
            code,
        }))
    }

    #[test]
    fn ambiguous_lookup_is_a_configuration_fault() {
        let err = Error::ambiguous(ResourceKind::Network, "name=demo-vpc-cni", 2);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("found 2 network resources"));
        assert!(err.to_string().contains("name=demo-vpc-cni"));
    }

    #[test]
    fn missing_prerequisites_are_retried() {
        let err = Error::not_ready_for("default-demo", "router ID is not ready");
        assert!(err.is_retryable());
        assert_eq!(err.cluster(), Some("default-demo"));

        let err = Error::not_ready("cluster network is not ready");
        assert_eq!(err.cluster(), Some(UNKNOWN_CONTEXT));
    }

    #[test]
    fn conflicts_are_recognised_from_both_sources() {
        assert!(Error::already_exists(ResourceKind::Port, "p").is_already_exists());
        assert!(api_error(409).is_already_exists());
        assert!(!api_error(404).is_already_exists());
        assert!(!Error::cloud("create port", "timeout").is_already_exists());
    }

    #[test]
    fn kube_client_errors_are_not_retried() {
        assert!(!api_error(403).is_retryable());
        assert!(api_error(409).is_retryable());
        assert!(api_error(503).is_retryable());
    }

    #[test]
    fn unavailable_backend_is_flagged_for_skipping() {
        let err = Error::unavailable("identity", "no identity endpoint in catalog");
        assert!(err.is_unavailable());
        assert!(!Error::identity("missing user ID").is_unavailable());
        assert!(!Error::identity("missing user ID").is_retryable());
    }

    #[test]
    fn tag_collections_match_neutron_resources() {
        assert_eq!(ResourceKind::Network.tag_collection(), "networks");
        assert_eq!(ResourceKind::Subnet.tag_collection(), "subnets");
        assert_eq!(ResourceKind::SecurityGroup.tag_collection(), "security-groups");
        assert_eq!(ResourceKind::Port.tag_collection(), "ports");
        assert_eq!(ResourceKind::SecurityGroup.to_string(), "security group");
    }
}
