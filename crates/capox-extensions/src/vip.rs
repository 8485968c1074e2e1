//! Reserved ports backing virtual IPs

use capox_cloud::NetworkClient;
use capox_common::{Error, Result};

use crate::ensure::{ensure, PortRequest};

/// Port reserved for one VIP
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VipPortInput {
    /// Port name, also the lookup key
    pub name: String,
    /// Port description
    pub description: String,
    /// Network to reserve the address on
    pub network_id: String,
    /// Tags applied after creation
    pub tags: Vec<String>,
    /// Security groups applied on creation
    pub security_groups: Vec<String>,
}

/// Reserve (or find) the port for `input` and return its address
///
/// The port is created administratively down: it only holds the address,
/// keepalived moves the traffic between machines.
pub async fn ensure_vip_port(client: &dyn NetworkClient, input: &VipPortInput) -> Result<String> {
    if input.network_id.is_empty() {
        return Err(Error::not_ready("cluster network is not ready"));
    }
    if input.name.is_empty() {
        return Err(Error::not_ready("VIP port name must be provided"));
    }

    let port = ensure(
        client,
        &PortRequest {
            name: input.name.clone(),
            description: input.description.clone(),
            network_id: input.network_id.clone(),
            security_groups: input.security_groups.clone(),
            admin_state_up: false,
            tags: input.tags.clone(),
        },
    )
    .await?;

    port.first_fixed_ip()
        .map(String::from)
        .ok_or_else(|| Error::NoFixedIp { port: port.id.clone() })
}
