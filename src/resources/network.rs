//! Networking resources: networks, subnets, floating IPs, internet gateways.

use crate::lifecycle::lifecycle_state;
use crate::resources::resource;
use serde::{Deserialize, Serialize};

lifecycle_state! {
    NetworkState {
        Unknown => "unknown",
        Pending => "pending",
        Available => "available",
        Down => "down",
        Error => "error",
    }
    ready: [Available],
    terminal: [Error],
    gone: [Unknown],
}

lifecycle_state! {
    SubnetState {
        Unknown => "unknown",
        Pending => "pending",
        Available => "available",
        Down => "down",
        Error => "error",
    }
    ready: [Available],
    terminal: [Error],
    gone: [Unknown],
}

lifecycle_state! {
    FloatingIpState {
        Unknown => "unknown",
        Available => "available",
        InUse => "in_use",
        Error => "error",
    }
    ready: [Available, InUse],
    terminal: [Error],
    gone: [Unknown],
}

lifecycle_state! {
    GatewayState {
        Unknown => "unknown",
        Configuring => "configuring",
        Available => "available",
        Error => "error",
    }
    ready: [Available],
    terminal: [Error],
    gone: [Unknown],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub label: Option<String>,
    pub state: NetworkState,
    pub cidr_block: String,
    /// Whether the network is provider-managed and routes to the internet.
    pub external: bool,
}

resource!(Network, labeled, state: NetworkState);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub label: Option<String>,
    pub state: SubnetState,
    pub network_id: String,
    pub cidr_block: String,
    pub zone: Option<String>,
}

resource!(Subnet, labeled, state: SubnetState);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    pub public_ip: String,
    /// Private address the floating IP currently maps to.
    pub private_ip: Option<String>,
    pub state: FloatingIpState,
    pub gateway_id: String,
}

impl crate::pagination::Identified for FloatingIp {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.public_ip
    }
}

impl crate::resources::CloudResource for FloatingIp {}

impl crate::lifecycle::StatefulResource for FloatingIp {
    type State = FloatingIpState;

    fn state(&self) -> FloatingIpState {
        self.state
    }

    fn set_state(&mut self, state: FloatingIpState) {
        self.state = state;
    }
}

impl FloatingIp {
    #[must_use]
    pub const fn in_use(&self) -> bool {
        self.private_ip.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetGateway {
    pub id: String,
    pub name: String,
    pub state: GatewayState,
    pub network_id: Option<String>,
}

resource!(InternetGateway, named, state: GatewayState);
