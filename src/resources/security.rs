//! Security resources: key pairs and VM firewalls.

use crate::resources::resource;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub id: String,
    pub name: String,
    /// Private key material. Only present on the value returned by a `create`
    /// call that generated the key; providers never return it again.
    pub material: Option<String>,
    pub fingerprint: Option<String>,
}

resource!(KeyPair, named);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    All,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::All => "all",
        })
    }
}

/// One rule of a [`VmFirewall`]. Either `cidr` or `src_firewall_id` names the peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    pub direction: Direction,
    pub protocol: Protocol,
    pub from_port: Option<u16>,
    pub to_port: Option<u16>,
    pub cidr: Option<String>,
    pub src_firewall_id: Option<String>,
}

impl FirewallRule {
    /// Whether `other` describes the same traffic, ignoring the rule id.
    #[must_use]
    pub fn same_traffic(&self, other: &RuleSpec) -> bool {
        self.direction == other.direction
            && self.protocol == other.protocol
            && self.from_port == other.from_port
            && self.to_port == other.to_port
            && self.cidr == other.cidr
            && self.src_firewall_id == other.src_firewall_id
    }
}

/// Parameters for a new firewall rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub direction: Direction,
    pub protocol: Protocol,
    pub from_port: Option<u16>,
    pub to_port: Option<u16>,
    pub cidr: Option<String>,
    pub src_firewall_id: Option<String>,
}

impl RuleSpec {
    /// Inbound traffic on a port range from a CIDR block.
    pub fn inbound(protocol: Protocol, from_port: u16, to_port: u16, cidr: impl Into<String>) -> Self {
        Self {
            direction: Direction::Inbound,
            protocol,
            from_port: Some(from_port),
            to_port: Some(to_port),
            cidr: Some(cidr.into()),
            src_firewall_id: None,
        }
    }

    /// All inbound traffic from members of another firewall.
    pub fn from_firewall(firewall_id: impl Into<String>) -> Self {
        Self {
            direction: Direction::Inbound,
            protocol: Protocol::All,
            from_port: None,
            to_port: None,
            cidr: None,
            src_firewall_id: Some(firewall_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmFirewall {
    pub id: String,
    pub name: String,
    pub label: Option<String>,
    pub network_id: String,
    pub description: Option<String>,
    pub rules: Vec<FirewallRule>,
}

resource!(VmFirewall, labeled);
