//! Inventory views of the resources inside a network domain
//!
//! These are read-only snapshots as returned by the listing endpoints. The
//! teardown never mutates them; it only issues commands by id.

use serde::{Deserialize, Serialize};

/// A network domain, the root of the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDomain {
    pub id: String,
    pub name: String,
    pub datacenter_id: String,
}

/// A NAT rule mapping a public address to an internal one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatRule {
    pub id: String,
    pub external_ip_address: String,
    pub internal_ip_address: String,
    pub network_domain_id: String,
}

/// A block of public IPv4 addresses reserved for the domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpBlock {
    pub id: String,
    pub base_ip: String,
    pub size: u32,
    pub network_domain_id: String,
}

/// A virtual server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub name: String,
    /// Whether the server is powered on
    pub started: bool,
    pub network_domain_id: String,
}

/// A VLAN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    pub id: String,
    pub name: String,
    pub network_domain_id: String,
}
