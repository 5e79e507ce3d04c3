//! CloudControl resource kinds and teardown ordering
//!
//! Provides the teardown priority shared by every stage of the pipeline.
//! Resources must be deleted in dependency order to avoid "resource in use"
//! failures from the provider.

/// Kinds of resource that live inside a network domain
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum ResourceKind {
    /// NAT rule (references public addresses)
    #[strum(serialize = "NAT rule")]
    NatRule,
    /// Public IP block
    #[strum(serialize = "public IP block")]
    PublicIpBlock,
    /// Virtual server (must be stopped before it can be deleted)
    #[strum(serialize = "server")]
    Server,
    /// VLAN (cannot be deleted while servers are attached to it)
    #[strum(serialize = "VLAN")]
    Vlan,
    /// The network domain itself (root of the dependency graph)
    #[strum(serialize = "network domain")]
    NetworkDomain,
}

impl ResourceKind {
    /// Get teardown priority (lower number = delete first)
    ///
    /// - 0: NAT rules (they reference public IPs)
    /// - 1: Public IP blocks
    /// - 2: Servers (must be stopped first)
    /// - 3: VLANs (servers must be gone)
    /// - 4: Network domain (everything else must be gone)
    pub fn teardown_priority(self) -> u8 {
        match self {
            ResourceKind::NatRule => 0,
            ResourceKind::PublicIpBlock => 1,
            ResourceKind::Server => 2,
            ResourceKind::Vlan => 3,
            ResourceKind::NetworkDomain => 4,
        }
    }

    /// Whether deletion of this kind is asynchronous and must be awaited.
    ///
    /// NAT rules and public IP blocks are gone once the delete is accepted.
    pub fn has_async_delete(self) -> bool {
        matches!(self, ResourceKind::Server | ResourceKind::Vlan)
    }

    /// Resource type name as used by the CloudControl API
    pub fn api_name(self) -> &'static str {
        match self {
            ResourceKind::NatRule => "natRule",
            ResourceKind::PublicIpBlock => "publicIpBlock",
            ResourceKind::Server => "server",
            ResourceKind::Vlan => "vlan",
            ResourceKind::NetworkDomain => "networkDomain",
        }
    }
}
