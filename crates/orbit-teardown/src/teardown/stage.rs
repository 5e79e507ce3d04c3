//! Pipeline stages in dependency order

use orbit_common::ResourceKind;

/// One resource kind's list-then-delete unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Stage {
    #[strum(serialize = "NAT rules")]
    NatRules,
    #[strum(serialize = "public IP blocks")]
    PublicIpBlocks,
    #[strum(serialize = "servers")]
    Servers,
    #[strum(serialize = "VLANs")]
    Vlans,
    #[strum(serialize = "network domain")]
    NetworkDomain,
}

impl Stage {
    /// The resource kind this stage deletes
    pub fn kind(self) -> ResourceKind {
        match self {
            Stage::NatRules => ResourceKind::NatRule,
            Stage::PublicIpBlocks => ResourceKind::PublicIpBlock,
            Stage::Servers => ResourceKind::Server,
            Stage::Vlans => ResourceKind::Vlan,
            Stage::NetworkDomain => ResourceKind::NetworkDomain,
        }
    }
}
