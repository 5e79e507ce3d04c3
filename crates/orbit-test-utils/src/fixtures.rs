//! Inventory fixtures
//!
//! Small constructors for inventory records with predictable field values.

use orbit_common::{NatRule, NetworkDomain, PublicIpBlock, Server, Vlan};

/// Default datacenter used by fixtures
pub const TEST_DATACENTER: &str = "NA9";

/// A network domain named after its id
pub fn network_domain(id: &str) -> NetworkDomain {
    NetworkDomain {
        id: id.to_string(),
        name: format!("{id}-name"),
        datacenter_id: TEST_DATACENTER.to_string(),
    }
}

/// A NAT rule whose addresses are derived from `n`
pub fn nat_rule(domain_id: &str, n: usize) -> NatRule {
    NatRule {
        id: format!("nat-{n}"),
        external_ip_address: format!("203.0.113.{}", n % 250 + 1),
        internal_ip_address: format!("10.0.0.{}", n % 250 + 1),
        network_domain_id: domain_id.to_string(),
    }
}

/// A public IP block of two addresses
pub fn public_ip_block(domain_id: &str, n: usize) -> PublicIpBlock {
    PublicIpBlock {
        id: format!("ipb-{n}"),
        base_ip: format!("198.51.100.{}", (n * 2) % 250),
        size: 2,
        network_domain_id: domain_id.to_string(),
    }
}

/// A server, running or stopped
pub fn server(domain_id: &str, n: usize, started: bool) -> Server {
    Server {
        id: format!("srv-{n}"),
        name: format!("server-{n:02}"),
        started,
        network_domain_id: domain_id.to_string(),
    }
}

/// A VLAN
pub fn vlan(domain_id: &str, n: usize) -> Vlan {
    Vlan {
        id: format!("vlan-{n}"),
        name: format!("vlan-{n:02}"),
        network_domain_id: domain_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_ids_are_distinct() {
        assert_ne!(nat_rule("nd", 1).id, nat_rule("nd", 2).id);
        assert_eq!(server("nd", 3, true).id, "srv-3");
        assert!(server("nd", 3, true).started);
        assert_eq!(vlan("nd", 7).network_domain_id, "nd");
    }
}
