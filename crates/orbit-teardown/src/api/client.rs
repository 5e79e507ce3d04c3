//! CloudControl operations trait
//!
//! The teardown core never talks HTTP itself. Everything it needs from the
//! provider goes through this trait, so orchestration logic can be tested
//! against an in-memory inventory.

use super::error::ApiError;
use orbit_common::{
    NatRule, NetworkDomain, Page, Paging, PublicIpBlock, ResourceKind, ResourceStatus, Server,
    Vlan,
};
use std::future::Future;

/// Result type for CloudControl operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the teardown needs from a CloudControl client.
///
/// Implementations must tolerate concurrent calls for distinct resource ids;
/// the server stage issues power-off, delete and state polls from many tasks
/// at once.
pub trait CloudControlApi: Send + Sync {
    /// List one page of NAT rules in a network domain
    fn list_nat_rules(
        &self,
        network_domain_id: &str,
        paging: Paging,
    ) -> impl Future<Output = ApiResult<Page<NatRule>>> + Send;

    /// List one page of public IP blocks in a network domain
    fn list_public_ip_blocks(
        &self,
        network_domain_id: &str,
        paging: Paging,
    ) -> impl Future<Output = ApiResult<Page<PublicIpBlock>>> + Send;

    /// List one page of servers in a network domain
    fn list_servers(
        &self,
        network_domain_id: &str,
        paging: Paging,
    ) -> impl Future<Output = ApiResult<Page<Server>>> + Send;

    /// List one page of VLANs in a network domain
    fn list_vlans(
        &self,
        network_domain_id: &str,
        paging: Paging,
    ) -> impl Future<Output = ApiResult<Page<Vlan>>> + Send;

    /// Delete a NAT rule (synchronous)
    fn delete_nat_rule(&self, nat_rule_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Release a public IP block (synchronous)
    fn remove_public_ip_block(
        &self,
        block_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Request deletion of a server (completes asynchronously)
    fn delete_server(&self, server_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Request a hard power-off of a server (completes asynchronously)
    fn power_off_server(&self, server_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Request deletion of a VLAN (completes asynchronously)
    fn delete_vlan(&self, vlan_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Delete a network domain
    fn delete_network_domain(
        &self,
        network_domain_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Observe a resource's lifecycle state once.
    ///
    /// Returns `Ok(None)` once the resource no longer exists.
    fn get_resource(
        &self,
        kind: ResourceKind,
        resource_id: &str,
    ) -> impl Future<Output = ApiResult<Option<ResourceStatus>>> + Send;

    /// Find a network domain by name within a datacenter
    fn get_network_domain_by_name(
        &self,
        name: &str,
        datacenter_id: &str,
    ) -> impl Future<Output = ApiResult<Option<NetworkDomain>>> + Send;
}
