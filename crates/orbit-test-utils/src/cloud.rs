//! In-memory CloudControl
//!
//! [`FakeCloud`] implements [`CloudControlApi`] over an in-memory inventory
//! and journals every call, so tests can assert on ordering. It enforces the
//! provider's dependency rules (a started server cannot be deleted, a VLAN
//! cannot be deleted while servers exist, ...) and simulates eventual
//! consistency: asynchronous operations stay pending for a few polls before
//! they settle.

use orbit_common::{
    LifecycleState, NatRule, NetworkDomain, Page, Paging, PublicIpBlock, ResourceKind,
    ResourceStatus, Server, Vlan,
};
use orbit_teardown::api::{ApiError, ApiResult, CloudControlApi, classify_api_error};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One recorded API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { kind: ResourceKind, page: u32 },
    Delete { kind: ResourceKind, id: String },
    PowerOff { id: String },
    Poll { kind: ResourceKind, id: String },
    Lookup { name: String },
}

/// A resource with an asynchronous lifecycle
#[derive(Debug, Clone)]
struct Tracked<T> {
    record: T,
    state: LifecycleState,
    /// Polls left before a pending operation settles
    polls_left: u32,
}

impl<T> Tracked<T> {
    fn new(record: T) -> Self {
        Self {
            record,
            state: LifecycleState::Normal,
            polls_left: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Inventory {
    domains: Vec<NetworkDomain>,
    nat_rules: Vec<NatRule>,
    ip_blocks: Vec<PublicIpBlock>,
    servers: Vec<Tracked<Server>>,
    vlans: Vec<Tracked<Vlan>>,
    /// Most servers ever seen mid-operation at once
    peak_pending_servers: usize,
}

impl Inventory {
    fn note_pending_servers(&mut self) {
        let pending = self.servers.iter().filter(|s| s.state.is_pending()).count();
        self.peak_pending_servers = self.peak_pending_servers.max(pending);
    }
}

#[derive(Debug, Default)]
struct Faults {
    listing: HashSet<(ResourceKind, u32)>,
    power_off: HashSet<String>,
    delete: HashSet<String>,
    stuck: HashSet<String>,
    failed_state: HashMap<String, String>,
    lookup: bool,
}

/// In-memory CloudControl for tests
#[derive(Debug)]
pub struct FakeCloud {
    inventory: Mutex<Inventory>,
    faults: Mutex<Faults>,
    journal: Mutex<Vec<Call>>,
    server_deletes_in_flight: AtomicUsize,
    peak_server_deletes: AtomicUsize,
    settle_polls: u32,
    latency: Duration,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn page_of<T: Clone>(items: Vec<T>, paging: Paging) -> Page<T> {
    let size = paging.page_size as usize;
    let start = (paging.page_number.saturating_sub(1) as usize).saturating_mul(size);
    let items = items.into_iter().skip(start).take(size).collect();
    Page::new(items, paging)
}

fn api_error(code: &str, message: String) -> ApiError {
    classify_api_error(Some(code), Some(&message))
}

impl FakeCloud {
    /// Empty cloud; pending operations settle after two polls
    pub fn new() -> Self {
        Self {
            inventory: Mutex::default(),
            faults: Mutex::default(),
            journal: Mutex::default(),
            server_deletes_in_flight: AtomicUsize::new(0),
            peak_server_deletes: AtomicUsize::new(0),
            settle_polls: 2,
            latency: Duration::from_millis(10),
        }
    }

    /// Number of polls a pending operation takes to settle
    pub fn with_settle_polls(mut self, polls: u32) -> Self {
        self.settle_polls = polls;
        self
    }

    /// Simulated latency of every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// A cloud holding one domain with the given number of each resource.
    ///
    /// Servers alternate between started (even) and stopped (odd).
    pub fn populated(
        domain_id: &str,
        nat_rules: usize,
        ip_blocks: usize,
        servers: usize,
        vlans: usize,
    ) -> Self {
        use crate::fixtures;

        let cloud = Self::new();
        cloud.add_network_domain(fixtures::network_domain(domain_id));
        for n in 0..nat_rules {
            cloud.add_nat_rule(fixtures::nat_rule(domain_id, n));
        }
        for n in 0..ip_blocks {
            cloud.add_public_ip_block(fixtures::public_ip_block(domain_id, n));
        }
        for n in 0..servers {
            cloud.add_server(fixtures::server(domain_id, n, n % 2 == 0));
        }
        for n in 0..vlans {
            cloud.add_vlan(fixtures::vlan(domain_id, n));
        }
        cloud
    }

    // ── Inventory ───────────────────────────────────────────────────────

    pub fn add_network_domain(&self, domain: NetworkDomain) {
        lock(&self.inventory).domains.push(domain);
    }

    pub fn add_nat_rule(&self, rule: NatRule) {
        lock(&self.inventory).nat_rules.push(rule);
    }

    pub fn add_public_ip_block(&self, block: PublicIpBlock) {
        lock(&self.inventory).ip_blocks.push(block);
    }

    pub fn add_server(&self, server: Server) {
        lock(&self.inventory).servers.push(Tracked::new(server));
    }

    pub fn add_vlan(&self, vlan: Vlan) {
        lock(&self.inventory).vlans.push(Tracked::new(vlan));
    }

    /// Whether a network domain still exists
    pub fn has_network_domain(&self, id: &str) -> bool {
        lock(&self.inventory).domains.iter().any(|d| d.id == id)
    }

    /// Number of resources of `kind` still present
    pub fn remaining(&self, kind: ResourceKind) -> usize {
        let inventory = lock(&self.inventory);
        match kind {
            ResourceKind::NatRule => inventory.nat_rules.len(),
            ResourceKind::PublicIpBlock => inventory.ip_blocks.len(),
            ResourceKind::Server => inventory.servers.len(),
            ResourceKind::Vlan => inventory.vlans.len(),
            ResourceKind::NetworkDomain => inventory.domains.len(),
        }
    }

    // ── Faults ──────────────────────────────────────────────────────────

    /// Fail listing of `kind` at `page` with a transport error
    pub fn fail_listing(&self, kind: ResourceKind, page: u32) {
        lock(&self.faults).listing.insert((kind, page));
    }

    /// Reject power-off requests for a server
    pub fn reject_power_off(&self, server_id: &str) {
        lock(&self.faults).power_off.insert(server_id.to_string());
    }

    /// Reject delete requests for a resource
    pub fn reject_delete(&self, resource_id: &str) {
        lock(&self.faults).delete.insert(resource_id.to_string());
    }

    /// Keep a resource's pending operation from ever settling
    pub fn stick(&self, resource_id: &str) {
        lock(&self.faults).stuck.insert(resource_id.to_string());
    }

    /// Make a resource's pending operation settle into a failure state
    pub fn fail_state(&self, resource_id: &str, state: &str) {
        lock(&self.faults)
            .failed_state
            .insert(resource_id.to_string(), state.to_string());
    }

    /// Fail network domain lookups with a transport error
    pub fn fail_lookup(&self) {
        lock(&self.faults).lookup = true;
    }

    /// Drop every scripted fault
    pub fn clear_faults(&self) {
        *lock(&self.faults) = Faults::default();
    }

    // ── Journal ─────────────────────────────────────────────────────────

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.journal).clone()
    }

    /// Delete calls in order, as `(kind, id)`
    pub fn deletes(&self) -> Vec<(ResourceKind, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete { kind, id } => Some((kind, id)),
                _ => None,
            })
            .collect()
    }

    /// Ids of servers a power-off was issued for, in order
    pub fn power_offs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PowerOff { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Listing requests for one kind, as page numbers
    pub fn list_requests(&self, kind: ResourceKind) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List { kind: k, page } if k == kind => Some(page),
                _ => None,
            })
            .collect()
    }

    /// Most servers that were powering off or deleting at the same time
    pub fn peak_pending_servers(&self) -> usize {
        lock(&self.inventory).peak_pending_servers
    }

    /// Most server delete requests that were in flight at the same time
    pub fn peak_concurrent_server_deletes(&self) -> usize {
        self.peak_server_deletes.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        lock(&self.journal).push(call);
    }

    async fn latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn check_listing(&self, kind: ResourceKind, paging: Paging) -> ApiResult<()> {
        self.record(Call::List {
            kind,
            page: paging.page_number,
        });
        if lock(&self.faults)
            .listing
            .contains(&(kind, paging.page_number))
        {
            return Err(ApiError::transport(anyhow::anyhow!(
                "connection reset while listing page {}",
                paging.page_number
            )));
        }
        Ok(())
    }

    fn check_delete(&self, kind: ResourceKind, id: &str) -> ApiResult<()> {
        self.record(Call::Delete {
            kind,
            id: id.to_string(),
        });
        if lock(&self.faults).delete.contains(id) {
            return Err(api_error("RESOURCE_BUSY", format!("{kind} '{id}' is busy")));
        }
        Ok(())
    }

    fn issue_server_delete(&self, server_id: &str) -> ApiResult<()> {
        self.check_delete(ResourceKind::Server, server_id)?;
        let mut inventory = lock(&self.inventory);
        let Some(index) = inventory.servers.iter().position(|s| s.record.id == server_id) else {
            return Err(api_error("RESOURCE_NOT_FOUND", format!("server '{server_id}'")));
        };
        let tracked = &inventory.servers[index];
        if tracked.record.started || tracked.state.is_pending() {
            return Err(api_error(
                "RESOURCE_BUSY",
                format!("server '{server_id}' must be stopped before deletion"),
            ));
        }
        self.begin(&mut inventory.servers[index], LifecycleState::PendingDelete);
        inventory.note_pending_servers();
        Ok(())
    }

    /// Start a pending operation on a tracked resource
    fn begin<T>(&self, tracked: &mut Tracked<T>, state: LifecycleState) {
        tracked.state = state;
        tracked.polls_left = self.settle_polls;
    }

    /// Advance a tracked resource by one poll; `true` once a pending delete settles
    fn advance<T>(&self, tracked: &mut Tracked<T>, id: &str, faults: &Faults) -> bool {
        if !tracked.state.is_pending() || faults.stuck.contains(id) {
            return false;
        }
        if tracked.polls_left > 0 {
            tracked.polls_left -= 1;
            return false;
        }
        if let Some(failure) = faults.failed_state.get(id) {
            tracked.state = LifecycleState::Other(failure.clone());
            return false;
        }
        let deleted = tracked.state == LifecycleState::PendingDelete;
        tracked.state = LifecycleState::Normal;
        deleted
    }
}

impl CloudControlApi for FakeCloud {
    async fn list_nat_rules(
        &self,
        network_domain_id: &str,
        paging: Paging,
    ) -> ApiResult<Page<NatRule>> {
        self.latency().await;
        self.check_listing(ResourceKind::NatRule, paging)?;
        let items = lock(&self.inventory)
            .nat_rules
            .iter()
            .filter(|r| r.network_domain_id == network_domain_id)
            .cloned()
            .collect();
        Ok(page_of(items, paging))
    }

    async fn list_public_ip_blocks(
        &self,
        network_domain_id: &str,
        paging: Paging,
    ) -> ApiResult<Page<PublicIpBlock>> {
        self.latency().await;
        self.check_listing(ResourceKind::PublicIpBlock, paging)?;
        let items = lock(&self.inventory)
            .ip_blocks
            .iter()
            .filter(|b| b.network_domain_id == network_domain_id)
            .cloned()
            .collect();
        Ok(page_of(items, paging))
    }

    async fn list_servers(
        &self,
        network_domain_id: &str,
        paging: Paging,
    ) -> ApiResult<Page<Server>> {
        self.latency().await;
        self.check_listing(ResourceKind::Server, paging)?;
        let items = lock(&self.inventory)
            .servers
            .iter()
            .filter(|s| s.record.network_domain_id == network_domain_id)
            .map(|s| s.record.clone())
            .collect();
        Ok(page_of(items, paging))
    }

    async fn list_vlans(&self, network_domain_id: &str, paging: Paging) -> ApiResult<Page<Vlan>> {
        self.latency().await;
        self.check_listing(ResourceKind::Vlan, paging)?;
        let items = lock(&self.inventory)
            .vlans
            .iter()
            .filter(|v| v.record.network_domain_id == network_domain_id)
            .map(|v| v.record.clone())
            .collect();
        Ok(page_of(items, paging))
    }

    async fn delete_nat_rule(&self, nat_rule_id: &str) -> ApiResult<()> {
        self.latency().await;
        self.check_delete(ResourceKind::NatRule, nat_rule_id)?;
        let mut inventory = lock(&self.inventory);
        let before = inventory.nat_rules.len();
        inventory.nat_rules.retain(|r| r.id != nat_rule_id);
        if inventory.nat_rules.len() == before {
            return Err(api_error("RESOURCE_NOT_FOUND", format!("NAT rule '{nat_rule_id}'")));
        }
        Ok(())
    }

    async fn remove_public_ip_block(&self, block_id: &str) -> ApiResult<()> {
        self.latency().await;
        self.check_delete(ResourceKind::PublicIpBlock, block_id)?;
        let mut inventory = lock(&self.inventory);
        let Some(block) = inventory.ip_blocks.iter().find(|b| b.id == block_id).cloned() else {
            return Err(api_error("RESOURCE_NOT_FOUND", format!("IP block '{block_id}'")));
        };
        if inventory
            .nat_rules
            .iter()
            .any(|r| r.network_domain_id == block.network_domain_id)
        {
            return Err(api_error(
                "HAS_DEPENDENCY",
                format!("IP block '{block_id}' is referenced by NAT rules"),
            ));
        }
        inventory.ip_blocks.retain(|b| b.id != block_id);
        Ok(())
    }

    async fn delete_server(&self, server_id: &str) -> ApiResult<()> {
        let in_flight = self.server_deletes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_server_deletes.fetch_max(in_flight, Ordering::SeqCst);
        self.latency().await;
        let result = self.issue_server_delete(server_id);
        self.server_deletes_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn power_off_server(&self, server_id: &str) -> ApiResult<()> {
        self.latency().await;
        self.record(Call::PowerOff {
            id: server_id.to_string(),
        });
        if lock(&self.faults).power_off.contains(server_id) {
            return Err(api_error(
                "RESOURCE_BUSY",
                format!("server '{server_id}' refused power-off"),
            ));
        }
        let mut inventory = lock(&self.inventory);
        let Some(tracked) = inventory.servers.iter_mut().find(|s| s.record.id == server_id) else {
            return Err(api_error("RESOURCE_NOT_FOUND", format!("server '{server_id}'")));
        };
        self.begin(tracked, LifecycleState::PendingChange);
        inventory.note_pending_servers();
        Ok(())
    }

    async fn delete_vlan(&self, vlan_id: &str) -> ApiResult<()> {
        self.latency().await;
        self.check_delete(ResourceKind::Vlan, vlan_id)?;
        let mut inventory = lock(&self.inventory);
        let Some(index) = inventory.vlans.iter().position(|v| v.record.id == vlan_id) else {
            return Err(api_error("RESOURCE_NOT_FOUND", format!("VLAN '{vlan_id}'")));
        };
        let domain_id = inventory.vlans[index].record.network_domain_id.clone();
        if inventory
            .servers
            .iter()
            .any(|s| s.record.network_domain_id == domain_id)
        {
            return Err(api_error(
                "HAS_DEPENDENCY",
                format!("VLAN '{vlan_id}' still has servers attached"),
            ));
        }
        self.begin(&mut inventory.vlans[index], LifecycleState::PendingDelete);
        Ok(())
    }

    async fn delete_network_domain(&self, network_domain_id: &str) -> ApiResult<()> {
        self.latency().await;
        self.check_delete(ResourceKind::NetworkDomain, network_domain_id)?;
        let mut inventory = lock(&self.inventory);
        let in_use = inventory
            .nat_rules
            .iter()
            .any(|r| r.network_domain_id == network_domain_id)
            || inventory
                .ip_blocks
                .iter()
                .any(|b| b.network_domain_id == network_domain_id)
            || inventory
                .servers
                .iter()
                .any(|s| s.record.network_domain_id == network_domain_id)
            || inventory
                .vlans
                .iter()
                .any(|v| v.record.network_domain_id == network_domain_id);
        if in_use {
            return Err(api_error(
                "HAS_DEPENDENCY",
                format!("network domain '{network_domain_id}' is not empty"),
            ));
        }
        let before = inventory.domains.len();
        inventory.domains.retain(|d| d.id != network_domain_id);
        if inventory.domains.len() == before {
            return Err(api_error(
                "RESOURCE_NOT_FOUND",
                format!("network domain '{network_domain_id}'"),
            ));
        }
        Ok(())
    }

    async fn get_resource(
        &self,
        kind: ResourceKind,
        resource_id: &str,
    ) -> ApiResult<Option<ResourceStatus>> {
        self.latency().await;
        self.record(Call::Poll {
            kind,
            id: resource_id.to_string(),
        });
        let faults = lock(&self.faults);
        let mut inventory = lock(&self.inventory);

        match kind {
            ResourceKind::Server => {
                let Some(index) = inventory
                    .servers
                    .iter()
                    .position(|s| s.record.id == resource_id)
                else {
                    return Ok(None);
                };
                let tracked = &mut inventory.servers[index];
                let was_changing = tracked.state == LifecycleState::PendingChange;
                if self.advance(tracked, resource_id, &faults) {
                    inventory.servers.remove(index);
                    return Ok(None);
                }
                if was_changing && tracked.state == LifecycleState::Normal {
                    tracked.record.started = false;
                }
                Ok(Some(ResourceStatus::server(
                    tracked.state.clone(),
                    tracked.record.started,
                )))
            }
            ResourceKind::Vlan => {
                let Some(index) = inventory
                    .vlans
                    .iter()
                    .position(|v| v.record.id == resource_id)
                else {
                    return Ok(None);
                };
                if self.advance(&mut inventory.vlans[index], resource_id, &faults) {
                    inventory.vlans.remove(index);
                    return Ok(None);
                }
                Ok(Some(ResourceStatus::new(inventory.vlans[index].state.clone())))
            }
            ResourceKind::NatRule => Ok(inventory
                .nat_rules
                .iter()
                .any(|r| r.id == resource_id)
                .then(|| ResourceStatus::new(LifecycleState::Normal))),
            ResourceKind::PublicIpBlock => Ok(inventory
                .ip_blocks
                .iter()
                .any(|b| b.id == resource_id)
                .then(|| ResourceStatus::new(LifecycleState::Normal))),
            ResourceKind::NetworkDomain => Ok(inventory
                .domains
                .iter()
                .any(|d| d.id == resource_id)
                .then(|| ResourceStatus::new(LifecycleState::Normal))),
        }
    }

    async fn get_network_domain_by_name(
        &self,
        name: &str,
        datacenter_id: &str,
    ) -> ApiResult<Option<NetworkDomain>> {
        self.latency().await;
        self.record(Call::Lookup {
            name: name.to_string(),
        });
        if lock(&self.faults).lookup {
            return Err(ApiError::transport(anyhow::anyhow!("lookup timed out")));
        }
        Ok(lock(&self.inventory)
            .domains
            .iter()
            .find(|d| d.name == name && d.datacenter_id == datacenter_id)
            .cloned())
    }
}
