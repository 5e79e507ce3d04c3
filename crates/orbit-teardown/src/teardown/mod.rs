//! Teardown pipeline
//!
//! Runs the stages in dependency order, strictly one after another:
//!
//! 1. NAT rules
//! 2. Public IP blocks
//! 3. Servers (concurrently, one worker per server)
//! 4. VLANs (each removal awaited)
//! 5. The network domain itself
//!
//! The first failing stage ends the run; later stages never start and
//! nothing already deleted is restored. A re-run simply lists again and
//! deletes whatever is left.

pub mod error;
pub mod events;
pub mod lister;
pub mod progress;
pub mod resolve;
pub mod server;
pub mod stage;
pub mod stages;
pub mod waiter;

pub use error::{ServerFailure, TeardownError};
pub use events::TeardownEvent;
pub use progress::{ChannelSink, LogSink, NullSink, ProgressSink};
pub use resolve::resolve_network_domain;
pub use stage::Stage;
pub use waiter::{Transition, await_terminal};

use crate::api::CloudControlApi;
use crate::config::TeardownConfig;
use stages::StageContext;
use std::sync::Arc;
use tracing::{debug, info};

/// Counts of what a successful run removed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub nat_rules: usize,
    pub public_ip_blocks: usize,
    pub servers: usize,
    pub vlans: usize,
    /// Whether the network domain delete was issued
    pub network_domain_deleted: bool,
    /// Counts are of resources that would have been deleted
    pub dry_run: bool,
}

impl TeardownReport {
    /// Total resources removed below the network domain
    pub fn total(&self) -> usize {
        self.nat_rules + self.public_ip_blocks + self.servers + self.vlans
    }
}

/// Orchestrates the teardown of network domains through a CloudControl client
pub struct Teardown<C> {
    ctx: StageContext<C>,
}

impl<C: CloudControlApi + 'static> Teardown<C> {
    /// Create a teardown that reports progress through tracing
    pub fn new(api: Arc<C>, config: TeardownConfig) -> Self {
        Self::with_sink(api, config, Arc::new(LogSink::new()))
    }

    /// Create a teardown that reports progress to `sink`
    pub fn with_sink(api: Arc<C>, config: TeardownConfig, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            ctx: StageContext { api, sink, config },
        }
    }

    /// The configuration this teardown runs with
    pub fn config(&self) -> &TeardownConfig {
        &self.ctx.config
    }

    /// Delete every resource in the network domain, then the domain.
    ///
    /// # Errors
    /// The first stage failure, wrapped in [`TeardownError::Stage`].
    pub async fn teardown(&self, network_domain_id: &str) -> Result<TeardownReport, TeardownError> {
        let ctx = &self.ctx;
        debug!(
            network_domain_id = %network_domain_id,
            config = ?ctx.config,
            "Starting teardown"
        );
        ctx.sink.emit(TeardownEvent::Started {
            network_domain_id: network_domain_id.to_string(),
        });

        let mut report = TeardownReport {
            dry_run: ctx.config.dry_run,
            ..Default::default()
        };

        report.nat_rules = ctx
            .delete_nat_rules(network_domain_id)
            .await
            .map_err(|e| e.in_stage(Stage::NatRules))?;

        report.public_ip_blocks = ctx
            .delete_public_ip_blocks(network_domain_id)
            .await
            .map_err(|e| e.in_stage(Stage::PublicIpBlocks))?;

        report.servers = ctx
            .delete_servers(network_domain_id)
            .await
            .map_err(|e| e.in_stage(Stage::Servers))?;

        // TODO: Tear down VIP nodes, VIP pools and virtual listeners here once
        // the client exposes them; VLANs cannot go while they reference it.

        report.vlans = ctx
            .delete_vlans(network_domain_id)
            .await
            .map_err(|e| e.in_stage(Stage::Vlans))?;

        ctx.delete_network_domain(network_domain_id)
            .await
            .map_err(|e| e.in_stage(Stage::NetworkDomain))?;
        report.network_domain_deleted = !ctx.config.dry_run;

        info!(
            network_domain_id = %network_domain_id,
            deleted = report.total(),
            dry_run = report.dry_run,
            "Teardown finished"
        );
        if !ctx.config.dry_run {
            ctx.sink.emit(TeardownEvent::Completed {
                network_domain_id: network_domain_id.to_string(),
            });
        }

        Ok(report)
    }
}
