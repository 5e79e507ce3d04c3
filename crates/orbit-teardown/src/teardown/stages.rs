//! Stage executors
//!
//! Each stage lists one resource kind in full, then deletes it. NAT rules,
//! public IP blocks and VLANs are deleted one at a time and the first error
//! aborts the stage; only VLAN deletion is awaited, since NAT rules and IP
//! blocks are gone once the delete is accepted. Servers fan out to one
//! [`ServerWorker`] each and the stage fails if any of them did.

use super::error::{ServerFailure, TeardownError};
use super::events::TeardownEvent;
use super::lister::list_all;
use super::progress::ProgressSink;
use super::server::ServerWorker;
use super::stage::Stage;
use super::waiter::{Transition, await_terminal};
use crate::api::{ApiError, CloudControlApi};
use crate::config::TeardownConfig;
use orbit_common::{ResourceKind, Server};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{info, warn};

/// Shared state for every stage of one run
pub(crate) struct StageContext<C> {
    pub api: Arc<C>,
    pub sink: Arc<dyn ProgressSink>,
    pub config: TeardownConfig,
}

impl<C: CloudControlApi + 'static> StageContext<C> {
    /// Delete every item in order, stopping at the first failure.
    ///
    /// Returns the number of items deleted (or, in dry-run, that would be).
    async fn delete_each<T, D, DFut>(
        &self,
        stage: Stage,
        items: Vec<T>,
        describe: impl Fn(&T) -> (String, String),
        mut delete: D,
    ) -> Result<usize, TeardownError>
    where
        D: FnMut(String) -> DFut,
        DFut: Future<Output = Result<(), TeardownError>>,
    {
        let kind = stage.kind();
        self.sink.emit(TeardownEvent::StageStarted {
            stage,
            count: items.len(),
        });

        for item in &items {
            let (id, description) = describe(item);
            if self.config.dry_run {
                self.sink.emit(TeardownEvent::WouldDelete {
                    kind,
                    id,
                    description,
                });
                continue;
            }

            self.sink.emit(TeardownEvent::Deleting {
                kind,
                id: id.clone(),
                description: description.clone(),
            });
            delete(id.clone()).await?;
            self.sink.emit(TeardownEvent::Deleted {
                kind,
                id,
                description,
            });
        }

        self.sink.emit(TeardownEvent::StageCompleted {
            stage,
            deleted: items.len(),
        });
        Ok(items.len())
    }

    fn rejected(kind: ResourceKind, id: String) -> impl FnOnce(ApiError) -> TeardownError {
        move |source| TeardownError::DeletionRejected { kind, id, source }
    }

    /// Delete every NAT rule in the domain
    pub async fn delete_nat_rules(&self, network_domain_id: &str) -> Result<usize, TeardownError> {
        let api = self.api.as_ref();
        let rules = list_all(ResourceKind::NatRule, self.config.page_size(), |paging| {
            api.list_nat_rules(network_domain_id, paging)
        })
        .await?;

        self.delete_each(
            Stage::NatRules,
            rules,
            |rule| {
                (
                    rule.id.clone(),
                    format!("{} -> {}", rule.external_ip_address, rule.internal_ip_address),
                )
            },
            |id| async move {
                let result = api.delete_nat_rule(&id).await;
                result.map_err(Self::rejected(ResourceKind::NatRule, id))
            },
        )
        .await
    }

    /// Release every public IP block in the domain
    pub async fn delete_public_ip_blocks(
        &self,
        network_domain_id: &str,
    ) -> Result<usize, TeardownError> {
        let api = self.api.as_ref();
        let blocks = list_all(ResourceKind::PublicIpBlock, self.config.page_size(), |paging| {
            api.list_public_ip_blocks(network_domain_id, paging)
        })
        .await?;

        self.delete_each(
            Stage::PublicIpBlocks,
            blocks,
            |block| (block.id.clone(), format!("{}/{}", block.base_ip, block.size)),
            |id| async move {
                let result = api.remove_public_ip_block(&id).await;
                result.map_err(Self::rejected(ResourceKind::PublicIpBlock, id))
            },
        )
        .await
    }

    /// Delete every VLAN in the domain, awaiting each removal
    pub async fn delete_vlans(&self, network_domain_id: &str) -> Result<usize, TeardownError> {
        let api = self.api.as_ref();
        let wait = self.config.wait_config();
        let vlans = list_all(ResourceKind::Vlan, self.config.page_size(), |paging| {
            api.list_vlans(network_domain_id, paging)
        })
        .await?;

        let wait = &wait;
        self.delete_each(
            Stage::Vlans,
            vlans,
            |vlan| (vlan.id.clone(), vlan.name.clone()),
            |id| async move {
                let result = api.delete_vlan(&id).await;
                result.map_err(Self::rejected(ResourceKind::Vlan, id.clone()))?;
                await_terminal(api, ResourceKind::Vlan, &id, Transition::Deleted, wait).await
            },
        )
        .await
    }

    /// Tear down every server in the domain concurrently.
    ///
    /// All workers run to completion; one failing never cancels another.
    /// Outcomes are collected over a channel and inspected after the join.
    pub async fn delete_servers(&self, network_domain_id: &str) -> Result<usize, TeardownError> {
        let api = self.api.as_ref();
        let servers = list_all(ResourceKind::Server, self.config.page_size(), |paging| {
            api.list_servers(network_domain_id, paging)
        })
        .await?;

        let total = servers.len();
        self.sink.emit(TeardownEvent::StageStarted {
            stage: Stage::Servers,
            count: total,
        });

        if self.config.dry_run {
            for server in &servers {
                self.sink.emit(TeardownEvent::WouldDelete {
                    kind: ResourceKind::Server,
                    id: server.id.clone(),
                    description: server.name.clone(),
                });
            }
            self.sink.emit(TeardownEvent::StageCompleted {
                stage: Stage::Servers,
                deleted: total,
            });
            return Ok(total);
        }

        let worker = ServerWorker::new(
            Arc::clone(&self.api),
            Arc::clone(&self.sink),
            self.config.wait_config(),
        );
        let permits = self
            .config
            .max_concurrent_servers()
            .map(|n| Arc::new(Semaphore::new(n)));

        let (tx, mut rx) = mpsc::unbounded_channel::<(Server, Result<(), TeardownError>)>();
        let mut handles = Vec::with_capacity(total);

        for server in servers {
            let worker = worker.clone();
            let permits = permits.clone();
            let tx = tx.clone();
            let identity = (server.id.clone(), server.name.clone());

            let handle = tokio::spawn(async move {
                let _permit = match permits {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let outcome = worker.run(&server).await;
                let _ = tx.send((server, outcome));
            });
            handles.push((identity, handle));
        }
        drop(tx);

        let mut failures = Vec::new();
        let (identities, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let joined = futures::future::join_all(handles).await;
        for ((server_id, server_name), result) in identities.into_iter().zip(joined) {
            if let Err(e) = result {
                failures.push(ServerFailure {
                    server_id,
                    server_name,
                    reason: format!("worker aborted: {e}"),
                });
            }
        }

        while let Some((server, outcome)) = rx.recv().await {
            if let Err(e) = outcome {
                failures.push(ServerFailure {
                    server_id: server.id,
                    server_name: server.name,
                    reason: e.to_string(),
                });
            }
        }

        if !failures.is_empty() {
            for failure in &failures {
                self.sink.emit(TeardownEvent::ServerFailed {
                    server_id: failure.server_id.clone(),
                    server_name: failure.server_name.clone(),
                    reason: failure.reason.clone(),
                });
            }
            warn!(
                network_domain_id = %network_domain_id,
                failed = failures.len(),
                total,
                "Server teardown failed"
            );
            return Err(TeardownError::AggregateFailure {
                domain_id: network_domain_id.to_string(),
                total,
                failures,
            });
        }

        self.sink.emit(TeardownEvent::StageCompleted {
            stage: Stage::Servers,
            deleted: total,
        });
        Ok(total)
    }

    /// Delete the network domain itself
    pub async fn delete_network_domain(&self, network_domain_id: &str) -> Result<(), TeardownError> {
        let kind = ResourceKind::NetworkDomain;
        if self.config.dry_run {
            self.sink.emit(TeardownEvent::WouldDelete {
                kind,
                id: network_domain_id.to_string(),
                description: String::new(),
            });
            return Ok(());
        }

        info!(network_domain_id = %network_domain_id, "Deleting network domain...");
        self.sink.emit(TeardownEvent::Deleting {
            kind,
            id: network_domain_id.to_string(),
            description: String::new(),
        });
        self.api
            .delete_network_domain(network_domain_id)
            .await
            .map_err(Self::rejected(kind, network_domain_id.to_string()))?;
        self.sink.emit(TeardownEvent::Deleted {
            kind,
            id: network_domain_id.to_string(),
            description: String::new(),
        });
        Ok(())
    }
}
