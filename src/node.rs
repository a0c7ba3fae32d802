//! Node lifecycle
//!
//! # Boot Sequence (strict order)
//!
//! 1. Create an empty store
//! 2. Recover: replay the WAL, open it for appends, build the state machine
//! 3. Start consensus over the state machine
//! 4. Expose the key-value service
//!
//! Any failure before step 4 aborts boot; a node never serves a partially
//! rebuilt store.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::consensus::{ConsensusAdapter, ConsensusError, LocalConsensus};
use crate::observability::{Event, MetricsRegistry};
use crate::recovery::{RecoveryError, RecoveryManager, RecoveryState, ReplayStats};
use crate::service::KvService;
use crate::store::VersionedStore;

/// Service type served by a booted node
pub type NodeService = KvService<LocalConsensus<VersionedStore>, VersionedStore>;

/// Result type for node lifecycle operations
pub type NodeResult<T> = Result<T, NodeError>;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("recovery failed: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("shutdown failed: {0}")]
    Shutdown(#[from] ConsensusError),
}

impl NodeError {
    pub fn code(&self) -> &'static str {
        match self {
            NodeError::Recovery(e) => e.code(),
            NodeError::Shutdown(e) => e.code(),
        }
    }
}

/// A booted node: store, state machine, consensus and service.
pub struct Node {
    config: Config,
    store: Arc<VersionedStore>,
    service: NodeService,
    metrics: Arc<MetricsRegistry>,
    replay_stats: ReplayStats,
}

impl Node {
    /// Boots a node from its configuration.
    ///
    /// With `bootstrap` the node forms a cluster of one and leads it.
    /// Without it the node starts as a follower with no known leader and
    /// rejects writes until it is promoted.
    pub fn boot(config: &Config, bootstrap: bool) -> NodeResult<Self> {
        info!(event = %Event::BootStart, node_id = %config.node_id, data_dir = %config.data_dir.display(), "booting node");

        let store = Arc::new(VersionedStore::new());
        let metrics = Arc::new(MetricsRegistry::new());

        let RecoveryState {
            state_machine,
            replay_stats,
        } = RecoveryManager::new(&config.data_dir).recover(Arc::clone(&store), Arc::clone(&metrics))?;

        let consensus = LocalConsensus::bootstrap(&config.node_id, config.raft_address(), state_machine);
        if !bootstrap {
            consensus.step_down(None);
        }

        let service = KvService::new(
            Arc::new(consensus),
            Arc::clone(&store),
            config.submit_timeout(),
            Arc::clone(&metrics),
        );

        info!(
            event = %Event::BootComplete,
            node_id = %config.node_id,
            keys = store.len(),
            replayed = replay_stats.records_replayed,
            leader = service.consensus().is_leader(),
            "node ready"
        );

        Ok(Self {
            config: config.clone(),
            store,
            service,
            metrics,
            replay_stats,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &NodeService {
        &self.service
    }

    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn replay_stats(&self) -> &ReplayStats {
        &self.replay_stats
    }

    /// Flushes and releases the WAL.
    pub fn shutdown(self) -> NodeResult<()> {
        info!(event = %Event::ShutdownStart, node_id = %self.config.node_id, "shutting down");

        let consensus = Arc::clone(self.service.consensus());
        drop(self.service);
        // The service held the only other reference
        if let Ok(consensus) = Arc::try_unwrap(consensus) {
            consensus.shutdown()?;
        }

        info!(event = %Event::ShutdownComplete, node_id = %self.config.node_id, "shutdown complete");
        Ok(())
    }
}
