//! Bot composition and event loop.
//!
//! The [`Node`] owns the [`Service`] and feeds it inbound events one at a
//! time from an `mpsc` channel. There is no other writer, so user records
//! need no locking.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, info_span, Instrument};

use tally_core::error::StoreError;
use tally_core::event::InboundEvent;
use tally_core::registry::Registry;
use tally_core::service::Service;
use tally_core::traits::{LedgerStore, MembershipOracle, Transport};

use crate::config::NodeConfig;
use crate::storage::RocksLedger;

pub struct Node {
    service: Service,
}

impl Node {
    /// Open the RocksDB ledger under `config.data_dir` and load all users.
    pub fn open(
        config: &NodeConfig,
        oracle: Arc<dyn MembershipOracle>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, StoreError> {
        let store = Arc::new(RocksLedger::open(config.db_path())?);
        Self::with_store(store, config, oracle, transport)
    }

    /// Build a node over any ledger store.
    pub fn with_store(
        store: Arc<dyn LedgerStore>,
        config: &NodeConfig,
        oracle: Arc<dyn MembershipOracle>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, StoreError> {
        let registry = Registry::load(store, config.persist_attempts)?;
        info!(users = registry.len(), "ledger loaded");
        let service = Service::new(
            registry,
            config.settings(),
            oracle,
            transport,
            config.service_config(),
        );
        Ok(Self { service })
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Handle one event. Errors are logged; the loop keeps going.
    pub async fn process(&mut self, event: InboundEvent) {
        let user = event.sender().id;
        let span = info_span!("event", %user);
        if let Err(e) = self.service.handle(event).instrument(span).await {
            error!(%user, error = %e, "event handling failed");
        }
    }

    /// Process events until every sender is dropped.
    pub async fn run(&mut self, mut events: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = events.recv().await {
            self.process(event).await;
        }
        info!("event channel closed");
    }
}
