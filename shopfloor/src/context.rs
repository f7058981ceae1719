//! Dependency bundle shared by every lifecycle component

use std::sync::Arc;

use crate::config::ShopFloorConfig;
use crate::services::{InMemoryShopStore, NoDocuments, SystemClock};
use crate::traits::{Clock, DocumentSource, MachineStore, OperationStore, OrderStore, ShiftRecordStore, SnapshotLog};

/// Stores and collaborators injected into the core
///
/// Cloning is cheap; every component holds its own copy.
#[derive(Clone)]
pub struct ShopContext {
    pub machines: Arc<dyn MachineStore>,
    pub operations: Arc<dyn OperationStore>,
    pub orders: Arc<dyn OrderStore>,
    pub shifts: Arc<dyn ShiftRecordStore>,
    pub documents: Arc<dyn DocumentSource>,
    pub snapshots: Arc<dyn SnapshotLog>,
    pub clock: Arc<dyn Clock>,
    pub config: ShopFloorConfig,
}

impl ShopContext {
    /// Context over separate stores, with no documents, an in-memory snapshot
    /// log, the system clock and default configuration
    pub fn new(
        machines: Arc<dyn MachineStore>,
        operations: Arc<dyn OperationStore>,
        orders: Arc<dyn OrderStore>,
        shifts: Arc<dyn ShiftRecordStore>,
    ) -> Self {
        Self {
            machines,
            operations,
            orders,
            shifts,
            documents: Arc::new(NoDocuments),
            snapshots: Arc::new(InMemoryShopStore::new()),
            clock: Arc::new(SystemClock),
            config: ShopFloorConfig::default(),
        }
    }

    /// Context where one in-memory store backs every table
    pub fn in_memory(store: Arc<InMemoryShopStore>) -> Self {
        let mut context = Self::new(store.clone(), store.clone(), store.clone(), store.clone());
        context.snapshots = store;
        context
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentSource>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotLog>) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: ShopFloorConfig) -> Self {
        self.config = config;
        self
    }
}
