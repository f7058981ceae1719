//! Shop-floor operation lifecycle
//!
//! Assigns operations to machines, aggregates shift-logged production into
//! progress, detects finished operations, repairs drift between the machine
//! registry and the operation table, and recommends work for idle machines.
//! Every store and collaborator is injected through [`ShopContext`].

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod lifecycle;
pub mod poller;
pub mod reconcile;
pub mod services;
pub mod shop_floor;
pub mod traits;

// Re-export commonly used types
pub use config::ShopFloorConfig;
pub use context::ShopContext;
pub use core::{CompletionDetector, PlanningRecommender, ProgressAggregator, ScanReport, SkippedOperation};
pub use error::{ShopFloorError, ShopFloorResult};
pub use lifecycle::AssignmentOrchestrator;
pub use poller::{PollStats, Poller};
pub use reconcile::{Reconciler, Repair};
pub use shop_floor::ShopFloor;
pub use traits::{
    Clock, DocumentSource, MachineStore, OperationStore, OrderStore, ShiftFilter, ShiftRecordStore,
    SnapshotLog, ClaimOutcome,
    MockClock, MockDocumentSource, MockMachineStore, MockOperationStore, MockOrderStore,
    MockShiftRecordStore, MockSnapshotLog,
};
