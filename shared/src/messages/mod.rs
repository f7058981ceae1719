//! Contracts exchanged with callers of the shop-floor core
//!
//! - `lifecycle`: machine views, completion checks and write synchronization reports
//! - `planning`: recommendations, feasibility and audit snapshots

pub mod lifecycle;
pub mod planning;

pub use lifecycle::{
    CompletionAction, CompletionCheck, CompletionFinding, MachineView, OperationSummary,
    ProgressSummary, SyncReport, WriteStatus,
};

pub use planning::{DocumentRef, Feasibility, PlanningSnapshot, Recommendation};
