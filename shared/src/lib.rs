//! Shared types for the shop-floor operation lifecycle
//!
//! Contains the persisted domain records, the view contracts handed to
//! callers, boundary validation errors and the logging setup used by every
//! crate in the workspace.

pub mod types;
pub mod errors;
pub mod logging;
pub mod messages;

pub use types::*;
pub use errors::*;

pub use messages::{
    // Lifecycle responses
    CompletionAction, CompletionCheck, CompletionFinding, MachineView, OperationSummary,
    ProgressSummary,

    // Write synchronization reporting
    SyncReport, WriteStatus,

    // Planning
    DocumentRef, Feasibility, PlanningSnapshot, Recommendation,
};
