//! Core business logic
//!
//! Progress aggregation, completion detection, machine/operation
//! compatibility, deadline feasibility and the planning recommender. These
//! read through the store traits and never mutate operation state; planning
//! only appends an audit snapshot.

pub mod compatibility;
pub mod completion;
pub mod feasibility;
pub mod planning;
pub mod progress;

pub use compatibility::is_compatible;
pub use completion::{CompletionDetector, ScanReport, SkippedOperation};
pub use feasibility::estimate;
pub use planning::PlanningRecommender;
pub use progress::ProgressAggregator;
