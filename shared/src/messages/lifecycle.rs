//! Lifecycle responses: what a caller sees after assigning, checking or
//! closing an operation

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SharedError;
use crate::types::{
    Machine, MachineId, MachineType, Operation, OperationId, OperationStatus, OperationType, Order,
    OrderId,
};

/// Accumulated output for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_produced: u64,
    pub last_update_date: Option<NaiveDate>,
    pub record_count: usize,
}

/// Completion state of the operation currently running on a machine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCheck {
    pub operation_id: Option<OperationId>,
    pub is_completed: bool,
    pub total_produced: u64,
    pub target_quantity: u64,
    pub remaining_quantity: u64,
    pub completion_percentage: u32,
    /// Advisory only: something has been produced
    pub can_complete: bool,
    pub last_update_date: Option<NaiveDate>,
}

impl CompletionCheck {
    /// Check for a machine with nothing running
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn evaluate(operation_id: OperationId, target_quantity: u64, progress: &ProgressSummary) -> Self {
        let total_produced = progress.total_produced;
        let completion_percentage = if target_quantity == 0 {
            0
        } else {
            (total_produced.saturating_mul(100) / target_quantity).min(100) as u32
        };

        Self {
            operation_id: Some(operation_id),
            is_completed: target_quantity > 0
                && total_produced >= target_quantity
                && completion_percentage >= 100,
            total_produced,
            target_quantity,
            remaining_quantity: target_quantity.saturating_sub(total_produced),
            completion_percentage,
            can_complete: total_produced > 0,
            last_update_date: progress.last_update_date,
        }
    }
}

/// One operation examined by an active scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionFinding {
    pub operation_id: OperationId,
    pub order_id: OrderId,
    pub machine_id: Option<MachineId>,
    pub drawing_number: String,
    pub check: CompletionCheck,
}

impl CompletionFinding {
    pub fn is_completed(&self) -> bool {
        self.check.is_completed
    }
}

/// What to do with an operation whose completion has been flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionAction {
    /// Record the batch as finished
    Complete,
    /// Dismiss the prompt and keep running
    Continue,
    /// Discard the accumulated count and send the operation back to planning
    PlanNew,
}

impl std::str::FromStr for CompletionAction {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "complete" => Ok(CompletionAction::Complete),
            "continue" => Ok(CompletionAction::Continue),
            "plan_new" | "plan-new" => Ok(CompletionAction::PlanNew),
            _ => Err(SharedError::InvalidAction { input: s.to_string() }),
        }
    }
}

impl fmt::Display for CompletionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionAction::Complete => write!(f, "complete"),
            CompletionAction::Continue => write!(f, "continue"),
            CompletionAction::PlanNew => write!(f, "plan_new"),
        }
    }
}

/// Outcome of a single store write inside a lifecycle call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum WriteStatus {
    Applied,
    Unchanged,
    Skipped,
    Failed(String),
}

impl WriteStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, WriteStatus::Failed(_))
    }
}

impl fmt::Display for WriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStatus::Applied => write!(f, "applied"),
            WriteStatus::Unchanged => write!(f, "unchanged"),
            WriteStatus::Skipped => write!(f, "skipped"),
            WriteStatus::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Per-aggregate write outcome of a lifecycle call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub machine: WriteStatus,
    pub operation: WriteStatus,
    /// Shift-record archiving, attempted only after both writes succeed
    pub archive: WriteStatus,
    pub archived_records: usize,
}

impl SyncReport {
    pub fn unchanged() -> Self {
        Self {
            machine: WriteStatus::Unchanged,
            operation: WriteStatus::Unchanged,
            archive: WriteStatus::Unchanged,
            archived_records: 0,
        }
    }

    /// Nothing attempted yet
    pub fn skipped() -> Self {
        Self {
            machine: WriteStatus::Skipped,
            operation: WriteStatus::Skipped,
            archive: WriteStatus::Skipped,
            archived_records: 0,
        }
    }

    pub fn is_consistent(&self) -> bool {
        !self.machine.is_failed() && !self.operation.is_failed() && !self.archive.is_failed()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "machine write {}, operation write {}, archive {} ({} shift records)",
            self.machine, self.operation, self.archive, self.archived_records
        )
    }
}

/// Operation details embedded in a machine view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    pub operation_id: OperationId,
    pub order_id: OrderId,
    pub drawing_number: Option<String>,
    pub sequence_number: u32,
    pub operation_type: OperationType,
    pub status: OperationStatus,
    pub assigned_at: Option<DateTime<Utc>>,
}

impl OperationSummary {
    pub fn new(operation: &Operation, order: Option<&Order>) -> Self {
        Self {
            operation_id: operation.id,
            order_id: operation.order_id,
            drawing_number: order.map(|o| o.drawing_number.clone()),
            sequence_number: operation.sequence_number,
            operation_type: operation.operation_type,
            status: operation.status,
            assigned_at: operation.assigned_at,
        }
    }
}

/// Machine state as returned by lifecycle calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineView {
    pub id: MachineId,
    pub name: String,
    pub machine_type: MachineType,
    pub available: bool,
    pub current_operation: Option<OperationSummary>,
    pub last_freed_at: Option<DateTime<Utc>>,
}

impl MachineView {
    pub fn new(machine: &Machine, current_operation: Option<OperationSummary>) -> Self {
        Self {
            id: machine.id,
            name: machine.name.clone(),
            machine_type: machine.machine_type,
            available: machine.available,
            current_operation,
            last_freed_at: machine.last_freed_at,
        }
    }
}
