//! Shop-floor error types

use shared::{MachineId, OperationId, SharedError, SyncReport};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopFloorError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Machine type {machine_type} cannot run {operation_type} operations")]
    Incompatible { machine_type: String, operation_type: String },

    #[error("Partial synchronization failure for {operation_id}: {report}")]
    PartialSyncFailure {
        operation_id: OperationId,
        machine_id: Option<MachineId>,
        report: SyncReport,
    },

    #[error("Uniqueness violation: {field} = {value}")]
    UniqueViolation { field: &'static str, value: String },

    #[error("Store operation failed: {message}")]
    Store { message: String },

    #[error("Configuration error: {field}")]
    Configuration { field: String },

    #[error("Shared component error")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShopFloorError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict { reason: reason.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store { message: message.into() }
    }

    pub fn config(field: impl Into<String>) -> Self {
        Self::Configuration { field: field.into() }
    }

    /// Whether the caller is expected to resolve the condition (unassign,
    /// pick another machine) rather than retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Incompatible { .. })
    }
}

pub type ShopFloorResult<T> = Result<T, ShopFloorError>;
