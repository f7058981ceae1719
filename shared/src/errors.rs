//! Shared error types for boundary validation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid priority: {value} (expected 1, 2 or 3)")]
    InvalidPriority { value: u8 },

    #[error("Invalid completion action: {input}")]
    InvalidAction { input: String },

    #[error("Invalid machine type: {input}")]
    InvalidMachineType { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
