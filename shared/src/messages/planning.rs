//! Planning recommendations for idle machines

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{MachineId, OperationId, OperationType, OrderId, Priority};

/// Document references attached to an order, when the document store has them
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub preview_url: Option<String>,
    pub file_url: Option<String>,
}

/// Whether a candidate can be finished before its deadline if started now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feasibility {
    pub total_minutes: i64,
    pub estimated_completion: DateTime<Utc>,
    pub will_meet_deadline: bool,
    /// Positive slack, or the negative overrun
    pub time_margin_minutes: i64,
}

/// A candidate first operation for an idle machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub operation_id: OperationId,
    pub order_id: OrderId,
    pub drawing_number: String,
    pub sequence_number: u32,
    pub operation_type: OperationType,
    pub estimated_time_per_unit: f64,
    pub quantity: u32,
    pub priority: Priority,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub documents: DocumentRef,
    pub feasibility: Feasibility,
}

/// Audit record of one planning pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningSnapshot {
    pub id: Uuid,
    pub machine_id: MachineId,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<Recommendation>,
}

impl PlanningSnapshot {
    pub fn new(machine_id: MachineId, generated_at: DateTime<Utc>, entries: Vec<Recommendation>) -> Self {
        Self {
            id: Uuid::new_v4(),
            machine_id,
            generated_at,
            entries,
        }
    }
}
