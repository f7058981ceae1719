//! Core domain records used throughout the shop-floor system

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SharedError;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

record_id!(
    /// Identifier of a machine in the registry
    MachineId, "machine"
);
record_id!(
    /// Identifier of a manufacturing operation
    OperationId, "operation"
);
record_id!(
    /// Identifier of a customer order
    OrderId, "order"
);
record_id!(
    /// Identifier of a shift ledger entry
    ShiftRecordId, "shift"
);

/// Kind of machine on the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineType {
    #[serde(rename = "milling-3axis", alias = "3-axis")]
    Milling3Axis,
    #[serde(rename = "milling-4axis", alias = "4-axis")]
    Milling4Axis,
    #[serde(rename = "turning")]
    Turning,
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineType::Milling3Axis => write!(f, "milling-3axis"),
            MachineType::Milling4Axis => write!(f, "milling-4axis"),
            MachineType::Turning => write!(f, "turning"),
            MachineType::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for MachineType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "milling-3axis" | "3-axis" => Ok(MachineType::Milling3Axis),
            "milling-4axis" | "4-axis" => Ok(MachineType::Milling4Axis),
            "turning" => Ok(MachineType::Turning),
            _ => Err(SharedError::InvalidMachineType { input: s.to_string() }),
        }
    }
}

/// Kind of work an operation requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    #[serde(rename = "turning")]
    Turning,
    #[serde(rename = "milling-3axis", alias = "3-axis")]
    Milling3Axis,
    #[serde(rename = "milling-4axis", alias = "4-axis")]
    Milling4Axis,
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Turning => write!(f, "turning"),
            OperationType::Milling3Axis => write!(f, "milling-3axis"),
            OperationType::Milling4Axis => write!(f, "milling-4axis"),
            OperationType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Operation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    #[serde(alias = "ASSIGNED")]
    InProgress,
    Completed,
    OnHold,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Pending => write!(f, "PENDING"),
            OperationStatus::InProgress => write!(f, "IN_PROGRESS"),
            OperationStatus::Completed => write!(f, "COMPLETED"),
            OperationStatus::OnHold => write!(f, "ON_HOLD"),
        }
    }
}

/// Order priority tier, 1 being the most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn level(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = SharedError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            _ => Err(SharedError::InvalidPriority { value }),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.level()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.level())
    }
}

/// Whether an order still has work outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Open,
    Completed,
}

/// A machine in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: MachineType,
    pub available: bool,
    #[serde(default)]
    pub current_operation_id: Option<OperationId>,
    /// When the current operation was claimed
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_freed_at: Option<DateTime<Utc>>,
}

impl Machine {
    pub fn new(id: impl Into<MachineId>, name: impl Into<String>, machine_type: MachineType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            machine_type,
            available: true,
            current_operation_id: None,
            assigned_at: None,
            last_freed_at: None,
        }
    }

    /// Occupy the machine with `operation_id` from `at`
    pub fn occupy(&mut self, operation_id: OperationId, at: DateTime<Utc>) {
        self.available = false;
        self.current_operation_id = Some(operation_id);
        self.assigned_at = Some(at);
    }

    /// Mark the machine free, stamping when it was released
    pub fn free(&mut self, at: DateTime<Utc>) {
        self.available = true;
        self.current_operation_id = None;
        self.assigned_at = None;
        self.last_freed_at = Some(at);
    }

    pub fn is_holding(&self, operation_id: OperationId) -> bool {
        self.current_operation_id == Some(operation_id)
    }
}

/// One manufacturing step of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: OperationId,
    pub order_id: OrderId,
    pub sequence_number: u32,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    /// Minutes per produced unit
    #[serde(default)]
    pub estimated_time_per_unit: f64,
    pub status: OperationStatus,
    #[serde(default)]
    pub assigned_machine_id: Option<MachineId>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_quantity: Option<u32>,
}

impl Operation {
    pub fn new(
        id: impl Into<OperationId>,
        order_id: impl Into<OrderId>,
        sequence_number: u32,
        operation_type: OperationType,
        estimated_time_per_unit: f64,
    ) -> Self {
        Self {
            id: id.into(),
            order_id: order_id.into(),
            sequence_number,
            operation_type,
            estimated_time_per_unit,
            status: OperationStatus::Pending,
            assigned_machine_id: None,
            assigned_at: None,
            actual_quantity: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == OperationStatus::InProgress
    }

    /// Whether the operation runs on `machine_id` right now
    pub fn is_active_on(&self, machine_id: MachineId) -> bool {
        self.is_active() && self.assigned_machine_id == Some(machine_id)
    }

    pub fn start_on(&mut self, machine_id: MachineId, at: DateTime<Utc>) {
        self.status = OperationStatus::InProgress;
        self.assigned_machine_id = Some(machine_id);
        self.assigned_at = Some(at);
    }

    /// Drop the machine link and return to the planning pool
    pub fn reset_to_pending(&mut self) {
        self.status = OperationStatus::Pending;
        self.assigned_machine_id = None;
        self.assigned_at = None;
    }

    pub fn complete(&mut self, quantity: u32) {
        self.status = OperationStatus::Completed;
        self.actual_quantity = Some(quantity);
        self.assigned_machine_id = None;
        self.assigned_at = None;
    }
}

/// A customer order for a drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub drawing_number: String,
    pub quantity: u32,
    pub deadline: NaiveDate,
    pub priority: Priority,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    pub fn is_open(&self) -> bool {
        self.status != OrderStatus::Completed
    }

    /// Deadline as an instant: the start of the deadline day in UTC
    pub fn deadline_at(&self) -> DateTime<Utc> {
        self.deadline.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

/// A dated entry of day/night production for a machine and operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShiftRecord {
    pub id: ShiftRecordId,
    pub date: NaiveDate,
    pub machine_id: Option<MachineId>,
    pub operation_id: Option<OperationId>,
    pub day_quantity: Option<u32>,
    pub day_time_per_unit: Option<f64>,
    pub day_operator: Option<String>,
    pub night_quantity: Option<u32>,
    pub night_time_per_unit: Option<f64>,
    pub night_operator: Option<String>,
    pub setup_time: Option<f64>,
    pub setup_operator: Option<String>,
    pub archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Default for ShiftRecordId {
    fn default() -> Self {
        ShiftRecordId(0)
    }
}

impl ShiftRecord {
    /// Day plus night output, missing shifts counting as zero
    pub fn produced(&self) -> u64 {
        u64::from(self.day_quantity.unwrap_or(0)) + u64::from(self.night_quantity.unwrap_or(0))
    }

    /// Archive once; an already archived record keeps its original stamp
    pub fn archive(&mut self, at: DateTime<Utc>) -> bool {
        if self.archived {
            return false;
        }
        self.archived = true;
        self.archived_at = Some(at);
        true
    }
}
