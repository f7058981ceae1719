//! Trait definitions with mockall annotations for testing
//!
//! Every store and external collaborator the lifecycle core talks to is
//! expressed here and injected through [`crate::ShopContext`]. The mocks are
//! used to exercise partial-write failures that the in-memory store never
//! produces on its own.

use chrono::{DateTime, NaiveDate, Utc};
use shared::{
    DocumentRef, Machine, MachineId, Operation, OperationId, OperationStatus, Order, OrderId,
    PlanningSnapshot, ShiftRecord,
};

use crate::error::ShopFloorResult;

/// Result of a conditional machine claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The machine was free and now holds the operation
    Claimed,
    /// The machine already held this operation; nothing was written
    AlreadyHeld,
    /// The machine is occupied by something else
    Busy { current: Option<OperationId> },
    /// Another machine already holds the operation
    HeldElsewhere { machine_id: MachineId },
}

/// Query over the shift ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftFilter {
    pub operation_id: Option<OperationId>,
    pub machine_id: Option<MachineId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_archived: bool,
}

impl ShiftFilter {
    /// Non-archived records of one operation
    pub fn active_for(operation_id: OperationId) -> Self {
        Self {
            operation_id: Some(operation_id),
            ..Self::default()
        }
    }

    pub fn on_machine(mut self, machine_id: Option<MachineId>) -> Self {
        self.machine_id = machine_id;
        self
    }

    /// Inclusive date range
    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    pub fn matches(&self, record: &ShiftRecord) -> bool {
        if !self.include_archived && record.archived {
            return false;
        }
        if self.operation_id.is_some() && record.operation_id != self.operation_id {
            return false;
        }
        if self.machine_id.is_some() && record.machine_id != self.machine_id {
            return false;
        }
        if self.from.is_some_and(|from| record.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| record.date > to) {
            return false;
        }
        true
    }
}

/// Machine registry
#[mockall::automock]
#[async_trait::async_trait]
pub trait MachineStore: Send + Sync {
    async fn get_machine(&self, id: MachineId) -> ShopFloorResult<Option<Machine>>;

    async fn find_machine_by_name(&self, name: &str) -> ShopFloorResult<Option<Machine>>;

    async fn list_machines(&self) -> ShopFloorResult<Vec<Machine>>;

    /// Machines whose current operation is `operation_id`
    async fn find_machines_holding(&self, operation_id: OperationId) -> ShopFloorResult<Vec<Machine>>;

    /// Insert or replace; machine names are unique
    async fn save_machine(&self, machine: &Machine) -> ShopFloorResult<()>;

    /// Occupy the machine with `operation_id` and stamp `assigned_at`, only if
    /// it is currently available (or already holding that operation) and no
    /// other machine holds the operation. This is the serialization point for
    /// concurrent assignments.
    async fn claim_machine(
        &self,
        id: MachineId,
        operation_id: OperationId,
        at: DateTime<Utc>,
    ) -> ShopFloorResult<ClaimOutcome>;

    /// Free the machine and stamp `last_freed_at`
    async fn release_machine(&self, id: MachineId, at: DateTime<Utc>) -> ShopFloorResult<Machine>;
}

/// Operation table
#[mockall::automock]
#[async_trait::async_trait]
pub trait OperationStore: Send + Sync {
    async fn get_operation(&self, id: OperationId) -> ShopFloorResult<Option<Operation>>;

    async fn list_operations_by_status(&self, status: OperationStatus) -> ShopFloorResult<Vec<Operation>>;

    /// Operations of one order ordered by sequence number
    async fn list_operations_for_order(&self, order_id: OrderId) -> ShopFloorResult<Vec<Operation>>;

    async fn save_operation(&self, operation: &Operation) -> ShopFloorResult<()>;
}

/// Order book
#[mockall::automock]
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, id: OrderId) -> ShopFloorResult<Option<Order>>;

    /// Orders not yet completed, ordered by priority, deadline, then id
    async fn list_open_orders(&self) -> ShopFloorResult<Vec<Order>>;

    /// Insert or replace; drawing numbers are unique
    async fn save_order(&self, order: &Order) -> ShopFloorResult<()>;
}

/// Shift production ledger
#[mockall::automock]
#[async_trait::async_trait]
pub trait ShiftRecordStore: Send + Sync {
    async fn list_shift_records(&self, filter: &ShiftFilter) -> ShopFloorResult<Vec<ShiftRecord>>;

    async fn save_shift_record(&self, record: &ShiftRecord) -> ShopFloorResult<()>;

    /// Archive every non-archived record of the operation (restricted to the
    /// machine when given), returning how many flipped
    async fn archive_shift_records(
        &self,
        operation_id: OperationId,
        machine_id: Option<MachineId>,
        at: DateTime<Utc>,
    ) -> ShopFloorResult<usize>;
}

/// External document metadata (drawing previews, files)
#[mockall::automock]
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn documents_for_order(&self, order_id: OrderId) -> ShopFloorResult<Option<DocumentRef>>;
}

/// Audit log of planning passes
#[mockall::automock]
#[async_trait::async_trait]
pub trait SnapshotLog: Send + Sync {
    async fn record_snapshot(&self, snapshot: &PlanningSnapshot) -> ShopFloorResult<()>;

    async fn latest_snapshot(&self, machine_id: MachineId) -> ShopFloorResult<Option<PlanningSnapshot>>;
}

/// Source of the current instant
#[mockall::automock]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32) -> ShiftRecord {
        ShiftRecord {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            operation_id: Some(OperationId(7)),
            machine_id: Some(MachineId(3)),
            ..ShiftRecord::default()
        }
    }

    #[test]
    fn test_mock_trait_instantiation() {
        let _machines = MockMachineStore::new();
        let _operations = MockOperationStore::new();
        let _orders = MockOrderStore::new();
        let _shifts = MockShiftRecordStore::new();
        let _documents = MockDocumentSource::new();
        let _snapshots = MockSnapshotLog::new();
        let _clock = MockClock::new();
    }

    #[test]
    fn test_filter_scopes() {
        let filter = ShiftFilter::active_for(OperationId(7));
        assert!(filter.matches(&record(2)));
        assert!(!ShiftFilter::active_for(OperationId(8)).matches(&record(2)));
        assert!(!filter.clone().on_machine(Some(MachineId(4))).matches(&record(2)));
        assert!(filter.clone().on_machine(None).matches(&record(2)));

        let mut archived = record(2);
        archived.archived = true;
        assert!(!filter.matches(&archived));
        assert!(filter.clone().with_archived().matches(&archived));
    }

    #[test]
    fn test_filter_date_range_is_inclusive() {
        let filter = ShiftFilter::default().between(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
        );
        assert!(!filter.matches(&record(1)));
        assert!(filter.matches(&record(2)));
        assert!(filter.matches(&record(4)));
        assert!(!filter.matches(&record(5)));
    }
}
