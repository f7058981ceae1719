//! In-memory implementation of every store trait
//!
//! All tables live behind one lock so a machine claim observes and mutates
//! the registry atomically. Used by the CLI (loaded from a seed file) and by
//! the integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use shared::{
    shop_debug, Machine, MachineId, Operation, OperationId, OperationStatus, Order, OrderId,
    PlanningSnapshot, ShiftRecord, ShiftRecordId, logging::Component,
};

use crate::error::{ShopFloorError, ShopFloorResult};
use crate::traits::{
    ClaimOutcome, MachineStore, OperationStore, OrderStore, ShiftFilter, ShiftRecordStore, SnapshotLog,
};

const DEFAULT_SNAPSHOT_LIMIT: usize = 1_000;

#[derive(Default)]
struct Tables {
    machines: BTreeMap<MachineId, Machine>,
    operations: BTreeMap<OperationId, Operation>,
    orders: BTreeMap<OrderId, Order>,
    shift_records: BTreeMap<ShiftRecordId, ShiftRecord>,
    snapshots: Vec<PlanningSnapshot>,
}

/// In-memory shop-floor database
pub struct InMemoryShopStore {
    tables: RwLock<Tables>,
    max_snapshots: usize,
}

impl InMemoryShopStore {
    pub fn new() -> Self {
        Self::with_max_snapshots(DEFAULT_SNAPSHOT_LIMIT)
    }

    /// Keep at most `max_snapshots` planning snapshots, dropping the oldest
    pub fn with_max_snapshots(max_snapshots: usize) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            max_snapshots: max_snapshots.max(1),
        }
    }

    pub async fn snapshot_count(&self) -> usize {
        self.tables.read().await.snapshots.len()
    }

    /// Every shift record, archived or not, ordered by id
    pub async fn all_shift_records(&self) -> Vec<ShiftRecord> {
        self.tables.read().await.shift_records.values().cloned().collect()
    }

    /// Every order, open or completed, ordered by id
    pub async fn all_orders(&self) -> Vec<Order> {
        self.tables.read().await.orders.values().cloned().collect()
    }

    /// Every operation regardless of status, ordered by id
    pub async fn all_operations(&self) -> Vec<Operation> {
        self.tables.read().await.operations.values().cloned().collect()
    }
}

impl Default for InMemoryShopStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MachineStore for InMemoryShopStore {
    async fn get_machine(&self, id: MachineId) -> ShopFloorResult<Option<Machine>> {
        Ok(self.tables.read().await.machines.get(&id).cloned())
    }

    async fn find_machine_by_name(&self, name: &str) -> ShopFloorResult<Option<Machine>> {
        let tables = self.tables.read().await;
        Ok(tables.machines.values().find(|m| m.name == name).cloned())
    }

    async fn list_machines(&self) -> ShopFloorResult<Vec<Machine>> {
        Ok(self.tables.read().await.machines.values().cloned().collect())
    }

    async fn find_machines_holding(&self, operation_id: OperationId) -> ShopFloorResult<Vec<Machine>> {
        let tables = self.tables.read().await;
        Ok(tables
            .machines
            .values()
            .filter(|m| m.is_holding(operation_id))
            .cloned()
            .collect())
    }

    async fn save_machine(&self, machine: &Machine) -> ShopFloorResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .machines
            .values()
            .any(|m| m.name == machine.name && m.id != machine.id)
        {
            return Err(ShopFloorError::UniqueViolation {
                field: "machine.name",
                value: machine.name.clone(),
            });
        }
        tables.machines.insert(machine.id, machine.clone());
        Ok(())
    }

    async fn claim_machine(
        &self,
        id: MachineId,
        operation_id: OperationId,
        at: DateTime<Utc>,
    ) -> ShopFloorResult<ClaimOutcome> {
        let mut tables = self.tables.write().await;
        if let Some(other) = tables
            .machines
            .values()
            .find(|m| m.id != id && m.is_holding(operation_id))
        {
            return Ok(ClaimOutcome::HeldElsewhere { machine_id: other.id });
        }

        let machine = tables
            .machines
            .get_mut(&id)
            .ok_or_else(|| ShopFloorError::not_found("Machine", id))?;

        if machine.is_holding(operation_id) {
            machine.available = false;
            return Ok(ClaimOutcome::AlreadyHeld);
        }
        if !machine.available || machine.current_operation_id.is_some() {
            return Ok(ClaimOutcome::Busy {
                current: machine.current_operation_id,
            });
        }

        machine.occupy(operation_id, at);
        shop_debug!(Component::Store, "{} claimed for {}", id, operation_id);
        Ok(ClaimOutcome::Claimed)
    }

    async fn release_machine(&self, id: MachineId, at: DateTime<Utc>) -> ShopFloorResult<Machine> {
        let mut tables = self.tables.write().await;
        let machine = tables
            .machines
            .get_mut(&id)
            .ok_or_else(|| ShopFloorError::not_found("Machine", id))?;
        machine.free(at);
        Ok(machine.clone())
    }
}

#[async_trait]
impl OperationStore for InMemoryShopStore {
    async fn get_operation(&self, id: OperationId) -> ShopFloorResult<Option<Operation>> {
        Ok(self.tables.read().await.operations.get(&id).cloned())
    }

    async fn list_operations_by_status(&self, status: OperationStatus) -> ShopFloorResult<Vec<Operation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .operations
            .values()
            .filter(|op| op.status == status)
            .cloned()
            .collect())
    }

    async fn list_operations_for_order(&self, order_id: OrderId) -> ShopFloorResult<Vec<Operation>> {
        let tables = self.tables.read().await;
        let mut operations: Vec<Operation> = tables
            .operations
            .values()
            .filter(|op| op.order_id == order_id)
            .cloned()
            .collect();
        operations.sort_by_key(|op| (op.sequence_number, op.id));
        Ok(operations)
    }

    async fn save_operation(&self, operation: &Operation) -> ShopFloorResult<()> {
        self.tables
            .write()
            .await
            .operations
            .insert(operation.id, operation.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryShopStore {
    async fn get_order(&self, id: OrderId) -> ShopFloorResult<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_open_orders(&self) -> ShopFloorResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables.orders.values().filter(|o| o.is_open()).cloned().collect();
        orders.sort_by_key(|o| (o.priority, o.deadline, o.id));
        Ok(orders)
    }

    async fn save_order(&self, order: &Order) -> ShopFloorResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .orders
            .values()
            .any(|o| o.drawing_number == order.drawing_number && o.id != order.id)
        {
            return Err(ShopFloorError::UniqueViolation {
                field: "order.drawing_number",
                value: order.drawing_number.clone(),
            });
        }
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }
}

#[async_trait]
impl ShiftRecordStore for InMemoryShopStore {
    async fn list_shift_records(&self, filter: &ShiftFilter) -> ShopFloorResult<Vec<ShiftRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .shift_records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn save_shift_record(&self, record: &ShiftRecord) -> ShopFloorResult<()> {
        self.tables
            .write()
            .await
            .shift_records
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn archive_shift_records(
        &self,
        operation_id: OperationId,
        machine_id: Option<MachineId>,
        at: DateTime<Utc>,
    ) -> ShopFloorResult<usize> {
        let filter = ShiftFilter::active_for(operation_id).on_machine(machine_id);
        let mut tables = self.tables.write().await;
        let archived = tables
            .shift_records
            .values_mut()
            .filter(|record| filter.matches(record))
            .map(|record| record.archive(at))
            .filter(|flipped| *flipped)
            .count();
        Ok(archived)
    }
}

#[async_trait]
impl SnapshotLog for InMemoryShopStore {
    async fn record_snapshot(&self, snapshot: &PlanningSnapshot) -> ShopFloorResult<()> {
        let mut tables = self.tables.write().await;
        if tables.snapshots.len() >= self.max_snapshots {
            tables.snapshots.remove(0);
        }
        tables.snapshots.push(snapshot.clone());
        Ok(())
    }

    async fn latest_snapshot(&self, machine_id: MachineId) -> ShopFloorResult<Option<PlanningSnapshot>> {
        let tables = self.tables.read().await;
        Ok(tables
            .snapshots
            .iter()
            .rev()
            .find(|s| s.machine_id == machine_id)
            .cloned())
    }
}
