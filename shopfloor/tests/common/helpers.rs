//! Test helpers and builder patterns for shop-floor tests
//!
//! `FloorBuilder` seeds an in-memory store, pins the clock to
//! [`TestFixtures::now`] and wires a [`ShopFloor`] over it.

use std::sync::Arc;

use shared::{
    DocumentRef, Machine, MachineId, MachineType, Operation, OperationId, OperationType, Order, OrderId,
    OrderStatus, Priority, ShiftRecord, ShiftRecordId,
};
use shopfloor::services::{FixedClock, InMemoryShopStore, StaticDocumentSource};
use shopfloor::{
    DocumentSource, MachineStore, OperationStore, OrderStore, ProgressAggregator, ShiftFilter,
    ShiftRecordStore, ShopContext, ShopFloor, ShopFloorConfig,
};

use super::fixtures::TestFixtures;

/// Builder for seeded floors with sensible defaults
pub struct FloorBuilder {
    machines: Vec<Machine>,
    orders: Vec<Order>,
    operations: Vec<Operation>,
    running: Vec<(OperationId, MachineId)>,
    shifts: Vec<ShiftRecord>,
    documents: Vec<(OrderId, DocumentRef)>,
    config: ShopFloorConfig,
}

impl FloorBuilder {
    pub fn new() -> Self {
        Self {
            machines: Vec::new(),
            orders: Vec::new(),
            operations: Vec::new(),
            running: Vec::new(),
            shifts: Vec::new(),
            documents: Vec::new(),
            config: ShopFloorConfig::default(),
        }
    }

    /// T1 and T2 (turning), M3 (3-axis) and M4 (4-axis), all free
    pub fn with_standard_machines(self) -> Self {
        self.machine(TestFixtures::T1_ID, TestFixtures::T1, MachineType::Turning)
            .machine(TestFixtures::T2_ID, TestFixtures::T2, MachineType::Turning)
            .machine(TestFixtures::M3_ID, TestFixtures::M3, MachineType::Milling3Axis)
            .machine(TestFixtures::M4_ID, TestFixtures::M4, MachineType::Milling4Axis)
    }

    pub fn machine(mut self, id: MachineId, name: &str, machine_type: MachineType) -> Self {
        self.machines.push(Machine::new(id, name, machine_type));
        self
    }

    /// Open order with a deadline `deadline_days` after the fixed clock
    pub fn order(mut self, id: OrderId, quantity: u32, priority: Priority, deadline_days: i64) -> Self {
        self.orders.push(Order {
            id,
            drawing_number: format!("D-{}", id.0),
            quantity,
            deadline: TestFixtures::days_from_now(deadline_days),
            priority,
            status: OrderStatus::Open,
        });
        self
    }

    /// Pending operation
    pub fn operation(mut self, id: OperationId, order: OrderId, sequence: u32, operation_type: OperationType) -> Self {
        self.operations.push(Operation::new(id, order, sequence, operation_type, 2.0));
        self
    }

    /// Pending first operation with an explicit minutes-per-unit rate
    pub fn operation_with_rate(
        mut self,
        id: OperationId,
        order: OrderId,
        operation_type: OperationType,
        minutes_per_unit: f64,
    ) -> Self {
        self.operations.push(Operation::new(id, order, 1, operation_type, minutes_per_unit));
        self
    }

    /// Operation already running on a machine, both sides consistent
    pub fn running(mut self, operation: OperationId, machine: MachineId) -> Self {
        self.running.push((operation, machine));
        self
    }

    pub fn shift(mut self, operation: OperationId, machine: MachineId, day: u32, night: u32) -> Self {
        let id = ShiftRecordId(self.shifts.len() as u64 + 1);
        self.shifts.push(ShiftRecord {
            id,
            date: TestFixtures::shift_date(),
            machine_id: Some(machine),
            operation_id: Some(operation),
            day_quantity: Some(day),
            night_quantity: Some(night),
            ..ShiftRecord::default()
        });
        self
    }

    pub fn documents(mut self, order: OrderId, preview_url: &str) -> Self {
        self.documents.push((
            order,
            DocumentRef {
                preview_url: Some(preview_url.to_string()),
                file_url: None,
            },
        ));
        self
    }

    pub fn config(mut self, config: ShopFloorConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Floor {
        let store = Arc::new(InMemoryShopStore::new());
        let clock = Arc::new(FixedClock::new(TestFixtures::now()));

        for machine in &self.machines {
            store.save_machine(machine).await.unwrap();
        }
        for order in &self.orders {
            store.save_order(order).await.unwrap();
        }
        for operation in &self.operations {
            let mut operation = operation.clone();
            if let Some((_, machine_id)) = self.running.iter().find(|(op, _)| *op == operation.id) {
                store
                    .claim_machine(*machine_id, operation.id, TestFixtures::now())
                    .await
                    .unwrap();
                operation.start_on(*machine_id, TestFixtures::now());
            }
            store.save_operation(&operation).await.unwrap();
        }
        for record in &self.shifts {
            store.save_shift_record(record).await.unwrap();
        }

        let documents = StaticDocumentSource::new(self.documents.into_iter().collect());
        let context = ShopContext::in_memory(store.clone())
            .with_documents(Arc::new(documents))
            .with_clock(clock.clone())
            .with_config(self.config);

        Floor {
            shop_floor: ShopFloor::new(context.clone()),
            store,
            clock,
            context,
        }
    }
}

/// A seeded floor and direct handles on its store and clock
pub struct Floor {
    pub shop_floor: ShopFloor,
    pub store: Arc<InMemoryShopStore>,
    pub clock: Arc<FixedClock>,
    pub context: ShopContext,
}

impl Floor {
    pub async fn operation(&self, id: OperationId) -> Operation {
        self.store.get_operation(id).await.unwrap().unwrap()
    }

    pub async fn machine(&self, id: MachineId) -> Machine {
        self.store.get_machine(id).await.unwrap().unwrap()
    }

    /// Same floor, with the operation table swapped for `operations`
    pub fn with_operations(&self, operations: Arc<dyn OperationStore>) -> ShopFloor {
        let mut context = self.context.clone();
        context.operations = operations;
        ShopFloor::new(context)
    }

    /// Same floor, with the machine registry swapped for `machines`
    pub fn with_machines(&self, machines: Arc<dyn MachineStore>) -> ShopFloor {
        let mut context = self.context.clone();
        context.machines = machines;
        ShopFloor::new(context)
    }

    /// Same floor, with the shift ledger swapped for `shifts`
    pub fn with_shifts(&self, shifts: Arc<dyn ShiftRecordStore>) -> ShopFloor {
        let mut context = self.context.clone();
        context.shifts = shifts;
        ShopFloor::new(context)
    }

    /// Point `machine` at `operation` without going through a claim
    pub async fn force_holder(&self, machine: MachineId, operation: OperationId) {
        let mut stale = self.machine(machine).await;
        stale.occupy(operation, TestFixtures::now());
        self.store.save_machine(&stale).await.unwrap();
    }

    /// Same floor, with the document collaborator swapped
    pub fn with_documents(&self, documents: Arc<dyn DocumentSource>) -> ShopFloor {
        ShopFloor::new(self.context.clone().with_documents(documents))
    }
}

/// Assertion helpers
pub struct TestHelpers;

impl TestHelpers {
    /// Exactly one machine holds the operation, and it is the one named
    pub async fn assert_single_holder(floor: &Floor, operation: OperationId, machine: MachineId) {
        let holders = floor.store.find_machines_holding(operation).await.unwrap();
        assert_eq!(holders.len(), 1, "{operation} should have exactly one holder");
        assert_eq!(holders[0].id, machine);
        assert!(floor.operation(operation).await.is_active_on(machine));
    }

    /// Non-archived shift records of an operation on any machine
    pub async fn active_records(floor: &Floor, operation: OperationId) -> Vec<ShiftRecord> {
        floor
            .store
            .list_shift_records(&ShiftFilter::active_for(operation))
            .await
            .unwrap()
    }

    /// Op-scoped progress ignoring the machine
    pub async fn produced(floor: &Floor, operation: OperationId) -> u64 {
        ProgressAggregator::new(floor.store.clone())
            .progress(operation, None)
            .await
            .unwrap()
            .total_produced
    }
}
