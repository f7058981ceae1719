//! Drift repair between the machine registry and the operation table
//!
//! Lifecycle calls write the machine first and the operation second, so when
//! the two disagree the machine registry carries the most recent intent.
//! Each pass brings operations in line with it and clears pointers that
//! cannot be honoured.

use serde::Serialize;
use std::collections::BTreeMap;

use shared::{
    logging::Component, shop_debug, shop_error, shop_warn, Machine, MachineId, OperationId,
    OperationStatus,
};

use crate::context::ShopContext;
use crate::error::{ShopFloorError, ShopFloorResult};

/// One corrective write performed by the reconciler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Repair {
    /// The machine pointed at an operation that does not exist
    ReleasedDanglingMachine { machine_id: MachineId, operation_id: OperationId },
    /// The operation write of an assignment was lost; re-applied
    RestoredAssignment { machine_id: MachineId, operation_id: OperationId },
    /// The machine pointed at a completed operation or one running elsewhere
    ReleasedStaleMachine { machine_id: MachineId, operation_id: OperationId },
    /// Another machine also held the operation
    ReleasedDuplicateHolder { machine_id: MachineId, operation_id: OperationId },
    /// In progress but held by no machine
    ResetOrphanedOperation { operation_id: OperationId },
    /// Unavailable without a current operation
    MarkedMachineAvailable { machine_id: MachineId },
    /// A completed operation still had live shift records
    ArchivedLeftoverRecords { operation_id: OperationId, count: usize },
}

/// Saga-style consistency pass, typically run by the [`crate::Poller`]
#[derive(Clone)]
pub struct Reconciler {
    context: ShopContext,
}

impl Reconciler {
    pub fn new(context: &ShopContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Detect and repair drift; a consistent floor yields no repairs
    ///
    /// Failing to list machines or operations aborts the pass. A failing
    /// individual repair is logged and skipped.
    pub async fn reconcile(&self) -> ShopFloorResult<Vec<Repair>> {
        let machines = self.context.machines.list_machines().await?;
        let mut repairs = Vec::new();

        let mut holders: BTreeMap<OperationId, Vec<Machine>> = BTreeMap::new();
        for machine in machines {
            match machine.current_operation_id {
                Some(operation_id) => holders.entry(operation_id).or_default().push(machine),
                None if !machine.available => {
                    self.attempt(&mut repairs, self.mark_available(machine)).await;
                }
                None => {}
            }
        }

        for (operation_id, machines) in holders {
            let keeper = self.resolve_duplicates(operation_id, machines, &mut repairs).await;
            self.attempt(&mut repairs, self.repair_holder(keeper, operation_id)).await;
        }

        let active = self
            .context
            .operations
            .list_operations_by_status(OperationStatus::InProgress)
            .await?;
        for operation in active {
            self.attempt(&mut repairs, self.reset_orphan(operation.id)).await;
        }

        let completed = self
            .context
            .operations
            .list_operations_by_status(OperationStatus::Completed)
            .await?;
        for operation in completed {
            self.attempt(&mut repairs, self.archive_leftovers(operation.id)).await;
        }

        if repairs.is_empty() {
            shop_debug!(Component::Reconciler, "No drift detected");
        }
        Ok(repairs)
    }

    async fn attempt<F>(&self, repairs: &mut Vec<Repair>, repair: F)
    where
        F: std::future::Future<Output = ShopFloorResult<Option<Repair>>>,
    {
        match repair.await {
            Ok(Some(repair)) => {
                shop_warn!(Component::Reconciler, "🩹 {:?}", repair);
                repairs.push(repair);
            }
            Ok(None) => {}
            Err(e) => {
                shop_error!(Component::Reconciler, "❌ Repair failed, will retry next pass: {}", e);
            }
        }
    }

    /// Keep the machine the operation names (else the lowest id) and release
    /// every other holder
    async fn resolve_duplicates(
        &self,
        operation_id: OperationId,
        mut machines: Vec<Machine>,
        repairs: &mut Vec<Repair>,
    ) -> Machine {
        if machines.len() > 1 {
            let named = match self.context.operations.get_operation(operation_id).await {
                Ok(Some(op)) => op.assigned_machine_id,
                _ => None,
            };
            machines.sort_by_key(|m| (Some(m.id) != named, m.id));
            for duplicate in machines.drain(1..) {
                let machine_id = duplicate.id;
                let release = async move {
                    self.context
                        .machines
                        .release_machine(machine_id, self.context.clock.now())
                        .await?;
                    Ok::<_, ShopFloorError>(Some(Repair::ReleasedDuplicateHolder { machine_id, operation_id }))
                };
                self.attempt(repairs, release).await;
            }
        }
        machines.remove(0)
    }

    async fn repair_holder(&self, machine: Machine, operation_id: OperationId) -> ShopFloorResult<Option<Repair>> {
        let now = self.context.clock.now();
        let Some(mut operation) = self.context.operations.get_operation(operation_id).await? else {
            self.context.machines.release_machine(machine.id, now).await?;
            return Ok(Some(Repair::ReleasedDanglingMachine {
                machine_id: machine.id,
                operation_id,
            }));
        };

        if operation.is_active_on(machine.id) {
            return Ok(None);
        }

        let names_other_machine = operation
            .assigned_machine_id
            .is_some_and(|assigned| assigned != machine.id);

        match operation.status {
            OperationStatus::Pending | OperationStatus::OnHold if !names_other_machine => {
                operation.start_on(machine.id, machine.assigned_at.unwrap_or(now));
                self.context.operations.save_operation(&operation).await?;
                Ok(Some(Repair::RestoredAssignment {
                    machine_id: machine.id,
                    operation_id,
                }))
            }
            _ => {
                self.context.machines.release_machine(machine.id, now).await?;
                Ok(Some(Repair::ReleasedStaleMachine {
                    machine_id: machine.id,
                    operation_id,
                }))
            }
        }
    }

    async fn reset_orphan(&self, operation_id: OperationId) -> ShopFloorResult<Option<Repair>> {
        // Re-read: the operation may have moved on since it was listed
        let Some(mut operation) = self.context.operations.get_operation(operation_id).await? else {
            return Ok(None);
        };
        if !operation.is_active() {
            return Ok(None);
        }
        if !self.context.machines.find_machines_holding(operation_id).await?.is_empty() {
            return Ok(None);
        }

        operation.reset_to_pending();
        self.context.operations.save_operation(&operation).await?;
        Ok(Some(Repair::ResetOrphanedOperation { operation_id }))
    }

    async fn archive_leftovers(&self, operation_id: OperationId) -> ShopFloorResult<Option<Repair>> {
        let count = self
            .context
            .shifts
            .archive_shift_records(operation_id, None, self.context.clock.now())
            .await?;
        Ok((count > 0).then_some(Repair::ArchivedLeftoverRecords { operation_id, count }))
    }

    async fn mark_available(&self, mut machine: Machine) -> ShopFloorResult<Option<Repair>> {
        machine.available = true;
        self.context.machines.save_machine(&machine).await?;
        Ok(Some(Repair::MarkedMachineAvailable { machine_id: machine.id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryShopStore;
    use crate::traits::{MachineStore, OperationStore, ShiftRecordStore};
    use chrono::Utc;
    use shared::{MachineType, Operation, OperationType, ShiftRecord, ShiftRecordId};
    use std::sync::Arc;

    async fn floor() -> (Arc<InMemoryShopStore>, Reconciler) {
        let store = Arc::new(InMemoryShopStore::new());
        for (id, name) in [(1, "T1"), (2, "T2")] {
            store
                .save_machine(&Machine::new(id, name, MachineType::Turning))
                .await
                .unwrap();
        }
        store
            .save_operation(&Operation::new(5, 1, 1, OperationType::Turning, 1.0))
            .await
            .unwrap();
        let reconciler = Reconciler::new(&ShopContext::in_memory(store.clone()));
        (store, reconciler)
    }

    #[tokio::test]
    async fn test_consistent_floor_needs_no_repair() {
        let (store, reconciler) = floor().await;
        store.claim_machine(MachineId(1), OperationId(5), Utc::now()).await.unwrap();
        let mut op = store.get_operation(OperationId(5)).await.unwrap().unwrap();
        op.start_on(MachineId(1), Utc::now());
        store.save_operation(&op).await.unwrap();

        assert!(reconciler.reconcile().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lost_operation_write_is_rolled_forward() {
        let (store, reconciler) = floor().await;
        store.claim_machine(MachineId(1), OperationId(5), Utc::now()).await.unwrap();

        let repairs = reconciler.reconcile().await.unwrap();
        assert_eq!(
            repairs,
            vec![Repair::RestoredAssignment {
                machine_id: MachineId(1),
                operation_id: OperationId(5)
            }]
        );
        let op = store.get_operation(OperationId(5)).await.unwrap().unwrap();
        assert!(op.is_active_on(MachineId(1)));
        assert!(reconciler.reconcile().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orphaned_operation_is_reset() {
        let (store, reconciler) = floor().await;
        let mut op = store.get_operation(OperationId(5)).await.unwrap().unwrap();
        op.start_on(MachineId(2), Utc::now());
        store.save_operation(&op).await.unwrap();

        let repairs = reconciler.reconcile().await.unwrap();
        assert_eq!(repairs, vec![Repair::ResetOrphanedOperation { operation_id: OperationId(5) }]);
        let op = store.get_operation(OperationId(5)).await.unwrap().unwrap();
        assert_eq!(op.status, OperationStatus::Pending);
        assert_eq!(op.assigned_machine_id, None);
    }

    #[tokio::test]
    async fn test_duplicate_holders_keep_named_machine() {
        let (store, reconciler) = floor().await;
        store.claim_machine(MachineId(1), OperationId(5), Utc::now()).await.unwrap();
        // A claim refuses a second holder, so the duplicate is written directly
        let mut t2 = store.get_machine(MachineId(2)).await.unwrap().unwrap();
        t2.occupy(OperationId(5), Utc::now());
        store.save_machine(&t2).await.unwrap();
        let mut op = store.get_operation(OperationId(5)).await.unwrap().unwrap();
        op.start_on(MachineId(2), Utc::now());
        store.save_operation(&op).await.unwrap();

        let repairs = reconciler.reconcile().await.unwrap();
        assert_eq!(
            repairs,
            vec![Repair::ReleasedDuplicateHolder {
                machine_id: MachineId(1),
                operation_id: OperationId(5)
            }]
        );
        let t1 = store.get_machine(MachineId(1)).await.unwrap().unwrap();
        assert!(t1.available);
        assert!(t1.last_freed_at.is_some());
        let t2 = store.get_machine(MachineId(2)).await.unwrap().unwrap();
        assert!(t2.is_holding(OperationId(5)));
    }

    #[tokio::test]
    async fn test_dangling_and_completed_pointers_are_released() {
        let (store, reconciler) = floor().await;
        store.claim_machine(MachineId(1), OperationId(99), Utc::now()).await.unwrap();
        let mut op = store.get_operation(OperationId(5)).await.unwrap().unwrap();
        op.complete(10);
        store.save_operation(&op).await.unwrap();
        store.claim_machine(MachineId(2), OperationId(5), Utc::now()).await.unwrap();

        let repairs = reconciler.reconcile().await.unwrap();
        assert_eq!(repairs.len(), 2);
        assert!(repairs.contains(&Repair::ReleasedStaleMachine {
            machine_id: MachineId(2),
            operation_id: OperationId(5)
        }));
        assert!(repairs.contains(&Repair::ReleasedDanglingMachine {
            machine_id: MachineId(1),
            operation_id: OperationId(99)
        }));
        for machine in store.list_machines().await.unwrap() {
            assert!(machine.available && machine.current_operation_id.is_none());
        }
    }

    #[tokio::test]
    async fn test_unavailable_idle_machine_is_freed() {
        let (store, reconciler) = floor().await;
        let mut t2 = store.get_machine(MachineId(2)).await.unwrap().unwrap();
        t2.available = false;
        store.save_machine(&t2).await.unwrap();

        let repairs = reconciler.reconcile().await.unwrap();
        assert_eq!(repairs, vec![Repair::MarkedMachineAvailable { machine_id: MachineId(2) }]);
    }

    #[tokio::test]
    async fn test_completed_operation_records_are_archived() {
        let (store, reconciler) = floor().await;
        let mut op = store.get_operation(OperationId(5)).await.unwrap().unwrap();
        op.complete(8);
        store.save_operation(&op).await.unwrap();
        store
            .save_shift_record(&ShiftRecord {
                id: ShiftRecordId(1),
                machine_id: Some(MachineId(1)),
                operation_id: Some(OperationId(5)),
                day_quantity: Some(8),
                ..ShiftRecord::default()
            })
            .await
            .unwrap();

        let repairs = reconciler.reconcile().await.unwrap();
        assert_eq!(
            repairs,
            vec![Repair::ArchivedLeftoverRecords {
                operation_id: OperationId(5),
                count: 1
            }]
        );
        assert!(reconciler.reconcile().await.unwrap().is_empty());
    }
}
