//! Assignment orchestration
//!
//! Moves operations through PENDING → IN_PROGRESS → COMPLETED/PENDING while
//! keeping the machine registry and the operation table pointing at each
//! other. There is no transaction spanning both aggregates, so every call
//! writes the machine first, then the operation, and reports the outcome of
//! each write in a [`SyncReport`]. A failed second write surfaces as
//! [`ShopFloorError::PartialSyncFailure`]; the [`crate::Reconciler`] repairs
//! the resulting drift on its next pass.

use chrono::{DateTime, Utc};

use shared::{
    logging::Component, shop_debug, shop_error, shop_info, shop_warn, CompletionCheck, Machine,
    MachineId, Operation, OperationId, OperationStatus, SyncReport, WriteStatus,
};

use crate::context::ShopContext;
use crate::core::{is_compatible, CompletionDetector};
use crate::error::{ShopFloorError, ShopFloorResult};
use crate::traits::ClaimOutcome;

/// How a closed operation leaves the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closure {
    /// Finished batch with a recorded quantity
    Completed(u32),
    /// Count discarded, operation back to planning
    Replan,
}

/// Lifecycle state machine over the injected stores
#[derive(Clone)]
pub struct AssignmentOrchestrator {
    context: ShopContext,
    detector: CompletionDetector,
}

impl AssignmentOrchestrator {
    pub fn new(context: &ShopContext) -> Self {
        Self {
            context: context.clone(),
            detector: CompletionDetector::new(context),
        }
    }

    /// Put `operation_id` on `machine_id`
    ///
    /// Re-assigning an operation to the machine already running it is a
    /// no-op. A machine busy with another active operation, an operation
    /// running elsewhere, or a completed operation is a Conflict.
    pub async fn assign(&self, operation_id: OperationId, machine_id: MachineId) -> ShopFloorResult<SyncReport> {
        let machine = self.load_machine(machine_id).await?;
        let mut operation = self.load_operation(operation_id).await?;

        if machine.is_holding(operation_id) && operation.is_active_on(machine_id) {
            shop_debug!(Component::Assignment, "{} already runs on {}", operation_id, machine.name);
            return Ok(SyncReport::unchanged());
        }

        let now = self.context.clock.now();
        self.ensure_operation_assignable(&operation, machine_id).await?;
        self.check_compatibility(&machine, &operation)?;
        self.ensure_machine_free_for(&machine, operation_id, now).await?;

        let mut report = SyncReport::skipped();

        report.machine = match self.context.machines.claim_machine(machine_id, operation_id, now).await? {
            ClaimOutcome::Claimed => WriteStatus::Applied,
            ClaimOutcome::AlreadyHeld => WriteStatus::Unchanged,
            ClaimOutcome::Busy { current } => {
                return Err(ShopFloorError::conflict(format!(
                    "{} was taken before it could be claimed (now holding {})",
                    machine.name,
                    describe(current)
                )));
            }
            ClaimOutcome::HeldElsewhere { machine_id: holder } => {
                return Err(ShopFloorError::conflict(format!(
                    "{} was claimed by {} in the meantime",
                    operation_id, holder
                )));
            }
        };

        operation.start_on(machine_id, now);
        if let Err(e) = self.context.operations.save_operation(&operation).await {
            report.operation = WriteStatus::Failed(e.to_string());
            return Err(self.partial_failure(operation_id, Some(machine_id), report));
        }
        report.operation = WriteStatus::Applied;

        shop_info!(Component::Assignment, "🔧 {} assigned to {}", operation_id, machine.name);
        Ok(report)
    }

    /// Record a finished batch: free the machine, mark the operation
    /// COMPLETED with `completed_quantity` and archive its shift records
    pub async fn close(&self, operation_id: OperationId, completed_quantity: u32) -> ShopFloorResult<SyncReport> {
        if completed_quantity == 0 {
            shop_warn!(Component::Assignment, "⚠️ Closing {} with zero quantity", operation_id);
        }
        self.finish(operation_id, Closure::Completed(completed_quantity)).await
    }

    /// Dismiss a completion prompt; nothing is written
    pub async fn continue_operation(&self, operation_id: OperationId) -> ShopFloorResult<CompletionCheck> {
        let operation = self.load_operation(operation_id).await?;
        let check = self.detector.evaluate(&operation).await?;
        shop_info!(
            Component::Assignment,
            "▶️ {} continues at {}/{}",
            operation_id,
            check.total_produced,
            check.target_quantity
        );
        Ok(check)
    }

    /// Discard the accumulated count: free the machine, send the operation
    /// back to PENDING and archive its shift records
    pub async fn plan_new(&self, operation_id: OperationId) -> ShopFloorResult<SyncReport> {
        self.finish(operation_id, Closure::Replan).await
    }

    /// Cancel an assignment without touching shift records
    ///
    /// A machine with a stale pointer to an operation that runs on another
    /// machine is released, and the operation is left where it runs.
    pub async fn unassign(&self, operation_id: OperationId, machine_id: MachineId) -> ShopFloorResult<SyncReport> {
        let machine = self.load_machine(machine_id).await?;
        let mut operation = self.load_operation(operation_id).await?;

        let holds = machine.is_holding(operation_id);
        if !holds && operation.assigned_machine_id != Some(machine_id) {
            return Err(ShopFloorError::conflict(format!(
                "{} is not assigned to {}",
                operation_id, machine.name
            )));
        }
        if operation.status == OperationStatus::Completed {
            return Err(ShopFloorError::conflict(format!("{operation_id} is already completed")));
        }

        let now = self.context.clock.now();
        let mut report = SyncReport::skipped();

        if holds {
            self.context.machines.release_machine(machine_id, now).await?;
            report.machine = WriteStatus::Applied;
        }

        if let Some(elsewhere) = operation.assigned_machine_id.filter(|m| *m != machine_id) {
            shop_warn!(
                Component::Assignment,
                "⚠️ {} released a stale pointer to {}, which runs on {}",
                machine.name,
                operation_id,
                elsewhere
            );
            return Ok(report);
        }

        operation.reset_to_pending();
        if let Err(e) = self.context.operations.save_operation(&operation).await {
            report.operation = WriteStatus::Failed(e.to_string());
            return Err(self.partial_failure(operation_id, Some(machine_id), report));
        }
        report.operation = WriteStatus::Applied;

        shop_info!(Component::Assignment, "↩️ {} unassigned from {}", operation_id, machine.name);
        Ok(report)
    }

    /// Machine currently responsible for `operation`: the one it names, or
    /// failing that, one that holds it
    pub async fn holding_machine(&self, operation: &Operation) -> ShopFloorResult<Option<Machine>> {
        if let Some(machine_id) = operation.assigned_machine_id {
            if let Some(machine) = self.context.machines.get_machine(machine_id).await? {
                return Ok(Some(machine));
            }
            shop_warn!(
                Component::Assignment,
                "⚠️ {} names missing {}",
                operation.id,
                machine_id
            );
        }
        let holders = self.context.machines.find_machines_holding(operation.id).await?;
        Ok(holders.into_iter().next())
    }

    /// Free the machine, save the operation, then archive its shift records
    ///
    /// Archiving comes last so a failed write never hides the count of an
    /// operation that is still running. A failed operation write leaves an
    /// orphan the Reconciler resets; a failed archive leaves records the
    /// Reconciler archives (closed operations) or a retried plan-new
    /// archives (replanned ones).
    async fn finish(&self, operation_id: OperationId, closure: Closure) -> ShopFloorResult<SyncReport> {
        let mut operation = self.load_operation(operation_id).await?;
        if operation.status == OperationStatus::Completed {
            return Err(ShopFloorError::conflict(format!("{operation_id} is already completed")));
        }

        let machine = self.holding_machine(&operation).await?;
        let machine_id = machine.as_ref().map(|m| m.id);
        let now = self.context.clock.now();
        let mut report = SyncReport::skipped();

        match &machine {
            Some(m) if m.is_holding(operation_id) => {
                if let Err(e) = self.context.machines.release_machine(m.id, now).await {
                    report.machine = WriteStatus::Failed(e.to_string());
                    return Err(self.partial_failure(operation_id, machine_id, report));
                }
                report.machine = WriteStatus::Applied;
            }
            Some(m) => {
                shop_warn!(
                    Component::Assignment,
                    "⚠️ {} is linked to {} but the machine holds {}; leaving it occupied",
                    operation_id,
                    m.name,
                    describe(m.current_operation_id)
                );
            }
            None => {
                shop_debug!(Component::Assignment, "{} has no machine to free", operation_id);
            }
        }

        match closure {
            Closure::Completed(quantity) => operation.complete(quantity),
            Closure::Replan => operation.reset_to_pending(),
        }
        if let Err(e) = self.context.operations.save_operation(&operation).await {
            report.operation = WriteStatus::Failed(e.to_string());
            return Err(self.partial_failure(operation_id, machine_id, report));
        }
        report.operation = WriteStatus::Applied;

        match self
            .context
            .shifts
            .archive_shift_records(operation_id, machine_id, now)
            .await
        {
            Ok(count) => {
                report.archive = WriteStatus::Applied;
                report.archived_records = count;
            }
            Err(e) => {
                report.archive = WriteStatus::Failed(e.to_string());
                return Err(self.partial_failure(operation_id, machine_id, report));
            }
        }

        match closure {
            Closure::Completed(quantity) => {
                shop_info!(
                    Component::Assignment,
                    "✅ {} completed with {} units ({} shift records archived)",
                    operation_id,
                    quantity,
                    report.archived_records
                );
            }
            Closure::Replan => {
                shop_info!(
                    Component::Assignment,
                    "🔁 {} returned to planning ({} shift records archived)",
                    operation_id,
                    report.archived_records
                );
            }
        }
        Ok(report)
    }

    /// Conflict when the machine runs another active operation; a stale
    /// pointer to an inactive or missing operation is cleared first
    async fn ensure_machine_free_for(
        &self,
        machine: &Machine,
        operation_id: OperationId,
        now: DateTime<Utc>,
    ) -> ShopFloorResult<()> {
        let Some(current) = machine.current_operation_id.filter(|c| *c != operation_id) else {
            return Ok(());
        };

        match self.context.operations.get_operation(current).await? {
            Some(other) if other.is_active() => Err(ShopFloorError::conflict(format!(
                "{} is busy with {}; unassign it first",
                machine.name, current
            ))),
            _ => {
                shop_warn!(
                    Component::Assignment,
                    "⚠️ {} pointed at inactive {}, releasing",
                    machine.name,
                    current
                );
                self.context.machines.release_machine(machine.id, now).await?;
                Ok(())
            }
        }
    }

    async fn ensure_operation_assignable(&self, operation: &Operation, machine_id: MachineId) -> ShopFloorResult<()> {
        match operation.status {
            OperationStatus::Completed => {
                return Err(ShopFloorError::conflict(format!("{} is already completed", operation.id)));
            }
            OperationStatus::InProgress => {
                if let Some(elsewhere) = operation.assigned_machine_id.filter(|m| *m != machine_id) {
                    return Err(ShopFloorError::conflict(format!(
                        "{} is already in progress on {}",
                        operation.id, elsewhere
                    )));
                }
            }
            OperationStatus::Pending | OperationStatus::OnHold => {}
        }

        let holders = self.context.machines.find_machines_holding(operation.id).await?;
        if let Some(other) = holders.iter().find(|m| m.id != machine_id) {
            return Err(ShopFloorError::conflict(format!(
                "{} is already held by {}",
                operation.id, other.name
            )));
        }
        Ok(())
    }

    fn check_compatibility(&self, machine: &Machine, operation: &Operation) -> ShopFloorResult<()> {
        if is_compatible(machine.machine_type, operation.operation_type) {
            return Ok(());
        }
        if self.context.config.enforce_compatibility_on_assign {
            return Err(ShopFloorError::Incompatible {
                machine_type: machine.machine_type.to_string(),
                operation_type: operation.operation_type.to_string(),
            });
        }
        shop_warn!(
            Component::Assignment,
            "⚠️ {} ({}) assigned to {} ({}) despite incompatible types",
            operation.id,
            operation.operation_type,
            machine.name,
            machine.machine_type
        );
        Ok(())
    }

    fn partial_failure(
        &self,
        operation_id: OperationId,
        machine_id: Option<MachineId>,
        report: SyncReport,
    ) -> ShopFloorError {
        shop_error!(
            Component::Assignment,
            "❌ Partial synchronization for {}: {}",
            operation_id,
            report
        );
        ShopFloorError::PartialSyncFailure {
            operation_id,
            machine_id,
            report,
        }
    }

    async fn load_machine(&self, id: MachineId) -> ShopFloorResult<Machine> {
        self.context
            .machines
            .get_machine(id)
            .await?
            .ok_or_else(|| ShopFloorError::not_found("Machine", id))
    }

    async fn load_operation(&self, id: OperationId) -> ShopFloorResult<Operation> {
        self.context
            .operations
            .get_operation(id)
            .await?
            .ok_or_else(|| ShopFloorError::not_found("Operation", id))
    }
}

fn describe(operation_id: Option<OperationId>) -> String {
    operation_id.map_or_else(|| "nothing".to_string(), |id| id.to_string())
}
