//! Name-based entry points over the lifecycle components
//!
//! Callers address machines by name. Every mutating call returns the
//! machine as it looks after the write, reloaded from the store.

use shared::{
    logging::Component, shop_info, shop_warn, CompletionAction, CompletionCheck, CompletionFinding,
    Machine, MachineId, MachineView, OperationId, OperationSummary, Recommendation,
};

use crate::context::ShopContext;
use crate::core::{CompletionDetector, PlanningRecommender, ScanReport};
use crate::error::{ShopFloorError, ShopFloorResult};
use crate::lifecycle::AssignmentOrchestrator;
use crate::reconcile::{Reconciler, Repair};

#[derive(Clone)]
pub struct ShopFloor {
    context: ShopContext,
    orchestrator: AssignmentOrchestrator,
    detector: CompletionDetector,
    planner: PlanningRecommender,
    reconciler: Reconciler,
}

impl ShopFloor {
    pub fn new(context: ShopContext) -> Self {
        Self {
            orchestrator: AssignmentOrchestrator::new(&context),
            detector: CompletionDetector::new(&context),
            planner: PlanningRecommender::new(&context),
            reconciler: Reconciler::new(&context),
            context,
        }
    }

    pub fn context(&self) -> &ShopContext {
        &self.context
    }

    pub fn orchestrator(&self) -> &AssignmentOrchestrator {
        &self.orchestrator
    }

    pub fn detector(&self) -> &CompletionDetector {
        &self.detector
    }

    /// Start `operation_id` on the named machine
    pub async fn assign_operation(&self, machine_name: &str, operation_id: OperationId) -> ShopFloorResult<MachineView> {
        let machine = self.find_machine(machine_name).await?;
        self.orchestrator.assign(operation_id, machine.id).await?;
        self.machine_view(machine.id).await
    }

    /// Progress of whatever the named machine is running, counted on that
    /// machine. An idle machine yields a zeroed check.
    pub async fn check_operation_completion(&self, machine_name: &str) -> ShopFloorResult<CompletionCheck> {
        let machine = self.find_machine(machine_name).await?;
        let Some(operation_id) = machine.current_operation_id else {
            return Ok(CompletionCheck::idle());
        };
        let operation = self
            .context
            .operations
            .get_operation(operation_id)
            .await?
            .ok_or_else(|| ShopFloorError::not_found("Operation", operation_id))?;

        self.detector.evaluate_on(&operation, Some(machine.id)).await
    }

    /// Act on a completion prompt for the named machine's current operation
    ///
    /// `Complete` closes the operation with the quantity produced on this
    /// machine, `Continue` writes nothing, `PlanNew` sends the operation back
    /// to planning.
    pub async fn complete_operation(
        &self,
        machine_name: &str,
        action: CompletionAction,
    ) -> ShopFloorResult<MachineView> {
        let machine = self.find_machine(machine_name).await?;
        let operation_id = machine.current_operation_id.ok_or_else(|| {
            ShopFloorError::conflict(format!("{} has no current operation", machine.name))
        })?;

        match action {
            CompletionAction::Complete => {
                let check = self.check_operation_completion(&machine.name).await?;
                let quantity = u32::try_from(check.total_produced).unwrap_or(u32::MAX);
                self.orchestrator.close(operation_id, quantity).await?;
            }
            CompletionAction::Continue => {
                self.orchestrator.continue_operation(operation_id).await?;
            }
            CompletionAction::PlanNew => {
                self.orchestrator.plan_new(operation_id).await?;
            }
        }

        self.machine_view(machine.id).await
    }

    /// Ranked candidates for the named machine
    pub async fn plan_operations_for_machine(&self, machine_name: &str) -> ShopFloorResult<Vec<Recommendation>> {
        self.planner.recommend(machine_name).await
    }

    /// Active operations that have reached their target
    pub async fn check_all_active_operations(&self) -> ShopFloorResult<Vec<CompletionFinding>> {
        let report = self.scan().await?;
        let completed = report.completed();
        if !completed.is_empty() {
            shop_info!(
                Component::Detector,
                "🏁 {} operation(s) ready to close",
                completed.len()
            );
        }
        Ok(completed)
    }

    /// Full detector pass, including unfinished and skipped operations
    pub async fn scan(&self) -> ShopFloorResult<ScanReport> {
        self.detector.scan_active().await
    }

    /// Take `operation_id` off the named machine without archiving anything
    pub async fn unassign_operation(
        &self,
        machine_name: &str,
        operation_id: OperationId,
    ) -> ShopFloorResult<MachineView> {
        let machine = self.find_machine(machine_name).await?;
        self.orchestrator.unassign(operation_id, machine.id).await?;
        self.machine_view(machine.id).await
    }

    pub async fn reconcile(&self) -> ShopFloorResult<Vec<Repair>> {
        self.reconciler.reconcile().await
    }

    /// Current state of a machine with its operation details
    pub async fn machine_view(&self, machine_id: MachineId) -> ShopFloorResult<MachineView> {
        let machine = self
            .context
            .machines
            .get_machine(machine_id)
            .await?
            .ok_or_else(|| ShopFloorError::not_found("Machine", machine_id))?;

        let Some(operation_id) = machine.current_operation_id else {
            return Ok(MachineView::new(&machine, None));
        };
        let Some(operation) = self.context.operations.get_operation(operation_id).await? else {
            shop_warn!(
                Component::Assignment,
                "⚠️ {} points at missing {}",
                machine.name,
                operation_id
            );
            return Ok(MachineView::new(&machine, None));
        };
        let order = self.context.orders.get_order(operation.order_id).await?;

        Ok(MachineView::new(
            &machine,
            Some(OperationSummary::new(&operation, order.as_ref())),
        ))
    }

    pub async fn find_machine(&self, machine_name: &str) -> ShopFloorResult<Machine> {
        self.context
            .machines
            .find_machine_by_name(machine_name)
            .await?
            .ok_or_else(|| ShopFloorError::not_found("Machine", machine_name))
    }
}
