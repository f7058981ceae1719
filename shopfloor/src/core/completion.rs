//! Completion detection over active operations

use std::sync::Arc;

use shared::{
    logging::Component, shop_debug, shop_warn, CompletionCheck, CompletionFinding, MachineId,
    Operation, OperationId, OperationStatus,
};

use crate::context::ShopContext;
use crate::core::ProgressAggregator;
use crate::error::{ShopFloorError, ShopFloorResult};
use crate::traits::{OperationStore, OrderStore};

/// An active operation the scan could not evaluate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOperation {
    pub operation_id: OperationId,
    pub reason: String,
}

/// Result of one pass over the active operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// One finding per evaluated operation, finished or not
    pub findings: Vec<CompletionFinding>,
    pub skipped: Vec<SkippedOperation>,
}

impl ScanReport {
    /// Findings whose operations have really reached their target
    pub fn completed(&self) -> Vec<CompletionFinding> {
        self.findings.iter().filter(|f| f.is_completed()).cloned().collect()
    }
}

/// Compares accumulated shift output against order targets
#[derive(Clone)]
pub struct CompletionDetector {
    operations: Arc<dyn OperationStore>,
    orders: Arc<dyn OrderStore>,
    progress: ProgressAggregator,
}

impl CompletionDetector {
    pub fn new(context: &ShopContext) -> Self {
        Self {
            operations: context.operations.clone(),
            orders: context.orders.clone(),
            progress: ProgressAggregator::new(context.shifts.clone()),
        }
    }

    /// Completion state of `operation`, counting output on its assigned
    /// machine only (or everywhere when unassigned)
    pub async fn evaluate(&self, operation: &Operation) -> ShopFloorResult<CompletionCheck> {
        self.evaluate_on(operation, operation.assigned_machine_id).await
    }

    /// Completion state of `operation` counting output on `machine_id` only
    pub async fn evaluate_on(
        &self,
        operation: &Operation,
        machine_id: Option<MachineId>,
    ) -> ShopFloorResult<CompletionCheck> {
        Ok(self.finding(operation, machine_id).await?.check)
    }

    async fn finding(&self, operation: &Operation, machine_id: Option<MachineId>) -> ShopFloorResult<CompletionFinding> {
        let order = self
            .orders
            .get_order(operation.order_id)
            .await?
            .ok_or_else(|| ShopFloorError::not_found("Order", operation.order_id))?;
        let progress = self
            .progress
            .progress(operation.id, machine_id)
            .await?;

        Ok(CompletionFinding {
            operation_id: operation.id,
            order_id: order.id,
            machine_id,
            drawing_number: order.drawing_number,
            check: CompletionCheck::evaluate(operation.id, u64::from(order.quantity), &progress),
        })
    }

    /// Evaluate every in-progress operation
    ///
    /// Listing the active set is the only fatal step. An operation that
    /// disappears mid-scan, or whose order is missing, is skipped with a
    /// warning and the scan carries on.
    pub async fn scan_active(&self) -> ShopFloorResult<ScanReport> {
        let active = self
            .operations
            .list_operations_by_status(OperationStatus::InProgress)
            .await?;
        let mut report = ScanReport::default();

        for listed in active {
            let operation = match self.operations.get_operation(listed.id).await {
                Ok(Some(op)) if op.is_active() => op,
                Ok(Some(_)) => {
                    shop_debug!(Component::Detector, "{} left IN_PROGRESS during scan", listed.id);
                    continue;
                }
                Ok(None) => {
                    shop_warn!(Component::Detector, "⚠️ {} disappeared during scan, skipping", listed.id);
                    report.skipped.push(SkippedOperation {
                        operation_id: listed.id,
                        reason: "operation no longer exists".to_string(),
                    });
                    continue;
                }
                Err(e) => {
                    shop_warn!(Component::Detector, "⚠️ Could not reload {}: {}", listed.id, e);
                    report.skipped.push(SkippedOperation {
                        operation_id: listed.id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.finding(&operation, operation.assigned_machine_id).await {
                Ok(finding) => {
                    if finding.is_completed() {
                        shop_debug!(
                            Component::Detector,
                            "🏁 {} reached {}/{}",
                            operation.id,
                            finding.check.total_produced,
                            finding.check.target_quantity
                        );
                    }
                    report.findings.push(finding);
                }
                Err(e) => {
                    shop_warn!(Component::Detector, "⚠️ Skipping {}: {}", operation.id, e);
                    report.skipped.push(SkippedOperation {
                        operation_id: operation.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
