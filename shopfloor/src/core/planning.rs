//! Planning recommendations for idle machines
//!
//! The recommender balances urgency across priority tiers: it takes the most
//! pressing open order of each tier, keeps only the first operation of each
//! (later operations wait on their predecessors), drops what the machine
//! cannot run, and ranks the rest. Each pass is recomputed from the stores
//! and written to the snapshot log for audit.

use std::cmp::Ordering;

use shared::{
    logging::Component, shop_debug, shop_info, shop_warn, DocumentRef, Machine, Operation,
    OperationStatus, Order, PlanningSnapshot, Priority, Recommendation,
};

use crate::context::ShopContext;
use crate::core::{estimate, is_compatible};
use crate::error::{ShopFloorError, ShopFloorResult};

/// Proposes candidate operations for a free machine
#[derive(Clone)]
pub struct PlanningRecommender {
    context: ShopContext,
}

impl PlanningRecommender {
    pub fn new(context: &ShopContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Up to `max_recommendations` compatible first operations for the named
    /// machine, most urgent first. An occupied machine gets an empty list.
    pub async fn recommend(&self, machine_name: &str) -> ShopFloorResult<Vec<Recommendation>> {
        let machine = self
            .context
            .machines
            .find_machine_by_name(machine_name)
            .await?
            .ok_or_else(|| ShopFloorError::not_found("Machine", machine_name))?;

        if !machine.available || machine.current_operation_id.is_some() {
            shop_debug!(Component::Planner, "{} is occupied, nothing to plan", machine.name);
            return Ok(Vec::new());
        }

        let mut open_orders = self.context.orders.list_open_orders().await?;
        open_orders.retain(Order::is_open);
        open_orders.sort_by(urgency);

        let mut candidates: Vec<(Order, Operation)> = Vec::new();
        for order in pick_per_tier(&open_orders) {
            let Some(first) = self.first_pending_operation(&order).await? else {
                shop_debug!(Component::Planner, "{} has no pending first operation", order.id);
                continue;
            };
            if !is_compatible(machine.machine_type, first.operation_type) {
                shop_debug!(
                    Component::Planner,
                    "{} ({}) is not compatible with {} ({})",
                    first.id,
                    first.operation_type,
                    machine.name,
                    machine.machine_type
                );
                continue;
            }
            candidates.push((order, first));
        }

        candidates.sort_by(|(a, _), (b, _)| urgency(a, b));
        candidates.truncate(self.context.config.max_recommendations);

        let now = self.context.clock.now();
        let mut recommendations = Vec::with_capacity(candidates.len());
        for (order, operation) in candidates {
            let documents = self.documents_for(&order).await;
            let feasibility = estimate(&operation, &order, now, self.context.config.setup_minutes);
            recommendations.push(Recommendation {
                operation_id: operation.id,
                order_id: order.id,
                drawing_number: order.drawing_number,
                sequence_number: operation.sequence_number,
                operation_type: operation.operation_type,
                estimated_time_per_unit: operation.estimated_time_per_unit,
                quantity: order.quantity,
                priority: order.priority,
                deadline: order.deadline,
                documents,
                feasibility,
            });
        }

        self.record_snapshot(&machine, now, &recommendations).await;
        shop_info!(
            Component::Planner,
            "📋 {} candidate(s) for {}",
            recommendations.len(),
            machine.name
        );
        Ok(recommendations)
    }

    async fn first_pending_operation(&self, order: &Order) -> ShopFloorResult<Option<Operation>> {
        let operations = self.context.operations.list_operations_for_order(order.id).await?;
        Ok(operations
            .into_iter()
            .find(|op| op.sequence_number == 1 && op.status == OperationStatus::Pending))
    }

    async fn documents_for(&self, order: &Order) -> DocumentRef {
        match self.context.documents.documents_for_order(order.id).await {
            Ok(documents) => documents.unwrap_or_default(),
            Err(e) => {
                shop_warn!(Component::Planner, "⚠️ No documents for {}: {}", order.id, e);
                DocumentRef::default()
            }
        }
    }

    async fn record_snapshot(&self, machine: &Machine, now: chrono::DateTime<chrono::Utc>, entries: &[Recommendation]) {
        let snapshot = PlanningSnapshot::new(machine.id, now, entries.to_vec());
        if let Err(e) = self.context.snapshots.record_snapshot(&snapshot).await {
            shop_warn!(
                Component::Planner,
                "⚠️ Planning snapshot for {} not recorded: {}",
                machine.name,
                e
            );
        }
    }
}

/// Priority first, then deadline, then order id
fn urgency(a: &Order, b: &Order) -> Ordering {
    (a.priority, a.deadline, a.id).cmp(&(b.priority, b.deadline, b.id))
}

/// The most urgent order of each priority tier, in tier order
///
/// `orders` must already be sorted by [`urgency`].
fn pick_per_tier(orders: &[Order]) -> Vec<Order> {
    Priority::ALL
        .iter()
        .filter_map(|tier| orders.iter().find(|o| o.priority == *tier).cloned())
        .collect()
}
