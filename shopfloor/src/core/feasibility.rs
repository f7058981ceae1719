//! Deadline feasibility of starting an operation now

use chrono::{DateTime, Duration, Utc};
use shared::{logging::Component, shop_warn, Feasibility, Operation, Order};

/// Estimate when `operation` would finish if started at `now`
///
/// Run time is `estimated_time_per_unit * quantity` rounded up to whole
/// minutes, plus `setup_minutes`. The margin is the signed distance from
/// the estimate to the deadline (start of the deadline day, UTC). An
/// estimate past the representable calendar saturates at its end and
/// misses the deadline.
pub fn estimate(operation: &Operation, order: &Order, now: DateTime<Utc>, setup_minutes: i64) -> Feasibility {
    let per_unit = operation.estimated_time_per_unit.max(0.0);
    let run_minutes = (per_unit * f64::from(order.quantity)).ceil() as i64;
    let total_minutes = run_minutes.saturating_add(setup_minutes.max(0));
    let deadline = order.deadline_at();

    let Some(estimated_completion) = Duration::try_minutes(total_minutes).and_then(|d| now.checked_add_signed(d))
    else {
        shop_warn!(
            Component::Planner,
            "⚠️ {} on order {} needs {} minutes, beyond any deadline",
            operation.id,
            order.id,
            total_minutes
        );
        let estimated_completion = DateTime::<Utc>::MAX_UTC;
        return Feasibility {
            total_minutes,
            estimated_completion,
            will_meet_deadline: false,
            time_margin_minutes: (deadline - estimated_completion).num_minutes(),
        };
    };

    Feasibility {
        total_minutes,
        estimated_completion,
        will_meet_deadline: estimated_completion <= deadline,
        time_margin_minutes: (deadline - estimated_completion).num_minutes(),
    }
}
