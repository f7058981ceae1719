//! Service-specific tests
//!
//! Each service has its own test file; shared builders live in `common`.

#[cfg(test)]
mod documents;

#[cfg(test)]
pub mod common {
    use chrono::NaiveDate;
    use shared::{Order, OrderId, OrderStatus, Priority, ShiftRecord, ShiftRecordId};

    pub fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("valid test date")
    }

    pub fn order(id: u64, drawing: &str, priority: Priority, deadline_day: u32) -> Order {
        Order {
            id: OrderId(id),
            drawing_number: drawing.to_string(),
            quantity: 10,
            deadline: day(deadline_day),
            priority,
            status: OrderStatus::Open,
        }
    }

    pub fn shift(id: u64, operation: u64, machine: u64, date: u32, day_qty: u32, night_qty: u32) -> ShiftRecord {
        ShiftRecord {
            id: ShiftRecordId(id),
            date: day(date),
            machine_id: Some(machine.into()),
            operation_id: Some(operation.into()),
            day_quantity: Some(day_qty),
            night_quantity: Some(night_qty),
            ..ShiftRecord::default()
        }
    }
}
