//! Test fixtures and data for shop-floor tests
//!
//! Identifiers and dates shared by every scenario so assertions read the
//! same across suites.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use shared::{MachineId, OperationId, OrderId};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Machine names
    pub const T1: &'static str = "T1";
    pub const T2: &'static str = "T2";
    pub const M3: &'static str = "M3";
    pub const M4: &'static str = "M4";

    /// Machine ids, matching the names above
    pub const T1_ID: MachineId = MachineId(1);
    pub const T2_ID: MachineId = MachineId(2);
    pub const M3_ID: MachineId = MachineId(3);
    pub const M4_ID: MachineId = MachineId(4);

    /// Orders
    pub const ORDER_A: OrderId = OrderId(100);
    pub const ORDER_B: OrderId = OrderId(200);
    pub const ORDER_C: OrderId = OrderId(300);

    /// Operations
    pub const OP_5: OperationId = OperationId(5);
    pub const OP_7: OperationId = OperationId(7);
    pub const OP_9: OperationId = OperationId(9);

    /// Instant every fixed clock starts at
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    /// Calendar date `days` after [`TestFixtures::now`]
    pub fn days_from_now(days: i64) -> NaiveDate {
        (Self::now() + Duration::days(days)).date_naive()
    }

    pub fn shift_date() -> NaiveDate {
        Self::now().date_naive()
    }
}
