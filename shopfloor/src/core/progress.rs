//! Shift production aggregation

use std::sync::Arc;

use shared::{logging::Component, shop_debug, MachineId, OperationId, ProgressSummary, ShiftRecord};

use crate::error::ShopFloorResult;
use crate::traits::{ShiftFilter, ShiftRecordStore};

/// Sums non-archived shift output per operation
#[derive(Clone)]
pub struct ProgressAggregator {
    shifts: Arc<dyn ShiftRecordStore>,
}

impl ProgressAggregator {
    pub fn new(shifts: Arc<dyn ShiftRecordStore>) -> Self {
        Self { shifts }
    }

    /// Total day+night output of `operation_id`, restricted to `machine_id`
    /// when given. Archived records never count.
    pub async fn progress(
        &self,
        operation_id: OperationId,
        machine_id: Option<MachineId>,
    ) -> ShopFloorResult<ProgressSummary> {
        let filter = ShiftFilter::active_for(operation_id).on_machine(machine_id);
        let records = self.shifts.list_shift_records(&filter).await?;
        let summary = summarize(&records);

        shop_debug!(
            Component::Progress,
            "{} produced {} over {} records",
            operation_id,
            summary.total_produced,
            summary.record_count
        );
        Ok(summary)
    }
}

/// Fold shift records into a progress summary; archived records are ignored
pub fn summarize(records: &[ShiftRecord]) -> ProgressSummary {
    records
        .iter()
        .filter(|r| !r.archived)
        .fold(ProgressSummary::default(), |mut summary, record| {
            summary.total_produced += record.produced();
            summary.record_count += 1;
            summary.last_update_date = summary.last_update_date.max(Some(record.date));
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryShopStore;
    use chrono::NaiveDate;
    use shared::ShiftRecordId;

    fn record(id: u64, op: u64, machine: u64, day: Option<u32>, night: Option<u32>, date: u32) -> ShiftRecord {
        ShiftRecord {
            id: ShiftRecordId(id),
            date: NaiveDate::from_ymd_opt(2026, 3, date).unwrap(),
            operation_id: Some(OperationId(op)),
            machine_id: Some(MachineId(machine)),
            day_quantity: day,
            night_quantity: night,
            ..ShiftRecord::default()
        }
    }

    async fn aggregator_with(records: Vec<ShiftRecord>) -> ProgressAggregator {
        let store = Arc::new(InMemoryShopStore::new());
        for r in &records {
            store.save_shift_record(r).await.unwrap();
        }
        ProgressAggregator::new(store)
    }

    #[test]
    fn test_summarize_skips_archived_and_missing_fields() {
        let mut archived = record(3, 7, 3, Some(100), None, 1);
        archived.archived = true;
        let summary = summarize(&[
            record(1, 7, 3, Some(8), None, 2),
            record(2, 7, 3, None, Some(5), 4),
            archived,
        ]);

        assert_eq!(summary.total_produced, 13);
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.last_update_date, NaiveDate::from_ymd_opt(2026, 3, 4));
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), ProgressSummary::default());
    }

    #[tokio::test]
    async fn test_progress_scoped_by_machine() {
        let aggregator = aggregator_with(vec![
            record(1, 7, 3, Some(8), Some(5), 2),
            record(2, 7, 4, Some(2), None, 3),
            record(3, 8, 3, Some(50), None, 3),
        ])
        .await;

        let on_machine = aggregator.progress(OperationId(7), Some(MachineId(3))).await.unwrap();
        assert_eq!(on_machine.total_produced, 13);

        let anywhere = aggregator.progress(OperationId(7), None).await.unwrap();
        assert_eq!(anywhere.total_produced, 15);
        assert_eq!(anywhere.record_count, 2);
    }

    #[tokio::test]
    async fn test_progress_is_repeatable() {
        let aggregator = aggregator_with(vec![record(1, 7, 3, Some(4), Some(4), 2)]).await;
        let first = aggregator.progress(OperationId(7), None).await.unwrap();
        let second = aggregator.progress(OperationId(7), None).await.unwrap();
        assert_eq!(first, second);
    }
}
