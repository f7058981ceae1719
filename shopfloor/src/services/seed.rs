//! Seed files for the in-memory store
//!
//! A seed is a JSON snapshot of the four tables plus order documents:
//!
//! ```json
//! {
//!   "machines": [{"id": 1, "name": "T1", "type": "turning", "available": true}],
//!   "orders": [{"id": 1, "drawingNumber": "D-100", "quantity": 10,
//!               "deadline": "2026-11-01", "priority": 1}],
//!   "operations": [{"id": 1, "orderId": 1, "sequenceNumber": 1, "type": "turning",
//!                   "estimatedTimePerUnit": 4.5, "status": "PENDING"}],
//!   "shiftRecords": [],
//!   "documents": [{"orderId": 1, "previewUrl": "/previews/D-100.png"}]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use shared::{
    logging::Component, shop_debug, shop_warn, DocumentRef, Machine, Operation, Order, OrderId,
    ShiftRecord,
};

use crate::error::ShopFloorResult;
use crate::services::{InMemoryShopStore, StaticDocumentSource};
use crate::traits::{MachineStore, OperationStore, OrderStore, ShiftRecordStore};

/// Documents attached to one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocuments {
    pub order_id: OrderId,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Contents of a seed file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedData {
    pub machines: Vec<Machine>,
    pub orders: Vec<Order>,
    pub operations: Vec<Operation>,
    pub shift_records: Vec<ShiftRecord>,
    pub documents: Vec<OrderDocuments>,
}

impl SeedData {
    /// Read and parse a seed file
    pub async fn load(path: &Path) -> ShopFloorResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let seed: SeedData = serde_json::from_str(&content)?;
        shop_debug!(
            Component::Store,
            "📂 Loaded seed {}: {} machines, {} orders, {} operations, {} shift records",
            path.display(),
            seed.machines.len(),
            seed.orders.len(),
            seed.operations.len(),
            seed.shift_records.len()
        );
        Ok(seed)
    }

    /// Current contents of `store`, carrying `documents` over unchanged
    pub async fn capture(store: &InMemoryShopStore, documents: Vec<OrderDocuments>) -> ShopFloorResult<Self> {
        Ok(Self {
            machines: store.list_machines().await?,
            orders: store.all_orders().await,
            operations: store.all_operations().await,
            shift_records: store.all_shift_records().await,
            documents,
        })
    }

    /// Write the seed as pretty JSON, replacing `path` only once the new
    /// content is fully on disk
    pub async fn save(&self, path: &Path) -> ShopFloorResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, path).await?;
        shop_debug!(Component::Store, "💾 Saved seed {}", path.display());
        Ok(())
    }

    /// Insert every row into `store`; uniqueness violations abort the load
    pub async fn apply(&self, store: &InMemoryShopStore) -> ShopFloorResult<()> {
        for machine in &self.machines {
            store.save_machine(machine).await?;
        }
        for order in &self.orders {
            store.save_order(order).await?;
        }
        for operation in &self.operations {
            if !self.orders.iter().any(|o| o.id == operation.order_id) {
                shop_warn!(
                    Component::Store,
                    "⚠️ {} references missing {}",
                    operation.id,
                    operation.order_id
                );
            }
            store.save_operation(operation).await?;
        }
        for record in &self.shift_records {
            store.save_shift_record(record).await?;
        }
        Ok(())
    }

    pub fn document_source(&self) -> StaticDocumentSource {
        let documents: HashMap<OrderId, DocumentRef> = self
            .documents
            .iter()
            .map(|d| {
                (
                    d.order_id,
                    DocumentRef {
                        preview_url: d.preview_url.clone(),
                        file_url: d.file_url.clone(),
                    },
                )
            })
            .collect();
        StaticDocumentSource::new(documents)
    }
}
