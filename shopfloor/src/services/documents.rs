//! Document metadata collaborators

use async_trait::async_trait;
use std::collections::HashMap;

use shared::{DocumentRef, OrderId};

use crate::error::ShopFloorResult;
use crate::traits::DocumentSource;

/// Document source for deployments without a document store
pub struct NoDocuments;

#[async_trait]
impl DocumentSource for NoDocuments {
    async fn documents_for_order(&self, _order_id: OrderId) -> ShopFloorResult<Option<DocumentRef>> {
        Ok(None)
    }
}

/// Fixed order-to-documents table, typically loaded from a seed file
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentSource {
    documents: HashMap<OrderId, DocumentRef>,
}

impl StaticDocumentSource {
    pub fn new(documents: HashMap<OrderId, DocumentRef>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentSource for StaticDocumentSource {
    async fn documents_for_order(&self, order_id: OrderId) -> ShopFloorResult<Option<DocumentRef>> {
        Ok(self.documents.get(&order_id).cloned())
    }
}
