//! Tests for document sources and clocks

use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;

use shared::{DocumentRef, OrderId};

use crate::services::{FixedClock, NoDocuments, StaticDocumentSource};
use crate::traits::{Clock, DocumentSource};

#[test]
fn test_no_documents_is_always_empty() {
    let documents = tokio_test::block_on(NoDocuments.documents_for_order(OrderId(1))).unwrap();
    assert!(documents.is_none());
}

#[tokio::test]
async fn test_static_documents_lookup() {
    let mut table = HashMap::new();
    table.insert(
        OrderId(4),
        DocumentRef {
            preview_url: Some("/p/4.png".into()),
            file_url: Some("/f/4.pdf".into()),
        },
    );
    let source = StaticDocumentSource::new(table);

    assert!(!source.is_empty());
    let documents = source.documents_for_order(OrderId(4)).await.unwrap().unwrap();
    assert_eq!(documents.file_url.as_deref(), Some("/f/4.pdf"));
    assert!(source.documents_for_order(OrderId(5)).await.unwrap().is_none());
}

#[test]
fn test_fixed_clock_advances() {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let clock = FixedClock::new(start);
    assert_eq!(clock.now(), start);

    clock.advance(Duration::minutes(90));
    assert_eq!(clock.now(), start + Duration::minutes(90));
}
