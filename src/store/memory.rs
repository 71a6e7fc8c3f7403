use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderRecord, OrderStore, StoreError, SubmissionCounter};
use crate::domain::order::SubmissionNumber;

/// Process-local store. Records live as long as the process.
#[derive(Default)]
pub struct InMemoryOrderStore {
    records: RwLock<HashMap<Uuid, OrderRecord>>,
    counter: SubmissionCounter,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(counter: SubmissionCounter) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            counter,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, mut record: OrderRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        if let Some(existing) = records.get(&record.order_id) {
            if existing.is_submitted() {
                return Err(StoreError::Immutable(record.order_id));
            }
            record.created_at = existing.created_at;
        }

        tracing::debug!(
            order_id = %record.order_id,
            status = %record.status,
            "Order record saved"
        );
        records.insert(record.order_id, record);
        Ok(())
    }

    async fn load(&self, order_id: Uuid) -> Result<OrderRecord, StoreError> {
        self.records
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound(order_id))
    }

    async fn list_for_rep(&self, sales_rep: &str) -> Result<Vec<OrderRecord>, StoreError> {
        let mut matching: Vec<OrderRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.sales_rep == sales_rep)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    fn next_submission_number(&self) -> SubmissionNumber {
        self.counter.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{Order, OrderStatus};
    use chrono::{Duration, NaiveDate};

    fn record(rep: &str) -> OrderRecord {
        let mut order = Order::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 4, 10).unwrap());
        order.header.sales_rep = Some(rep.to_string());
        OrderRecord::from_order(&order).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemoryOrderStore::new();
        let record = record("Dana");
        store.save(record.clone()).await.unwrap();

        assert_eq!(store.load(record.order_id).await.unwrap(), record);
        assert!(matches!(
            store.load(Uuid::new_v4()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_draft_overwrite_keeps_created_at() {
        let store = InMemoryOrderStore::new();
        let original = record("Dana");
        store.save(original.clone()).await.unwrap();

        let mut updated = original.clone();
        updated.po_number = "PO-2".into();
        updated.created_at = original.created_at + Duration::hours(1);
        store.save(updated).await.unwrap();

        let loaded = store.load(original.order_id).await.unwrap();
        assert_eq!(loaded.po_number, "PO-2");
        assert_eq!(loaded.created_at, original.created_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_submitted_record_is_write_once() {
        let store = InMemoryOrderStore::new();
        let mut submitted = record("Dana");
        submitted.status = OrderStatus::Submitted;
        store.save(submitted.clone()).await.unwrap();

        let result = store.save(submitted.clone()).await;
        assert!(matches!(result, Err(StoreError::Immutable(id)) if id == submitted.order_id));
    }

    #[tokio::test]
    async fn test_list_for_rep_filters_and_sorts_newest_first() {
        let store = InMemoryOrderStore::new();
        let older = record("Dana");
        let mut newer = record("Dana");
        newer.created_at = older.created_at + Duration::minutes(5);

        store.save(older.clone()).await.unwrap();
        store.save(newer.clone()).await.unwrap();
        store.save(record("Lee")).await.unwrap();

        let listed = store.list_for_rep("Dana").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.order_id).collect();
        assert_eq!(ids, vec![newer.order_id, older.order_id]);
    }

    #[test]
    fn test_custom_counter_start() {
        let store = InMemoryOrderStore::with_counter(SubmissionCounter::starting_at(5000));
        assert_eq!(store.next_submission_number(), SubmissionNumber(5000));
    }
}
