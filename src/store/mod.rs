// ============================================================================
// Order Store - draft and submitted order records
// ============================================================================
//
// The store owns the submission counter so that numbering is serialized in
// one place. Submitted records are write-once.
//
// ============================================================================

mod memory;

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use memory::InMemoryOrderStore;

use crate::domain::order::{Order, OrderStatus, SubmissionNumber};
use crate::utils::IsTransient;

/// First number issued by a fresh counter
pub const FIRST_SUBMISSION_NUMBER: u64 = 1001;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Order record not found: {0}")]
    NotFound(Uuid),

    #[error("Order {0} is submitted and cannot be overwritten")]
    Immutable(Uuid),

    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    #[error("Order data could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Persisted row for one order; `order_data` holds the full aggregate as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: Uuid,
    pub sales_rep: String,
    pub status: OrderStatus,
    pub submission_number: Option<SubmissionNumber>,
    pub po_number: String,
    pub customer: String,
    pub order_date: NaiveDate,
    pub ship_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub order_data: String,
}

impl OrderRecord {
    pub fn from_order(order: &Order) -> Result<Self, StoreError> {
        Ok(Self {
            order_id: order.id,
            sales_rep: order.header.sales_rep.clone().unwrap_or_default(),
            status: order.status,
            submission_number: order.submission_number,
            po_number: order.header.po_number.clone(),
            customer: order.header.customer.clone().unwrap_or_default(),
            order_date: order.header.order_date,
            ship_date: order.header.ship_date,
            created_at: Utc::now(),
            order_data: serde_json::to_string(order)?,
        })
    }

    pub fn order(&self) -> Result<Order, StoreError> {
        Ok(serde_json::from_str(&self.order_data)?)
    }

    pub fn is_submitted(&self) -> bool {
        self.status == OrderStatus::Submitted
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert or replace a record. Replacing a submitted record fails.
    async fn save(&self, record: OrderRecord) -> Result<(), StoreError>;

    async fn load(&self, order_id: Uuid) -> Result<OrderRecord, StoreError>;

    /// Records belonging to a rep, newest first
    async fn list_for_rep(&self, sales_rep: &str) -> Result<Vec<OrderRecord>, StoreError>;

    fn next_submission_number(&self) -> SubmissionNumber;
}

/// Monotonic submission numbering, safe under concurrent callers
#[derive(Debug)]
pub struct SubmissionCounter {
    next: AtomicU64,
}

impl SubmissionCounter {
    pub fn new() -> Self {
        Self::starting_at(FIRST_SUBMISSION_NUMBER)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next(&self) -> SubmissionNumber {
        SubmissionNumber(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for SubmissionCounter {
    fn default() -> Self {
        Self::new()
    }
}
