use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::aggregate::Order;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::OrderEvent;
use super::value_objects::{Size, SubmissionNumber};
use crate::activity::{log_best_effort, ActivityEntry, ActivityEventType, ActivityLog, ActivityStatus, ClientContext};
use crate::catalog::CatalogService;
use crate::directory::DirectoryService;
use crate::domain::Aggregate;
use crate::export::{pivot_grid_to_line_items, write_export_file, LineItem};
use crate::metrics::Metrics;
use crate::pricing::{price_order, PricingSummary};
use crate::store::{OrderRecord, OrderStore, StoreError};
use crate::utils::{retry_on_transient, RetryConfig, RetryError};
use crate::validation::{validate, ValidationIssue, ValidationReport};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → lookup enrichment → Aggregate → Events
//               Submit → Validation → Numbering → Export → Order Store
//
// ============================================================================

/// Everything the rep sees after a successful submission
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub order_id: Uuid,
    pub submission_number: SubmissionNumber,
    pub submitted_at: DateTime<Utc>,
    pub pricing: PricingSummary,
    pub line_items: Vec<LineItem>,
    pub warnings: Vec<ValidationIssue>,
    pub export_path: Option<PathBuf>,
}

pub struct OrderCommandHandler {
    store: Arc<dyn OrderStore>,
    catalog: Arc<CatalogService>,
    directory: Arc<DirectoryService>,
    activity: Arc<dyn ActivityLog>,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
    export_dir: Option<PathBuf>,
}

impl OrderCommandHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<CatalogService>,
        directory: Arc<DirectoryService>,
        activity: Arc<dyn ActivityLog>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            catalog,
            directory,
            activity,
            metrics,
            retry: RetryConfig::default(),
            export_dir: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Write an export CSV into `dir` on every submission
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    /// A blank order for today's session
    pub fn new_order(&self, order_date: NaiveDate) -> Order {
        Order::new(Uuid::now_v7(), order_date)
    }

    /// Reopen a stored draft for editing
    pub async fn open_draft(&self, order_id: Uuid) -> Result<Order, OrderError> {
        let record = self.store.load(order_id).await.map_err(|e| match e {
            StoreError::NotFound(id) => OrderError::NotFound(id),
            other => OrderError::Persistence(other),
        })?;

        let order = record.order()?;
        if order.is_submitted() {
            return Err(OrderError::AlreadySubmitted);
        }
        order.check_document()?;
        Ok(order)
    }

    /// Apply a user command to the in-memory order.
    ///
    /// Lookup-dependent details (customer address, SKU legality, offered
    /// colors and sizes) are resolved here so the aggregate stays pure.
    pub async fn handle(&self, order: &mut Order, command: OrderCommand) -> Result<Vec<OrderEvent>, OrderError> {
        let command = self.enrich(order, command).await?;
        let events = order.execute(&command)?;

        for event in &events {
            tracing::debug!(order_id = %order.id, event_type = event.event_type(), "Order event applied");
        }
        Ok(events)
    }

    async fn enrich(&self, order: &Order, command: OrderCommand) -> Result<OrderCommand, OrderError> {
        let enriched = match command {
            OrderCommand::SelectSalesRep { sales_rep, .. } => {
                let directory = self.directory.snapshot().await;
                let keeps_customer = match (&sales_rep, &order.header.customer) {
                    (Some(rep), Some(customer)) => directory.is_customer_of(rep, customer),
                    _ => false,
                };
                OrderCommand::SelectSalesRep { sales_rep, keeps_customer }
            }

            OrderCommand::SelectCustomer { customer, .. } => {
                let directory = self.directory.snapshot().await;
                let address = customer.as_deref().and_then(|name| directory.customer_address(name));
                OrderCommand::SelectCustomer { customer, address }
            }

            OrderCommand::SetDecorationMethod { method, .. } => {
                let catalog = self.catalog.snapshot().await;
                let invalid_rows = order
                    .grid
                    .iter()
                    .enumerate()
                    .filter(|(_, line)| !line.is_placeholder() && !catalog.is_sku_valid_for_method(&line.sku, method))
                    .map(|(row, _)| row)
                    .collect::<Vec<_>>();

                if !invalid_rows.is_empty() {
                    tracing::info!(
                        order_id = %order.id,
                        method = %method,
                        rows = ?invalid_rows,
                        "Clearing SKUs not sold under the new method"
                    );
                }
                OrderCommand::SetDecorationMethod { method, invalid_rows }
            }

            OrderCommand::SelectSku { row, sku, .. } => {
                let catalog = self.catalog.snapshot().await;
                let sku = sku.trim().to_string();

                if let Some(method) = order.decoration.method {
                    catalog
                        .check_sku_for_method(&sku, method)
                        .map_err(|reason| OrderError::SkuNotAllowed { sku: sku.clone(), reason })?;
                }

                let (brand, description) = catalog.sku_details(&sku);
                let offered_colors = catalog.colors_for_sku(&sku);
                OrderCommand::SelectSku { row, sku, brand, description, offered_colors }
            }

            OrderCommand::SetQuantity { row, size, quantity } => {
                if quantity > 0 {
                    let line = order.grid.get(row).ok_or(OrderError::RowOutOfRange(row))?;
                    let catalog = self.catalog.snapshot().await;
                    if !catalog.enabled_sizes(&line.sku).contains(&size) {
                        return Err(OrderError::SizeUnavailable { sku: line.sku.clone(), size });
                    }
                }
                OrderCommand::SetQuantity { row, size, quantity }
            }

            other => other,
        };
        Ok(enriched)
    }

    /// Sizes open for entry on a grid row
    pub async fn enabled_sizes(&self, order: &Order, row: usize) -> Result<Vec<Size>, OrderError> {
        let line = order.grid.get(row).ok_or(OrderError::RowOutOfRange(row))?;
        Ok(self.catalog.snapshot().await.enabled_sizes(&line.sku))
    }

    /// Current totals against the cached catalog
    pub async fn price(&self, order: &Order) -> PricingSummary {
        let catalog = self.catalog.snapshot().await;

        let started = Instant::now();
        let summary = price_order(&order.grid, &order.decoration, catalog.as_ref());
        self.metrics.observe_pricing(started.elapsed().as_secs_f64());

        summary
    }

    /// Persist the order as a draft. No validation is applied.
    pub async fn save_draft(&self, order: &Order, context: &ClientContext) -> Result<(), OrderError> {
        if order.is_submitted() {
            return Err(OrderError::AlreadySubmitted);
        }

        let record = OrderRecord::from_order(order)?;
        self.persist(record).await?;
        self.metrics.drafts_saved.inc();

        tracing::info!(order_id = %order.id, "Draft saved");
        log_best_effort(
            self.activity.as_ref(),
            ActivityEntry::new(context, ActivityEventType::DraftSaved, ActivityStatus::Success)
                .rep(order.header.sales_rep.clone().unwrap_or_default())
                .details(format!("Draft {} saved", order.id)),
        )
        .await;
        Ok(())
    }

    /// Validate, number, export and persist the order.
    ///
    /// `order` is only marked submitted once the record is stored; on any
    /// failure it is left exactly as it was.
    pub async fn submit(&self, order: &mut Order, context: &ClientContext) -> Result<SubmissionReceipt, OrderError> {
        if order.is_submitted() {
            return Err(OrderError::AlreadySubmitted);
        }
        let rep = order.header.sales_rep.clone().unwrap_or_default();

        let report = validate(order);
        if !report.is_clean() {
            return Err(self.reject(order, &rep, context, report).await);
        }

        let submission_number = self.store.next_submission_number();
        let mut submitted = order.clone();
        submitted.execute(&OrderCommand::Submit { submission_number })?;
        let submitted_at = submitted.submitted_at.unwrap_or_else(Utc::now);

        let pricing = self.price(&submitted).await;
        let customer = submitted.header.customer.clone().unwrap_or_default();
        let line_items = pivot_grid_to_line_items(&customer, &submitted.grid);

        let export_path = match &self.export_dir {
            Some(dir) => Some(write_export_file(dir, submission_number, submitted_at, &line_items).await?),
            None => None,
        };

        let record = OrderRecord::from_order(&submitted)?;
        if let Err(e) = self.persist(record).await {
            tracing::error!(
                order_id = %order.id,
                submission = %submission_number,
                error = %e,
                "Submission not persisted, order left as draft"
            );
            if let Some(path) = &export_path {
                discard_export(path).await;
            }
            return Err(OrderError::Persistence(e));
        }

        *order = submitted;
        self.metrics.orders_submitted.inc();
        tracing::info!(
            order_id = %order.id,
            submission = %submission_number,
            units = pricing.total_units,
            grand_total = %pricing.grand_total,
            "Order submitted"
        );
        log_best_effort(
            self.activity.as_ref(),
            ActivityEntry::new(context, ActivityEventType::OrderSubmitted, ActivityStatus::Success)
                .rep(rep)
                .details(format!("PO {} for {}", order.header.po_number, customer))
                .order_number(submission_number),
        )
        .await;

        Ok(SubmissionReceipt {
            order_id: order.id,
            submission_number,
            submitted_at,
            pricing,
            line_items,
            warnings: report.warnings,
            export_path,
        })
    }

    async fn reject(&self, order: &Order, rep: &str, context: &ClientContext, report: ValidationReport) -> OrderError {
        self.metrics.validation_rejections.inc();
        tracing::info!(
            order_id = %order.id,
            errors = report.errors.len(),
            "Submission blocked by validation"
        );
        log_best_effort(
            self.activity.as_ref(),
            ActivityEntry::new(context, ActivityEventType::ValidationFailed, ActivityStatus::Failure)
                .rep(rep)
                .details(report.error_messages().join("; ")),
        )
        .await;
        OrderError::ValidationFailed(report)
    }

    async fn persist(&self, record: OrderRecord) -> Result<(), StoreError> {
        retry_on_transient(&self.retry, |attempt| {
            self.metrics.record_retry_attempt("save_order", attempt);
            let record = record.clone();
            async move { self.store.save(record).await }
        })
        .await
        .map_err(RetryError::into_inner)
    }
}

/// An export must not outlive a submission that was never stored
async fn discard_export(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::info!(path = %path.display(), "Export removed after failed submission"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Export of a failed submission could not be removed"),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
