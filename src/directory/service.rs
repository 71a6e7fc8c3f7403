use std::sync::Arc;
use std::time::Duration;

use super::{parse_customers, parse_sales_reps, CustomerTable, Directory, DirectoryError, SalesRep};
use crate::lookup::{TableSource, TtlCache};
use crate::metrics::Metrics;

/// Cached access to the SalesReps and Customers sheets.
///
/// Each sheet degrades on its own: an unreadable SalesReps sheet still leaves
/// the customer list usable and vice versa.
pub struct DirectoryService {
    reps_source: Arc<dyn TableSource>,
    customers_source: Arc<dyn TableSource>,
    cache: TtlCache<Directory>,
    metrics: Option<Arc<Metrics>>,
}

impl DirectoryService {
    pub fn new(
        reps_source: Arc<dyn TableSource>,
        customers_source: Arc<dyn TableSource>,
        ttl: Duration,
    ) -> Self {
        Self {
            reps_source,
            customers_source,
            cache: TtlCache::new(ttl),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn degraded(&self, lookup: &str, source: &dyn TableSource, error: &DirectoryError) {
        tracing::error!(
            source = %source.name(),
            error = %error,
            "Directory sheet unavailable, continuing without it"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_lookup_degraded(lookup);
        }
    }

    async fn load_reps(&self) -> Vec<SalesRep> {
        let result = match self.reps_source.fetch().await {
            Ok(body) => parse_sales_reps(body.as_bytes()),
            Err(e) => Err(e.into()),
        };
        result.unwrap_or_else(|e| {
            self.degraded("sales_reps", self.reps_source.as_ref(), &e);
            Vec::new()
        })
    }

    async fn load_customers(&self) -> CustomerTable {
        let result = match self.customers_source.fetch().await {
            Ok(body) => parse_customers(body.as_bytes()),
            Err(e) => Err(e.into()),
        };
        result.unwrap_or_else(|e| {
            self.degraded("customers", self.customers_source.as_ref(), &e);
            CustomerTable::default()
        })
    }

    pub async fn snapshot(&self) -> Arc<Directory> {
        self.cache
            .get_or_load(|| async {
                let (reps, customers) = tokio::join!(self.load_reps(), self.load_customers());
                Directory::new(reps, customers)
            })
            .await
    }
}
