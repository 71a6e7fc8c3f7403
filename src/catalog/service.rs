use std::sync::Arc;
use std::time::Duration;

use super::{Catalog, CatalogError};
use crate::lookup::{TableSource, TtlCache};
use crate::metrics::Metrics;

/// Cached access to the Products sheet.
///
/// A failed refresh never fails the caller: it yields an empty catalog (no
/// SKUs offered, every SKU allowed) until the next refresh.
pub struct CatalogService {
    source: Arc<dyn TableSource>,
    cache: TtlCache<Catalog>,
    metrics: Option<Arc<Metrics>>,
}

impl CatalogService {
    pub fn new(source: Arc<dyn TableSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn load(&self) -> Result<Catalog, CatalogError> {
        let body = self.source.fetch().await?;
        Catalog::from_csv(body.as_bytes())
    }

    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.cache
            .get_or_load(|| async {
                match self.load().await {
                    Ok(catalog) => catalog,
                    Err(e) => {
                        tracing::error!(
                            source = %self.source.name(),
                            error = %e,
                            "Catalog unavailable, continuing with an empty catalog"
                        );
                        if let Some(metrics) = &self.metrics {
                            metrics.record_lookup_degraded("catalog");
                        }
                        Catalog::empty()
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::PRODUCTS_CSV;
    use crate::domain::order::DecorationMethod;
    use crate::lookup::{FileSource, InlineSource};

    #[tokio::test]
    async fn test_snapshot_parses_source() {
        let service = CatalogService::new(
            Arc::new(InlineSource::new("Products", PRODUCTS_CSV)),
            Duration::from_secs(300),
        );
        let catalog = service.snapshot().await;
        assert_eq!(catalog.len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_source_degrades_to_empty() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let service = CatalogService::new(
            Arc::new(FileSource::new("Products", "/nonexistent/products.csv")),
            Duration::from_secs(300),
        )
        .with_metrics(metrics.clone());

        let catalog = service.snapshot().await;
        assert!(catalog.is_empty());
        assert!(catalog.skus_for_method(DecorationMethod::Screenprint).is_empty());
        assert!(catalog.is_sku_valid_for_method("TS100", DecorationMethod::Applique));
        assert!(metrics.render().unwrap().contains("lookup_degraded_total{lookup=\"catalog\"} 1"));
    }
}
