use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for the intake flow
// ============================================================================
//
// Tracks:
// - Drafts saved and orders submitted
// - Submissions rejected by validation
// - Lookups that degraded to an empty snapshot
// - Order store retries
// - Pricing computation latency
//
// `render` produces the text exposition format for scraping or dumping.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Order lifecycle
    pub drafts_saved: IntCounter,
    pub orders_submitted: IntCounter,
    pub validation_rejections: IntCounter,

    // Collaborators
    pub lookup_degraded: IntCounterVec,
    pub persistence_retries: IntCounterVec,

    // Pricing
    pub pricing_duration: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let drafts_saved = IntCounter::new("drafts_saved_total", "Total order drafts saved")?;
        registry.register(Box::new(drafts_saved.clone()))?;

        let orders_submitted = IntCounter::new("orders_submitted_total", "Total orders submitted")?;
        registry.register(Box::new(orders_submitted.clone()))?;

        let validation_rejections = IntCounter::new(
            "validation_rejections_total",
            "Submissions blocked by validation errors",
        )?;
        registry.register(Box::new(validation_rejections.clone()))?;

        let lookup_degraded = IntCounterVec::new(
            Opts::new("lookup_degraded_total", "Lookups served from an empty snapshot"),
            &["lookup"],
        )?;
        registry.register(Box::new(lookup_degraded.clone()))?;

        let persistence_retries = IntCounterVec::new(
            Opts::new("persistence_retries_total", "Order store attempts beyond the first"),
            &["operation"],
        )?;
        registry.register(Box::new(persistence_retries.clone()))?;

        let pricing_duration = Histogram::with_opts(
            HistogramOpts::new("pricing_duration_seconds", "Order pricing duration")
                .buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1]),
        )?;
        registry.register(Box::new(pricing_duration.clone()))?;

        Ok(Self {
            registry,
            drafts_saved,
            orders_submitted,
            validation_rejections,
            lookup_degraded,
            persistence_retries,
            pricing_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_lookup_degraded(&self, lookup: &str) {
        self.lookup_degraded.with_label_values(&[lookup]).inc();
    }

    pub fn record_retry_attempt(&self, operation: &str, attempt: u32) {
        if attempt > 1 {
            self.persistence_retries.with_label_values(&[operation]).inc();
        }
    }

    pub fn observe_pricing(&self, duration_secs: f64) {
        self.pricing_duration.observe(duration_secs);
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
