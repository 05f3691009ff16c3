use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Tracks:
// - Orders projected per tab, and orders dropped as malformed
// - Status transition outcomes
// - Latency of remote status updates
//
// ============================================================================

/// Central metrics registry for the application
pub struct Metrics {
    registry: Registry,

    // Projection Metrics
    pub orders_projected: IntCounterVec,
    pub orders_malformed: IntCounter,

    // Transition Metrics
    pub status_transitions: IntCounterVec,
    pub status_update_duration: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_projected = IntCounterVec::new(
            Opts::new("orders_projected_total", "Orders placed into a date group"),
            &["tab"],
        )?;
        registry.register(Box::new(orders_projected.clone()))?;

        let orders_malformed = IntCounter::new(
            "orders_malformed_total",
            "Orders excluded from a view because their creation time could not be read",
        )?;
        registry.register(Box::new(orders_malformed.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("status_transitions_total", "Status change requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let status_update_duration = Histogram::with_opts(
            HistogramOpts::new(
                "status_update_duration_seconds",
                "Remote order status update latency",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(status_update_duration.clone()))?;

        Ok(Self {
            registry,
            orders_projected,
            orders_malformed,
            status_transitions,
            status_update_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_projection(&self, tab: &str, orders: usize, malformed: usize) {
        self.orders_projected.with_label_values(&[tab]).inc_by(orders as u64);
        self.orders_malformed.inc_by(malformed as u64);
    }

    pub fn record_transition(&self, outcome: &str) {
        self.status_transitions.with_label_values(&[outcome]).inc();
    }

    pub fn transition_count(&self, outcome: &str) -> u64 {
        self.status_transitions.with_label_values(&[outcome]).get()
    }

    pub fn observe_status_update(&self, duration_secs: f64) {
        self.status_update_duration.observe(duration_secs);
    }

    /// Prometheus text exposition of every registered metric
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
