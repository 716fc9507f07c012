use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{
    core::Collector, histogram_opts, Histogram, HistogramVec, IntCounterVec, Opts, Registry,
};
use tracing::error;

lazy_static! {
    static ref PROBES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("a11y_probe_probes_total", "Probes run, by outcome"),
        &["outcome"]
    )
    .unwrap();
    static ref INTERACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("a11y_probe_interactions_total", "Interactions dispatched"),
        &["kind", "result"]
    )
    .unwrap();
    static ref INTERACTION_DURATION: HistogramVec = HistogramVec::new(
        histogram_opts!(
            "a11y_probe_interaction_duration_seconds",
            "Interaction latency including settle",
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0]
        ),
        &["kind"]
    )
    .unwrap();
    static ref SCORES: Histogram = Histogram::with_opts(histogram_opts!(
        "a11y_probe_accessibility_score",
        "Accessibility scores of completed interactions",
        vec![0.0, 25.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
    ))
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register probe metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, PROBES_TOTAL.clone());
    register(registry, INTERACTIONS_TOTAL.clone());
    register(registry, INTERACTION_DURATION.clone());
    register(registry, SCORES.clone());
}

/// `outcome` is one of `found`, `not_found` or `environment`.
pub fn record_probe(outcome: &str) {
    PROBES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_interaction(kind: &str, success: bool, elapsed: Duration) {
    let result = if success { "ok" } else { "failed" };
    INTERACTIONS_TOTAL.with_label_values(&[kind, result]).inc();
    INTERACTION_DURATION
        .with_label_values(&[kind])
        .observe(elapsed.as_secs_f64());
}

pub fn record_score(score: u8) {
    SCORES.observe(f64::from(score));
}
