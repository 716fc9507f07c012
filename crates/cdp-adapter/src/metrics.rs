//! Prometheus instrumentation for DevTools traffic.
//!
//! Every command goes through [`observe`], which labels the outcome with the
//! adapter error kind so environment losses stand apart from per-element
//! failures. A small atomic mirror backs [`snapshot`] for tests and
//! end-of-run summaries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{core::Collector, histogram_opts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};
use tracing::error;

use crate::error::AdapterError;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterMetricsSnapshot {
    pub commands: u64,
    pub failures: u64,
    pub environmental_failures: u64,
    pub live_handles: i64,
}

static COMMANDS: AtomicU64 = AtomicU64::new(0);
static FAILURES: AtomicU64 = AtomicU64::new(0);
static ENVIRONMENTAL: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref COMMANDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("a11y_probe_cdp_commands_total", "DevTools commands issued"),
        &["method"]
    )
    .unwrap();
    static ref FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("a11y_probe_cdp_failures_total", "DevTools commands that failed, by error kind"),
        &["method", "kind"]
    )
    .unwrap();
    static ref LATENCY: HistogramVec = HistogramVec::new(
        histogram_opts!(
            "a11y_probe_cdp_latency_seconds",
            "Round-trip time of successful DevTools commands",
            vec![0.005, 0.02, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]
        ),
        &["method"]
    )
    .unwrap();
    static ref LIVE_HANDLES: IntGauge = IntGauge::new(
        "a11y_probe_cdp_element_handles",
        "Element handles currently held by open pages"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register cdp metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, COMMANDS_TOTAL.clone());
    register(registry, FAILURES_TOTAL.clone());
    register(registry, LATENCY.clone());
    register(registry, LIVE_HANDLES.clone());
}

/// Records one finished command.
pub fn observe(method: &str, outcome: Result<(), &AdapterError>, elapsed: Duration) {
    COMMANDS.fetch_add(1, Ordering::Relaxed);
    COMMANDS_TOTAL.with_label_values(&[method]).inc();
    match outcome {
        Ok(()) => LATENCY
            .with_label_values(&[method])
            .observe(elapsed.as_secs_f64()),
        Err(err) => {
            FAILURES.fetch_add(1, Ordering::Relaxed);
            if err.is_environmental() {
                ENVIRONMENTAL.fetch_add(1, Ordering::Relaxed);
            }
            FAILURES_TOTAL
                .with_label_values(&[method, err.kind.label()])
                .inc();
        }
    }
}

pub fn handles_added(count: usize) {
    LIVE_HANDLES.add(count as i64);
}

pub fn handles_released(count: usize) {
    LIVE_HANDLES.sub(count as i64);
}

pub fn snapshot() -> AdapterMetricsSnapshot {
    AdapterMetricsSnapshot {
        commands: COMMANDS.load(Ordering::Relaxed),
        failures: FAILURES.load(Ordering::Relaxed),
        environmental_failures: ENVIRONMENTAL.load(Ordering::Relaxed),
        live_handles: LIVE_HANDLES.get(),
    }
}
