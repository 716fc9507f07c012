use cdp_adapter::metrics as cdp_metrics;
use once_cell::sync::{Lazy, OnceCell};
use probe_engine::metrics as probe_metrics;
use prometheus::{Encoder, Registry, TextEncoder};

use crate::errors::{AppError, AppResult};

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        let registry = global_registry();
        cdp_metrics::register_metrics(registry);
        probe_metrics::register_metrics(registry);
    });
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

/// Prometheus text exposition of everything registered so far.
pub fn dump() -> AppResult<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&global_registry().gather(), &mut buffer)
        .map_err(|err| AppError::Render(format!("metric encode error: {err}")))?;
    String::from_utf8(buffer).map_err(|err| AppError::Render(err.to_string()))
}

/// One-line digest of DevTools traffic for the end of a run.
pub fn cdp_summary() -> String {
    let snapshot = cdp_metrics::snapshot();
    format!(
        "cdp commands={} failures={} environmental={} live_handles={}",
        snapshot.commands, snapshot.failures, snapshot.environmental_failures, snapshot.live_handles
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_contains_probe_metrics() {
        register_metrics();
        probe_metrics::record_probe("not_found");
        let text = dump().unwrap();
        assert!(text.contains("a11y_probe_probes_total"));
    }

    #[test]
    fn cdp_summary_lists_counters() {
        let line = cdp_summary();
        assert!(line.starts_with("cdp commands="));
        assert!(line.contains(" environmental="));
        assert!(line.contains(" live_handles="));
    }
}
