//! Chromium DevTools Protocol adapter for a11y-probe.
//!
//! Launches or attaches to a Chromium instance, opens the page under test and
//! exposes the element-level primitives the probe engine needs: scoped
//! queries, read-only script evaluation against a node, and the click, focus,
//! hover and key-press actions. Element handles are opaque ids backed by a
//! per-page registry.

mod adapter;
pub mod config;
pub mod error;
pub mod metrics;
mod registry;

pub use adapter::{ChromiumPage, ChromiumSession};
pub use config::CdpConfig;
pub use error::{AdapterError, AdapterErrorKind};
pub use metrics::AdapterMetricsSnapshot;
pub use registry::ElementRegistry;
