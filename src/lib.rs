//! a11y-probe library
//!
//! Configuration, plan files, report rendering and the Chromium-backed run
//! loop behind the `a11yprobe` binary. The probing itself lives in the
//! `probe-engine` crate.

pub mod config;
pub mod errors;
pub mod metrics;
pub mod output;
pub mod plan;
pub mod runner;

pub use config::{load_config, AppConfig};
pub use errors::{AppError, AppResult};
pub use output::OutputFormat;
pub use plan::ProbePlan;
pub use runner::run_plan;
