//! Accessibility probe-and-diff engine.
//!
//! A probe locates an element, records its accessibility facts, performs one
//! interaction, snapshots the surrounding DOM before and after, classifies
//! what changed and scores the result. The browser is reached only through
//! [`ports::PagePort`].

pub mod analyzer;
pub mod api;
pub mod differ;
pub mod errors;
pub mod executor;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod ports;
pub mod sampler;
pub mod scorer;
pub mod scripts;

mod wait;

pub use api::ValidationOrchestrator;
pub use errors::ProbeError;
pub use model::{
    AccessibilitySnapshot, DomChangeReport, DomNeighborhoodSnapshot, InteractionKind,
    InteractionOutcome, InteractionSpec, InteractionType, ProbeReport, ProbeRequest, SuiteReport,
    SuiteSummary, ValidationResult,
};
pub use policy::{LabelledByMode, ProbePolicy, SettleMode};
pub use ports::PagePort;
pub use probe_core_types::ElementHandle;
