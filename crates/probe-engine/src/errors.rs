//! Error types for the probe engine

use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

/// Failures surfaced while probing an element.
///
/// Only [`ProbeError::Environment`] is allowed to escape a probe; everything
/// else is absorbed at the point of origin and recorded on the result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The handle no longer points at a node in the document
    #[error("stale element: {0}")]
    StaleElement(String),

    /// A read-only script threw or returned an unexpected shape
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    /// Dispatching click/focus/hover/key failed
    #[error("interaction failed: {0}")]
    Interaction(String),

    /// The page or browser is gone; every later probe would fail too
    #[error("environment failure: {0}")]
    Environment(String),

    /// The probe request itself is malformed
    #[error("invalid probe: {0}")]
    InvalidSpec(String),
}

impl ProbeError {
    pub fn is_environmental(&self) -> bool {
        matches!(self, ProbeError::Environment(_))
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::StaleElement(_) => "stale_element",
            ProbeError::Evaluation(_) => "evaluation",
            ProbeError::Interaction(_) => "interaction",
            ProbeError::Environment(_) => "environment",
            ProbeError::InvalidSpec(_) => "invalid_spec",
        }
    }
}

impl From<AdapterError> for ProbeError {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        match err.kind {
            AdapterErrorKind::TargetNotFound => ProbeError::StaleElement(message),
            AdapterErrorKind::ScriptFailed => ProbeError::Evaluation(message),
            AdapterErrorKind::ActionFailed => ProbeError::Interaction(message),
            AdapterErrorKind::LaunchFailed
            | AdapterErrorKind::NavTimeout
            | AdapterErrorKind::CdpIo
            | AdapterErrorKind::Internal => ProbeError::Environment(message),
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Evaluation(format!("unexpected script result: {err}"))
    }
}
