use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong talking to the browser.
#[derive(Clone, Copy, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdapterErrorKind {
    #[error("browser launch failed")]
    LaunchFailed,
    #[error("navigation timed out")]
    NavTimeout,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("target element not found")]
    TargetNotFound,
    #[error("script evaluation failed")]
    ScriptFailed,
    #[error("element action failed")]
    ActionFailed,
    #[error("internal error")]
    Internal,
}

impl AdapterErrorKind {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            AdapterErrorKind::LaunchFailed => "launch_failed",
            AdapterErrorKind::NavTimeout => "nav_timeout",
            AdapterErrorKind::CdpIo => "cdp_io",
            AdapterErrorKind::TargetNotFound => "target_not_found",
            AdapterErrorKind::ScriptFailed => "script_failed",
            AdapterErrorKind::ActionFailed => "action_failed",
            AdapterErrorKind::Internal => "internal",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{}: {}", self.kind, hint),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// True when the page or browser is unusable, as opposed to a failure
    /// scoped to one element.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self.kind,
            AdapterErrorKind::LaunchFailed
                | AdapterErrorKind::NavTimeout
                | AdapterErrorKind::CdpIo
                | AdapterErrorKind::Internal
        )
    }
}
