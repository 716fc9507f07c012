//! Probe plan files
//!
//! A plan is a list of probes, written as YAML or JSON:
//!
//! ```yaml
//! probes:
//!   - selector: "#menu-toggle"
//!     description: main menu
//!     interaction: { type: click }
//!   - selector: nav
//!     childSelector: "a.home"
//! ```

use std::path::Path;

use probe_engine::model::InteractionKind;
use probe_engine::ProbeRequest;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbePlan {
    pub probes: Vec<ProbeRequest>,
}

impl ProbePlan {
    /// Reads and validates a plan; `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub async fn load(path: &Path) -> AppResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AppError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let plan = Self::parse(&content, is_json).map_err(|message| AppError::plan(path, message))?;
        for warning in plan.validate().map_err(|message| AppError::plan(path, message))? {
            warn!(plan = %path.display(), "{warning}");
        }
        Ok(plan)
    }

    pub fn parse(content: &str, json: bool) -> Result<Self, String> {
        if json {
            serde_json::from_str(content).map_err(|err| err.to_string())
        } else {
            serde_yaml::from_str(content).map_err(|err| err.to_string())
        }
    }

    /// Rejects unusable probes and returns warnings for suspicious ones.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        if self.probes.is_empty() {
            return Err("plan contains no probes".to_string());
        }
        let mut warnings = Vec::new();
        for (index, probe) in self.probes.iter().enumerate() {
            probe
                .validate()
                .map_err(|err| format!("probe #{}: {err}", index + 1))?;
            if let Some(spec) = &probe.interaction {
                if spec.kind == InteractionKind::Keydown && spec.key.is_none() {
                    warnings.push(format!(
                        "probe #{} ({}): keydown without a key only focuses the element",
                        index + 1,
                        probe.label()
                    ));
                }
            }
        }
        Ok(warnings)
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}
