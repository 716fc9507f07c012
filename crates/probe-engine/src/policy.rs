use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::Bounds;

/// Tunables for one probe run. Every field has a default and can be
/// overridden from the `probe` section of the config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbePolicy {
    pub neighborhood: NeighborhoodPolicy,
    pub diff: DiffPolicy,
    pub settle: SettlePolicy,
    pub naming: NamingPolicy,
    pub scoring: ScoreWeights,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodPolicy {
    pub candidate_selector: String,
    pub vertical_window: f64,
    pub horizontal_window: f64,
    pub min_width: f64,
    pub min_height: f64,
}

impl NeighborhoodPolicy {
    /// Candidate box lies close to the target and is large enough to matter.
    pub fn within_window(&self, target_bottom: f64, target_left: f64, candidate: &Bounds) -> bool {
        (candidate.top - target_bottom).abs() < self.vertical_window
            && (candidate.left - target_left).abs() < self.horizontal_window
            && candidate.width > self.min_width
            && candidate.height > self.min_height
    }
}

impl Default for NeighborhoodPolicy {
    fn default() -> Self {
        Self {
            candidate_selector: "div, ul, ol, section, nav, menu, dialog, aside".to_string(),
            vertical_window: 200.0,
            horizontal_window: 200.0,
            min_width: 50.0,
            min_height: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffPolicy {
    /// Max vertical drift for two nearby elements to count as the same node.
    pub match_tolerance: f64,
}

impl Default for DiffPolicy {
    fn default() -> Self {
        Self {
            match_tolerance: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    #[default]
    Fixed,
    PollUntilStable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlePolicy {
    pub mode: SettleMode,
    pub settle_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
}

impl SettlePolicy {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Number of recaptures allowed before giving up on a stable DOM.
    pub fn max_polls(&self) -> u64 {
        (self.poll_timeout_ms / self.poll_interval_ms.max(1)).max(1)
    }
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            mode: SettleMode::Fixed,
            settle_ms: 300,
            poll_interval_ms: 100,
            poll_timeout_ms: 2000,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelledByMode {
    /// Use the text of the referenced elements, falling back to the raw value.
    #[default]
    Resolve,
    /// Use the raw `aria-labelledby` id list.
    Literal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingPolicy {
    pub labelled_by: LabelledByMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub base: u32,
    pub focus: u32,
    pub expanded: u32,
    pub pressed: u32,
    pub selected: u32,
    pub dom_change: u32,
    pub aria_expansion: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base: 50,
            focus: 20,
            expanded: 15,
            pressed: 10,
            selected: 5,
            dom_change: 10,
            aria_expansion: 5,
        }
    }
}
