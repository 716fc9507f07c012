//! Records produced and consumed by a probe.
//!
//! Everything here is created fresh per probe and serialized with camelCase
//! field names, which is the shape callers embed in their own responses.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ProbeError;

/// Accessibility facts about one element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilitySnapshot {
    pub tag_name: String,
    pub is_visible: bool,
    pub is_focusable: bool,
    /// Only `aria-*` attributes and `role`.
    pub aria_attributes: BTreeMap<String, String>,
    pub accessible_name: Option<String>,
    pub has_valid_semantics: bool,
}

/// Viewport-relative rectangle of the probed element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

/// Viewport-relative box of a nearby element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingInfo {
    pub tag_name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub id: String,
    pub is_visible: bool,
    pub has_aria_expanded: bool,
    pub aria_expanded: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyElement {
    pub tag_name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub id: String,
    pub is_visible: bool,
    pub position: Bounds,
}

/// Geometry plus sibling and spatial neighborhood of an element at one instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomNeighborhoodSnapshot {
    pub element_position: Rect,
    pub parent_tag_name: Option<String>,
    pub siblings: Vec<SiblingInfo>,
    pub nearby_elements: Vec<NearbyElement>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Click,
    Focus,
    Hover,
    Keydown,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Click => "click",
            InteractionKind::Focus => "focus",
            InteractionKind::Hover => "hover",
            InteractionKind::Keydown => "keydown",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do to the target element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSpec {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Informational only; never affects the verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_state_change: Option<bool>,
}

impl InteractionSpec {
    pub fn new(kind: InteractionKind) -> Self {
        Self {
            kind,
            key: None,
            expect_state_change: None,
        }
    }

    pub fn click() -> Self {
        Self::new(InteractionKind::Click)
    }

    pub fn focus() -> Self {
        Self::new(InteractionKind::Focus)
    }

    pub fn hover() -> Self {
        Self::new(InteractionKind::Hover)
    }

    pub fn keydown(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(InteractionKind::Keydown)
        }
    }

    pub fn expecting_change(mut self, expected: bool) -> Self {
        self.expect_state_change = Some(expected);
        self
    }
}

/// Focus and ARIA state read before and after an interaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    pub focused: bool,
    pub aria_expanded: Option<String>,
    pub aria_pressed: Option<String>,
    pub aria_selected: Option<String>,
}

impl ElementState {
    /// Field-wise inequality against the state read after the interaction.
    pub fn changes_to(&self, after: &ElementState) -> StateChange {
        StateChange {
            focus_changed: self.focused != after.focused,
            aria_expanded_changed: self.aria_expanded != after.aria_expanded,
            aria_pressed_changed: self.aria_pressed != after.aria_pressed,
            aria_selected_changed: self.aria_selected != after.aria_selected,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub focus_changed: bool,
    pub aria_expanded_changed: bool,
    pub aria_pressed_changed: bool,
    pub aria_selected_changed: bool,
}

impl StateChange {
    pub fn any(&self) -> bool {
        self.focus_changed
            || self.aria_expanded_changed
            || self.aria_pressed_changed
            || self.aria_selected_changed
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionOutcome {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub success: bool,
    pub error: Option<String>,
    pub interaction_time_ms: u64,
    pub state_change: Option<StateChange>,
    pub accessibility_score: u8,
}

impl InteractionOutcome {
    pub fn succeeded(kind: InteractionKind, state_change: StateChange, elapsed_ms: u64) -> Self {
        Self {
            kind,
            success: true,
            error: None,
            interaction_time_ms: elapsed_ms,
            state_change: Some(state_change),
            accessibility_score: 0,
        }
    }

    pub fn failed(kind: InteractionKind, error: &ProbeError, elapsed_ms: u64) -> Self {
        Self {
            kind,
            success: false,
            error: Some(error.to_string()),
            interaction_time_ms: elapsed_ms,
            state_change: None,
            accessibility_score: 0,
        }
    }
}

/// Category assigned to the observed side effect of an interaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    #[default]
    None,
    Dropdown,
    Modal,
    InputExpansion,
    ContentExpansion,
    VisibilityToggle,
    AriaExpansion,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::None => "none",
            InteractionType::Dropdown => "dropdown",
            InteractionType::Modal => "modal",
            InteractionType::InputExpansion => "input_expansion",
            InteractionType::ContentExpansion => "content_expansion",
            InteractionType::VisibilityToggle => "visibility_toggle",
            InteractionType::AriaExpansion => "aria_expansion",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sibling whose visibility flipped across the interaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityChange {
    pub index: usize,
    pub tag_name: String,
    pub class_name: String,
    pub id: String,
    pub was_visible: bool,
    pub is_visible: bool,
}

/// A sibling whose `aria-expanded` value changed across the interaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionChange {
    pub index: usize,
    pub tag_name: String,
    pub class_name: String,
    pub id: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomChangeReport {
    pub new_elements: Vec<NearbyElement>,
    pub changed_visibility: Vec<VisibilityChange>,
    pub expanded_elements: Vec<ExpansionChange>,
    pub interaction_type: InteractionType,
    pub description: String,
}

/// Verdict for one probe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub found: bool,
    pub details: Option<AccessibilitySnapshot>,
    pub child_found: bool,
    pub child_details: Option<AccessibilitySnapshot>,
    pub interaction_result: Option<InteractionOutcome>,
    pub dom_changes: Option<DomChangeReport>,
    pub execution_time_ms: u64,
}

impl ValidationResult {
    pub fn not_found(execution_time_ms: u64) -> Self {
        Self {
            execution_time_ms,
            ..Self::default()
        }
    }

    pub fn found(details: AccessibilitySnapshot) -> Self {
        Self {
            found: true,
            details: Some(details),
            ..Self::default()
        }
    }

    pub fn score(&self) -> Option<u8> {
        self.interaction_result
            .as_ref()
            .map(|outcome| outcome.accessibility_score)
    }
}

/// One entry of a probe plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRequest {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<InteractionSpec>,
}

impl ProbeRequest {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            description: None,
            child_selector: None,
            interaction: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_child(mut self, selector: impl Into<String>) -> Self {
        self.child_selector = Some(selector.into());
        self
    }

    pub fn with_interaction(mut self, spec: InteractionSpec) -> Self {
        self.interaction = Some(spec);
        self
    }

    /// Label used in logs: the description when present, else the selector.
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.selector)
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.selector.trim().is_empty() {
            return Err(ProbeError::InvalidSpec("selector must not be empty".into()));
        }
        if let Some(child) = &self.child_selector {
            if child.trim().is_empty() {
                return Err(ProbeError::InvalidSpec(format!(
                    "child selector of '{}' must not be empty",
                    self.selector
                )));
            }
        }
        if let Some(InteractionSpec {
            kind: InteractionKind::Keydown,
            key: Some(key),
            ..
        }) = &self.interaction
        {
            if key.is_empty() {
                return Err(ProbeError::InvalidSpec(format!(
                    "keydown on '{}' has an empty key",
                    self.selector
                )));
            }
        }
        Ok(())
    }
}

/// A probe request paired with its verdict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub result: ValidationResult,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    pub total: usize,
    pub found: usize,
    pub interactions_attempted: usize,
    pub interactions_succeeded: usize,
    pub average_score: Option<f64>,
    pub execution_time_ms: u64,
}

impl SuiteSummary {
    pub fn from_reports(reports: &[ProbeReport], execution_time_ms: u64) -> Self {
        let outcomes: Vec<&InteractionOutcome> = reports
            .iter()
            .filter_map(|report| report.result.interaction_result.as_ref())
            .collect();
        let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
        let average_score = if outcomes.is_empty() {
            None
        } else {
            let total: u32 = outcomes
                .iter()
                .map(|outcome| u32::from(outcome.accessibility_score))
                .sum();
            Some(f64::from(total) / outcomes.len() as f64)
        };
        Self {
            total: reports.len(),
            found: reports.iter().filter(|report| report.result.found).count(),
            interactions_attempted: outcomes.len(),
            interactions_succeeded: succeeded,
            average_score,
            execution_time_ms,
        }
    }
}

/// Ordered results of a probe suite.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub results: Vec<ProbeReport>,
    pub summary: SuiteSummary,
}
