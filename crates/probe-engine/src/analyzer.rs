//! Accessibility facts for a single element.

use std::collections::BTreeMap;

use probe_core_types::ElementHandle;
use tracing::{debug, warn};

use crate::errors::ProbeError;
use crate::model::AccessibilitySnapshot;
use crate::policy::{LabelledByMode, NamingPolicy};
use crate::ports::PagePort;
use crate::scripts::{self, ElementFacts};

const NATIVE_INTERACTIVE: &[&str] = &["input", "button", "select", "textarea", "a"];

/// Reads the element's accessibility snapshot. Never fails: when the facts
/// script is unusable the snapshot is empty apart from visibility, which
/// falls back to the page's own check.
pub async fn analyze(
    page: &dyn PagePort,
    handle: &ElementHandle,
    naming: &NamingPolicy,
) -> AccessibilitySnapshot {
    let facts = match page.evaluate(handle, scripts::ELEMENT_FACTS).await {
        Ok(value) => serde_json::from_value::<ElementFacts>(value).map_err(ProbeError::from),
        Err(err) => Err(err),
    };
    match facts {
        Ok(facts) => {
            let snapshot = assess(&facts, naming.labelled_by);
            debug!(%handle, tag = %snapshot.tag_name, name = ?snapshot.accessible_name, "analyzed element");
            snapshot
        }
        Err(err) => {
            warn!(%handle, %err, "accessibility analysis failed");
            let is_visible = page.is_visible(handle).await.unwrap_or_else(|err| {
                debug!(%handle, %err, "visibility check failed");
                false
            });
            AccessibilitySnapshot {
                is_visible,
                ..AccessibilitySnapshot::default()
            }
        }
    }
}

/// Derives the snapshot from raw facts.
pub fn assess(facts: &ElementFacts, labelled_by: LabelledByMode) -> AccessibilitySnapshot {
    let tag = facts.tag_name.to_ascii_lowercase();
    let native = NATIVE_INTERACTIVE.contains(&tag.as_str());

    let aria_attributes: BTreeMap<String, String> = facts
        .attributes
        .iter()
        .filter(|(name, _)| name.starts_with("aria-") || name.as_str() == "role")
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    AccessibilitySnapshot {
        is_visible: facts.has_box && facts.has_offset_parent,
        is_focusable: native || facts.tab_index >= 0 || facts.attributes.contains_key("tabindex"),
        accessible_name: accessible_name(facts, labelled_by),
        has_valid_semantics: native || facts.attributes.contains_key("role"),
        aria_attributes,
        tag_name: tag,
    }
}

fn accessible_name(facts: &ElementFacts, labelled_by: LabelledByMode) -> Option<String> {
    let attr = |name: &str| facts.attributes.get(name).map(String::as_str);

    let labelled = attr("aria-labelledby").map(|raw| match labelled_by {
        LabelledByMode::Resolve => facts
            .labelled_by_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(raw),
        LabelledByMode::Literal => raw,
    });

    [
        attr("aria-label"),
        labelled,
        attr("alt"),
        attr("title"),
        Some(facts.text.trim()),
    ]
    .into_iter()
    .flatten()
    .find(|candidate| !candidate.is_empty())
    .map(str::to_string)
}
