//! Read-only page scripts and the raw shapes they return.
//!
//! Scripts only collect facts; every decision (visibility, naming,
//! proximity) is taken on the Rust side so it can be tested without a
//! browser.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{NearbyElement, Rect, SiblingInfo};

/// Raw facts about one element as returned by [`ELEMENT_FACTS`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementFacts {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub has_box: bool,
    pub has_offset_parent: bool,
    pub tab_index: i64,
    pub text: String,
    /// Joined text of the elements referenced by `aria-labelledby`.
    pub labelled_by_text: Option<String>,
}

/// Neighborhood before proximity filtering, as returned by [`neighborhood`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNeighborhood {
    pub element_position: Rect,
    pub parent_tag_name: Option<String>,
    pub siblings: Vec<SiblingInfo>,
    pub candidates: Vec<NearbyElement>,
}

pub const ELEMENT_FACTS: &str = r#"function() {
  const el = this;
  const attributes = {};
  for (const attr of Array.from(el.attributes)) {
    attributes[attr.name] = attr.value;
  }
  const rect = el.getBoundingClientRect();
  let labelledByText = null;
  const ids = el.getAttribute('aria-labelledby');
  if (ids) {
    const parts = ids.split(/\s+/)
      .map((id) => document.getElementById(id))
      .filter((node) => node !== null)
      .map((node) => (node.textContent || '').trim())
      .filter((text) => text.length > 0);
    if (parts.length > 0) {
      labelledByText = parts.join(' ');
    }
  }
  return {
    tagName: el.tagName.toLowerCase(),
    attributes,
    hasBox: rect.width > 0 && rect.height > 0,
    hasOffsetParent: el.offsetParent !== null,
    tabIndex: typeof el.tabIndex === 'number' ? el.tabIndex : -1,
    text: el.textContent || '',
    labelledByText,
  };
}"#;

pub const ELEMENT_STATE: &str = r#"function() {
  return {
    focused: document.activeElement === this,
    ariaExpanded: this.getAttribute('aria-expanded'),
    ariaPressed: this.getAttribute('aria-pressed'),
    ariaSelected: this.getAttribute('aria-selected'),
  };
}"#;

/// Neighborhood script for the given candidate selector.
pub fn neighborhood(candidate_selector: &str) -> String {
    // JSON string literals are valid JS string literals.
    let selector = serde_json::Value::String(candidate_selector.to_string()).to_string();
    format!(
        r#"function() {{
  const el = this;
  const shown = (node) => {{
    const style = window.getComputedStyle(node);
    const rect = node.getBoundingClientRect();
    return style.display !== 'none'
      && style.visibility !== 'hidden'
      && rect.width > 0
      && rect.height > 0;
  }};
  const className = (node) => typeof node.className === 'string' ? node.className : '';
  const rect = el.getBoundingClientRect();
  const parent = el.parentElement;
  const siblings = parent ? Array.from(parent.children).map((node) => ({{
    tagName: node.tagName.toLowerCase(),
    className: className(node),
    id: node.id || '',
    isVisible: shown(node),
    hasAriaExpanded: node.hasAttribute('aria-expanded'),
    ariaExpanded: node.getAttribute('aria-expanded'),
  }})) : [];
  const candidates = Array.from(document.querySelectorAll({selector}))
    .filter((node) => node !== el && !node.contains(el) && !el.contains(node))
    .map((node) => {{
      const box = node.getBoundingClientRect();
      return {{
        tagName: node.tagName.toLowerCase(),
        className: className(node),
        id: node.id || '',
        isVisible: shown(node),
        position: {{ top: box.top, left: box.left, width: box.width, height: box.height }},
      }};
    }});
  return {{
    elementPosition: {{ top: rect.top, left: rect.left, bottom: rect.bottom, right: rect.right }},
    parentTagName: parent ? parent.tagName.toLowerCase() : null,
    siblings,
    candidates,
  }};
}}"#
    )
}
