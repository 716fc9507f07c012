use crate::model::{
    DomChangeReport, DomNeighborhoodSnapshot, ExpansionChange, InteractionType, NearbyElement,
    VisibilityChange,
};
use crate::policy::DiffPolicy;

const LIST_TAGS: &[&str] = &["ul", "ol", "menu"];

pub fn diff(before: &DomNeighborhoodSnapshot, after: &DomNeighborhoodSnapshot) -> DomChangeReport {
    diff_with_policy(before, after, &DiffPolicy::default())
}

pub fn diff_with_policy(
    before: &DomNeighborhoodSnapshot,
    after: &DomNeighborhoodSnapshot,
    policy: &DiffPolicy,
) -> DomChangeReport {
    let new_elements = new_elements(before, after, policy.match_tolerance);

    let pairs = before.siblings.iter().zip(&after.siblings).enumerate();
    let mut changed_visibility = Vec::new();
    let mut expanded_elements = Vec::new();
    for (index, (was, now)) in pairs {
        if was.is_visible != now.is_visible {
            changed_visibility.push(VisibilityChange {
                index,
                tag_name: now.tag_name.clone(),
                class_name: now.class_name.clone(),
                id: now.id.clone(),
                was_visible: was.is_visible,
                is_visible: now.is_visible,
            });
        }
        if was.aria_expanded != now.aria_expanded {
            expanded_elements.push(ExpansionChange {
                index,
                tag_name: now.tag_name.clone(),
                class_name: now.class_name.clone(),
                id: now.id.clone(),
                before: was.aria_expanded.clone(),
                after: now.aria_expanded.clone(),
            });
        }
    }

    let interaction_type = match new_elements.first() {
        Some(first) => classify_new_element(first),
        None if !changed_visibility.is_empty() => InteractionType::VisibilityToggle,
        None if !expanded_elements.is_empty() => InteractionType::AriaExpansion,
        None => InteractionType::None,
    };

    let affected = match interaction_type {
        InteractionType::None => 0,
        InteractionType::VisibilityToggle => changed_visibility.len(),
        InteractionType::AriaExpansion => expanded_elements.len(),
        _ => new_elements.len(),
    };

    DomChangeReport {
        description: describe(interaction_type, affected),
        new_elements,
        changed_visibility,
        expanded_elements,
        interaction_type,
    }
}

/// Visible elements in `after` with no visible counterpart in `before`.
fn new_elements(
    before: &DomNeighborhoodSnapshot,
    after: &DomNeighborhoodSnapshot,
    tolerance: f64,
) -> Vec<NearbyElement> {
    after
        .nearby_elements
        .iter()
        .filter(|candidate| candidate.is_visible)
        .filter(|candidate| {
            !before
                .nearby_elements
                .iter()
                .any(|prior| prior.is_visible && same_element(prior, candidate, tolerance))
        })
        .cloned()
        .collect()
}

fn same_element(a: &NearbyElement, b: &NearbyElement, tolerance: f64) -> bool {
    a.tag_name == b.tag_name
        && a.class_name == b.class_name
        && (a.position.top - b.position.top).abs() < tolerance
}

fn classify_new_element(element: &NearbyElement) -> InteractionType {
    let tag = element.tag_name.to_ascii_lowercase();
    let class = element.class_name.to_ascii_lowercase();
    if LIST_TAGS.contains(&tag.as_str()) || class.contains("dropdown") || class.contains("menu") {
        InteractionType::Dropdown
    } else if class.contains("modal") || class.contains("dialog") {
        InteractionType::Modal
    } else if tag == "input" || class.contains("input") {
        InteractionType::InputExpansion
    } else {
        InteractionType::ContentExpansion
    }
}

fn describe(kind: InteractionType, count: usize) -> String {
    match kind {
        InteractionType::None => String::new(),
        InteractionType::Dropdown => format!("Dropdown menu appeared ({count} new element(s))"),
        InteractionType::Modal => format!("Modal dialog appeared ({count} new element(s))"),
        InteractionType::InputExpansion => {
            format!("Input field expanded ({count} new element(s))")
        }
        InteractionType::ContentExpansion => {
            format!("Content expanded ({count} new element(s))")
        }
        InteractionType::VisibilityToggle => {
            format!("Visibility toggled on {count} sibling element(s)")
        }
        InteractionType::AriaExpansion => {
            format!("aria-expanded changed on {count} element(s)")
        }
    }
}
