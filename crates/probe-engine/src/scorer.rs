use crate::model::{DomChangeReport, InteractionType, StateChange};
use crate::policy::ScoreWeights;

pub fn score(
    state_change: Option<&StateChange>,
    success: bool,
    dom_changes: Option<&DomChangeReport>,
) -> u8 {
    score_with_weights(state_change, success, dom_changes, &ScoreWeights::default())
}

/// Weighted score in `0..=100`; a failed interaction always scores 0.
pub fn score_with_weights(
    state_change: Option<&StateChange>,
    success: bool,
    dom_changes: Option<&DomChangeReport>,
    weights: &ScoreWeights,
) -> u8 {
    if !success {
        return 0;
    }

    let mut total = weights.base;
    if let Some(change) = state_change {
        let bonuses = [
            (change.focus_changed, weights.focus),
            (change.aria_expanded_changed, weights.expanded),
            (change.aria_pressed_changed, weights.pressed),
            (change.aria_selected_changed, weights.selected),
        ];
        total = bonuses
            .iter()
            .filter(|(hit, _)| *hit)
            .fold(total, |acc, (_, weight)| acc.saturating_add(*weight));
    }
    if let Some(report) = dom_changes {
        if report.interaction_type != InteractionType::None {
            total = total.saturating_add(weights.dom_change);
        }
        if !report.expanded_elements.is_empty() {
            total = total.saturating_add(weights.aria_expansion);
        }
    }
    total.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExpansionChange;

    fn all_changed() -> StateChange {
        StateChange {
            focus_changed: true,
            aria_expanded_changed: true,
            aria_pressed_changed: true,
            aria_selected_changed: true,
        }
    }

    #[test]
    fn failure_scores_zero() {
        assert_eq!(score(Some(&all_changed()), false, None), 0);
    }

    #[test]
    fn base_only() {
        assert_eq!(score(Some(&StateChange::default()), true, None), 50);
        assert_eq!(score(None, true, Some(&DomChangeReport::default())), 50);
    }

    #[test]
    fn bonuses_accumulate_and_clamp() {
        let report = DomChangeReport {
            interaction_type: InteractionType::AriaExpansion,
            expanded_elements: vec![ExpansionChange {
                index: 0,
                tag_name: "button".into(),
                class_name: String::new(),
                id: String::new(),
                before: Some("false".into()),
                after: Some("true".into()),
            }],
            ..DomChangeReport::default()
        };
        // 50 + 20 + 15 + 10 + 5 + 10 + 5 = 115
        assert_eq!(score(Some(&all_changed()), true, Some(&report)), 100);

        let focus_only = StateChange {
            focus_changed: true,
            ..StateChange::default()
        };
        assert_eq!(score(Some(&focus_only), true, Some(&report)), 85);
    }

    #[test]
    fn custom_weights() {
        let weights = ScoreWeights {
            base: 10,
            dom_change: 40,
            ..ScoreWeights::default()
        };
        let report = DomChangeReport {
            interaction_type: InteractionType::Modal,
            ..DomChangeReport::default()
        };
        assert_eq!(score_with_weights(None, true, Some(&report), &weights), 50);
    }

    #[test]
    fn extreme_weights_saturate() {
        let weights = ScoreWeights {
            base: u32::MAX,
            focus: u32::MAX,
            dom_change: u32::MAX,
            ..ScoreWeights::default()
        };
        let report = DomChangeReport {
            interaction_type: InteractionType::Dropdown,
            ..DomChangeReport::default()
        };
        assert_eq!(
            score_with_weights(Some(&all_changed()), true, Some(&report), &weights),
            100
        );
    }
}
