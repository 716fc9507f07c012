//! Proximity-filtered snapshot of the DOM around one element.

use probe_core_types::ElementHandle;
use tracing::trace;

use crate::errors::ProbeError;
use crate::model::DomNeighborhoodSnapshot;
use crate::policy::NeighborhoodPolicy;
use crate::ports::PagePort;
use crate::scripts::{self, RawNeighborhood};

/// Captures the element's position, its siblings and the nearby candidates
/// that fall inside the proximity window.
pub async fn capture(
    page: &dyn PagePort,
    handle: &ElementHandle,
    policy: &NeighborhoodPolicy,
) -> Result<DomNeighborhoodSnapshot, ProbeError> {
    let script = scripts::neighborhood(&policy.candidate_selector);
    let raw: RawNeighborhood = serde_json::from_value(page.evaluate(handle, &script).await?)?;
    let snapshot = filter(raw, policy);
    trace!(
        %handle,
        siblings = snapshot.siblings.len(),
        nearby = snapshot.nearby_elements.len(),
        "captured neighborhood"
    );
    Ok(snapshot)
}

/// Applies the proximity window to the raw candidate list.
pub fn filter(raw: RawNeighborhood, policy: &NeighborhoodPolicy) -> DomNeighborhoodSnapshot {
    let target = raw.element_position;
    let nearby_elements = raw
        .candidates
        .into_iter()
        .filter(|candidate| policy.within_window(target.bottom, target.left, &candidate.position))
        .collect();
    DomNeighborhoodSnapshot {
        element_position: target,
        parent_tag_name: raw.parent_tag_name,
        siblings: raw.siblings,
        nearby_elements,
    }
}
