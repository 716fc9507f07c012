use probe_core_types::ElementHandle;
use tracing::debug;

use crate::errors::ProbeError;
use crate::model::DomNeighborhoodSnapshot;
use crate::policy::{NeighborhoodPolicy, SettleMode, SettlePolicy};
use crate::ports::PagePort;
use crate::sampler;

/// Waits for the page to react to an interaction, then returns the
/// post-interaction neighborhood.
pub async fn settle_and_capture(
    page: &dyn PagePort,
    handle: &ElementHandle,
    settle: &SettlePolicy,
    neighborhood: &NeighborhoodPolicy,
) -> Result<DomNeighborhoodSnapshot, ProbeError> {
    page.wait(settle.settle()).await;
    let mut last = sampler::capture(page, handle, neighborhood).await?;
    if settle.mode == SettleMode::Fixed {
        return Ok(last);
    }

    for poll in 1..=settle.max_polls() {
        page.wait(settle.poll_interval()).await;
        let next = sampler::capture(page, handle, neighborhood).await?;
        if next == last {
            debug!(%handle, polls = poll, "neighborhood settled");
            return Ok(next);
        }
        last = next;
    }
    debug!(%handle, timeout_ms = settle.poll_timeout_ms, "neighborhood still changing at poll timeout");
    Ok(last)
}
