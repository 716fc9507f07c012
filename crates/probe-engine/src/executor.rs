use std::time::Instant;

use probe_core_types::ElementHandle;
use tracing::{debug, instrument, warn};

use crate::errors::ProbeError;
use crate::metrics;
use crate::model::{
    DomNeighborhoodSnapshot, ElementState, InteractionKind, InteractionOutcome, InteractionSpec,
    StateChange,
};
use crate::policy::ProbePolicy;
use crate::ports::PagePort;
use crate::{scripts, wait};

/// Result of one interaction attempt.
#[derive(Clone, Debug)]
pub struct InteractionRun {
    /// Always populated; the score is filled in once the diff is known.
    pub outcome: InteractionOutcome,
    /// Post-interaction neighborhood, absent when the interaction failed.
    pub after: Option<DomNeighborhoodSnapshot>,
    /// Set when the failure means the page itself is unusable.
    pub fatal: Option<ProbeError>,
}

/// Dispatches `spec` against the element and observes what changed.
///
/// Failures are reported on the outcome rather than returned.
#[instrument(skip_all, fields(element = %handle, kind = %spec.kind))]
pub async fn perform(
    page: &dyn PagePort,
    handle: &ElementHandle,
    spec: &InteractionSpec,
    policy: &ProbePolicy,
) -> InteractionRun {
    let started = Instant::now();
    let attempt = run(page, handle, spec, policy).await;
    let elapsed = started.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;
    metrics::record_interaction(spec.kind.as_str(), attempt.is_ok(), elapsed);

    match attempt {
        Ok((state_change, after)) => {
            debug!(?state_change, elapsed_ms, "interaction completed");
            InteractionRun {
                outcome: InteractionOutcome::succeeded(spec.kind, state_change, elapsed_ms),
                after: Some(after),
                fatal: None,
            }
        }
        Err(err) => {
            warn!(%err, error_kind = err.kind(), "interaction failed");
            InteractionRun {
                outcome: InteractionOutcome::failed(spec.kind, &err, elapsed_ms),
                after: None,
                fatal: err.is_environmental().then_some(err),
            }
        }
    }
}

async fn run(
    page: &dyn PagePort,
    handle: &ElementHandle,
    spec: &InteractionSpec,
    policy: &ProbePolicy,
) -> Result<(StateChange, DomNeighborhoodSnapshot), ProbeError> {
    let before = read_state(page, handle).await?;
    dispatch(page, handle, spec).await?;
    let after = wait::settle_and_capture(page, handle, &policy.settle, &policy.neighborhood).await?;
    let after_state = read_state(page, handle).await?;
    Ok((before.changes_to(&after_state), after))
}

async fn dispatch(
    page: &dyn PagePort,
    handle: &ElementHandle,
    spec: &InteractionSpec,
) -> Result<(), ProbeError> {
    match spec.kind {
        InteractionKind::Click => page.click(handle).await,
        InteractionKind::Focus => page.focus(handle).await,
        InteractionKind::Hover => page.hover(handle).await,
        InteractionKind::Keydown => {
            page.focus(handle).await?;
            match spec.key.as_deref() {
                Some(key) => page.press_key(handle, key).await,
                None => Ok(()),
            }
        }
    }
}

pub async fn read_state(
    page: &dyn PagePort,
    handle: &ElementHandle,
) -> Result<ElementState, ProbeError> {
    let value = page.evaluate(handle, scripts::ELEMENT_STATE).await?;
    Ok(serde_json::from_value(value)?)
}
