use std::sync::Arc;
use std::time::Instant;

use futures::{stream, StreamExt, TryStreamExt};
use probe_core_types::{ElementHandle, ProbeId};
use tracing::{debug, info, instrument, warn};

use crate::errors::ProbeError;
use crate::model::{
    DomNeighborhoodSnapshot, InteractionSpec, ProbeReport, ProbeRequest, SuiteReport,
    SuiteSummary, ValidationResult,
};
use crate::policy::ProbePolicy;
use crate::ports::PagePort;
use crate::{analyzer, differ, executor, metrics, sampler, scorer};

/// Runs probes against one live page.
///
/// Probes never overlap: each call finishes every page round-trip before
/// returning, so the page needs no locking.
pub struct ValidationOrchestrator {
    page: Arc<dyn PagePort>,
    policy: ProbePolicy,
}

impl ValidationOrchestrator {
    pub fn new(page: Arc<dyn PagePort>) -> Self {
        Self::with_policy(page, ProbePolicy::default())
    }

    pub fn with_policy(page: Arc<dyn PagePort>, policy: ProbePolicy) -> Self {
        Self { page, policy }
    }

    pub fn policy(&self) -> &ProbePolicy {
        &self.policy
    }

    /// Runs one probe. Missing elements and failed interactions are
    /// reported on the result; only environment failures (and a malformed
    /// request) come back as `Err`. Every handle resolved on the way is
    /// released before returning.
    #[instrument(
        skip_all,
        fields(probe = %ProbeId::new(), selector = %request.selector, child = ?request.child_selector)
    )]
    pub async fn validate(&self, request: &ProbeRequest) -> Result<ValidationResult, ProbeError> {
        request.validate()?;
        let started = Instant::now();
        let mut held = Vec::new();
        let outcome = self.probe(request, &mut held).await;
        for handle in &held {
            self.page.release(handle).await;
        }
        match outcome {
            Ok(mut result) => {
                result.execution_time_ms = started.elapsed().as_millis() as u64;
                metrics::record_probe(if result.found { "found" } else { "not_found" });
                debug!(
                    found = result.found,
                    child_found = result.child_found,
                    score = ?result.score(),
                    elapsed_ms = result.execution_time_ms,
                    "probe finished"
                );
                Ok(result)
            }
            Err(err) => {
                metrics::record_probe("environment");
                warn!(%err, "probe aborted");
                Err(err)
            }
        }
    }

    /// Runs every request in order and summarizes the results.
    #[instrument(skip_all, fields(probes = requests.len()))]
    pub async fn run_suite(&self, requests: &[ProbeRequest]) -> Result<SuiteReport, ProbeError> {
        let started = Instant::now();
        let results: Vec<ProbeReport> = stream::iter(requests)
            .then(|request| async move {
                let result = self.validate(request).await?;
                Ok::<_, ProbeError>(ProbeReport {
                    selector: request.selector.clone(),
                    description: request.description.clone(),
                    result,
                })
            })
            .try_collect()
            .await?;
        let summary = SuiteSummary::from_reports(&results, started.elapsed().as_millis() as u64);
        info!(
            total = summary.total,
            found = summary.found,
            interactions = summary.interactions_attempted,
            succeeded = summary.interactions_succeeded,
            "suite finished"
        );
        Ok(SuiteReport { results, summary })
    }

    async fn probe(
        &self,
        request: &ProbeRequest,
        held: &mut Vec<ElementHandle>,
    ) -> Result<ValidationResult, ProbeError> {
        let page = self.page.as_ref();
        let Some(container) = self.locate(None, &request.selector).await? else {
            debug!(label = request.label(), "container not found");
            return Ok(ValidationResult::not_found(0));
        };
        held.push(container);

        let details = analyzer::analyze(page, &container, &self.policy.naming).await;
        let mut result = ValidationResult::found(details);
        let baseline = self.neighborhood(&container).await?;

        match (&request.child_selector, &request.interaction) {
            (Some(child_selector), interaction) => {
                let Some(child) = self.locate(Some(&container), child_selector).await? else {
                    debug!(child = %child_selector, "child not found");
                    return Ok(result);
                };
                held.push(child);
                result.child_found = true;
                result.child_details =
                    Some(analyzer::analyze(page, &child, &self.policy.naming).await);
                if let Some(spec) = interaction {
                    let before = self.neighborhood(&child).await?;
                    self.interact(&child, spec, before, &mut result).await?;
                }
            }
            (None, Some(spec)) => {
                self.interact(&container, spec, baseline, &mut result).await?;
            }
            (None, None) => {}
        }
        Ok(result)
    }

    async fn interact(
        &self,
        handle: &ElementHandle,
        spec: &InteractionSpec,
        before: Option<DomNeighborhoodSnapshot>,
        result: &mut ValidationResult,
    ) -> Result<(), ProbeError> {
        let run = executor::perform(self.page.as_ref(), handle, spec, &self.policy).await;
        if let Some(fatal) = run.fatal {
            return Err(fatal);
        }

        let dom_changes = match (&before, &run.after) {
            (Some(before), Some(after)) => {
                Some(differ::diff_with_policy(before, after, &self.policy.diff))
            }
            _ => None,
        };
        let mut outcome = run.outcome;
        outcome.accessibility_score = scorer::score_with_weights(
            outcome.state_change.as_ref(),
            outcome.success,
            dom_changes.as_ref(),
            &self.policy.scoring,
        );
        if outcome.success {
            metrics::record_score(outcome.accessibility_score);
        }
        if let Some(report) = &dom_changes {
            debug!(
                interaction_type = %report.interaction_type,
                new_elements = report.new_elements.len(),
                score = outcome.accessibility_score,
                "interaction observed"
            );
        }
        result.interaction_result = Some(outcome);
        result.dom_changes = dom_changes;
        Ok(())
    }

    /// A lookup that fails for a non-environmental reason counts as absent.
    async fn locate(
        &self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> Result<Option<ElementHandle>, ProbeError> {
        match self.page.query(scope, selector).await {
            Ok(found) => Ok(found),
            Err(err) if err.is_environmental() => Err(err),
            Err(err) => {
                warn!(selector, %err, "lookup failed, treating element as absent");
                Ok(None)
            }
        }
    }

    async fn neighborhood(
        &self,
        handle: &ElementHandle,
    ) -> Result<Option<DomNeighborhoodSnapshot>, ProbeError> {
        match sampler::capture(self.page.as_ref(), handle, &self.policy.neighborhood).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) if err.is_environmental() => Err(err),
            Err(err) => {
                warn!(%handle, %err, "neighborhood capture failed");
                Ok(None)
            }
        }
    }
}
