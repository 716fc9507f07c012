use std::sync::Arc;

use cdp_adapter::ChromiumSession;
use probe_engine::{SuiteReport, ValidationOrchestrator};
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::plan::ProbePlan;

/// Launches Chromium, opens `url` and runs the plan as one suite.
///
/// The browser is closed on every path, including when the suite aborts.
#[instrument(skip_all, fields(url = %url, probes = plan.len()))]
pub async fn run_plan(config: &AppConfig, url: &str, plan: &ProbePlan) -> AppResult<SuiteReport> {
    let target = Url::parse(url).map_err(|err| AppError::Url(url.to_string(), err))?;

    let session = ChromiumSession::launch(config.browser.clone()).await?;
    let outcome = run_on_session(&session, config, target.as_str(), plan).await;
    if let Err(err) = session.close().await {
        warn!(%err, "failed to close browser cleanly");
    }
    outcome
}

async fn run_on_session(
    session: &ChromiumSession,
    config: &AppConfig,
    url: &str,
    plan: &ProbePlan,
) -> AppResult<SuiteReport> {
    let page = session.open_page(url).await?;
    info!(page = %page.id().0, "running probe suite");
    let orchestrator = ValidationOrchestrator::with_policy(Arc::new(page), config.probe.clone());
    Ok(orchestrator.run_suite(&plan.probes).await?)
}
