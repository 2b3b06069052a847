use super::aggregate::ActivityReport;
use super::enumerate::{list_all_projects, list_all_repositories};
use super::fetch::{fetch_committers, FetchLimits};
use super::output::{write_json, write_text};
use crate::azdo::{AzDoClient, DevOpsApi};
use crate::config::{OutputMode, Settings};
use crate::error::InsightsError;
use crate::util::lookback_since;
use anyhow::Context;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::info;

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub organisation: String,
    pub concurrency: usize,
    pub call_timeout: Duration,
    pub overall_timeout: Duration,
    pub show_progress: bool,
}

impl From<&Settings> for ScanOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            organisation: settings.organisation.clone(),
            concurrency: settings.concurrency,
            call_timeout: settings.request_timeout,
            overall_timeout: settings.overall_timeout,
            show_progress: matches!(settings.output, OutputMode::Text { verbose: true }),
        }
    }
}

pub async fn exec(settings: Settings) -> anyhow::Result<()> {
    info!(?settings, "starting committer scan");
    let client = Arc::new(AzDoClient::new(&settings).context("Failed to build HTTP client")?);
    let options = ScanOptions::from(&settings);

    let report = collect_activity(client, &options).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match settings.output {
        OutputMode::Json => write_json(&mut out, &report)?,
        OutputMode::Text { verbose } => write_text(&mut out, &report, verbose)?,
    }

    Ok(())
}

/// Lists projects and repositories, then fetches each repository's
/// committers. Listing errors are fatal; commit errors are kept per
/// repository in the returned report.
///
/// `overall_timeout` bounds the whole call. Running out of it while listing
/// is fatal; running out of it while fetching commits marks the unfinished
/// repositories as failed and still yields a report.
pub async fn collect_activity<A>(api: Arc<A>, options: &ScanOptions) -> anyhow::Result<ActivityReport>
where
    A: DevOpsApi + ?Sized + 'static,
{
    let deadline = Instant::now()
        .checked_add(options.overall_timeout)
        .unwrap_or_else(|| Instant::now() + FAR_FUTURE);
    let expired = || InsightsError::timeout(options.overall_timeout);

    let projects = timeout_at(deadline, list_all_projects(api.as_ref()))
        .await
        .map_err(|_| expired())
        .and_then(|listed| listed)
        .context("Failed to list projects")?;

    let repositories = timeout_at(deadline, list_all_repositories(api.as_ref(), &projects))
        .await
        .map_err(|_| expired())
        .and_then(|listed| listed)
        .context("Failed to list repositories")?;

    let since = lookback_since(Utc::now());
    let progress = progress_bar(repositories.len() as u64, options.show_progress);
    let outcomes = fetch_committers(
        Arc::clone(&api),
        repositories,
        FetchLimits {
            concurrency: options.concurrency,
            call_timeout: options.call_timeout,
            deadline,
            overall_timeout: options.overall_timeout,
        },
        &progress,
    )
    .await;
    progress.finish_and_clear();

    let report = ActivityReport::from_outcomes(options.organisation.clone(), since, projects.len(), outcomes);
    info!(
        repositories = report.repositories,
        failures = report.failures.len(),
        committers = report.distinct_committers(),
        "committer scan complete"
    );
    Ok(report)
}

fn progress_bar(len: u64, enabled: bool) -> ProgressBar {
    if !enabled || !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} repositories")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}
