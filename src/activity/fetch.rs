use super::aggregate::committer_emails;
use crate::azdo::DevOpsApi;
use crate::error::InsightsError;
use crate::model::{RepoOutcome, Repository};
use crate::util::lookback_since;
use chrono::Utc;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Fetches one repository's commits from the lookback window and keeps the
/// committer emails. Every error, including a timeout, ends up in the
/// returned outcome instead of being propagated.
pub async fn fetch_repository<A>(api: &A, repository: Repository, call_timeout: Duration) -> RepoOutcome
where
    A: DevOpsApi + ?Sized,
{
    let since = lookback_since(Utc::now());
    let result = match tokio::time::timeout(call_timeout, api.list_commits(&repository, since)).await {
        Ok(Ok(commits)) => Ok(committer_emails(&commits)),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(InsightsError::timeout(call_timeout).to_string()),
    };

    match &result {
        Ok(emails) => debug!(
            repository = %repository.name,
            project = %repository.project.name,
            committers = emails.len(),
            "fetched committers"
        ),
        Err(message) => warn!(
            repository = %repository.name,
            project = %repository.project.name,
            error = %message,
            "failed to fetch commits, continuing"
        ),
    }

    RepoOutcome { repository, result }
}

/// Bounds for a commit fetch run. `deadline` is the end of the overall
/// run budget of `overall_timeout`.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub concurrency: usize,
    pub call_timeout: Duration,
    pub deadline: Instant,
    pub overall_timeout: Duration,
}

/// Fetches every repository with at most `concurrency` calls in flight.
///
/// Outcomes come back in the order of `repositories`. A task that dies
/// before reporting is recorded as a failure of its repository. When the
/// deadline passes, the remaining tasks are aborted and their repositories
/// are recorded as timed out; outcomes already collected are kept.
pub async fn fetch_committers<A>(
    api: Arc<A>,
    repositories: Vec<Repository>,
    limits: FetchLimits,
    progress: &ProgressBar,
) -> Vec<RepoOutcome>
where
    A: DevOpsApi + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limits.concurrency.max(1)));
    let call_timeout = limits.call_timeout;
    let mut set = JoinSet::new();

    for (idx, repository) in repositories.iter().cloned().enumerate() {
        let api = Arc::clone(&api);
        let sem = Arc::clone(&semaphore);
        set.spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return (idx, RepoOutcome::failure(repository, "fetch cancelled"));
            };
            (idx, fetch_repository(api.as_ref(), repository, call_timeout).await)
        });
    }

    let mut slots: Vec<Option<RepoOutcome>> = vec![None; repositories.len()];
    let mut timed_out = false;
    loop {
        let next = tokio::time::timeout_at(limits.deadline, set.join_next()).await;
        let joined = match next {
            Ok(Some(joined)) => joined,
            Ok(None) => break,
            Err(_) => {
                warn!(unfinished = set.len(), "run deadline reached, abandoning remaining repositories");
                set.abort_all();
                timed_out = true;
                break;
            }
        };
        match joined {
            Ok((idx, outcome)) => slots[idx] = Some(outcome),
            Err(e) => warn!(error = %e, "commit fetch task failed"),
        }
        progress.inc(1);
    }

    let unfinished = if timed_out {
        InsightsError::timeout(limits.overall_timeout).to_string()
    } else {
        "commit fetch task did not complete".to_string()
    };

    slots
        .into_iter()
        .zip(repositories)
        .map(|(slot, repository)| slot.unwrap_or_else(|| RepoOutcome::failure(repository, unfinished.clone())))
        .collect()
}
