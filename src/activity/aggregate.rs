use crate::model::{Commit, FailureEntry, RepoOutcome};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Distinct committer emails. Emails are compared exactly as returned by
/// the service, so `A@x.com` and `a@x.com` are two committers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitterSet {
    emails: HashSet<String>,
}

impl CommitterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I, S>(&mut self, emails: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emails.extend(emails.into_iter().map(Into::into));
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn sorted(&self) -> Vec<String> {
        let mut emails: Vec<String> = self.emails.iter().cloned().collect();
        emails.sort();
        emails
    }
}

/// Committer emails of `commits`, in commit order. Commits with no
/// committer email are skipped.
pub fn committer_emails(commits: &[Commit]) -> Vec<String> {
    commits
        .iter()
        .filter_map(|c| c.committer_email())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct ActivityReport {
    pub organisation: String,
    pub since: DateTime<Utc>,
    pub projects: usize,
    pub repositories: usize,
    pub committers: CommitterSet,
    pub failures: Vec<FailureEntry>,
}

impl ActivityReport {
    /// Merges per-repository outcomes. Failed repositories contribute a
    /// failure entry and no committers.
    pub fn from_outcomes(
        organisation: impl Into<String>,
        since: DateTime<Utc>,
        projects: usize,
        outcomes: Vec<RepoOutcome>,
    ) -> Self {
        let repositories = outcomes.len();
        let mut committers = CommitterSet::new();
        let mut failures = Vec::new();

        for RepoOutcome { repository, result } in outcomes {
            match result {
                Ok(emails) => committers.extend(emails),
                Err(message) => failures.push(FailureEntry {
                    project: repository.project.name,
                    repository: repository.name,
                    message,
                }),
            }
        }

        Self {
            organisation: organisation.into(),
            since,
            projects,
            repositories,
            committers,
            failures,
        }
    }

    pub fn distinct_committers(&self) -> usize {
        self.committers.len()
    }
}
