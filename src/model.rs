use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Length of the activity window, counted back from the moment each
/// repository is queried.
pub const LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub project: ProjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub commit_id: String,
    #[serde(default)]
    pub committer: Option<GitUser>,
}

impl Commit {
    pub fn committer_email(&self) -> Option<&str> {
        self.committer.as_ref().and_then(|c| c.email.as_deref())
    }
}

/// One page of a continuation-token paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, continuation_token: None }
    }

    pub fn with_token(items: Vec<T>, token: impl Into<String>) -> Self {
        Self { items, continuation_token: Some(token.into()) }
    }

    /// Empty and missing tokens both mean there is nothing more to fetch.
    pub fn next_token(&self) -> Option<&str> {
        self.continuation_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Result of fetching a single repository's commits.
#[derive(Debug, Clone)]
pub struct RepoOutcome {
    pub repository: Repository,
    pub result: std::result::Result<Vec<String>, String>,
}

impl RepoOutcome {
    pub fn success(repository: Repository, emails: Vec<String>) -> Self {
        Self { repository, result: Ok(emails) }
    }

    pub fn failure(repository: Repository, message: impl Into<String>) -> Self {
        Self { repository, result: Err(message.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub project: String,
    pub repository: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub organisation: String,
    pub since: DateTime<Utc>,
    pub window_days: i64,
    pub projects: usize,
    pub repositories: usize,
    pub distinct_committers: usize,
    pub committers: Vec<String>,
    pub failures: Vec<FailureEntry>,
}
