use crate::error::Result;
use crate::model::{Commit, Page, Project, Repository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The three organisation-scoped operations the committer count needs.
#[async_trait]
pub trait DevOpsApi: Send + Sync {
    /// Lists one page of projects, continuing from `continuation_token`.
    async fn list_projects(&self, continuation_token: Option<&str>) -> Result<Page<Project>>;

    /// Lists the repositories of a project. Only the first page is returned.
    async fn list_repositories(&self, project: &Project) -> Result<Vec<Repository>>;

    /// Lists commits of a repository made after `since`.
    async fn list_commits(&self, repository: &Repository, since: DateTime<Utc>) -> Result<Vec<Commit>>;
}
