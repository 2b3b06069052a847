use super::api::DevOpsApi;
use super::http::{check_response, read_json};
use super::types::{ListResponse, CONTINUATION_HEADER};
use crate::config::Settings;
use crate::error::Result;
use crate::model::{Commit, Page, Project, Repository};
use crate::util::{format_from_date, join_url, path_segment};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use tracing::debug;

/// Organisation-scoped Azure DevOps client. Authenticates every request
/// with basic auth: an empty username and the PAT as password.
pub struct AzDoClient {
    http: reqwest::Client,
    base_url: String,
    pat: String,
    api_version: String,
    max_commits: u32,
}

impl AzDoClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("azdo-insights/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            pat: settings.pat.clone(),
            api_version: settings.api_version.clone(),
            max_commits: settings.max_commits,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(join_url(&self.base_url, path))
            .basic_auth("", Some(&self.pat))
            .header(ACCEPT, "application/json")
            .query(&[("api-version", self.api_version.as_str())])
    }
}

#[async_trait]
impl DevOpsApi for AzDoClient {
    async fn list_projects(&self, continuation_token: Option<&str>) -> Result<Page<Project>> {
        let mut request = self.get("_apis/projects");
        if let Some(token) = continuation_token {
            request = request.query(&[("continuationToken", token)]);
        }

        let resp = check_response(request.send().await?).await?;
        let next = resp
            .headers()
            .get(CONTINUATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body: ListResponse<Project> = read_json(resp).await?;
        debug!(projects = body.value.len(), has_more = next.is_some(), "fetched project page");
        Ok(Page { items: body.value, continuation_token: next })
    }

    async fn list_repositories(&self, project: &Project) -> Result<Vec<Repository>> {
        let path = format!("{}/_apis/git/repositories", path_segment(&project.name));
        let resp = check_response(self.get(&path).send().await?).await?;
        let body: ListResponse<Repository> = read_json(resp).await?;
        debug!(project = %project.name, repositories = body.value.len(), "fetched repositories");
        Ok(body.value)
    }

    async fn list_commits(&self, repository: &Repository, since: DateTime<Utc>) -> Result<Vec<Commit>> {
        let path = format!(
            "{}/_apis/git/repositories/{}/commits",
            path_segment(&repository.project.id),
            path_segment(&repository.id)
        );
        let top = self.max_commits.to_string();
        let request = self.get(&path).query(&[
            ("searchCriteria.fromDate", format_from_date(&since)),
            ("searchCriteria.$top", top),
        ]);

        let resp = check_response(request.send().await?).await?;
        let body: ListResponse<Commit> = read_json(resp).await?;
        debug!(repository = %repository.name, commits = body.value.len(), "fetched commits");
        Ok(body.value)
    }
}
