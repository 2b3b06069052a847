use crate::azdo::DevOpsApi;
use crate::error::Result;
use crate::model::{Project, Repository};
use crate::paginate::collect_pages;
use tracing::{debug, info};

pub async fn list_all_projects<A>(api: &A) -> Result<Vec<Project>>
where
    A: DevOpsApi + ?Sized,
{
    let projects = collect_pages(|token| async move { api.list_projects(token.as_deref()).await }).await?;
    info!(projects = projects.len(), "listed projects");
    Ok(projects)
}

/// One call per project, in project order. Repository listings are not
/// paginated, so anything past the service's first page is not seen.
pub async fn list_all_repositories<A>(api: &A, projects: &[Project]) -> Result<Vec<Repository>>
where
    A: DevOpsApi + ?Sized,
{
    let mut repositories = Vec::new();
    for project in projects {
        let found = api.list_repositories(project).await?;
        debug!(project = %project.name, repositories = found.len(), "listed repositories");
        repositories.extend(found);
    }
    info!(repositories = repositories.len(), "listed repositories");
    Ok(repositories)
}
