use async_trait::async_trait;
use azdo_insights::activity::{
    collect_activity, committer_emails, fetch_committers, list_all_projects, list_all_repositories, write_text,
    ActivityReport, CommitterSet, FetchLimits, ScanOptions,
};
use azdo_insights::azdo::DevOpsApi;
use azdo_insights::error::{InsightsError, Result};
use azdo_insights::model::{Commit, GitUser, Page, Project, ProjectRef, RepoOutcome, Repository};
use azdo_insights::paginate::collect_pages;
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn project(name: &str) -> Project {
    Project { id: format!("{name}-id"), name: name.to_string() }
}

fn repository(project_name: &str, name: &str) -> Repository {
    Repository {
        id: format!("{name}-id"),
        name: name.to_string(),
        project: ProjectRef { id: format!("{project_name}-id"), name: project_name.to_string() },
    }
}

fn commit(email: &str) -> Commit {
    Commit {
        commit_id: format!("sha-{email}"),
        committer: Some(GitUser { name: None, email: Some(email.to_string()) }),
    }
}

#[derive(Default)]
struct FakeApi {
    project_pages: Vec<Page<Project>>,
    repositories: HashMap<String, Vec<Repository>>,
    commits: HashMap<String, std::result::Result<Vec<Commit>, String>>,
    slow_repositories: Vec<String>,
    project_calls: AtomicUsize,
    seen_tokens: Mutex<Vec<Option<String>>>,
    commit_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeApi {
    fn with_projects(mut self, pages: Vec<Page<Project>>) -> Self {
        self.project_pages = pages;
        self
    }

    fn with_repos(mut self, project: &str, repos: Vec<Repository>) -> Self {
        self.repositories.insert(project.to_string(), repos);
        self
    }

    fn with_commits(mut self, repo: &str, emails: &[&str]) -> Self {
        let commits = emails.iter().map(|e| commit(e)).collect();
        self.commits.insert(format!("{repo}-id"), Ok(commits));
        self
    }

    fn with_failure(mut self, repo: &str, message: &str) -> Self {
        self.commits.insert(format!("{repo}-id"), Err(message.to_string()));
        self
    }

    fn with_slow(mut self, repo: &str) -> Self {
        self.slow_repositories.push(format!("{repo}-id"));
        self
    }
}

#[async_trait]
impl DevOpsApi for FakeApi {
    async fn list_projects(&self, continuation_token: Option<&str>) -> Result<Page<Project>> {
        let call = self.project_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().unwrap().push(continuation_token.map(str::to_string));
        Ok(self.project_pages.get(call).cloned().unwrap_or_else(|| Page::last(Vec::new())))
    }

    async fn list_repositories(&self, project: &Project) -> Result<Vec<Repository>> {
        self.repositories
            .get(&project.name)
            .cloned()
            .ok_or_else(|| InsightsError::Api { status: 404, message: format!("no project {}", project.name) })
    }

    async fn list_commits(&self, repository: &Repository, _since: DateTime<Utc>) -> Result<Vec<Commit>> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = if self.slow_repositories.contains(&repository.id) {
            Duration::from_secs(5)
        } else {
            Duration::from_millis(10)
        };
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.commits.get(&repository.id) {
            Some(Ok(commits)) => Ok(commits.clone()),
            Some(Err(message)) => Err(InsightsError::Api { status: 500, message: message.clone() }),
            None => Ok(Vec::new()),
        }
    }
}

fn options(concurrency: usize) -> ScanOptions {
    ScanOptions {
        organisation: "contoso".to_string(),
        concurrency,
        call_timeout: Duration::from_secs(2),
        overall_timeout: Duration::from_secs(60),
        show_progress: false,
    }
}

fn limits(concurrency: usize, call_timeout: Duration) -> FetchLimits {
    FetchLimits {
        concurrency,
        call_timeout,
        deadline: tokio::time::Instant::now() + Duration::from_secs(60),
        overall_timeout: Duration::from_secs(60),
    }
}

fn render(report: &ActivityReport, verbose: bool) -> String {
    console::set_colors_enabled(false);
    let mut buf = Vec::new();
    write_text(&mut buf, report, verbose).unwrap();
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn pagination_concatenates_pages_in_three_calls() {
    let api = FakeApi::default().with_projects(vec![
        Page::with_token(vec![project("p1"), project("p2")], "t1"),
        Page::with_token(vec![project("p3"), project("p4")], "t2"),
        Page::with_token(vec![project("p5"), project("p6")], ""),
    ]);

    let projects = list_all_projects(&api).await.unwrap();

    let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["p1", "p2", "p3", "p4", "p5", "p6"]);
    assert_eq!(api.project_calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        *api.seen_tokens.lock().unwrap(),
        vec![None, Some("t1".to_string()), Some("t2".to_string())]
    );
}

#[tokio::test]
async fn pagination_issues_one_call_per_token_plus_one() {
    for token_count in 0..5usize {
        let calls = AtomicUsize::new(0);
        let items = collect_pages(|token: Option<String>| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                assert_eq!(token.is_some(), call > 0);
                let page = if call < token_count {
                    Page::with_token(vec![call, call + 100], format!("tok-{call}"))
                } else {
                    Page::last(vec![call])
                };
                Ok::<_, InsightsError>(page)
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), token_count + 1);
        let expected: Vec<usize> = (0..token_count)
            .flat_map(|c| [c, c + 100])
            .chain(std::iter::once(token_count))
            .collect();
        assert_eq!(items, expected);
    }
}

#[tokio::test]
async fn pagination_stops_on_first_error() {
    let calls = AtomicUsize::new(0);
    let result: std::result::Result<Vec<u8>, InsightsError> = collect_pages(|_token| {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if call == 0 {
                Ok(Page::with_token(vec![1], "next"))
            } else {
                Err(InsightsError::Api { status: 503, message: "unavailable".to_string() })
            }
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn repositories_are_flattened_in_project_order() {
    let api = FakeApi::default()
        .with_repos("A", vec![repository("A", "a1"), repository("A", "a2")])
        .with_repos("B", vec![repository("B", "b1")]);

    let repos = list_all_repositories(&api, &[project("A"), project("B")]).await.unwrap();

    let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a1", "a2", "b1"]);
}

#[tokio::test]
async fn repository_listing_failure_is_fatal() {
    let api = FakeApi::default()
        .with_projects(vec![Page::last(vec![project("A"), project("missing")])])
        .with_repos("A", vec![repository("A", "a1")]);

    let err = collect_activity(Arc::new(api), &options(4)).await.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to list repositories"));
}

#[tokio::test]
async fn failing_repository_is_isolated() {
    let api = FakeApi::default()
        .with_projects(vec![Page::last(vec![project("A"), project("B")])])
        .with_repos("A", vec![repository("A", "repo-a")])
        .with_repos("B", vec![repository("B", "repo-b")])
        .with_commits("repo-a", &["u1@x.com", "u2@x.com"])
        .with_failure("repo-b", "TF401019: repository not found");

    let report = collect_activity(Arc::new(api), &options(4)).await.unwrap();

    assert_eq!(report.projects, 2);
    assert_eq!(report.repositories, 2);
    assert_eq!(report.distinct_committers(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].project, "B");
    assert_eq!(report.failures[0].repository, "repo-b");
    assert!(report.failures[0].message.contains("TF401019"));

    let verbose = render(&report, true);
    assert_eq!(
        verbose,
        "Caught exception while retrieving committers for repository repo-b in project B\n\
         ----------------------------\n\
         API error (500): TF401019: repository not found\n\
         ----------------------------\n\
         Continuing...\n\
         Found 2 distinct committers in the last month.\n"
    );

    let quiet = render(&report, false);
    assert_eq!(quiet, "Found 2 distinct committers in the last month.\n");
}

#[tokio::test]
async fn failures_in_the_middle_do_not_stop_later_repositories() {
    let repos: Vec<_> = (0..6).map(|i| repository("P", &format!("r{i}"))).collect();
    let mut api = FakeApi::default()
        .with_projects(vec![Page::last(vec![project("P")])])
        .with_repos("P", repos);
    for i in 0..6 {
        let name = format!("r{i}");
        let dev = format!("dev{i}@x.com");
        api = if i % 2 == 1 {
            api.with_failure(&name, "boom")
        } else {
            api.with_commits(&name, &[dev.as_str(), "shared@x.com"])
        };
    }
    let api = Arc::new(api);

    let report = collect_activity(Arc::clone(&api), &options(2)).await.unwrap();

    assert_eq!(api.commit_calls.load(Ordering::SeqCst), 6);
    // dev0, dev2, dev4 and shared
    assert_eq!(report.distinct_committers(), 4);
    let failed: Vec<_> = report.failures.iter().map(|f| f.repository.as_str()).collect();
    assert_eq!(failed, vec!["r1", "r3", "r5"]);
}

#[tokio::test]
async fn zero_projects_reports_zero() {
    let api = FakeApi::default().with_projects(vec![Page::last(Vec::new())]);

    let report = collect_activity(Arc::new(api), &options(4)).await.unwrap();

    assert_eq!(report.repositories, 0);
    assert_eq!(render(&report, true), "Found 0 distinct committers in the last month.\n");
}

#[tokio::test]
async fn emails_differing_in_case_are_distinct() {
    let api = FakeApi::default()
        .with_projects(vec![Page::last(vec![project("A")])])
        .with_repos("A", vec![repository("A", "r")])
        .with_commits("r", &["a@x.com", "A@x.com", "a@x.com"]);

    let report = collect_activity(Arc::new(api), &options(1)).await.unwrap();

    assert_eq!(report.distinct_committers(), 2);
    assert_eq!(report.committers.sorted(), vec!["A@x.com".to_string(), "a@x.com".to_string()]);
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let repos: Vec<_> = (0..10).map(|i| repository("P", &format!("r{i}"))).collect();
    let api = Arc::new(FakeApi::default());

    let outcomes = fetch_committers(Arc::clone(&api), repos, limits(3, Duration::from_secs(2)), &ProgressBar::hidden()).await;

    assert_eq!(outcomes.len(), 10);
    assert!(api.max_in_flight.load(Ordering::SeqCst) <= 3);
    let order: Vec<_> = outcomes.iter().map(|o| o.repository.name.clone()).collect();
    let expected: Vec<_> = (0..10).map(|i| format!("r{i}")).collect();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn slow_repository_times_out_without_failing_the_run() {
    let api = Arc::new(
        FakeApi::default()
            .with_commits("fast", &["u1@x.com"])
            .with_slow("slow")
            .with_commits("slow", &["u2@x.com"]),
    );
    let repos = vec![repository("P", "slow"), repository("P", "fast")];

    let outcomes = fetch_committers(api, repos, limits(2, Duration::from_millis(200)), &ProgressBar::hidden()).await;
    let report = ActivityReport::from_outcomes("contoso", Utc::now(), 1, outcomes);

    assert_eq!(report.distinct_committers(), 1);
    assert!(report.committers.contains("u1@x.com"));
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.starts_with("Timed out after"));
}

#[test]
fn aggregation_is_idempotent() {
    let commits = vec![commit("u1@x.com"), commit("u2@x.com"), commit("u1@x.com")];
    let outcomes = vec![RepoOutcome::success(repository("P", "r"), committer_emails(&commits))];

    let first = ActivityReport::from_outcomes("o", Utc::now(), 1, outcomes.clone());
    let second = ActivityReport::from_outcomes("o", Utc::now(), 1, outcomes);
    assert_eq!(first.distinct_committers(), 2);
    assert_eq!(first.committers, second.committers);

    let mut set = CommitterSet::new();
    set.extend(committer_emails(&commits));
    set.extend(committer_emails(&commits));
    assert_eq!(set.len(), 2);
}

#[test]
fn commits_without_committer_email_are_skipped() {
    let commits = vec![
        commit("u1@x.com"),
        Commit { commit_id: "no-committer".to_string(), committer: None },
        Commit {
            commit_id: "no-email".to_string(),
            committer: Some(GitUser { name: Some("Bot".to_string()), email: None }),
        },
    ];

    assert_eq!(committer_emails(&commits), vec!["u1@x.com".to_string()]);
}

#[tokio::test]
async fn run_deadline_during_fetch_keeps_finished_repositories() {
    let api = FakeApi::default()
        .with_projects(vec![Page::last(vec![project("P")])])
        .with_repos("P", vec![repository("P", "fast"), repository("P", "slow")])
        .with_commits("fast", &["u1@x.com"])
        .with_slow("slow")
        .with_commits("slow", &["u2@x.com"]);
    let opts = ScanOptions {
        call_timeout: Duration::from_secs(10),
        overall_timeout: Duration::from_millis(500),
        ..options(4)
    };

    let report = collect_activity(Arc::new(api), &opts).await.unwrap();

    assert_eq!(report.repositories, 2);
    assert_eq!(report.committers.sorted(), vec!["u1@x.com".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].repository, "slow");
    assert_eq!(report.failures[0].message, "Timed out after 500ms");
    assert!(render(&report, false).ends_with("Found 1 distinct committers in the last month.\n"));
}

#[test]
fn committer_date_format_does_not_affect_parsing() {
    let body = r#"{
        "commitId": "abc",
        "committer": { "name": "Dev", "email": "dev@x.com", "date": "01/05/2024 10:00" }
    }"#;

    let commit: Commit = serde_json::from_str(body).unwrap();
    assert_eq!(commit.committer_email(), Some("dev@x.com"));
}
