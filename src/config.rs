use crate::cli::Cli;
use crate::error::{InsightsError, Result};
use std::time::Duration;

pub const ORGANISATION_ENV: &str = "AzDoOrganisation";
pub const PAT_ENV: &str = "AzDoPAT";
pub const DEFAULT_HOST: &str = "https://dev.azure.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text { verbose: bool },
    Json,
}

/// Validated run settings. Flags win over environment variables.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub organisation: String,
    pub pat: String,
    pub api_version: String,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub overall_timeout: Duration,
    pub max_commits: u32,
    pub output: OutputMode,
}

// The token must never reach the logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("organisation", &self.organisation)
            .field("pat", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("concurrency", &self.concurrency)
            .field("request_timeout", &self.request_timeout)
            .field("overall_timeout", &self.overall_timeout)
            .field("max_commits", &self.max_commits)
            .field("output", &self.output)
            .finish()
    }
}

impl Settings {
    pub fn resolve<F>(cli: &Cli, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pat = non_blank(cli.pat.clone())
            .or_else(|| non_blank(env(PAT_ENV)))
            .ok_or_else(|| {
                InsightsError::Config(format!("a personal access token is required (--PAT or {PAT_ENV})"))
            })?;

        let base_url = match non_blank(cli.organisation.clone()) {
            Some(org) if org.contains("://") => org,
            Some(org) => format!("{DEFAULT_HOST}/{}", org.trim_matches('/')),
            None => non_blank(env(ORGANISATION_ENV)).ok_or_else(|| {
                InsightsError::Config(format!(
                    "an organisation is required (--Organisation or {ORGANISATION_ENV})"
                ))
            })?,
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(InsightsError::Config(format!(
                "organisation URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        if cli.concurrency == 0 {
            return Err(InsightsError::Config("--concurrency must be at least 1".to_string()));
        }
        if cli.max_commits == 0 {
            return Err(InsightsError::Config("--max-commits must be at least 1".to_string()));
        }

        let output = if cli.json {
            OutputMode::Json
        } else {
            OutputMode::Text { verbose: !cli.quiet }
        };

        Ok(Self {
            organisation: organisation_name(&base_url),
            base_url,
            pat,
            api_version: cli.api_version.clone(),
            concurrency: cli.concurrency,
            request_timeout: cli.timeout,
            overall_timeout: cli.overall_timeout,
            max_commits: cli.max_commits,
            output,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn organisation_name(base_url: &str) -> String {
    let without_scheme = base_url.split_once("://").map_or(base_url, |(_, rest)| rest);
    match without_scheme.split_once('/') {
        Some((_, path)) if !path.is_empty() => path.to_string(),
        _ => without_scheme.to_string(),
    }
}
