use crate::config::Settings;
use anyhow::Result;
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "azdo-insights")]
#[command(about = "Find active Azure DevOps committers in the last month")]
#[command(version)]
pub struct Cli {
    #[arg(long = "PAT", alias = "pat", help = "A Personal Access Token with code read rights (falls back to AzDoPAT)")]
    pub pat: Option<String>,

    #[arg(
        long = "Organisation",
        alias = "organisation",
        help = "The name of the Azure DevOps organisation (falls back to the AzDoOrganisation base URL)"
    )]
    pub organisation: Option<String>,

    #[arg(long, help = "Only print the final count, without per-repository failure diagnostics")]
    pub quiet: bool,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, help = "Maximum number of repositories queried at once", default_value_t = 8)]
    pub concurrency: usize,

    #[arg(
        long,
        help = "Timeout for each API call (e.g. 30s, 2m)",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub timeout: Duration,

    #[arg(
        long,
        help = "Timeout for the whole run (e.g. 10m, 1h)",
        default_value = "10m",
        value_parser = humantime::parse_duration
    )]
    pub overall_timeout: Duration,

    #[arg(long, help = "Maximum commits requested per repository", default_value_t = 100)]
    pub max_commits: u32,

    #[arg(long, help = "Azure DevOps REST API version", default_value = "7.1")]
    pub api_version: String,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub async fn execute(self) -> Result<()> {
        let settings = Settings::resolve(&self, |key| std::env::var(key).ok())?;
        crate::activity::exec(settings).await
    }
}
