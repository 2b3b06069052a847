use super::aggregate::ActivityReport;
use crate::model::{ActivityOutput, LOOKBACK_DAYS, SCHEMA_VERSION};
use chrono::Utc;
use console::style;
use std::io::{self, Write};

const SEPARATOR: &str = "----------------------------";

pub fn summary_line(distinct: usize) -> String {
    format!("Found {distinct} distinct committers in the last month.")
}

/// Writes the plain-text report. With `verbose`, each failed repository gets
/// a diagnostic block ahead of the summary line.
pub fn write_text<W: Write>(out: &mut W, report: &ActivityReport, verbose: bool) -> io::Result<()> {
    if verbose {
        for failure in &report.failures {
            writeln!(
                out,
                "{}",
                style(format!(
                    "Caught exception while retrieving committers for repository {} in project {}",
                    failure.repository, failure.project
                ))
                .yellow()
            )?;
            writeln!(out, "{SEPARATOR}")?;
            writeln!(out, "{}", failure.message)?;
            writeln!(out, "{SEPARATOR}")?;
            writeln!(out, "Continuing...")?;
        }
    }

    writeln!(out, "{}", summary_line(report.distinct_committers()))
}

pub fn output_json(report: &ActivityReport) -> ActivityOutput {
    ActivityOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        organisation: report.organisation.clone(),
        since: report.since,
        window_days: LOOKBACK_DAYS,
        projects: report.projects,
        repositories: report.repositories,
        distinct_committers: report.distinct_committers(),
        committers: report.committers.sorted(),
        failures: report.failures.clone(),
    }
}

pub fn write_json<W: Write>(out: &mut W, report: &ActivityReport) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &output_json(report))?;
    writeln!(out)?;
    Ok(())
}
