pub mod aggregate;
pub mod enumerate;
pub mod exec;
pub mod fetch;
pub mod output;

pub use aggregate::{committer_emails, ActivityReport, CommitterSet};
pub use enumerate::{list_all_projects, list_all_repositories};
pub use exec::{collect_activity, exec, ScanOptions};
pub use fetch::{fetch_committers, fetch_repository, FetchLimits};
pub use output::{output_json, write_json, write_text};
