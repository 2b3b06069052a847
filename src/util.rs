use crate::model::LOOKBACK_DAYS;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

pub fn lookback_since(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(LOOKBACK_DAYS)
}

pub fn format_from_date(since: &DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
