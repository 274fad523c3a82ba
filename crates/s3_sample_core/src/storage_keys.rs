use chrono::{DateTime, Utc};
use rand::Rng;

pub const ARTIFACT_SUFFIX: &str = "df.csv";

const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

/// Run identifier: UTC timestamp at microsecond resolution plus a random suffix.
///
/// Identifiers sort by creation time; the suffix separates runs started within
/// the same microsecond.
pub fn run_id(now: DateTime<Utc>, suffix: u32) -> String {
    format!("{}-{suffix:08x}", now.format(RUN_TIMESTAMP_FORMAT))
}

pub fn new_run_id(now: DateTime<Utc>) -> String {
    run_id(now, rand::thread_rng().gen())
}

pub fn artifact_object_key(key_prefix: Option<&str>, run_id: &str) -> String {
    let prefix = key_prefix
        .map(|prefix| prefix.trim_matches('/'))
        .filter(|prefix| !prefix.is_empty());
    match prefix {
        Some(prefix) => format!("{prefix}/{run_id}-{ARTIFACT_SUFFIX}"),
        None => format!("{run_id}-{ARTIFACT_SUFFIX}"),
    }
}
