//! Knowledge base endpoints, signed with the dataset API key.

pub mod documents;
pub mod segments;

use chrono::{DateTime, Utc};

const API_VERSION: &str = "v1";
const DATASETS: &str = "datasets";
const DOCUMENTS: &str = "documents";

/// Dify reports timestamps as unix seconds.
pub(crate) fn unix_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
