use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::election::ElectionStatus;

/// The writable part of an election: everything except the ID and the
/// server-managed timestamps.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// Election title.
    pub title: String,
    /// Election description.
    pub description: String,
    /// Election start time.
    pub start_time: DateTime<Utc>,
    /// Election end time.
    pub end_time: DateTime<Utc>,
    /// Election status.
    pub status: ElectionStatus,
}

impl ElectionSpec {
    /// Does the election start strictly before it ends?
    pub fn has_valid_timespan(&self) -> bool {
        self.start_time < self.end_time
    }
}
