use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// States in the Election lifecycle.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    /// Under construction. The only state in which an election may be edited.
    #[default]
    Draft,
    /// Voting is open.
    Active,
    /// Voting has finished.
    Closed,
    /// Completed and hidden by default.
    Archived,
}

impl ElectionStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ElectionStatus; 4] = [Self::Draft, Self::Active, Self::Closed, Self::Archived];

    /// The lowercase name used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }

    /// Whether an election in this status, starting at `start_time`, may be
    /// modified at `now`. Only drafts that have not yet started qualify.
    pub fn is_mutable(self, start_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self == Self::Draft && start_time > now
    }
}

impl Display for ElectionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string that names none of the known statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown election status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ElectionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
