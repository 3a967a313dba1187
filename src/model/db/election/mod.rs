use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::election::ElectionId;
use crate::model::db::repository::Entity;

mod spec;

pub use spec::ElectionSpec;

/// An election from the store, with its unique ID and timestamps.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    #[serde(flatten)]
    pub election: ElectionSpec,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Election {
    /// May this election be modified at `now`?
    pub fn is_mutable(&self, now: DateTime<Utc>) -> bool {
        self.status.is_mutable(self.start_time, now)
    }
}

impl Entity for Election {
    type Spec = ElectionSpec;
}

impl Deref for Election {
    type Target = ElectionSpec;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::serde::json::serde_json::{self, json};

    use crate::model::common::election::ElectionStatus;

    use super::*;

    #[test]
    fn serialises_flat() {
        let spec = ElectionSpec::future_example();
        let now = Utc::now();
        let election = Election {
            id: "abc".to_string(),
            election: spec.clone(),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&election).unwrap();
        assert_eq!(value["id"], json!("abc"));
        assert_eq!(value["title"], json!(spec.title));
        assert_eq!(value["status"], json!("draft"));
        assert!(value.get("election").is_none());

        let back: Election = serde_json::from_value(value).unwrap();
        assert_eq!(back, election);
    }

    #[test]
    fn mutability_follows_status_and_start() {
        let now = Utc::now();
        let mut election = Election {
            id: "abc".to_string(),
            election: ElectionSpec::future_example(),
            created_at: now,
            updated_at: now,
        };
        assert!(election.is_mutable(now));

        election.status = ElectionStatus::Active;
        assert!(!election.is_mutable(now));

        election.status = ElectionStatus::Draft;
        election.start_time = now;
        assert!(!election.is_mutable(now));

        election.start_time = now - Duration::seconds(1);
        assert!(!election.is_mutable(now));
    }
}
