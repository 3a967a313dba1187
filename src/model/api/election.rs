use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::model::{common::election::ElectionStatus, db::election::ElectionSpec};

/// An election as submitted by a client, for creation or replacement.
///
/// Decoding fails if the title or description is missing or blank, either
/// timestamp is missing, or the status (when given) is unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionInput {
    #[serde(deserialize_with = "non_blank")]
    pub title: String,
    #[serde(deserialize_with = "non_blank")]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ElectionStatus>,
}

impl ElectionInput {
    /// The spec for a new election. Whatever status the client asked for,
    /// new elections start as drafts.
    pub fn into_draft(self) -> ElectionSpec {
        ElectionSpec {
            status: ElectionStatus::Draft,
            ..self.into_spec()
        }
    }

    /// The spec for replacing an existing election. A missing status means
    /// draft.
    pub fn into_spec(self) -> ElectionSpec {
        ElectionSpec {
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status.unwrap_or_default(),
        }
    }
}

fn non_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.trim().is_empty() {
        return Err(de::Error::invalid_value(
            de::Unexpected::Str(&value),
            &"a non-empty string",
        ));
    }
    Ok(value)
}

impl From<ElectionSpec> for ElectionInput {
    fn from(spec: ElectionSpec) -> Self {
        Self {
            title: spec.title,
            description: spec.description,
            start_time: spec.start_time,
            end_time: spec.end_time,
            status: Some(spec.status),
        }
    }
}
