use serde::{Deserialize, Serialize};

/// A plain `{"message": ...}` response body, used for acknowledgements and
/// errors alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
