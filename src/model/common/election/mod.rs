mod status;

pub use status::{ElectionStatus, UnknownStatus};

/// Election IDs are opaque strings assigned by the store.
pub type ElectionId = String;
