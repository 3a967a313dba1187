//! API-compatible types.
//!
//! The types in this module are what clients send and receive, e.g.:
//!
//! - Statuses are serialised as lowercase strings.
//! - Datetimes are serialised as RFC 3339 strings.

pub mod election;
pub mod message;
