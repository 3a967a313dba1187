use rocket::{
    http::{Status, StatusClass},
    response::Responder,
    serde::json::Json,
    Request,
};
use log::Level;
use thiserror::Error;

use crate::{logging::RequestId, manager::ElectionError, model::api::message::Message};

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a handler can fail with. Each variant maps to one status code
/// and one fixed message; the detail only goes to the log.
#[derive(Debug, Error)]
pub enum Error {
    /// The request body could not be decoded.
    #[error("{message}: {detail}")]
    Decode {
        message: &'static str,
        detail: String,
    },
    /// A query parameter was malformed.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Election(#[from] ElectionError),
}

impl Error {
    pub fn decode(message: &'static str, detail: impl ToString) -> Self {
        Self::Decode {
            message,
            detail: detail.to_string(),
        }
    }

    fn status(&self) -> Status {
        match self {
            Self::Decode { .. } | Self::Validation(_) => Status::BadRequest,
            Self::Election(e) => match e {
                ElectionError::Validation(_) | ElectionError::Immutable(_) => Status::BadRequest,
                ElectionError::NotFound(_) => Status::NotFound,
                ElectionError::CreateFailed(_)
                | ElectionError::ListFailed(_)
                | ElectionError::LookupFailed(..)
                | ElectionError::UpdateFailed(..) => Status::InternalServerError,
            },
        }
    }

    /// Client errors are logged as warnings, server errors as errors.
    fn log_level(&self) -> Level {
        match self.status().class() {
            StatusClass::ServerError => Level::Error,
            _ => Level::Warn,
        }
    }

    /// The text shown to the client.
    fn message(&self) -> String {
        match self {
            Self::Decode { message, .. } => message.to_string(),
            Self::Validation(message) => message.clone(),
            Self::Election(e) => match e {
                ElectionError::Validation(message) => message.clone(),
                ElectionError::NotFound(_) => "election does not exist".to_string(),
                ElectionError::Immutable(_) => {
                    "can not update active or closed election".to_string()
                }
                ElectionError::CreateFailed(_) => "could not create election".to_string(),
                ElectionError::ListFailed(_) => "could not get elections".to_string(),
                ElectionError::LookupFailed(..) => "could not get election".to_string(),
                ElectionError::UpdateFailed(..) => "could not update election".to_string(),
            },
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let id = RequestId::for_request(req);
        let status = self.status();
        let detail = match std::error::Error::source(&self) {
            Some(source) => format!("req{id} responding {status}: {self} ({source})"),
            None => format!("req{id} responding {status}: {self}"),
        };
        log::log!(self.log_level(), "{detail}");
        (status, Json(Message::new(self.message()))).respond_to(req)
    }
}
