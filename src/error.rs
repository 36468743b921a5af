//! Error types.
//!
//! Two kinds of failure, kept apart on purpose:
//!
//! - [`Error`]: infrastructure. Binding a port, accepting a connection,
//!   joining the serve task. Returned from the server lifecycle only.
//! - [`ApiError`]: what went wrong with a request, whether the router, the
//!   body reader, or a handler noticed. Converted into a JSON error response
//!   at the boundary and never seen by hyper.

use serde::Serialize;
use thiserror::Error;

use crate::method::Method;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// The error type returned by the server's fallible operations.
///
/// Application-level outcomes (404, 400, etc.) are [`ApiError`] values turned
/// into [`Response`]s. This type surfaces failures of the process itself.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid socket address `{addr}`: {source}")]
    InvalidAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A request-level failure, mapped 1:1 onto an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or the body contradicts the path.
    #[error("{0}")]
    Validation(String),

    /// The body is not JSON of the expected shape.
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// The body could not be read off the connection.
    #[error("failed to read request body: {0}")]
    UnreadableBody(String),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("{0}")]
    NotFound(String),

    /// The path is routed, but only under these methods.
    #[error("method not allowed")]
    MethodNotAllowed(Vec<Method>),

    #[error("failed to encode response: {0}")]
    Serialize(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) | Self::MalformedBody(_) | Self::UnreadableBody(_) => {
                Status::BadRequest
            }
            Self::BodyTooLarge { .. } => Status::ContentTooLarge,
            Self::NotFound(_) => Status::NotFound,
            Self::MethodNotAllowed(_) => Status::MethodNotAllowed,
            Self::Serialize(_) => Status::InternalServerError,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        if matches!(self, Self::Serialize(_)) {
            tracing::error!(error = %message, "response encoding failed");
        } else {
            tracing::debug!(error = %message, "request rejected");
        }

        // ErrorBody is a single borrowed string; encoding it cannot fail.
        let body = serde_json::to_vec(&ErrorBody { error: &message }).unwrap_or_default();
        let mut builder = Response::builder().status(self.status());
        if let Self::MethodNotAllowed(allowed) = &self {
            let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
            builder = builder.header("allow", &allow);
        }
        builder.json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(u16::from(ApiError::Validation("x".into()).status()), 400);
        assert_eq!(u16::from(ApiError::NotFound("x".into()).status()), 404);
        assert_eq!(u16::from(ApiError::Serialize("x".into()).status()), 500);
        assert_eq!(u16::from(ApiError::BodyTooLarge { limit: 8 }.status()), 413);
        assert_eq!(u16::from(ApiError::UnreadableBody("reset".into()).status()), 400);

        let malformed = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        assert_eq!(u16::from(ApiError::from(malformed).status()), 400);
    }

    #[test]
    fn error_response_carries_json_message() {
        let resp = ApiError::Validation("Missing `name` in request body".into()).into_response();
        assert_eq!(resp.status_code(), 400);
        assert_eq!(resp.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(body["error"], "Missing `name` in request body");
    }

    #[test]
    fn method_not_allowed_lists_allowed_methods() {
        let resp = ApiError::MethodNotAllowed(vec![Method::Delete, Method::Put]).into_response();
        assert_eq!(resp.status_code(), 405);
        assert_eq!(resp.header("allow"), Some("DELETE, PUT"));
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "method not allowed");
    }
}
