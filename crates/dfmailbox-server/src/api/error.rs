//! API error types and problem documents
//!
//! Every failure leaves the API as an `application/problem+json` document
//! with a stable `type`, a `title`, the numeric `status` and any extension
//! fields the caller needs to act on it.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dfmailbox_bridge::BridgeError;
use dfmailbox_core::Role;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::error;

use crate::registry::RegistryError;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";
pub const UNAUTHORIZED_TYPE: &str = "https://tools.ietf.org/html/rfc9110#section-15.5.2";
const WWW_AUTHENTICATE: &str = r#"Bearer realm="dfmailbox", Plot realm="dfmailbox""#;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// RFC 9457 problem document
#[derive(Debug, Serialize)]
pub struct ProblemDocument {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl ProblemDocument {
    fn new(status: StatusCode, problem_type: &str, title: &str) -> Self {
        Self {
            problem_type: problem_type.to_string(),
            title: title.to_string(),
            status: status.as_u16(),
            detail: None,
            extensions: Map::new(),
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn with(mut self, name: &str, value: Value) -> Self {
        self.extensions.insert(name.to_string(), value);
        self
    }
}

fn expected_role_title(expected: &[Role]) -> &'static str {
    match expected {
        [Role::Host, Role::Registered] => "Expected any registration",
        [Role::Unregistered] => "Expected unregistered plot",
        _ => "Expected role",
    }
}

impl ApiError {
    /// The problem document this error renders as
    pub fn problem(&self) -> ProblemDocument {
        match self {
            ApiError::Registry(err) => registry_problem(err),
            ApiError::Unauthorized(msg) => {
                ProblemDocument::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED_TYPE, "Unauthorized")
                    .with_detail(msg.clone())
            }
            ApiError::InvalidInput(msg) => invalid_input(msg),
            ApiError::Internal(_) => internal(),
        }
    }
}

fn invalid_input(msg: &str) -> ProblemDocument {
    ProblemDocument::new(StatusCode::BAD_REQUEST, "/v0/problems/invalid-input", "Invalid input")
        .with_detail(msg)
}

fn internal() -> ProblemDocument {
    ProblemDocument::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "about:blank",
        "Internal Server Error",
    )
}

fn registry_problem(err: &RegistryError) -> ProblemDocument {
    const UNKNOWN_INSTANCE: &str = "/v0/problems/unknown-instance";
    const UNKNOWN_INSTANCE_TITLE: &str = "Specified instance has not been identified";

    match err {
        RegistryError::AlreadyExists => ProblemDocument::new(
            StatusCode::CONFLICT,
            "/v0/problems/already-exists",
            "Resource already exists",
        ),
        RegistryError::NoEffectUpdate => ProblemDocument::new(
            StatusCode::CONFLICT,
            "/v0/problems/no-effect-update",
            "Update would have no effect",
        ),
        RegistryError::UnknownInstance { public_key } => {
            ProblemDocument::new(StatusCode::NOT_FOUND, UNKNOWN_INSTANCE, UNKNOWN_INSTANCE_TITLE)
                .with("public_key", json!(public_key))
        }
        RegistryError::UnknownReferencedInstance { public_key } => {
            ProblemDocument::new(StatusCode::CONFLICT, UNKNOWN_INSTANCE, UNKNOWN_INSTANCE_TITLE)
                .with("public_key", json!(public_key))
        }
        RegistryError::InstanceUnreachable { address } => ProblemDocument::new(
            StatusCode::BAD_REQUEST,
            "/v0/problems/federation/instance-unreachable",
            "Instance could not be reached",
        )
        .with("address", json!(address)),
        RegistryError::ChallengeFailed { challenge_bytes } => ProblemDocument::new(
            StatusCode::BAD_REQUEST,
            "/v0/problems/challenge-failed",
            "Instance failed the ownership challenge",
        )
        .with("challenge_bytes", json!(challenge_bytes)),
        RegistryError::ExpectedRole { expected, received } => ProblemDocument::new(
            StatusCode::FORBIDDEN,
            "/v0/problems/expected-role/any",
            expected_role_title(expected),
        )
        .with("expected", json!(expected))
        .with("received", json!(received)),
        RegistryError::InvalidInput(msg) => invalid_input(msg),
        RegistryError::Storage(_) => internal(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let problem = self.problem();
        let status =
            StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let mut response = (status, Json(problem)).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE),
            );
        }
        response
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}
