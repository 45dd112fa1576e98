//! Error types for the gateway and the hero service.
//!
//! # Design
//! `GatewayError` covers everything that goes wrong before an envelope is in
//! hand: transport failures, non-2xx statuses, timeouts, undecodable bodies
//! and configuration misuse. `HeroError` is what the service's typed
//! channel reports: gateway failures, schema-reported errors, not-found and
//! missing or malformed data.

use std::time::Duration;

use thiserror::Error;

use crate::operation::ErrorDetail;

/// Failures raised by `SchemaGateway` and its transports.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The invocation exceeded the configured timeout.
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body is not a GraphQL result envelope.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("gateway is already configured")]
    AlreadyConfigured,

    #[error("gateway is not configured")]
    NotConfigured,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// Invalid or unreadable gateway configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures reported by the hero service's `try_*` operations.
#[derive(Debug, Clone, Error)]
pub enum HeroError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The schema answered with errors in the envelope.
    #[error("{}", summarize(.0))]
    Graphql(Vec<ErrorDetail>),

    #[error("hero not found: id={0}")]
    NotFound(i64),

    /// The envelope carried no value for the expected field.
    #[error("response is missing `{0}`")]
    MissingData(&'static str),

    /// The field was present but did not match the expected shape.
    #[error("malformed `{field}`: {message}")]
    Malformed { field: &'static str, message: String },
}

fn summarize(errors: &[ErrorDetail]) -> String {
    if errors.is_empty() {
        return "GraphQL error".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_error_joins_messages() {
        let err = HeroError::Graphql(vec![
            ErrorDetail::new("hero 99 not found"),
            ErrorDetail::new("second"),
        ]);
        assert_eq!(err.to_string(), "hero 99 not found; second");
    }

    #[test]
    fn gateway_error_is_transparent() {
        let err = HeroError::from(GatewayError::HttpStatus {
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
