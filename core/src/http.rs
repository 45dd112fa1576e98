//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe GraphQL-over-HTTP requests and responses as plain
//! data. `encode_request` turns a descriptor into an `HttpRequest` and
//! `decode_response` turns an `HttpResponse` back into a `ResultEnvelope`;
//! neither touches the network. A `Transport` implementation executes the
//! round-trip in between, which keeps the encoding deterministic and lets
//! tests feed canned responses.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::operation::{OperationDescriptor, ResultEnvelope};

const MAX_ERROR_BODY: usize = 4096;

/// A GraphQL request described as plain data. Always sent as `POST`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A `200 OK` response carrying `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Build the `POST` request for `descriptor` against `endpoint`.
///
/// `content-type` always comes first; configured headers follow in key
/// order and may not override it.
pub fn encode_request(
    endpoint: &str,
    descriptor: &OperationDescriptor,
    headers: &BTreeMap<String, String>,
) -> Result<HttpRequest, GatewayError> {
    let mut payload = Map::new();
    payload.insert("query".to_string(), Value::String(descriptor.document.to_string()));
    payload.insert(
        "variables".to_string(),
        Value::Object(descriptor.variables.clone()),
    );
    payload.insert(
        "operationName".to_string(),
        Value::String(descriptor.name.to_string()),
    );
    let body = serde_json::to_string(&Value::Object(payload))
        .map_err(|e| GatewayError::Serialization(e.to_string()))?;

    let mut request_headers = vec![("content-type".to_string(), "application/json".to_string())];
    request_headers.extend(
        headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("content-type"))
            .map(|(name, value)| (name.clone(), value.clone())),
    );

    Ok(HttpRequest {
        url: endpoint.to_string(),
        headers: request_headers,
        body,
    })
}

/// Decode the envelope from a response. Non-2xx statuses are transport
/// failures even when the body carries GraphQL errors.
pub fn decode_response(response: HttpResponse) -> Result<ResultEnvelope, GatewayError> {
    if !(200..300).contains(&response.status) {
        return Err(GatewayError::HttpStatus {
            status: response.status,
            body: truncate_body(response.body),
        });
    }
    serde_json::from_str(&response.body).map_err(|e| GatewayError::Deserialization(e.to_string()))
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
