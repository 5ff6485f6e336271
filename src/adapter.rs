//! HTTP envelope to JSON-RPC adaptation
//!
//! One inbound request is validated, decoded into a message batch, dispatched to the
//! [`RpcServer`] and folded back into a single response. Validation completes before
//! dispatch, so a malformed batch never reaches the server.

use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::debug;

use crate::errors::AdapterError;
use crate::mcp::message::{parse_batch, JsonRpcMessage, RequestId};
use crate::mcp::server::RpcServer;

pub const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

impl HttpRequest {
    pub fn new(headers: HeaderMap, body: Option<String>) -> Self {
        Self {
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    /// Wraps a raw body; bytes that are not UTF-8 are carried base64-encoded.
    pub fn from_bytes(headers: HeaderMap, body: &Bytes) -> Self {
        match String::from_utf8(body.to_vec()) {
            Ok(text) => Self::new(headers, Some(text)),
            Err(err) => Self {
                headers,
                body: Some(STANDARD.encode(err.as_bytes())),
                is_base64_encoded: true,
            },
        }
    }

    pub fn with_base64_body(mut self, encoded: impl Into<String>) -> Self {
        self.body = Some(encoded.into());
        self.is_base64_encoded = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn json(status: StatusCode, body: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Self {
            status,
            headers,
            body,
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

#[derive(Clone)]
pub struct Adapter {
    server: Arc<dyn RpcServer>,
}

impl Adapter {
    pub fn new(server: Arc<dyn RpcServer>) -> Self {
        Self { server }
    }

    pub async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, AdapterError> {
        if !header_includes_json(&request.headers, ACCEPT) {
            return Err(AdapterError::NotAcceptable);
        }
        if !header_includes_json(&request.headers, CONTENT_TYPE) {
            return Err(AdapterError::UnsupportedMediaType);
        }

        let text = decode_body(&request)?;
        let payload: Value = serde_json::from_str(&text).map_err(|err| {
            AdapterError::unprocessable(format!("request body is not valid JSON: {err}"))
        })?;
        let messages = parse_batch(payload).map_err(|err| {
            AdapterError::unprocessable(format!("invalid JSON-RPC message: {err}"))
        })?;

        let request_ids: Vec<RequestId> = messages
            .iter()
            .filter_map(JsonRpcMessage::request_id)
            .cloned()
            .collect();
        debug!(
            messages = messages.len(),
            requests = request_ids.len(),
            "dispatching message batch"
        );

        let replies = self
            .server
            .handle_batch(messages)
            .await
            .map_err(AdapterError::Server)?;

        encode_replies(&correlate_replies(&request_ids, replies))
    }
}

fn header_includes_json(headers: &HeaderMap, name: HeaderName) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.to_ascii_lowercase().contains(APPLICATION_JSON))
}

fn decode_body(request: &HttpRequest) -> Result<String, AdapterError> {
    let raw = request.body.as_deref().unwrap_or_default();

    let text = if request.is_base64_encoded {
        let bytes = STANDARD.decode(raw.trim()).map_err(|err| {
            AdapterError::unprocessable(format!("request body is not valid base64: {err}"))
        })?;
        String::from_utf8(bytes)
            .map_err(|_| AdapterError::unprocessable("request body is not valid UTF-8"))?
    } else {
        raw.to_string()
    };

    if text.trim().is_empty() {
        return Err(AdapterError::unprocessable(
            "request body must contain at least one JSON-RPC message",
        ));
    }

    Ok(text)
}

/// Orders replies by the position of the request they answer. Stable, so replies that match
/// no request id keep their relative order after the matched ones.
fn correlate_replies(
    request_ids: &[RequestId],
    mut replies: Vec<JsonRpcMessage>,
) -> Vec<JsonRpcMessage> {
    replies.sort_by_key(|reply| {
        reply
            .response_id()
            .and_then(|id| request_ids.iter().position(|candidate| candidate == id))
            .unwrap_or(request_ids.len())
    });
    replies
}

fn encode_replies(replies: &[JsonRpcMessage]) -> Result<HttpResponse, AdapterError> {
    let body = match replies {
        [] => String::new(),
        [single] => serde_json::to_string(single)?,
        many => serde_json::to_string(many)?,
    };

    Ok(HttpResponse::json(StatusCode::OK, body))
}
