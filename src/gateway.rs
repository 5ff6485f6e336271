//! Serverless gateway envelope
//!
//! Proxy-integration event and response shapes, plus [`handle_event`], which runs the adapter
//! and renders its failures into error envelopes the platform can return as-is.

use std::collections::{BTreeMap, HashMap};

use axum::http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::adapter::{Adapter, HttpRequest, HttpResponse, APPLICATION_JSON};
use crate::errors::AdapterError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl From<ProxyEvent> for HttpRequest {
    fn from(event: ProxyEvent) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in event.headers.unwrap_or_default() {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => debug!(header = %name, "skipping unrepresentable header"),
            }
        }

        Self {
            headers,
            body: event.body,
            is_base64_encoded: event.is_base64_encoded,
        }
    }
}

impl From<HttpResponse> for ProxyResponse {
    fn from(response: HttpResponse) -> Self {
        Self {
            status_code: response.status.as_u16(),
            headers: header_map_to_envelope(&response.headers),
            body: response.body,
        }
    }
}

impl From<&AdapterError> for ProxyResponse {
    fn from(err: &AdapterError) -> Self {
        let body = serde_json::to_string(&err.to_error_response())
            .unwrap_or_else(|_| err.code().to_string());
        let mut headers = BTreeMap::new();
        headers.insert(envelope_header_name(&CONTENT_TYPE), APPLICATION_JSON.to_string());

        Self {
            status_code: err.status_code().as_u16(),
            headers,
            body,
        }
    }
}

pub async fn handle_event(adapter: &Adapter, event: ProxyEvent) -> ProxyResponse {
    match adapter.handle(event.into()).await {
        Ok(response) => response.into(),
        Err(err) => {
            if err.is_internal() {
                error!(error = %err, "request failed with internal error");
            } else {
                warn!(status = err.status_code().as_u16(), error = %err, "request rejected");
            }
            ProxyResponse::from(&err)
        }
    }
}

fn header_map_to_envelope(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (envelope_header_name(name), value.to_string()))
        })
        .collect()
}

/// Canonical casing for envelope keys (`content-type` becomes `Content-Type`). The envelope is a
/// plain JSON map, so its keys are compared exactly by whoever reads it.
fn envelope_header_name(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::{json, Value};

    use super::*;
    use crate::mcp::server::McpServer;

    fn adapter() -> Adapter {
        Adapter::new(Arc::new(McpServer::default()))
    }

    fn event(value: Value) -> ProxyEvent {
        serde_json::from_value(value).expect("valid proxy event")
    }

    #[tokio::test]
    async fn ping_event_round_trips() {
        let response = handle_event(
            &adapter(),
            event(json!({
                "headers": {
                    "Accept": "application/json",
                    "Content-Type": "application/json"
                },
                "body": "{\"jsonrpc\":\"2.0\",\"method\":\"ping\",\"id\":123}",
                "isBase64Encoded": false
            })),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers["Content-Type"], "application/json");
        assert_eq!(response.body, r#"{"jsonrpc":"2.0","result":{},"id":123}"#);
    }

    #[tokio::test]
    async fn header_names_are_case_insensitive() {
        let response = handle_event(
            &adapter(),
            event(json!({
                "headers": {
                    "ACCEPT": "application/json",
                    "content-TYPE": "application/json"
                },
                "body": "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}"
            })),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn unrepresentable_headers_are_skipped() {
        let response = handle_event(
            &adapter(),
            event(json!({
                "headers": {
                    "Bad Header": "x",
                    "X-Trace": "line\nbreak",
                    "Accept": "application/json",
                    "Content-Type": "application/json"
                },
                "body": "{\"jsonrpc\":\"2.0\",\"method\":\"ping\",\"id\":123}"
            })),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"jsonrpc":"2.0","result":{},"id":123}"#);
    }

    #[tokio::test]
    async fn base64_encoded_event_body_is_decoded() {
        let response = handle_event(
            &adapter(),
            event(json!({
                "headers": {
                    "Accept": "application/json",
                    "Content-Type": "application/json"
                },
                "body": STANDARD.encode(r#"{"jsonrpc":"2.0","method":"ping","id":123}"#),
                "isBase64Encoded": true
            })),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"jsonrpc":"2.0","result":{},"id":123}"#);
    }

    #[tokio::test]
    async fn missing_headers_render_not_acceptable() {
        let response = handle_event(&adapter(), event(json!({"headers": null}))).await;

        assert_eq!(response.status_code, 406);
        let body: Value = serde_json::from_str(&response.body).expect("json error body");
        assert_eq!(body["code"], "not_acceptable");
    }

    #[tokio::test]
    async fn text_content_type_renders_unsupported_media_type() {
        let response = handle_event(
            &adapter(),
            event(json!({
                "headers": {"Accept": "application/json", "Content-Type": "text/plain"}
            })),
        )
        .await;

        assert_eq!(response.status_code, 415);
    }

    #[tokio::test]
    async fn empty_body_renders_unprocessable_entity() {
        let response = handle_event(
            &adapter(),
            event(json!({
                "headers": {"Accept": "application/json", "Content-Type": "application/json"},
                "body": ""
            })),
        )
        .await;

        assert_eq!(response.status_code, 422);
        assert_eq!(response.headers["Content-Type"], "application/json");
    }

    #[test]
    fn response_envelope_uses_camel_case() {
        let envelope = ProxyResponse::from(HttpResponse::json(
            axum::http::StatusCode::OK,
            String::new(),
        ));

        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["headers"], json!({"Content-Type": "application/json"}));
        assert_eq!(value["body"], "");
    }
}
