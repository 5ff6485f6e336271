//! RPC server seam and the reference MCP server
//!
//! The adapter only ever talks to an [`RpcServer`]: hand it an ordered batch, get back the
//! replies. [`McpServer`] is the minimal implementation the binary ships with; it answers
//! `initialize` and `ping`, swallows notifications and client responses, and reports every
//! other method as not found.

use async_trait::async_trait;
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ProtocolVersion, ServerCapabilities,
    ServerCapabilitiesResources, ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::mcp::message::{params_object, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest};
use crate::mcp::rpc::{
    invalid_params, json_rpc_error, json_rpc_result, INTERNAL_ERROR, METHOD_NOT_FOUND,
};

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Error)]
#[error("{message}")]
pub struct RpcServerError {
    message: String,
}

impl RpcServerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Executes a validated message batch.
///
/// Implementations must return exactly one reply per request message and none for
/// notifications. Replies should follow the order of their requests; the adapter restores
/// that order if they do not.
#[async_trait]
pub trait RpcServer: Send + Sync {
    async fn handle_batch(
        &self,
        messages: Vec<JsonRpcMessage>,
    ) -> Result<Vec<JsonRpcMessage>, RpcServerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParamsError {
    code: &'static str,
    message: &'static str,
}

#[derive(Debug, Clone)]
pub struct McpServer {
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcMessage {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        let audit_params = redact_audit_params(params.as_ref());

        let response = match method.as_str() {
            "initialize" => match negotiate_protocol_version(params.as_ref()) {
                Ok(protocol_version) => {
                    match serde_json::to_value(self.initialize_result(protocol_version)) {
                        Ok(result) => json_rpc_result(id, result),
                        Err(err) => {
                            error!(error = %err, "initialize result serialization failed");
                            json_rpc_error(Some(id), INTERNAL_ERROR, "Internal error")
                        }
                    }
                }
                Err(err) => invalid_params(id, err.code, err.message),
            },
            "ping" => json_rpc_result(id, json!({})),
            _ => json_rpc_error(Some(id), METHOD_NOT_FOUND, "Method not found"),
        };

        info!(
            method = %method,
            params = %audit_params,
            outcome = if response.is_error() { "failure" } else { "success" },
            "mcp action audited"
        );

        response
    }

    pub fn handle_notification(&self, notification: JsonRpcNotification) {
        info!(
            method = %notification.method,
            params = %redact_audit_params(notification.params.as_ref()),
            "mcp notification received"
        );
    }

    fn initialize_result(&self, protocol_version: ProtocolVersion) -> InitializeResult {
        InitializeResult {
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                title: None,
                description: None,
                icons: vec![],
                website_url: None,
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(false),
                }),
                resources: Some(ServerCapabilitiesResources {
                    subscribe: Some(false),
                    list_changed: Some(false),
                }),
                prompts: None,
                ..Default::default()
            },
            protocol_version: protocol_version.into(),
            instructions: None,
            meta: None,
        }
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

#[async_trait]
impl RpcServer for McpServer {
    async fn handle_batch(
        &self,
        messages: Vec<JsonRpcMessage>,
    ) -> Result<Vec<JsonRpcMessage>, RpcServerError> {
        let mut replies = Vec::new();
        for message in messages {
            match message {
                JsonRpcMessage::Request(request) => replies.push(self.handle_request(request)),
                JsonRpcMessage::Notification(notification) => {
                    self.handle_notification(notification)
                }
                JsonRpcMessage::Result(_) | JsonRpcMessage::Error(_) => {
                    debug!("ignoring client-sent response message");
                }
            }
        }
        Ok(replies)
    }
}

fn negotiate_protocol_version(params: Option<&Value>) -> Result<ProtocolVersion, ParamsError> {
    let offered_version = params_object(params)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or(ParamsError {
            code: "invalid_protocol_version",
            message: "initialize params.protocolVersion is required",
        })?;

    if offered_version != SUPPORTED_PROTOCOL_VERSION {
        return Err(ParamsError {
            code: "unsupported_protocol_version",
            message: "unsupported initialize protocolVersion",
        });
    }

    Ok(ProtocolVersion::V2024_11_05)
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "authorization" | "bearer" | "api_key" | "apikey")
        || ["token", "secret", "password", "credential"]
            .iter()
            .any(|marker| normalized.contains(marker))
}
