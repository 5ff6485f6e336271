//! JSON-RPC 2.0 message model and structural validation
//!
//! Inbound payloads are checked against the minimal message contract with explicit guard
//! clauses before anything is handed to the RPC server. Serialization keeps field order
//! stable (`jsonrpc` first, `id` last on responses) so replies render predictably.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// The `jsonrpc` member. Always serializes as `"2.0"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Integer(i64),
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResultResponse {
    pub jsonrpc: JsonRpcVersion,
    pub result: Value,
    pub id: RequestId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: JsonRpcVersion,
    pub error: JsonRpcErrorObject,
    /// `None` renders as `null`, used when the failing request id is unknown.
    pub id: Option<RequestId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    Result(JsonRpcResultResponse),
    Error(JsonRpcErrorResponse),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("message must be a JSON object")]
    NotAnObject,
    #[error("message must declare jsonrpc \"2.0\"")]
    UnsupportedVersion,
    #[error("method must be a string")]
    InvalidMethod,
    #[error("id must be a string or an integer")]
    InvalidId,
    #[error("response must carry an id")]
    MissingId,
    #[error("error must carry an integer code and a string message")]
    InvalidErrorObject,
    #[error("response must not carry both result and error")]
    AmbiguousResponse,
    #[error("message must carry a method, a result or an error")]
    Unrecognized,
    #[error("batch must contain at least one message")]
    EmptyBatch,
    #[error("batch entry {index}: {source}")]
    BatchEntry {
        index: usize,
        #[source]
        source: Box<ShapeError>,
    },
}

impl JsonRpcMessage {
    pub fn request(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Self {
        Self::Request(JsonRpcRequest {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            method: method.into(),
            params,
        })
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self::Notification(JsonRpcNotification {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        })
    }

    pub fn result(id: RequestId, result: Value) -> Self {
        Self::Result(JsonRpcResultResponse {
            jsonrpc: JsonRpcVersion,
            result,
            id,
        })
    }

    pub fn error(id: Option<RequestId>, error: JsonRpcErrorObject) -> Self {
        Self::Error(JsonRpcErrorResponse {
            jsonrpc: JsonRpcVersion,
            error,
            id,
        })
    }

    /// Id of a message that expects a reply.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(request) => Some(&request.id),
            _ => None,
        }
    }

    /// Id a response answers, if any.
    pub fn response_id(&self) -> Option<&RequestId> {
        match self {
            Self::Result(response) => Some(&response.id),
            Self::Error(response) => response.id.as_ref(),
            Self::Request(_) | Self::Notification(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Classifies a decoded JSON value, rejecting anything outside the minimal message contract.
    pub fn from_value(value: Value) -> Result<Self, ShapeError> {
        let Value::Object(mut object) = value else {
            return Err(ShapeError::NotAnObject);
        };

        if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(ShapeError::UnsupportedVersion);
        }

        let id = object.remove("id");

        if let Some(method) = object.remove("method") {
            let Value::String(method) = method else {
                return Err(ShapeError::InvalidMethod);
            };
            let params = object.remove("params");

            return match id {
                None => Ok(Self::Notification(JsonRpcNotification {
                    jsonrpc: JsonRpcVersion,
                    method,
                    params,
                })),
                Some(id) => Ok(Self::Request(JsonRpcRequest {
                    jsonrpc: JsonRpcVersion,
                    id: parse_id(id)?,
                    method,
                    params,
                })),
            };
        }

        match (object.remove("result"), object.remove("error")) {
            (Some(result), None) => {
                let id = id.ok_or(ShapeError::MissingId).and_then(parse_id)?;
                Ok(Self::result(id, result))
            }
            (None, Some(error)) => {
                let id = match id {
                    None => return Err(ShapeError::MissingId),
                    Some(Value::Null) => None,
                    Some(id) => Some(parse_id(id)?),
                };
                Ok(Self::error(id, parse_error_object(error)?))
            }
            (Some(_), Some(_)) => Err(ShapeError::AmbiguousResponse),
            (None, None) => Err(ShapeError::Unrecognized),
        }
    }
}

impl<'de> Deserialize<'de> for JsonRpcMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Accepts a single message or a non-empty array of messages; one bad entry rejects the lot.
pub fn parse_batch(value: Value) -> Result<Vec<JsonRpcMessage>, ShapeError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(ShapeError::EmptyBatch);
            }

            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    JsonRpcMessage::from_value(item).map_err(|source| ShapeError::BatchEntry {
                        index,
                        source: Box::new(source),
                    })
                })
                .collect()
        }
        other => Ok(vec![JsonRpcMessage::from_value(other)?]),
    }
}

fn parse_id(value: Value) -> Result<RequestId, ShapeError> {
    match value {
        Value::String(id) => Ok(RequestId::String(id)),
        Value::Number(number) => number
            .as_i64()
            .map(RequestId::Integer)
            .ok_or(ShapeError::InvalidId),
        _ => Err(ShapeError::InvalidId),
    }
}

fn parse_error_object(value: Value) -> Result<JsonRpcErrorObject, ShapeError> {
    let Value::Object(mut object) = value else {
        return Err(ShapeError::InvalidErrorObject);
    };

    let code = object
        .get("code")
        .and_then(Value::as_i64)
        .ok_or(ShapeError::InvalidErrorObject)?;
    let Some(Value::String(message)) = object.remove("message") else {
        return Err(ShapeError::InvalidErrorObject);
    };

    Ok(JsonRpcErrorObject {
        code,
        message,
        data: object.remove("data"),
    })
}

/// Params as an object map, when present.
pub fn params_object(params: Option<&Value>) -> Option<&Map<String, Value>> {
    params.and_then(Value::as_object)
}
