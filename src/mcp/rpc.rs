//! JSON-RPC reply construction helpers
//!
//! Standard error codes and shortcuts for building result and error replies.

use serde_json::{json, Value};

use crate::mcp::message::{JsonRpcErrorObject, JsonRpcMessage, RequestId};

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

pub fn json_rpc_error(id: Option<RequestId>, code: i64, message: &str) -> JsonRpcMessage {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<RequestId>,
    code: i64,
    message: &str,
    data: Option<Value>,
) -> JsonRpcMessage {
    JsonRpcMessage::error(
        id,
        JsonRpcErrorObject {
            code,
            message: message.to_string(),
            data,
        },
    )
}

pub fn json_rpc_result(id: RequestId, result: Value) -> JsonRpcMessage {
    JsonRpcMessage::result(id, result)
}

/// Invalid params reply carrying a machine-readable reason in `data`.
pub fn invalid_params(id: RequestId, code: &str, message: &str) -> JsonRpcMessage {
    json_rpc_error_with_data(
        Some(id),
        INVALID_PARAMS,
        "Invalid params",
        Some(json!({
            "code": code,
            "message": message,
            "details": {}
        })),
    )
}
