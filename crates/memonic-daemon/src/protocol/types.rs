//! JSON-RPC 2.0 request/response types for the daemon's wire protocol
//! (§4.10, §6): one frame per line, one response per request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version
pub const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// JSON-RPC REQUEST/RESPONSE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// ============================================================================
// JSON-RPC ERROR
// ============================================================================

/// Standard JSON-RPC error codes.
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code as i32
    }
}

/// Tool-level error kinds (§7), carried in [`JsonRpcError::data`] so callers
/// can match on the kind without parsing `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    ToolNotFound,
    NotFound,
    ToolExecutionError,
    Timeout,
    StoreError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code: code.into(),
            message: message.to_string(),
            data: None,
        }
    }

    fn with_kind(code: ErrorCode, message: &str, kind: ToolErrorKind) -> Self {
        Self {
            code: code.into(),
            message: message.to_string(),
            data: Some(serde_json::json!({ "kind": kind })),
        }
    }

    pub fn parse_error() -> Self {
        Self::new(ErrorCode::ParseError, "parse error")
    }

    pub fn invalid_request(message: &str) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::with_kind(
            ErrorCode::MethodNotFound,
            &format!("method not found: {method}"),
            ToolErrorKind::ToolNotFound,
        )
    }

    pub fn tool_not_found(tool: &str) -> Self {
        Self::with_kind(
            ErrorCode::MethodNotFound,
            &format!("tool not found: {tool}"),
            ToolErrorKind::ToolNotFound,
        )
    }

    pub fn invalid_params(message: &str) -> Self {
        Self::with_kind(ErrorCode::InvalidParams, message, ToolErrorKind::InvalidParams)
    }

    pub fn not_found(message: &str) -> Self {
        Self::with_kind(ErrorCode::InvalidRequest, message, ToolErrorKind::NotFound)
    }

    pub fn store_error(message: &str) -> Self {
        Self::with_kind(ErrorCode::InternalError, message, ToolErrorKind::StoreError)
    }

    pub fn tool_execution_error(message: &str) -> Self {
        Self::with_kind(ErrorCode::InternalError, message, ToolErrorKind::ToolExecutionError)
    }

    pub fn timeout(message: &str) -> Self {
        Self::with_kind(ErrorCode::InternalError, message, ToolErrorKind::Timeout)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

/// Maps a core error to a JSON-RPC error using the §7 taxonomy: not-found
/// conditions become `not_found`, everything else becomes `store_error`.
impl From<memonic_core::MemonicError> for JsonRpcError {
    fn from(err: memonic_core::MemonicError) -> Self {
        match &err {
            memonic_core::MemonicError::NotFound(id) => {
                JsonRpcError::not_found(&format!("not found: {id}"))
            }
            memonic_core::MemonicError::Validation(_) | memonic_core::MemonicError::EmbedderUnavailable(_) => {
                JsonRpcError::invalid_params(&err.to_string())
            }
            memonic_core::MemonicError::Timeout(_) => JsonRpcError::timeout(&err.to_string()),
            other => JsonRpcError::store_error(&other.to_string()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(Value::Number(1.into())),
            method: "test".to_string(),
            params: Some(serde_json::json!({"key": "value"})),
        };

        let json = serde_json::to_string(&request).unwrap();
        let parsed: JsonRpcRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.method, "test");
        assert!(parsed.id.is_some());
    }

    #[test]
    fn test_notification() {
        let notification = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: "notify".to_string(),
            params: None,
        };

        assert!(notification.id.is_none());
    }

    #[test]
    fn test_response_success() {
        let response = JsonRpcResponse::success(
            Some(Value::Number(1.into())),
            serde_json::json!({"result": "ok"}),
        );

        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_response_error() {
        let response = JsonRpcResponse::error(
            Some(Value::Number(1.into())),
            JsonRpcError::method_not_found("missing"),
        );

        assert!(response.result.is_none());
        assert!(response.error.is_some());
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn not_found_error_carries_kind() {
        let err = JsonRpcError::not_found("no such node");
        assert_eq!(err.data.unwrap()["kind"], "not_found");
    }
}
