//! JSON-RPC 2.0 message envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    core::error::RadioError,
    protocol::{notification::Notification, request::Request, response::Response},
};

/// JSON-RPC 2.0 request wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub request: Request,
    pub id: RequestId,
}

/// JSON-RPC 2.0 response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: RequestId,
}

/// JSON-RPC 2.0 notification wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub notification: Notification,
}

/// Any message the bridge sends to the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

/// Request ID (number or string)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Standard JSON-RPC error codes
impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Radio bridge error codes
    pub const RADIO_ERROR: i32 = -32001;
    pub const INVALID_STATE: i32 = -32002;
    pub const NOT_INITIALIZED: i32 = -32003;
    pub const TIMEOUT: i32 = -32004;

    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found() -> Self {
        Self::new(Self::METHOD_NOT_FOUND, "Method not found")
    }

    pub fn radio_error(message: impl Into<String>) -> Self {
        Self::new(Self::RADIO_ERROR, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_STATE, message)
    }

    pub fn not_initialized() -> Self {
        Self::new(Self::NOT_INITIALIZED, "Radio not initialized")
    }

    pub fn timeout() -> Self {
        Self::new(Self::TIMEOUT, "Operation timed out")
    }
}

impl From<JsonRpcError> for RadioError {
    fn from(error: JsonRpcError) -> Self {
        match error.code {
            JsonRpcError::INVALID_STATE => RadioError::InvalidState(error.message),
            JsonRpcError::NOT_INITIALIZED => RadioError::NotInitialized,
            JsonRpcError::TIMEOUT => RadioError::Timeout,
            JsonRpcError::RADIO_ERROR => RadioError::Driver(error.message),
            code => RadioError::Bridge(format!("{} ({})", error.message, code)),
        }
    }
}

impl JsonRpcRequest {
    pub fn new(request: Request, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            request,
            id,
        }
    }
}

impl JsonRpcResponse {
    pub fn success(result: Response, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(error: JsonRpcError, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

impl JsonRpcNotification {
    pub fn new(notification: Notification) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            notification,
        }
    }
}
