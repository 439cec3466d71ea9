//! JSON-RPC 2.0 envelopes and the line codec.
//!
//! Every frame is one JSON object on one line. A frame that cannot be
//! trusted (bad JSON, wrong `jsonrpc` version, unusable id) is reported as a
//! [`DecodeError`]; transports log it and write nothing back. A request whose
//! id is readable but whose method or params are not gets an error response
//! instead, see [`DecodeError::response`].

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error as ThisError;

pub const JSONRPC_VERSION: &str = "2.0";
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

pub const INVALID_REQUEST: i32 = -32600;
pub const INVALID_PARAMS: i32 = -32602;

/// Request identifier: a string or any JSON number, echoed back as sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for RequestId {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// A decoded request. `id == None` marks a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub id: Option<RequestId>,
    pub method: String,
    pub params: Map<String, Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: Some(id.into()),
            method: method.into(),
            params: params.as_object().cloned().unwrap_or_default(),
        }
    }

    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            id: None,
            method: method.into(),
            params: Map::new(),
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(JsonRpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error(id: RequestId, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Error(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn from_error(id: RequestId, err: &Error) -> Self {
        Self::error(id, err.error_code(), err.to_string())
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_body(&self) -> Option<&JsonRpcError> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(err) => Some(err),
        }
    }
}

/// Why a frame was dropped.
#[derive(Debug, ThisError)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("missing jsonrpc version")]
    MissingVersion,

    #[error("unsupported jsonrpc version: {0}")]
    UnsupportedVersion(String),

    #[error("missing or non-string method")]
    MissingMethod(Option<RequestId>),

    #[error("id must be a string or a number")]
    InvalidId,

    #[error("params must be an object")]
    InvalidParams(Option<RequestId>),
}

impl DecodeError {
    /// Error reply for a request whose id could still be read.
    ///
    /// Notifications and frames without a usable id get `None`.
    pub fn response(&self) -> Option<JsonRpcResponse> {
        let (id, code) = match self {
            Self::MissingMethod(Some(id)) => (id, INVALID_REQUEST),
            Self::InvalidParams(Some(id)) => (id, INVALID_PARAMS),
            _ => return None,
        };
        Some(JsonRpcResponse::error(id.clone(), code, self.to_string()))
    }
}

/// Decodes one line into a request.
pub fn decode(line: &str) -> Result<JsonRpcRequest, DecodeError> {
    let value: Value = serde_json::from_str(line)?;
    let Value::Object(mut frame) = value else {
        return Err(DecodeError::NotAnObject);
    };

    match frame.get("jsonrpc") {
        None => return Err(DecodeError::MissingVersion),
        Some(Value::String(v)) if v == JSONRPC_VERSION => {}
        Some(other) => {
            let shown = other
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string());
            return Err(DecodeError::UnsupportedVersion(shown));
        }
    }

    let id = match frame.remove("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(RequestId::String(s)),
        Some(Value::Number(n)) => Some(RequestId::Number(n)),
        Some(_) => return Err(DecodeError::InvalidId),
    };

    let method = match frame.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(DecodeError::MissingMethod(id)),
    };

    let params = match frame.remove("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params,
        Some(_) => return Err(DecodeError::InvalidParams(id)),
    };

    Ok(JsonRpcRequest { id, method, params })
}

/// Encodes a response as one newline-terminated line.
pub fn encode(response: &JsonRpcResponse) -> crate::Result<String> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    Ok(line)
}

/// Static identity reported by `initialize` and `system_info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
