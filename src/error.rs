use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Unknown prompt: {0}")]
    PromptNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// Failure raised by a capability that wants a specific JSON-RPC code.
    #[error("{message}")]
    Tool { code: i32, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn error_code(&self) -> i32 {
        match self {
            Error::MethodNotFound(_) | Error::ToolNotFound(_) => -32601,
            Error::InvalidParams(_) | Error::ResourceNotFound(_) | Error::PromptNotFound(_) => {
                -32602
            }
            Error::InvalidSession(_) => -32001,
            Error::Tool { code, .. } => *code,
            Error::SiteNotFound(_) | Error::Storage(_) | Error::Internal(_) => -32603,
            Error::Io(_) | Error::Json(_) => -32603,
        }
    }

    pub fn tool(code: i32, message: impl Into<String>) -> Self {
        Error::Tool {
            code,
            message: message.into(),
        }
    }
}

/// Errors raised while loading the server configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration validation failed: {0}")]
    Invalid(String),
}
