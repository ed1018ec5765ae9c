use crate::jsonrpc::{METHOD_NOT_FOUND, SERVER_ERROR};

/// Failure raised by a tool before it reaches its own result boundary, such
/// as a missing or mistyped argument. Reported to the caller as
/// `isError: true`.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{tool}() arguments must be a JSON object")]
    ArgumentsNotObject { tool: &'static str },

    #[error("{tool}() invalid arguments: {message}")]
    InvalidArguments { tool: &'static str, message: String },
}

/// Registry construction failure.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}

/// Errors reported in the JSON-RPC envelope rather than inside a tool result.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    #[error("{0}")]
    MalformedRequest(String),
}

impl DispatchError {
    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::ToolNotFound(_) | Self::MalformedRequest(_) => SERVER_ERROR,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
        }
    }
}
