pub mod database_tools;
pub mod dispatch;
pub mod error;
pub mod jsonrpc;
pub mod result;
pub mod tools;

#[cfg(test)]
mod testing;

pub use database_tools::database_registry;
pub use dispatch::{Dispatcher, ServerInfo};
pub use error::{DispatchError, HandlerError, RegistryError};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use result::ToolResult;
pub use tools::{ToolDefinition, ToolHandler, ToolRegistry};
