mod health;
mod mcp;

pub use health::health;
pub use mcp::{capabilities, debug_tools, mcp_request};
