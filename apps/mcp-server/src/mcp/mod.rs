//! Model Context Protocol implementation

pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use server::GenUiMcpServer;
