pub mod config;
pub mod error;
pub mod mcp;
pub mod session;
pub mod site;

pub use config::ServerConfig;
pub use error::Error;
pub use mcp::McpServer;

pub type Result<T> = std::result::Result<T, Error>;

/// Runs the stdio server until its input closes.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let server = McpServer::new(config);
    server.run().await
}

/// Runs the HTTP session server until ctrl-c.
pub async fn serve_http(config: ServerConfig) -> Result<()> {
    let server = McpServer::new(config);
    server.serve_http().await
}
