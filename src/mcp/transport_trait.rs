use crate::Result;
use async_trait::async_trait;

/// Line-oriented transport, so the server loop can be driven by mocks.
#[async_trait]
pub trait McpTransportTrait: Send {
    /// Reads the next frame without its line terminator. `None` means EOF.
    async fn read_line(&mut self) -> Result<Option<String>>;

    /// Writes one frame and flushes. A missing trailing newline is added.
    async fn write_line(&mut self, line: &str) -> Result<()>;
}
