use super::transport_trait::McpTransportTrait;
use crate::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace, warn};

/// Newline-delimited JSON over a reader/writer pair; stdin/stdout in production.
pub struct StdioTransport<R, W> {
    reader: R,
    writer: W,
}

impl StdioTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn new() -> Self {
        Self::with_io(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl Default for StdioTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn with_io(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[async_trait]
impl<R, W> McpTransportTrait for StdioTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Lines that are not UTF-8 are logged and skipped.
    async fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            let mut buf = Vec::new();
            if self.reader.read_until(b'\n', &mut buf).await? == 0 {
                debug!("Input closed");
                return Ok(None);
            }

            if buf.ends_with(b"\n") {
                buf.pop();
                if buf.ends_with(b"\r") {
                    buf.pop();
                }
            }

            match String::from_utf8(buf) {
                Ok(line) => {
                    trace!("Received line: {}", line);
                    return Ok(Some(line));
                }
                Err(e) => warn!("Dropping non-UTF-8 frame: {}", e.utf8_error()),
            }
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        trace!("Sending line: {}", line.trim_end());

        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.flush().await?;

        Ok(())
    }
}
