pub mod dispatcher;
pub mod http;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod tools;
pub mod transport;
pub mod transport_trait;

use crate::config::ServerConfig;
use crate::session::SessionManager;
use crate::site::{SiteContextManager, SiteDirectory};
use crate::Result;
use dispatcher::Dispatcher;
use protocol::JsonRpcResponse;
use registry::Registry;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use transport::StdioTransport;
use transport_trait::McpTransportTrait;

pub struct McpServer {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry(config, Registry::with_builtins())
    }

    pub fn with_registry(config: ServerConfig, registry: Registry) -> Self {
        info!("Initializing MCP server");

        let sites_root = config.sites_root();
        info!(
            "Sites root: {} (default site: {})",
            sites_root.display(),
            config.default_site
        );

        let sites = Arc::new(SiteContextManager::new(
            SiteDirectory::new(sites_root),
            config.default_site.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), sites));

        Self { config, dispatcher }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Decodes and dispatches one input line.
    ///
    /// Blank lines, undecodable frames and notifications yield `None`. A
    /// request with a readable id but a bad method or params is answered
    /// with an error.
    pub async fn process_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match protocol::decode(line) {
            Ok(request) => self.dispatcher.dispatch(request).await,
            Err(e) => match e.response() {
                Some(response) => {
                    warn!("Rejecting invalid request {}: {}", response.id, e);
                    Some(response)
                }
                None => {
                    warn!("Dropping undecodable frame: {}", e);
                    None
                }
            },
        }
    }

    /// Serves stdin/stdout until EOF.
    pub async fn run(&self) -> Result<()> {
        let mut transport = StdioTransport::new();
        self.run_transport(&mut transport).await
    }

    /// Strictly sequential loop: one request is read, executed and answered
    /// before the next is read. There is no timeout, so a tool that never
    /// returns stalls the server.
    pub async fn run_transport<T: McpTransportTrait + ?Sized>(&self, transport: &mut T) -> Result<()> {
        info!("Starting MCP server on stdio");

        loop {
            let line = match transport.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Input closed, shutting down");
                    return Ok(());
                }
                Err(e) => {
                    error!("Failed to read message: {}", e);
                    return Err(e);
                }
            };

            let Some(response) = self.process_line(&line).await else {
                continue;
            };

            let encoded = protocol::encode(&response)?;
            if let Err(e) = transport.write_line(&encoded).await {
                error!("Failed to write response: {}", e);
                return Err(e);
            }
            debug!("Answered request {}", response.id);
        }
    }

    /// Serves the HTTP session transport on the configured address until ctrl-c.
    pub async fn serve_http(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind).await?;
        self.serve_http_on(listener, shutdown_signal()).await
    }

    pub async fn serve_http_on(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let sessions = Arc::new(SessionManager::new(self.config.session_max_age()));
        let cleanup = sessions.start_cleanup_task(self.config.cleanup_interval());
        let (router, worker) = http::start(
            Arc::clone(&self.dispatcher),
            sessions,
            self.config.max_poll_wait(),
        );

        let served = http::serve(listener, router, shutdown).await;

        cleanup.abort();
        worker.abort();
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
