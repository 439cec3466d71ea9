use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cms_mcp::ServerConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cms_mcp")]
#[command(about = "MCP server exposing multi-site CMS content", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server listening on STDIO
    Serve {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Start the HTTP session transport
    ServeHttp {
        #[command(flatten)]
        common: CommonArgs,

        /// Address to listen on (overrides the config file)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding one sub-directory per site
    #[arg(long)]
    sites_root: Option<PathBuf>,

    /// Site used when a call names none
    #[arg(long)]
    default_site: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl CommonArgs {
    fn init_logging(&self) {
        let level = if self.verbose { "debug" } else { &self.log_level };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        // stdout carries the protocol, so logs always go to stderr.
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        match self.log_format {
            LogFormat::Text => builder.init(),
            LogFormat::Json => builder.json().init(),
        }
    }

    fn load_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(root) = &self.sites_root {
            config.sites_root = root.clone();
        }
        if let Some(site) = &self.default_site {
            config.default_site = site.clone();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { common } => {
            common.init_logging();
            let config = common.load_config()?;

            cms_mcp::serve(config)
                .await
                .context("stdio server failed")?;
        }
        Commands::ServeHttp { common, bind } => {
            common.init_logging();
            let mut config = common.load_config()?;
            if let Some(bind) = bind {
                config.bind = bind;
            }

            cms_mcp::serve_http(config)
                .await
                .context("HTTP server failed")?;
        }
    }

    Ok(())
}
