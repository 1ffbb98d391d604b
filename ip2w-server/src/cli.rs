use anyhow::bail;
use clap::{Parser, Subcommand};
use ip2w_core::{Config, ConfigError, Handler, Request};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use crate::{logging, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "ip2w", version, about = "Current weather for an IP address")]
pub struct Cli {
    /// Config file; defaults to $IP2W_CONFIG or the platform config dir.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve `/ip2w/[<ip>]` over HTTP (the default).
    Serve {
        /// Address to listen on; overrides `server.bind`.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Run one lookup and print the JSON response.
    Lookup {
        /// IPv4 address; omit to look up this machine's address.
        ip: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let loaded = match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        };

        let default_logging = Default::default();
        let logging_config = loaded.as_ref().map(|cfg| &cfg.logging).unwrap_or(&default_logging);
        let logging = logging::init(logging_config);

        let (config, handler) = split(loaded, logging);

        match self.command.unwrap_or(Command::Serve { bind: None }) {
            Command::Serve { bind } => {
                let bind = bind.unwrap_or(config.server.bind);
                server::serve(Arc::new(handler), bind).await
            }
            Command::Lookup { ip } => {
                let request = Request::new(format!("/ip2w/{}", ip.unwrap_or_default()));
                let response = handler.handle(&request).await;

                println!("{}", String::from_utf8_lossy(&response.body));
                if !response.status.is_success() {
                    bail!("lookup failed with status {}", response.status);
                }
                Ok(())
            }
        }
    }
}

/// Config (or defaults, for bind address and such) plus the handler built from it.
///
/// A config that loaded but whose logging section failed keeps its bind
/// address; the handler still refuses every request.
fn split(
    loaded: Result<Config, ConfigError>,
    logging: Result<(), ConfigError>,
) -> (Config, Handler) {
    match (loaded, logging) {
        (Ok(config), Ok(())) => {
            tracing::info!("configuration loaded");
            let handler = Handler::from_config(Ok(&config));
            (config, handler)
        }
        (Ok(config), Err(err)) => (config, Handler::from_config(Err(err))),
        (Err(err), _) => (Config::default(), Handler::from_config(Err(err))),
    }
}
