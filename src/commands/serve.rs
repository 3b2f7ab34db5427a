use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Args;

use crate::config::{Overrides, Settings};
use crate::logging::{self, LogConfig};
use crate::server;

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on (default: PORT or 8080).
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub model: Option<String>,

    /// Named profile from the config file.
    #[arg(long)]
    pub profile: Option<String>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

pub fn run(args: ServeArgs) -> Result<(), String> {
    let overrides = Overrides {
        model: args.model.clone(),
        port: args.port,
        debug: args.debug.then_some(true),
        ..Overrides::default()
    };
    let settings = Settings::resolve(args.profile.as_deref(), &overrides)?;
    logging::init(LogConfig::from_debug(settings.debug));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to start async runtime: {err}"))?;

    let addr = SocketAddr::new(args.host, settings.port);
    runtime
        .block_on(server::serve(addr, settings.assistant))
        .map_err(|err| format!("Server on {addr} failed: {err}"))
}
