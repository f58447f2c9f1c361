//! Demo service: `/ping`, `/divide?d=N` and `/stream-closed` behind the
//! access-log and recovery middleware.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use service_log::config::{load_config, LogConfig};
use service_log::lifecycle::SyncOnDrop;
use service_log::{logging, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "service-log", version, about)]
struct Args {
    /// Environment mode: "prod", "test", or anything else for console only.
    #[arg(long, default_value = "dev")]
    env: String,

    /// TOML logging configuration; `--env` overrides its mode.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Omit stack traces from recovered panics.
    #[arg(long)]
    no_stack: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => LogConfig::default(),
    };
    config.mode = args.env.as_str().into();

    logging::init_logger_with(config)?;
    let _sync = SyncOnDrop::new();

    let registry = logging::registry().ok_or("logger registry missing after init")?;
    let log = registry.sugar();
    log.info_kv("logger initialized", &[("mode", &registry.mode())]);

    let listener = TcpListener::bind(&args.bind).await?;
    let server = HttpServer::new(registry.clone(), !args.no_stack);
    server.run(listener).await?;

    log.info(format_args!("shutdown complete"));
    Ok(())
}
