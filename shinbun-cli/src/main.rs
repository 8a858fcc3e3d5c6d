//! Shinbun CLI - feed service entrypoint
//!
//! Configures logging and runs the aggregation API server.

use std::net::SocketAddr;

use clap::Parser;
use shinbun_core::config::ShinbunConfig;
use shinbun_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "shinbun")]
#[command(about = "Anime release feed aggregation server")]
struct Cli {
    /// Address to bind the API server on
    #[arg(long, default_value = "127.0.0.1:8001")]
    bind: SocketAddr,

    /// Console log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: CliLogLevel,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level());

    let mut config = ShinbunConfig::default();
    config.server.bind_addr = cli.bind;

    shinbun_web::run_server(config).await
}
