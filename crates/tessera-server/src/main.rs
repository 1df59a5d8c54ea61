use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tessera_server::TesseraServer;
use tessera_server::config::loader::load_config;
use tessera_server::observability::init_tracing;

#[derive(Parser)]
#[command(name = "tessera-server")]
#[command(about = "OAuth 2.0 / OpenID Connect provider")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "TESSERA_CONFIG", default_value = "tessera.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(2);
        }
    };
    init_tracing(&cfg.logging);
    tracing::info!(path = %cli.config.display(), "configuration loaded");

    let server = match TesseraServer::new(&cfg) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "server initialization failed");
            return ExitCode::from(2);
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server terminated");
            ExitCode::FAILURE
        }
    }
}
