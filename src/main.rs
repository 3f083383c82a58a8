use std::sync::Arc;

use color_eyre::Result;
use kaiwa::cli::{parse_args, run_cli_command, CliCommand, USAGE};
use kaiwa::{ApiClient, ClientConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr so command output on stdout stays clean
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    if !matches!(command, CliCommand::Version | CliCommand::Help) {
        init_logging();
    }

    let api = Arc::new(ApiClient::new(ClientConfig::from_env())?);
    run_cli_command(command, api, &mut std::io::stdout()).await
}
