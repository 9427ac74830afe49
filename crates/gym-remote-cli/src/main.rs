//! gym-remote bridge host binary
//!
//! Hosts one registered environment behind a Unix socket for a single
//! client, then exits when the session ends.

use anyhow::Result;
use clap::Parser;
use gym_remote_cli::HostArgs;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Single-threaded: the bridge serves one request at a time
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = HostArgs::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    gym_remote_cli::run(args, &gym_remote_cli::registry()).await?;
    Ok(())
}
