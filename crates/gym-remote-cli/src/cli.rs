//! CLI argument types for the bridge host binary.
//!
//! Defined separately from `main.rs` so tests can parse them directly.

use clap::Parser;
use gym_remote_core::Limits;
use std::path::PathBuf;
use std::time::Duration;

/// Host one environment behind a gym-remote bridge socket.
///
/// Normally started by the client orchestrator, not by hand.
#[derive(Parser, Debug)]
#[command(name = "gym-remote-bridge", version)]
pub struct HostArgs {
    /// Id of the registered environment to host.
    #[arg(long, required_unless_present = "list")]
    pub env: Option<String>,

    /// Session base directory; the socket is created at `<base-dir>/sock`.
    #[arg(long, required_unless_present = "list")]
    pub base_dir: Option<PathBuf>,

    /// Close the session once this many steps were served in an episode.
    #[arg(long)]
    pub timestep_limit: Option<u64>,

    /// Close the session on the first request after this many seconds.
    #[arg(long, value_parser = parse_seconds)]
    pub wallclock_limit: Option<Duration>,

    /// Print the registered environment ids and exit.
    #[arg(long)]
    pub list: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub verbose: bool,
}

impl HostArgs {
    pub fn limits(&self) -> Limits {
        Limits {
            timestep_limit: self.timestep_limit,
            wallclock_limit: self.wallclock_limit,
        }
    }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    gym_remote_core::parse_seconds(s).map_err(|e| e.to_string())
}
