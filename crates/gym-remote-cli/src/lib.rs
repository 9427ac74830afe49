//! gym-remote bridge host
//!
//! Library side of the `gym-remote-bridge` binary: argument types, the
//! registry of environments the binary can host, and the host entry point.

pub mod cli;
pub mod envs;

pub use cli::HostArgs;

use anyhow::{Context, Result};
use envs::{BitEnv, StepEnv};
use gym_remote_bridge::{Bridge, EnvRegistry, SessionEnd};
use tracing::info;

/// Registry of the environments shipped with the host binary
pub fn registry() -> EnvRegistry {
    let mut registry = EnvRegistry::new();
    registry
        .register("BitEnv-v0", BitEnv::new)
        .register("StepEnv-v0", StepEnv::new);
    registry
}

/// Host the requested environment until its session ends
///
/// Returns `None` when only listing environments.
pub async fn run(args: HostArgs, registry: &EnvRegistry) -> Result<Option<SessionEnd>> {
    if args.list {
        for id in registry.ids() {
            println!("{}", id);
        }
        return Ok(None);
    }

    let env_id = args.env.as_deref().context("--env is required")?;
    let base_dir = args.base_dir.as_deref().context("--base-dir is required")?;
    let env = registry
        .make(env_id)
        .with_context(|| format!("cannot host environment {}", env_id))?;

    info!("Hosting {} in {}", env_id, base_dir.display());
    let end = Bridge::listen(base_dir, env, args.limits()).await?;
    info!("Bridge for {} finished: {:?}", env_id, end);
    Ok(Some(end))
}
