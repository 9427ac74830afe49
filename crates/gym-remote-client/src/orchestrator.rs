//! Process orchestrator
//!
//! Flow:
//! 1. Allocate a fresh session base directory
//! 2. Spawn the bridge host process for the requested environment
//! 3. Poll the endpoint until it accepts a connection (bounded by the startup timeout)
//! 4. Hand the connection to a `RemoteEnv`
//!
//! The base directory and the subprocess belong to the returned proxy and are
//! released on close, on drop, and on every startup failure path.

use crate::RemoteEnv;
use gym_remote_bridge::unix::socket_path;
use gym_remote_core::{Limits, RemoteError, Result, format_seconds};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

/// Environment variable naming the bridge host binary
pub const BRIDGE_PROGRAM_ENV: &str = "GYM_REMOTE_BRIDGE";

/// Name of the bridge host binary
pub const DEFAULT_BRIDGE_PROGRAM: &str = "gym-remote-bridge";

/// Configuration for spawning bridge processes
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Host binary to run (default: `$GYM_REMOTE_BRIDGE`, else next to the
    /// current executable, else looked up on PATH)
    pub bridge_program: PathBuf,
    /// How long to wait for the endpoint to become reachable
    pub startup_timeout: Duration,
    /// How long to wait for the bridge to exit on close before killing it
    pub shutdown_timeout: Duration,
    /// Interval between endpoint connection attempts
    pub poll_interval: Duration,
    /// Directory to create session directories in (default: system temp dir)
    pub temp_root: Option<PathBuf>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            bridge_program: default_bridge_program(),
            startup_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            temp_root: None,
        }
    }
}

impl SpawnConfig {
    pub fn with_bridge_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.bridge_program = program.into();
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }
}

fn default_bridge_program() -> PathBuf {
    if let Some(program) = std::env::var_os(BRIDGE_PROGRAM_ENV) {
        return program.into();
    }

    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_BRIDGE_PROGRAM)));
    match sibling {
        Some(path) if path.exists() => path,
        _ => PathBuf::from(DEFAULT_BRIDGE_PROGRAM),
    }
}

/// Bridge subprocess plus the base directory it serves from
pub(crate) struct Session {
    child: Child,
    dir: Option<TempDir>,
    shutdown_timeout: Duration,
}

impl Session {
    /// Wait for the bridge to exit, killing it if it overstays
    pub(crate) async fn reap(&mut self) {
        match timeout(self.shutdown_timeout, self.child.wait()).await {
            Ok(Ok(status)) => debug!("Bridge process exited: {}", status),
            Ok(Err(e)) => warn!("Failed to wait for bridge process: {}", e),
            Err(_) => {
                warn!(
                    "Bridge process did not exit within {:?}, killing",
                    self.shutdown_timeout
                );
                if let Err(e) = self.child.kill().await {
                    warn!("Failed to kill bridge process: {}", e);
                }
            }
        }
    }

    /// Remove the base directory
    pub(crate) fn release(mut self) -> Result<()> {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            dir.close().map_err(|e| {
                RemoteError::IpcError(format!("Failed to remove {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Try to kill the bridge process if still running
        let _ = self.child.start_kill();
    }
}

/// Start a bridge process hosting `env_id` with the default configuration
pub async fn spawn(env_id: &str, limits: Limits) -> Result<RemoteEnv> {
    spawn_with_config(env_id, limits, SpawnConfig::default()).await
}

/// Start a bridge process hosting `env_id` and connect a proxy to it
pub async fn spawn_with_config(
    env_id: &str,
    limits: Limits,
    config: SpawnConfig,
) -> Result<RemoteEnv> {
    limits.validate()?;

    let dir = match &config.temp_root {
        Some(root) => tempfile::Builder::new()
            .prefix("gym-remote-")
            .tempdir_in(root),
        None => tempfile::Builder::new().prefix("gym-remote-").tempdir(),
    }
    .map_err(|e| RemoteError::StartupError(format!("Failed to create base directory: {}", e)))?;
    let base_dir = dir.path().to_path_buf();

    let mut command = Command::new(&config.bridge_program);
    command
        .arg("--env")
        .arg(env_id)
        .arg("--base-dir")
        .arg(&base_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .args(limit_args(&limits))
        .kill_on_drop(true);

    info!(
        "Spawning {} for {} in {}",
        config.bridge_program.display(),
        env_id,
        base_dir.display()
    );
    let child = command.spawn().map_err(|e| {
        RemoteError::StartupError(format!(
            "Failed to spawn {}: {}",
            config.bridge_program.display(),
            e
        ))
    })?;

    let mut session = Session {
        child,
        dir: Some(dir),
        shutdown_timeout: config.shutdown_timeout,
    };

    let endpoint = socket_path(&base_dir);
    let stream = match wait_for_endpoint(&mut session.child, &endpoint, &config).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = session.child.kill().await;
            return Err(e);
        }
    };

    RemoteEnv::attach(stream, base_dir, Some(session)).await
}

/// Host binary flags carrying the session limits
fn limit_args(limits: &Limits) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(steps) = limits.timestep_limit {
        args.push("--timestep-limit".to_string());
        args.push(steps.to_string());
    }
    if let Some(limit) = limits.wallclock_limit {
        args.push("--wallclock-limit".to_string());
        args.push(format_seconds(limit));
    }
    args
}

/// Poll until the endpoint accepts a connection
///
/// The first successful connection is the session connection: the bridge
/// serves exactly one peer.
async fn wait_for_endpoint(
    child: &mut Child,
    endpoint: &Path,
    config: &SpawnConfig,
) -> Result<UnixStream> {
    let deadline = Instant::now() + config.startup_timeout;

    loop {
        let exited = child
            .try_wait()
            .map_err(|e| RemoteError::StartupError(format!("Failed to poll bridge process: {}", e)))?;
        if let Some(status) = exited {
            return Err(RemoteError::StartupError(format!(
                "Bridge process exited before its endpoint was reachable ({})",
                status
            )));
        }

        match UnixStream::connect(endpoint).await {
            Ok(stream) => {
                debug!("Endpoint {} reachable", endpoint.display());
                return Ok(stream);
            }
            Err(e) => debug!("Endpoint not ready: {}", e),
        }

        if Instant::now() >= deadline {
            return Err(RemoteError::StartupError(format!(
                "Endpoint {} not reachable within {:?}",
                endpoint.display(),
                config.startup_timeout
            )));
        }
        sleep(config.poll_interval).await;
    }
}
