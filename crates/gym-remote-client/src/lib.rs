//! gym-remote client for driving environments hosted in another process
//!
//! This crate provides:
//! - `RemoteEnv`, a proxy exposing `step`/`reset`/`close` over a bridge socket
//! - `spawn`, which starts an isolated bridge process and returns a connected proxy

pub mod orchestrator;

pub use orchestrator::{SpawnConfig, spawn, spawn_with_config};

use gym_remote_bridge::unix::{UnixReadWrapper, UnixWriteWrapper, socket_path, split};
use gym_remote_bridge::{Request, Response, recv_message, send_message};
use gym_remote_core::{Action, Observation, RemoteError, Result, Space, StepResult};
use orchestrator::Session;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;
use tracing::{debug, info, warn};

/// Open connection to a bridge
struct Connection {
    reader: UnixReadWrapper,
    writer: UnixWriteWrapper,
}

/// Proxy for an environment hosted by a bridge
///
/// Every call is forwarded over the session socket. Once the bridge tears the
/// session down (explicit close or a limit breach) the proxy is closed for
/// good and every operation fails with `RemoteError::ConnectionClosed`.
pub struct RemoteEnv {
    /// Session base directory
    base_dir: PathBuf,
    /// Session endpoint
    socket_path: PathBuf,
    /// `None` once the session is closed
    connection: Option<Connection>,
    /// Bridge subprocess and base directory, when spawned by us
    session: Option<Session>,
    /// Set once `close()` has run
    shut_down: bool,
    action_space: Space,
    observation_space: Space,
}

impl RemoteEnv {
    /// Connect to a bridge already listening under `base_dir`
    ///
    /// The proxy does not own the bridge process.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let stream = UnixStream::connect(socket_path(&base_dir))
            .await
            .map_err(|e| RemoteError::IpcError(format!("Failed to connect: {}", e)))?;
        Self::attach(stream, base_dir, None).await
    }

    /// Build a proxy on an established connection and fetch the spaces
    pub(crate) async fn attach(
        stream: UnixStream,
        base_dir: PathBuf,
        session: Option<Session>,
    ) -> Result<Self> {
        let (mut reader, mut writer) = split(stream);

        send_message(&mut writer, &Request::Describe).await?;
        let (action_space, observation_space) = match recv_message(&mut reader).await? {
            Response::Spaces {
                action_space,
                observation_space,
            } => (action_space, observation_space),
            other => {
                return Err(RemoteError::ProtocolError(format!(
                    "Expected Spaces, got {}",
                    other.name()
                )));
            }
        };
        info!(
            "Connected to bridge at {} (action_space={}, observation_space={})",
            base_dir.display(),
            action_space,
            observation_space
        );

        Ok(Self {
            socket_path: socket_path(&base_dir),
            base_dir,
            connection: Some(Connection { reader, writer }),
            session,
            shut_down: false,
            action_space,
            observation_space,
        })
    }

    /// Execute an action and get the step result
    pub async fn step(&mut self, action: Action) -> Result<StepResult> {
        match self.request(Request::Step { action }).await? {
            Response::StepResult { result } => Ok(result),
            other => Err(self.unexpected("StepResult", other)),
        }
    }

    /// Reset the environment and get the initial observation
    pub async fn reset(&mut self) -> Result<Observation> {
        match self.request(Request::Reset).await? {
            Response::ResetComplete { observation } => Ok(observation),
            other => Err(self.unexpected("ResetComplete", other)),
        }
    }

    /// End the session
    ///
    /// Sends Close if the connection is still open, reaps the bridge process,
    /// and removes the endpoint and base directory. Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        if self.connection.is_some() {
            match self.request(Request::Close).await {
                Ok(Response::Closed) | Err(RemoteError::ConnectionClosed) => {}
                Ok(other) => warn!("Unexpected response to Close: {}", other.name()),
                Err(e) => warn!("Close request failed: {}", e),
            }
            self.connection = None;
        }

        let mut session = self.session.take();
        if let Some(session) = session.as_mut() {
            session.reap().await;
        }

        match std::fs::remove_file(&self.socket_path) {
            Ok(()) => debug!("Removed endpoint {}", self.socket_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(RemoteError::IpcError(format!(
                    "Failed to remove endpoint {}: {}",
                    self.socket_path.display(),
                    e
                )));
            }
        }

        if let Some(session) = session {
            session.release()?;
        }
        info!("Session at {} closed", self.base_dir.display());
        Ok(())
    }

    /// Session base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Session endpoint path
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Whether the session has ended
    pub fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    pub fn action_space(&self) -> &Space {
        &self.action_space
    }

    pub fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    /// Send a request and wait for its response
    ///
    /// A vanished peer or a protocol violation closes the proxy. Error
    /// responses from the environment are returned as errors and leave the
    /// session open.
    async fn request(&mut self, request: Request) -> Result<Response> {
        let connection = self
            .connection
            .as_mut()
            .ok_or(RemoteError::ConnectionClosed)?;

        let outcome: Result<Response> = async {
            send_message(&mut connection.writer, &request).await?;
            recv_message(&mut connection.reader).await
        }
        .await;

        match outcome {
            Ok(Response::Error { kind, message }) => Err(RemoteError::from_remote(kind, message)),
            Ok(response) => Ok(response),
            Err(e) => {
                if e.is_closed() {
                    info!("Bridge closed the session");
                } else {
                    warn!("Dropping connection after transport failure: {}", e);
                }
                self.connection = None;
                Err(e)
            }
        }
    }

    fn unexpected(&mut self, expected: &str, got: Response) -> RemoteError {
        self.connection = None;
        RemoteError::ProtocolError(format!("Expected {}, got {}", expected, got.name()))
    }
}
