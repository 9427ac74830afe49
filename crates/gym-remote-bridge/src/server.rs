//! Bridge server
//!
//! Hosts one environment behind a single-client Unix socket and enforces the
//! session's timestep and wall-clock limits. The serve loop is sequential:
//! one peer, one request at a time.

use crate::environment::Environment;
use crate::protocol::{Request, Response};
use crate::transport::{AsyncReader, AsyncWriter, recv_message, send_message};
use crate::unix::{socket_path, split};
use gym_remote_core::{Limits, RemoteError, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Peer sent Close
    Closed,
    /// Timestep limit reached; the limit-reaching step was served
    TimestepLimit,
    /// A request arrived after the wall-clock limit expired
    WallclockLimit,
    /// Peer went away without sending Close
    PeerDisconnected,
}

/// Socket file owned by the bridge, removed when dropped
struct Endpoint {
    path: PathBuf,
}

impl Endpoint {
    fn bind(path: PathBuf) -> Result<(Self, UnixListener)> {
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                RemoteError::IpcError(format!("Failed to remove stale socket: {}", e))
            })?;
        }
        let listener = UnixListener::bind(&path).map_err(|e| {
            RemoteError::IpcError(format!("Failed to bind {}: {}", path.display(), e))
        })?;
        Ok((Self { path }, listener))
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed endpoint {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove endpoint {}: {}", self.path.display(), e),
        }
    }
}

/// Bridge hosting one environment for one session
pub struct Bridge<E: Environment> {
    /// Hosted environment
    env: E,
    /// Session limits
    limits: Limits,
    /// Socket file, removed on every exit path
    endpoint: Endpoint,
    /// Listener awaiting the single peer; dropped once it connects
    listener: Option<UnixListener>,
    /// Steps served in the current episode
    steps: u64,
    /// Session start, taken when the endpoint is bound
    started: Instant,
}

impl<E: Environment> Bridge<E> {
    /// Create the endpoint under `base_dir`
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(base_dir: &Path, env: E, limits: Limits) -> Result<Self> {
        limits.validate()?;
        let (endpoint, listener) = Endpoint::bind(socket_path(base_dir))?;
        info!(
            "Bridge listening on {} (timestep_limit={:?}, wallclock_limit={:?})",
            endpoint.path.display(),
            limits.timestep_limit,
            limits.wallclock_limit
        );

        Ok(Self {
            env,
            limits,
            endpoint,
            listener: Some(listener),
            steps: 0,
            started: Instant::now(),
        })
    }

    /// Create the endpoint, wait for one peer and serve it until the session ends
    pub async fn listen(base_dir: &Path, env: E, limits: Limits) -> Result<SessionEnd> {
        Self::bind(base_dir, env, limits)?.serve().await
    }

    /// Endpoint path
    pub fn socket_path(&self) -> &Path {
        &self.endpoint.path
    }

    /// Accept exactly one peer and serve it
    ///
    /// The endpoint is removed before this returns, whatever the outcome.
    pub async fn serve(mut self) -> Result<SessionEnd> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| RemoteError::IpcError("Bridge already served a peer".into()))?;
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| RemoteError::IpcError(format!("Accept failed: {}", e)))?;
        drop(listener);
        info!("Peer connected");

        let (mut reader, mut writer) = split(stream);
        let outcome = self.serve_connection(&mut reader, &mut writer).await;

        match &outcome {
            Ok(end) => info!("Session ended: {:?}", end),
            Err(e) => error!("Session failed: {}", e),
        }
        outcome
    }

    async fn serve_connection<R, W>(&mut self, reader: &mut R, writer: &mut W) -> Result<SessionEnd>
    where
        R: AsyncReader + ?Sized,
        W: AsyncWriter + ?Sized,
    {
        loop {
            let request = match recv_message::<_, Request>(reader).await {
                Ok(request) => request,
                Err(RemoteError::ConnectionClosed) => return Ok(SessionEnd::PeerDisconnected),
                Err(e) => return Err(e),
            };

            // Polled at request boundaries only; an in-flight step is never interrupted
            let elapsed = self.started.elapsed();
            if self.limits.wallclock_exceeded(elapsed) {
                warn!(
                    "Wall-clock limit exceeded after {:.3}s, closing",
                    elapsed.as_secs_f64()
                );
                return Ok(SessionEnd::WallclockLimit);
            }

            if let Some(end) = self.dispatch(request, writer).await? {
                return Ok(end);
            }
        }
    }

    /// Handle one request; `Some` ends the session after the response is sent
    async fn dispatch<W>(&mut self, request: Request, writer: &mut W) -> Result<Option<SessionEnd>>
    where
        W: AsyncWriter + ?Sized,
    {
        match request {
            Request::Step { action } => match self.env.step(action).await {
                Ok(result) => {
                    self.steps += 1;
                    send_message(writer, &Response::StepResult { result }).await?;
                    if self.limits.timesteps_exhausted(self.steps) {
                        warn!("Timestep limit reached after {} steps, closing", self.steps);
                        return Ok(Some(SessionEnd::TimestepLimit));
                    }
                }
                Err(e) => {
                    debug!("Step failed: {}", e);
                    send_message(writer, &Response::error(&e)).await?;
                }
            },

            Request::Reset => match self.env.reset().await {
                Ok(observation) => {
                    self.steps = 0;
                    send_message(writer, &Response::ResetComplete { observation }).await?;
                }
                Err(e) => {
                    debug!("Reset failed: {}", e);
                    send_message(writer, &Response::error(&e)).await?;
                }
            },

            Request::Describe => {
                let response = Response::Spaces {
                    action_space: self.env.action_space(),
                    observation_space: self.env.observation_space(),
                };
                send_message(writer, &response).await?;
            }

            Request::Close => {
                send_message(writer, &Response::Closed).await?;
                return Ok(Some(SessionEnd::Closed));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unix::{UnixReadWrapper, UnixWriteWrapper};
    use async_trait::async_trait;
    use gym_remote_core::{Action, Observation, Space, StepResult};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;
    use tokio::task::JoinHandle;

    /// Reward is the number of steps taken this episode; action 1 fails
    struct Counter {
        steps: i64,
    }

    #[async_trait]
    impl Environment for Counter {
        fn action_space(&self) -> Space {
            Space::discrete(2)
        }

        fn observation_space(&self) -> Space {
            Space::discrete(1)
        }

        async fn step(&mut self, action: Action) -> Result<StepResult> {
            if action == Action::Discrete(1) {
                return Err(RemoteError::EnvironmentError("action 1 explodes".into()));
            }
            self.steps += 1;
            Ok(StepResult::new(0, self.steps as f64, false))
        }

        async fn reset(&mut self) -> Result<Observation> {
            self.steps = 0;
            Ok(Observation::Discrete(0))
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        socket: PathBuf,
        server: JoinHandle<Result<SessionEnd>>,
        reader: UnixReadWrapper,
        writer: UnixWriteWrapper,
    }

    impl Harness {
        async fn start(limits: Limits) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let bridge = Bridge::bind(dir.path(), Counter { steps: 0 }, limits).unwrap();
            let socket = bridge.socket_path().to_path_buf();
            let server = tokio::spawn(bridge.serve());
            let (reader, writer) = split(UnixStream::connect(&socket).await.unwrap());
            Self {
                _dir: dir,
                socket,
                server,
                reader,
                writer,
            }
        }

        async fn request(&mut self, request: Request) -> Result<Response> {
            send_message(&mut self.writer, &request).await?;
            recv_message(&mut self.reader).await
        }

        async fn step(&mut self, action: i64) -> Result<Response> {
            self.request(Request::Step {
                action: Action::Discrete(action),
            })
            .await
        }

        async fn finish(self) -> Result<SessionEnd> {
            self.server.await.unwrap()
        }
    }

    fn reward(response: Response) -> f64 {
        match response {
            Response::StepResult { result } => result.reward,
            other => panic!("Expected StepResult, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_limit_reaching_step_is_served() {
        let mut h = Harness::start(Limits::none().with_timestep_limit(3)).await;

        for expected in 1..=3 {
            assert_eq!(reward(h.step(0).await.unwrap()), expected as f64);
        }

        let err = h.step(0).await.unwrap_err();
        assert!(err.is_closed(), "expected ConnectionClosed, got {:?}", err);

        let socket = h.socket.clone();
        assert_eq!(h.finish().await.unwrap(), SessionEnd::TimestepLimit);
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn test_reset_restarts_timestep_count() {
        let mut h = Harness::start(Limits::none().with_timestep_limit(2)).await;

        assert_eq!(reward(h.step(0).await.unwrap()), 1.0);
        assert_eq!(
            h.request(Request::Reset).await.unwrap(),
            Response::ResetComplete {
                observation: Observation::Discrete(0)
            }
        );
        assert_eq!(reward(h.step(0).await.unwrap()), 1.0);
        assert_eq!(reward(h.step(0).await.unwrap()), 2.0);
        assert!(h.step(0).await.unwrap_err().is_closed());
    }

    #[tokio::test]
    async fn test_wallclock_limit_refuses_late_request() {
        let limits = Limits::none().with_wallclock_limit(Duration::from_millis(50));
        let mut h = Harness::start(limits).await;

        assert_eq!(reward(h.step(0).await.unwrap()), 1.0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(h.step(0).await.unwrap_err().is_closed());

        assert_eq!(h.finish().await.unwrap(), SessionEnd::WallclockLimit);
    }

    #[tokio::test]
    async fn test_wallclock_runs_from_bind() {
        let dir = tempfile::tempdir().unwrap();
        let limits = Limits::none().with_wallclock_limit(Duration::from_millis(50));
        let bridge = Bridge::bind(dir.path(), Counter { steps: 0 }, limits).unwrap();
        let socket = bridge.socket_path().to_path_buf();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let server = tokio::spawn(bridge.serve());
        let (mut reader, mut writer) = split(UnixStream::connect(&socket).await.unwrap());
        send_message(&mut writer, &Request::Reset).await.unwrap();
        let err = recv_message::<_, Response>(&mut reader).await.unwrap_err();
        assert!(err.is_closed(), "expected ConnectionClosed, got {:?}", err);

        assert_eq!(server.await.unwrap().unwrap(), SessionEnd::WallclockLimit);
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn test_environment_error_keeps_session_open() {
        let mut h = Harness::start(Limits::none().with_timestep_limit(2)).await;

        match h.step(1).await.unwrap() {
            Response::Error { message, .. } => assert_eq!(message, "action 1 explodes"),
            other => panic!("Expected Error, got {:?}", other),
        }
        // Failed steps do not count towards the limit
        assert_eq!(reward(h.step(0).await.unwrap()), 1.0);
        assert_eq!(reward(h.step(0).await.unwrap()), 2.0);
    }

    #[tokio::test]
    async fn test_close_acknowledged_and_endpoint_removed() {
        let mut h = Harness::start(Limits::none()).await;
        assert!(h.socket.exists());

        match h.request(Request::Describe).await.unwrap() {
            Response::Spaces { action_space, .. } => assert_eq!(action_space, Space::discrete(2)),
            other => panic!("Expected Spaces, got {:?}", other),
        }
        assert_eq!(h.request(Request::Close).await.unwrap(), Response::Closed);

        let socket = h.socket.clone();
        assert_eq!(h.finish().await.unwrap(), SessionEnd::Closed);
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn test_malformed_request_is_protocol_error() {
        let mut h = Harness::start(Limits::none()).await;
        h.writer.write_message(b"{\"Type\":\"Teleport\"}").await.unwrap();

        let socket = h.socket.clone();
        let err = h.finish().await.unwrap_err();
        assert!(matches!(err, RemoteError::ProtocolError(_)));
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn test_peer_hangup_ends_session() {
        let h = Harness::start(Limits::none()).await;
        let Harness {
            _dir,
            socket,
            server,
            reader,
            mut writer,
        } = h;
        writer.0.shutdown().await.unwrap();
        drop(writer);
        drop(reader);

        assert_eq!(server.await.unwrap().unwrap(), SessionEnd::PeerDisconnected);
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn test_zero_limit_rejected_before_binding() {
        let dir = tempfile::tempdir().unwrap();
        let result = Bridge::bind(
            dir.path(),
            Counter { steps: 0 },
            Limits::none().with_timestep_limit(0),
        );
        assert!(matches!(result, Err(RemoteError::InvalidConfig(_))));
        assert!(!socket_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_stale_socket_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(socket_path(dir.path()), b"stale").unwrap();

        let bridge = Bridge::bind(dir.path(), Counter { steps: 0 }, Limits::none()).unwrap();
        let mut stream = UnixStream::connect(bridge.socket_path()).await.unwrap();
        stream.shutdown().await.unwrap();
    }
}
