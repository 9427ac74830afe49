//! Unix socket transport implementation
//!
//! Each session lives in its own base directory; the endpoint is the socket
//! file `<base_dir>/sock`.

use crate::transport::{AsyncReader, AsyncWriter, MAX_FRAME_LEN};
use async_trait::async_trait;
use gym_remote_core::{RemoteError, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

/// File name of the session endpoint inside the base directory
pub const SOCKET_NAME: &str = "sock";

/// Endpoint path for a session base directory
pub fn socket_path(base_dir: &Path) -> PathBuf {
    base_dir.join(SOCKET_NAME)
}

/// Split a connected stream into framed read/write halves
pub fn split(stream: UnixStream) -> (UnixReadWrapper, UnixWriteWrapper) {
    let (read_half, write_half) = stream.into_split();
    (UnixReadWrapper(read_half), UnixWriteWrapper(write_half))
}

/// Unix socket read wrapper
pub struct UnixReadWrapper(pub OwnedReadHalf);

#[async_trait]
impl AsyncReader for UnixReadWrapper {
    async fn read_message(&mut self) -> Result<Vec<u8>> {
        // Read 4-byte length prefix (little-endian)
        let mut len_bytes = [0u8; 4];
        self.0
            .read_exact(&mut len_bytes)
            .await
            .map_err(|e| RemoteError::from_io("Unix read length failed", e))?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len > MAX_FRAME_LEN {
            return Err(RemoteError::ProtocolError(format!(
                "Message too large: {} bytes",
                len
            )));
        }

        // Read message body
        let mut data = vec![0u8; len];
        self.0
            .read_exact(&mut data)
            .await
            .map_err(|e| RemoteError::from_io("Unix read data failed", e))?;

        Ok(data)
    }
}

/// Unix socket write wrapper
pub struct UnixWriteWrapper(pub OwnedWriteHalf);

#[async_trait]
impl AsyncWriter for UnixWriteWrapper {
    async fn write_message(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_FRAME_LEN {
            return Err(RemoteError::ProtocolError(format!(
                "Message too large: {} bytes",
                data.len()
            )));
        }

        // Write 4-byte length prefix (little-endian)
        let len = (data.len() as u32).to_le_bytes();
        self.0
            .write_all(&len)
            .await
            .map_err(|e| RemoteError::from_io("Unix write length failed", e))?;

        self.0
            .write_all(data)
            .await
            .map_err(|e| RemoteError::from_io("Unix write data failed", e))?;

        self.0
            .flush()
            .await
            .map_err(|e| RemoteError::from_io("Unix flush failed", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Request;
    use crate::transport::{recv_message, send_message};
    use gym_remote_core::Action;

    #[tokio::test]
    async fn test_framed_exchange() {
        let (a, b) = UnixStream::pair().unwrap();
        let (_a_read, mut a_write) = split(a);
        let (mut b_read, _b_write) = split(b);

        let msg = Request::Step {
            action: Action::Discrete(5),
        };
        send_message(&mut a_write, &msg).await.unwrap();
        send_message(&mut a_write, &Request::Reset).await.unwrap();

        let first: Request = recv_message(&mut b_read).await.unwrap();
        let second: Request = recv_message(&mut b_read).await.unwrap();
        assert_eq!(first, msg);
        assert_eq!(second, Request::Reset);
    }

    #[tokio::test]
    async fn test_peer_hangup_is_connection_closed() {
        let (a, b) = UnixStream::pair().unwrap();
        drop(a);
        let (mut b_read, _b_write) = split(b);

        let err = b_read.read_message().await.unwrap_err();
        assert!(err.is_closed(), "expected ConnectionClosed, got {:?}", err);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, b) = UnixStream::pair().unwrap();
        a.write_all(&u32::MAX.to_le_bytes()).await.unwrap();
        let (mut b_read, _b_write) = split(b);

        let err = b_read.read_message().await.unwrap_err();
        assert!(matches!(err, RemoteError::ProtocolError(_)));
    }

    #[test]
    fn test_socket_path() {
        assert_eq!(
            socket_path(Path::new("/tmp/gym-remote-abc")),
            PathBuf::from("/tmp/gym-remote-abc/sock")
        );
    }
}
