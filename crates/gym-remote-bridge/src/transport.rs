//! Transport abstractions for the bridge
//!
//! Provides AsyncReader/AsyncWriter traits that can be implemented
//! for different transport mechanisms, plus typed send/receive helpers
//! on top of them.

use crate::protocol::{deserialize, serialize};
use async_trait::async_trait;
use gym_remote_core::Result;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// Largest frame either side will accept (64MB)
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Trait for async reading from a transport
#[async_trait]
pub trait AsyncReader: Send {
    /// Read a complete message from the transport
    /// Messages are length-prefixed: 4-byte little-endian length + JSON payload
    async fn read_message(&mut self) -> Result<Vec<u8>>;
}

/// Trait for async writing to a transport
#[async_trait]
pub trait AsyncWriter: Send + Sync {
    /// Write a complete message to the transport
    /// Messages are length-prefixed: 4-byte little-endian length + JSON payload
    async fn write_message(&mut self, data: &[u8]) -> Result<()>;
}

/// Serialize and send one message
pub async fn send_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWriter + ?Sized,
    T: Serialize + Sync,
{
    let data = serialize(msg)?;
    debug!("[send] len={} json={}", data.len(), preview(&data));
    writer.write_message(&data).await
}

/// Receive and decode one message
pub async fn recv_message<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncReader + ?Sized,
    T: DeserializeOwned,
{
    let data = reader.read_message().await?;
    debug!("[recv] len={} json={}", data.len(), preview(&data));
    deserialize(&data)
}

fn preview(data: &[u8]) -> String {
    String::from_utf8_lossy(data).chars().take(200).collect()
}
