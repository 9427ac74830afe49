//! Bridge side of gym-remote
//!
//! This crate provides:
//! - Wire protocol for requests and responses
//! - Transport abstractions (AsyncReader/AsyncWriter traits)
//! - Unix socket transport
//! - The `Environment` trait and a registry of environment constructors
//! - The `Bridge` server that hosts one environment under session limits

pub mod environment;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;
pub mod unix;

pub use environment::Environment;
pub use protocol::{Request, Response, deserialize, serialize};
pub use registry::EnvRegistry;
pub use server::{Bridge, SessionEnd};
pub use transport::{AsyncReader, AsyncWriter, recv_message, send_message};
pub use unix::{SOCKET_NAME, socket_path};
