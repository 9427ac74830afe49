//! # gym-remote-core
//!
//! Core types shared by the gym-remote bridge, client and host binary:
//! - Actions, observations and step results
//! - Action/observation space descriptors
//! - Session limits
//! - Error types

pub mod action;
pub mod error;
pub mod float;
pub mod limits;
pub mod observation;
pub mod space;

pub use action::Action;
pub use error::{ErrorKind, RemoteError, Result};
pub use limits::{Limits, format_seconds, parse_seconds};
pub use observation::{Info, Observation, StepResult};
pub use space::Space;
