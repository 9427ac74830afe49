//! Environment registry
//!
//! A live environment cannot cross a process boundary, so the host process
//! builds it from a registered constructor named on its command line.

use crate::environment::Environment;
use gym_remote_core::{RemoteError, Result};
use std::collections::BTreeMap;

type Constructor = Box<dyn Fn() -> Box<dyn Environment> + Send + Sync>;

/// Registry of environment constructors keyed by id
#[derive(Default)]
pub struct EnvRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl EnvRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor; a later registration under the same id wins
    pub fn register<E, F>(&mut self, id: impl Into<String>, constructor: F) -> &mut Self
    where
        E: Environment,
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.constructors.insert(
            id.into(),
            Box::new(move || Box::new(constructor()) as Box<dyn Environment>),
        );
        self
    }

    /// Construct a fresh environment instance
    pub fn make(&self, id: &str) -> Result<Box<dyn Environment>> {
        self.constructors
            .get(id)
            .map(|constructor| constructor())
            .ok_or_else(|| RemoteError::UnknownEnvironment(id.to_string()))
    }

    /// Whether an id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}
