//! Observation types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Auxiliary diagnostic information returned with each step
pub type Info = HashMap<String, serde_json::Value>;

/// Result of a single environment step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StepResult {
    /// Observation after the action was applied
    pub observation: Observation,

    /// Scalar reward signal
    #[serde(with = "crate::float")]
    pub reward: f64,

    /// Episode terminated
    pub done: bool,

    /// Environment-specific diagnostics
    #[serde(default)]
    pub info: Info,
}

impl StepResult {
    pub fn new(observation: impl Into<Observation>, reward: f64, done: bool) -> Self {
        Self {
            observation: observation.into(),
            reward,
            done,
            info: Info::new(),
        }
    }

    /// Attach an info entry
    pub fn with_info(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.info.insert(key.into(), value);
        self
    }
}

/// Environment observation (environment-specific contents)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    /// Discrete observation index
    Discrete(i64),
    /// Raw vector observation
    Vector(#[serde(with = "crate::float::vec")] Vec<f64>),
    /// Custom observation format
    Custom(serde_json::Value),
}

impl From<i64> for Observation {
    fn from(n: i64) -> Self {
        Observation::Discrete(n)
    }
}

impl From<Vec<f64>> for Observation {
    fn from(v: Vec<f64>) -> Self {
        Observation::Vector(v)
    }
}
