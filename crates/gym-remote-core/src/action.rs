//! Action types

use serde::{Deserialize, Serialize};

/// An action to execute in the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// Discrete action index
    Discrete(i64),
    /// Continuous action vector
    Continuous(#[serde(with = "crate::float::vec")] Vec<f64>),
}

impl Action {
    /// Discrete index, if this is a discrete action
    pub fn as_discrete(&self) -> Option<i64> {
        match self {
            Action::Discrete(n) => Some(*n),
            Action::Continuous(_) => None,
        }
    }
}

impl From<i64> for Action {
    fn from(n: i64) -> Self {
        Action::Discrete(n)
    }
}

impl From<Vec<f64>> for Action {
    fn from(v: Vec<f64>) -> Self {
        Action::Continuous(v)
    }
}
