//! Action and observation space descriptors
//!
//! Spaces only describe structure; they are used to validate actions and
//! observations, never to sample them.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::observation::Observation;

/// Description of an action or observation space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum Space {
    /// Integers in `0..n`
    Discrete {
        #[serde(rename = "N")]
        n: u64,
    },
    /// Bounded real-valued vector
    Box {
        #[serde(rename = "Shape")]
        shape: Vec<usize>,
        #[serde(rename = "Low", with = "crate::float::vec")]
        low: Vec<f64>,
        #[serde(rename = "High", with = "crate::float::vec")]
        high: Vec<f64>,
    },
}

impl Space {
    pub fn discrete(n: u64) -> Self {
        Space::Discrete { n }
    }

    /// Box space with the same bounds on every element
    pub fn uniform_box(shape: Vec<usize>, low: f64, high: f64) -> Self {
        let len = shape.iter().product();
        Space::Box {
            shape,
            low: vec![low; len],
            high: vec![high; len],
        }
    }

    /// Whether an action is a member of this space
    pub fn contains(&self, action: &Action) -> bool {
        match action {
            Action::Discrete(i) => self.contains_index(*i),
            Action::Continuous(v) => self.contains_vector(v),
        }
    }

    /// Whether an observation is a member of this space
    pub fn contains_observation(&self, observation: &Observation) -> bool {
        match observation {
            Observation::Discrete(i) => self.contains_index(*i),
            Observation::Vector(v) => self.contains_vector(v),
            Observation::Custom(_) => false,
        }
    }

    fn contains_index(&self, i: i64) -> bool {
        match self {
            Space::Discrete { n } => u64::try_from(i).is_ok_and(|i| i < *n),
            Space::Box { .. } => false,
        }
    }

    fn contains_vector(&self, v: &[f64]) -> bool {
        match self {
            Space::Discrete { .. } => false,
            Space::Box { low, high, .. } => {
                v.len() == low.len()
                    && v
                        .iter()
                        .zip(low.iter().zip(high))
                        .all(|(x, (lo, hi))| lo <= x && x <= hi)
            }
        }
    }
}

impl std::fmt::Display for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Space::Discrete { n } => write!(f, "Discrete({})", n),
            Space::Box { shape, .. } => write!(f, "Box{:?}", shape),
        }
    }
}
