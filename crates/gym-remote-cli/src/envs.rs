//! Reference environments
//!
//! Small deterministic environments used to exercise the bridge end to end.

use async_trait::async_trait;
use gym_remote_bridge::Environment;
use gym_remote_core::{Action, Observation, RemoteError, Result, Space, StepResult};

fn checked_discrete(space: &Space, action: &Action) -> Result<i64> {
    match action.as_discrete() {
        Some(n) if space.contains(action) => Ok(n),
        _ => Err(RemoteError::InvalidAction(format!(
            "{:?} not in {}",
            action, space
        ))),
    }
}

/// Decodes the bits of an action in `0..8` into a step result
///
/// observation = bit 0, reward = bit 1 (as 0.0 or 2.0), done = bit 2.
#[derive(Debug, Default)]
pub struct BitEnv;

impl BitEnv {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Environment for BitEnv {
    fn action_space(&self) -> Space {
        Space::discrete(8)
    }

    fn observation_space(&self) -> Space {
        Space::discrete(2)
    }

    async fn step(&mut self, action: Action) -> Result<StepResult> {
        let bits = checked_discrete(&self.action_space(), &action)?;
        Ok(StepResult::new(bits & 1, (bits & 2) as f64, bits & 4 != 0))
    }

    async fn reset(&mut self) -> Result<Observation> {
        Ok(Observation::Discrete(0))
    }
}

/// Rewards the running step count of the episode
///
/// Action 1 ends the episode; once done the reward stops growing.
#[derive(Debug, Default)]
pub struct StepEnv {
    reward: f64,
    done: bool,
}

impl StepEnv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Environment for StepEnv {
    fn action_space(&self) -> Space {
        Space::discrete(2)
    }

    fn observation_space(&self) -> Space {
        Space::discrete(1)
    }

    async fn step(&mut self, action: Action) -> Result<StepResult> {
        let action = checked_discrete(&self.action_space(), &action)?;
        if !self.done {
            self.reward += 1.0;
        }
        if action != 0 {
            self.done = true;
        }
        Ok(StepResult::new(0, self.reward, self.done))
    }

    async fn reset(&mut self) -> Result<Observation> {
        self.reward = 0.0;
        self.done = false;
        Ok(Observation::Discrete(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bit_env_decodes_bits() {
        let mut env = BitEnv::new();
        let result = env.step(Action::Discrete(7)).await.unwrap();
        assert_eq!(result, StepResult::new(1, 2.0, true));

        let result = env.step(Action::Discrete(2)).await.unwrap();
        assert_eq!(result, StepResult::new(0, 2.0, false));

        let err = env.step(Action::Discrete(8)).await.unwrap_err();
        assert!(matches!(err, RemoteError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn test_step_env_reward_freezes_when_done() {
        let mut env = StepEnv::new();
        let rewards = [
            env.step(Action::Discrete(0)).await.unwrap(),
            env.step(Action::Discrete(1)).await.unwrap(),
            env.step(Action::Discrete(0)).await.unwrap(),
        ]
        .map(|r| (r.reward, r.done));
        assert_eq!(rewards, [(1.0, false), (2.0, true), (2.0, true)]);

        env.reset().await.unwrap();
        assert_eq!(env.step(Action::Discrete(0)).await.unwrap().reward, 1.0);
    }
}
