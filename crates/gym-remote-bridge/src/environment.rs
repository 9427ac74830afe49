//! Environment trait

use async_trait::async_trait;
use gym_remote_core::{Action, Observation, Result, Space, StepResult};

/// Trait for implementing environments hosted behind a bridge
///
/// Implement this trait to expose an environment to remote callers. Action
/// validation is the environment's job: return `RemoteError::InvalidAction`
/// for actions outside `action_space`.
#[async_trait]
pub trait Environment: Send + 'static {
    /// Space that valid actions belong to
    fn action_space(&self) -> Space;

    /// Space that observations belong to
    fn observation_space(&self) -> Space;

    /// Execute an action and advance the environment
    async fn step(&mut self, action: Action) -> Result<StepResult>;

    /// Start a new episode and return the initial observation
    async fn reset(&mut self) -> Result<Observation>;
}

#[async_trait]
impl Environment for Box<dyn Environment> {
    fn action_space(&self) -> Space {
        (**self).action_space()
    }

    fn observation_space(&self) -> Space {
        (**self).observation_space()
    }

    async fn step(&mut self, action: Action) -> Result<StepResult> {
        (**self).step(action).await
    }

    async fn reset(&mut self) -> Result<Observation> {
        (**self).reset().await
    }
}
