//! Error taxonomy for training runs
//!
//! Every failure is fatal for the run it occurs in: there are no retries and
//! no partial recovery, since all episodes of a run share one set of parameters.

use thiserror::Error;

/// Invalid hyperparameters, rejected when the agent is constructed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("gamma must lie in (0, 1], got {0}")]
    Gamma(f32),
    #[error("n_steps must be greater than zero")]
    NSteps,
    #[error("value_coef must be finite and non-negative, got {0}")]
    ValueCoef(f32),
    #[error("entropy_coef must be finite and non-negative, got {0}")]
    EntropyCoef(f32),
    #[error("learning_rate must be finite and positive, got {0}")]
    LearningRate(f64),
    #[error("gradient_clip must be finite and positive, got {0}")]
    GradientClip(f32),
}

#[derive(Error, Debug)]
pub enum A2CError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Raised by the environment collaborator, passed through untouched
    #[error("environment failure: {0}")]
    Environment(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A loss, return, bootstrap value or action distribution went NaN/Inf.
    /// Raised before any gradient step so the parameters stay intact.
    #[error("non-finite {stage}: {value}")]
    Numeric {
        stage: &'static str,
        value: f32,
    },

    /// A rollout without transitions has nothing to learn from
    #[error("rollout has no transitions")]
    EmptyRollout,

    #[error("tensor read-back failed: {0}")]
    TensorData(String),
}

impl A2CError {
    pub fn environment<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Environment(Box::new(err))
    }
}

/// Returns `value` unchanged if finite, a [`A2CError::Numeric`] otherwise
pub fn ensure_finite(stage: &'static str, value: f32) -> Result<f32, A2CError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(A2CError::Numeric { stage, value })
    }
}
