use crate::error::ConfigError;

/// How the value term of the objective is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueLoss {
    /// `value_coef * mean(advantage²)` on the detached advantage.
    ///
    /// Numerically this is the squared value error, but no gradient reaches the
    /// value head through it; only the shared trunk learns, via the policy term.
    #[default]
    DetachedAdvantage,
    /// `value_coef * mean((returns - values)²)` with gradients flowing into `values`
    ValueError,
}

/// Configuration for the A2C trainer
///
/// Read once by [`A2CAgent::new`](super::A2CAgent::new), which validates it; the
/// agent never mutates it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct A2CConfig {
    /// Discount factor γ, in (0, 1] (default: 0.99)
    pub gamma: f32,
    /// Environment steps per rollout, one update per rollout (default: 5)
    pub n_steps: usize,
    /// Value loss coefficient (default: 0.5)
    pub value_coef: f32,
    /// Entropy coefficient for exploration (default: 0.01)
    pub entropy_coef: f32,
    /// Adam learning rate (default: 3e-4)
    pub learning_rate: f64,
    /// Gradient norm clipping (default: None)
    pub gradient_clip: Option<f32>,
    /// Value term of the objective (default: [`ValueLoss::DetachedAdvantage`])
    pub value_loss: ValueLoss,
    /// Episodes between progress logs, 0 disables them (default: 100)
    pub log_interval: usize,
    /// Seed for action sampling (default: None, seeded from entropy)
    pub seed: Option<u64>,
}

impl Default for A2CConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            n_steps: 5,
            value_coef: 0.5,
            entropy_coef: 0.01,
            learning_rate: 3e-4,
            gradient_clip: None,
            value_loss: ValueLoss::default(),
            log_interval: 100,
            seed: None,
        }
    }
}

impl A2CConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(ConfigError::Gamma(self.gamma));
        }
        if self.n_steps == 0 {
            return Err(ConfigError::NSteps);
        }
        if !(self.value_coef.is_finite() && self.value_coef >= 0.0) {
            return Err(ConfigError::ValueCoef(self.value_coef));
        }
        if !(self.entropy_coef.is_finite() && self.entropy_coef >= 0.0) {
            return Err(ConfigError::EntropyCoef(self.entropy_coef));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        match self.gradient_clip {
            Some(clip) if !(clip.is_finite() && clip > 0.0) => Err(ConfigError::GradientClip(clip)),
            _ => Ok(()),
        }
    }
}
