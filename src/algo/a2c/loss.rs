use burn::prelude::*;

use super::config::{A2CConfig, ValueLoss};

/// The three terms of the A2C objective, each a one-element tensor
#[derive(Debug, Clone)]
pub struct LossTerms<B: Backend> {
    pub policy: Tensor<B, 1>,
    pub value: Tensor<B, 1>,
    pub entropy: Tensor<B, 1>,
}

/// Host copy of [`LossTerms`], for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LossBreakdown {
    pub policy: f32,
    pub value: f32,
    pub entropy: f32,
    pub total: f32,
}

impl<B: Backend> LossTerms<B> {
    pub fn total(self) -> Tensor<B, 1> {
        self.policy + self.value + self.entropy
    }

    pub fn breakdown(&self) -> LossBreakdown {
        let read = |t: &Tensor<B, 1>| t.clone().into_scalar().elem::<f32>();
        let (policy, value, entropy) = (read(&self.policy), read(&self.value), read(&self.entropy));
        LossBreakdown {
            policy,
            value,
            entropy,
            total: policy + value + entropy,
        }
    }
}

/// Build the policy, value and entropy terms over one rollout.
///
/// All inputs have one entry per step. `advantage` is `returns - values.detach()`
/// and is held constant in every term:
/// - policy:  `-mean(log_probs * advantage)`
/// - value:   `value_coef * mean(advantage²)` (see [`ValueLoss`] for the alternative)
/// - entropy: `-entropy_coef * mean(entropies)`
pub fn loss_terms<B: Backend>(
    log_probs: Tensor<B, 1>,
    advantage: Tensor<B, 1>,
    values: Tensor<B, 1>,
    entropies: Tensor<B, 1>,
    config: &A2CConfig,
) -> LossTerms<B> {
    let advantage = advantage.detach();

    let policy = (log_probs * advantage.clone()).mean().neg();

    let value_residual = match config.value_loss {
        ValueLoss::DetachedAdvantage => advantage,
        // Same value as the advantage, but differentiable in `values`
        ValueLoss::ValueError => advantage + values.clone().detach() - values,
    };
    let value = value_residual.powf_scalar(2.0).mean().mul_scalar(config.value_coef);

    let entropy = entropies.mean().mul_scalar(-config.entropy_coef);

    LossTerms {
        policy,
        value,
        entropy,
    }
}

/// Scalar A2C loss: policy term + value term + entropy term
pub fn compute_loss<B: Backend>(
    log_probs: Tensor<B, 1>,
    advantage: Tensor<B, 1>,
    values: Tensor<B, 1>,
    entropies: Tensor<B, 1>,
    config: &A2CConfig,
) -> Tensor<B, 1> {
    loss_terms(log_probs, advantage, values, entropies, config).total()
}
