use burn::{prelude::*, tensor::activation::log_softmax};
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::{error::A2CError, traits::read_floats};

/// Categorical distribution over the actions of a single state
///
/// Built from one row of unnormalised logits (`[1, num_actions]`). Log-probabilities
/// and entropy stay on the autodiff graph of the logits; sampling happens on the host.
#[derive(Debug, Clone)]
pub struct Categorical<B: Backend> {
    log_probs: Tensor<B, 2>,
}

impl<B: Backend> Categorical<B> {
    pub fn from_logits(logits: Tensor<B, 2>) -> Self {
        Self {
            log_probs: log_softmax(logits, 1),
        }
    }

    pub fn probs(&self) -> Tensor<B, 2> {
        self.log_probs.clone().exp()
    }

    /// Draw an action index.
    ///
    /// Fails with [`A2CError::Numeric`] when the probabilities are not a valid
    /// distribution, which only happens once the logits have diverged.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, A2CError> {
        let probs = read_floats(self.probs().detach())?;
        let dist = WeightedIndex::new(&probs).map_err(|_| A2CError::Numeric {
            stage: "action probabilities",
            value: probs.iter().sum(),
        })?;
        Ok(dist.sample(rng))
    }

    /// `log π(action)` as a one-element tensor
    pub fn log_prob(&self, action: usize) -> Tensor<B, 1> {
        self.log_probs
            .clone()
            .slice([0..1, action..action + 1])
            .reshape([1])
    }

    /// `-Σ π(a) log π(a)` as a one-element tensor
    pub fn entropy(&self) -> Tensor<B, 1> {
        (self.probs() * self.log_probs.clone())
            .sum_dim(1)
            .neg()
            .reshape([1])
    }
}
