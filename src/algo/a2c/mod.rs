//! Synchronous n-step Advantage Actor-Critic (A2C)
//!
//! One agent, one environment, one gradient step per fixed-length rollout.
//!
//! # Training step
//!
//! Every episode of [`A2CAgent::train`] runs:
//!
//! 1. **Collect**: reset the environment and sample `n_steps` actions from the
//!    current policy ([`collect_rollout`]). Episodes that end inside the rollout
//!    are reset on the spot.
//! 2. **Bootstrap**: `0` if the last step ended an episode, else `V(final_state)`
//!    evaluated without gradient tracking.
//! 3. **Returns**: [`compute_returns`] seeded with the bootstrap.
//! 4. **Advantage**: `returns - values.detach()`.
//! 5. **Loss**: [`compute_loss`].
//! 6. **Update**: backward pass and one Adam step.
//! 7. **Report**: [`EpisodeMetrics`].
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
//! use a2c_rl::{
//!     algo::a2c::{A2CAgent, A2CConfig},
//!     gym::CartPole,
//!     nn::PolicyValueNetConfig,
//! };
//!
//! let device = NdArrayDevice::default();
//! let model = PolicyValueNetConfig::new(4, vec![128], 2).init::<Autodiff<NdArray>>(&device);
//! let mut agent = A2CAgent::new(model, A2CConfig::default(), device)?;
//!
//! let mut env = CartPole::default();
//! for record in agent.train(&mut env, 1000)? {
//!     println!("{}: {} ({})", record.episode, record.total_reward, record.loss);
//! }
//! ```
//!
//! # Value loss
//!
//! The value term is `value_coef * mean(advantage²)` on the *detached*
//! advantage, so by default it carries no gradient into the value head. Set
//! [`ValueLoss::ValueError`] to train the value head on `(returns - values)²`.
//!
//! Reference: "Asynchronous Methods for Deep Reinforcement Learning" (Mnih et al., 2016)

pub mod config;
pub mod loss;
pub mod returns;
pub mod rollout;

pub use config::{A2CConfig, ValueLoss};
pub use loss::{compute_loss, loss_terms, LossBreakdown, LossTerms};
pub use returns::compute_returns;
pub use rollout::{collect_rollout, Rollout, Transition};

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    grad_clipping::GradientClippingConfig,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

use crate::{
    env::{DiscreteActionSpace, Environment},
    error::{ensure_finite, A2CError},
    gym::{cartpole, CartPole},
    nn::{evaluate, PolicyValueModel, PolicyValueNetConfig},
    traits::ToTensor,
};

/// Per-episode training record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeMetrics {
    /// Zero-based episode index
    pub episode: usize,
    /// Sum of the raw rewards collected in the episode's rollout
    pub total_reward: f32,
    /// Loss of the update, rounded to 4 decimal places
    pub loss: f64,
}

/// Outcome of one parameter update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub bootstrap: f32,
    pub returns: Vec<f32>,
    pub loss: LossBreakdown,
}

/// A2C agent for discrete action spaces
///
/// Owns the policy-value network and its optimizer. Generic over:
/// - `B`: Autodiff backend (e.g. `Autodiff<NdArray>`)
/// - `M`: network implementing [`PolicyValueModel`]
pub struct A2CAgent<B, M>
where
    B: AutodiffBackend,
    M: PolicyValueModel<B>,
{
    model: M,
    optimizer: OptimizerAdaptor<Adam, M, B>,
    config: A2CConfig,
    device: B::Device,
    rng: StdRng,
}

impl<B, M> A2CAgent<B, M>
where
    B: AutodiffBackend,
    M: PolicyValueModel<B>,
{
    /// Create a new agent, rejecting an invalid `config` up front
    pub fn new(model: M, config: A2CConfig, device: B::Device) -> Result<Self, A2CError> {
        config.validate()?;

        let optimizer = AdamConfig::new()
            .with_grad_clipping(config.gradient_clip.map(GradientClippingConfig::Norm))
            .init();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            model,
            optimizer,
            config,
            device,
            rng,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Reset `env` and collect one rollout of `n_steps` transitions
    pub fn collect<E>(&mut self, env: &mut E) -> Result<Rollout<B, E::State>, A2CError>
    where
        E: Environment,
        Vec<E::State>: ToTensor<B, 2, Float>,
    {
        let start = env.reset().map_err(A2CError::environment)?;
        collect_rollout(
            &self.model,
            env,
            start,
            self.config.n_steps,
            &mut self.rng,
            &self.device,
        )
    }

    /// Value of the state after the rollout, `0` if the rollout ended an episode
    pub fn bootstrap_value<S>(&self, rollout: &Rollout<B, S>) -> Result<f32, A2CError>
    where
        S: Clone,
        Vec<S>: ToTensor<B, 2, Float>,
    {
        if rollout.last_done {
            return Ok(0.0);
        }

        let states = vec![rollout.final_state.clone()].to_tensor(&self.device);
        let (_, value) = evaluate(&self.model, states, false);
        ensure_finite("bootstrap value", value.into_scalar().elem::<f32>())
    }

    /// Compute returns and loss for `rollout` and apply one optimizer step.
    ///
    /// Nothing is applied if the rollout is empty or if any return or the loss
    /// is not finite.
    pub fn update<S>(&mut self, rollout: Rollout<B, S>) -> Result<UpdateReport, A2CError>
    where
        S: Clone,
        Vec<S>: ToTensor<B, 2, Float>,
    {
        if rollout.is_empty() {
            return Err(A2CError::EmptyRollout);
        }

        let bootstrap = self.bootstrap_value(&rollout)?;
        let returns = compute_returns(&rollout.rewards(), bootstrap, self.config.gamma);
        if let Some(&bad) = returns.iter().find(|r| !r.is_finite()) {
            return Err(A2CError::Numeric {
                stage: "returns",
                value: bad,
            });
        }

        let returns_tensor: Tensor<B, 1> = returns.clone().to_tensor(&self.device);
        let values = rollout.values();
        let advantage = returns_tensor - values.clone().detach();

        let terms = loss_terms(
            rollout.log_probs(),
            advantage,
            values,
            rollout.entropies(),
            &self.config,
        );
        let breakdown = terms.breakdown();
        ensure_finite("loss", breakdown.total)?;

        let grads = terms.total().backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optimizer
            .step(self.config.learning_rate, self.model.clone(), grads);

        debug!(
            policy_loss = breakdown.policy,
            value_loss = breakdown.value,
            entropy_loss = breakdown.entropy,
            bootstrap,
            "applied update"
        );

        Ok(UpdateReport {
            bootstrap,
            returns,
            loss: breakdown,
        })
    }

    /// Run one collect/update cycle
    pub fn train_episode<E>(
        &mut self,
        env: &mut E,
        episode: usize,
    ) -> Result<EpisodeMetrics, A2CError>
    where
        E: Environment,
        Vec<E::State>: ToTensor<B, 2, Float>,
    {
        let rollout = self.collect(env)?;
        let total_reward = rollout.total_reward();
        let report = self.update(rollout)?;

        let metrics = EpisodeMetrics {
            episode,
            total_reward,
            loss: round_to(report.loss.total as f64, 4),
        };

        let interval = self.config.log_interval;
        if interval > 0 && (episode + 1) % interval == 0 {
            info!(
                episode = episode + 1,
                total_reward,
                loss = metrics.loss,
                "Episode: {} -- Return: {}  loss: {:.4}",
                episode + 1,
                total_reward,
                metrics.loss
            );
        }

        Ok(metrics)
    }

    /// Train for `episodes` episodes and return one record per episode.
    ///
    /// The first error aborts the run.
    pub fn train<E>(
        &mut self,
        env: &mut E,
        episodes: usize,
    ) -> Result<Vec<EpisodeMetrics>, A2CError>
    where
        E: Environment,
        Vec<E::State>: ToTensor<B, 2, Float>,
    {
        let mut history = Vec::with_capacity(episodes);
        for episode in 0..episodes {
            history.push(self.train_episode(env, episode)?);
        }
        Ok(history)
    }
}

/// Backend used by [`training_loop`]
pub type DefaultBackend = Autodiff<NdArray>;

/// Hidden layer width of the network built by [`training_loop`]
pub const DEFAULT_HIDDEN: usize = 128;

/// Train a fresh agent on [`CartPole`] for `episodes` episodes.
///
/// Builds a shared-trunk [`PolicyValueNet`](crate::nn::PolicyValueNet) with one
/// hidden layer of [`DEFAULT_HIDDEN`] units on the CPU backend. With
/// `config.seed` set, parameter init, the environment and action sampling are
/// all seeded from it.
pub fn training_loop(episodes: usize, config: A2CConfig) -> Result<Vec<EpisodeMetrics>, A2CError> {
    let device = NdArrayDevice::default();

    let mut env = match config.seed {
        Some(seed) => {
            DefaultBackend::seed(seed);
            CartPole::with_seed(cartpole::DEFAULT_MAX_STEPS, seed)
        }
        None => CartPole::default(),
    };

    let model = PolicyValueNetConfig::new(
        cartpole::OBSERVATION_DIM,
        vec![DEFAULT_HIDDEN],
        env.num_actions(),
    )
    .init::<DefaultBackend>(&device);

    let mut agent = A2CAgent::new(model, config, device)?;
    agent.train(&mut env, episodes)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::PolicyValueNet;

    type TestBackend = Autodiff<NdArray>;

    fn value_head_gradient(value_loss: ValueLoss) -> Option<f32> {
        let device = NdArrayDevice::default();
        let net: PolicyValueNet<TestBackend> =
            PolicyValueNetConfig::new(2, vec![8], 2).init(&device);
        let config = A2CConfig {
            value_loss,
            ..Default::default()
        };

        let states = Tensor::<TestBackend, 2>::from_floats([[0.5, -0.5], [1.0, 0.2]], &device);
        let (logits, values) = PolicyValueModel::forward(&net, states);
        let log_probs = burn::tensor::activation::log_softmax(logits, 1)
            .slice([0..2, 0..1])
            .reshape([2]);
        let values = values.reshape([2]);
        let returns = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0], &device);
        let advantage = returns - values.clone().detach();
        let entropies = Tensor::<TestBackend, 1>::zeros([2], &device);

        let grads = compute_loss(log_probs, advantage, values, entropies, &config).backward();
        net.value_head
            .weight
            .val()
            .grad(&grads)
            .map(|g| g.abs().sum().into_scalar().elem::<f32>())
    }

    #[test]
    fn detached_advantage_leaves_value_head_untrained() {
        let grad = value_head_gradient(ValueLoss::DetachedAdvantage);
        assert!(grad.map_or(true, |g| g == 0.0), "value head got gradient {:?}", grad);
    }

    #[test]
    fn value_error_trains_value_head() {
        let grad = value_head_gradient(ValueLoss::ValueError).expect("value head is on the graph");
        assert!(grad > 0.0);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let device = NdArrayDevice::default();
        let net: PolicyValueNet<TestBackend> =
            PolicyValueNetConfig::new(2, vec![4], 2).init(&device);
        let config = A2CConfig {
            gamma: 1.5,
            ..Default::default()
        };

        assert!(matches!(
            A2CAgent::new(net, config, device),
            Err(A2CError::Config(crate::ConfigError::Gamma(_)))
        ));
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(-2.00004, 4), -2.0);
    }

    #[test]
    fn cartpole_training_loop_runs() {
        let config = A2CConfig {
            seed: Some(5),
            ..Default::default()
        };
        let history = training_loop(3, config).unwrap();

        assert_eq!(history.len(), 3);
        for (i, record) in history.iter().enumerate() {
            assert_eq!(record.episode, i);
            assert!(record.loss.is_finite());
            // CartPole pays 1 per step and the rollout always has n_steps steps
            assert_eq!(record.total_reward, 5.0);
        }
    }
}
