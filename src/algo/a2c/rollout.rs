use burn::{prelude::*, tensor::backend::AutodiffBackend};
use rand::Rng;
use tracing::debug;

use crate::{
    env::Environment,
    error::A2CError,
    nn::{evaluate, Categorical, PolicyValueModel},
    traits::ToTensor,
};

/// One environment step, with the graph-attached outputs of the forward pass
/// that chose the action
#[derive(Debug, Clone)]
pub struct Transition<B: Backend, S> {
    pub state: S,
    pub action: usize,
    pub reward: f32,
    pub value: Tensor<B, 1>,
    pub log_prob: Tensor<B, 1>,
    pub entropy: Tensor<B, 1>,
    /// The episode ended on this step (terminated or truncated)
    pub done: bool,
}

/// A fixed-length trajectory collected under the current policy
#[derive(Debug, Clone)]
pub struct Rollout<B: Backend, S> {
    pub transitions: Vec<Transition<B, S>>,
    /// Whether the last transition ended an episode
    pub last_done: bool,
    /// State reached after the last step; a fresh initial state if `last_done`
    pub final_state: S,
    /// Episodes that ended inside this rollout
    pub episodes_finished: usize,
}

impl<B: Backend, S> Rollout<B, S> {
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn rewards(&self) -> Vec<f32> {
        self.transitions.iter().map(|t| t.reward).collect()
    }

    pub fn total_reward(&self) -> f32 {
        self.transitions.iter().map(|t| t.reward).sum()
    }

    /// Value estimates stacked into `[n_steps]`, still attached to the graph
    pub fn values(&self) -> Tensor<B, 1> {
        Tensor::cat(self.transitions.iter().map(|t| t.value.clone()).collect(), 0)
    }

    pub fn log_probs(&self) -> Tensor<B, 1> {
        Tensor::cat(self.transitions.iter().map(|t| t.log_prob.clone()).collect(), 0)
    }

    pub fn entropies(&self) -> Tensor<B, 1> {
        Tensor::cat(self.transitions.iter().map(|t| t.entropy.clone()).collect(), 0)
    }
}

/// Step `env` for `n_steps` from `start`, sampling every action from `model`.
///
/// When an episode ends the environment is reset at once and collection goes on
/// from the new initial state, so the rollout always holds exactly `n_steps`
/// transitions. Environment errors abort the collection.
pub fn collect_rollout<B, M, E, R>(
    model: &M,
    env: &mut E,
    start: E::State,
    n_steps: usize,
    rng: &mut R,
    device: &B::Device,
) -> Result<Rollout<B, E::State>, A2CError>
where
    B: AutodiffBackend,
    M: PolicyValueModel<B>,
    E: Environment,
    Vec<E::State>: ToTensor<B, 2, Float>,
    R: Rng + ?Sized,
{
    let mut transitions = Vec::with_capacity(n_steps);
    let mut state = start;
    let mut last_done = false;
    let mut episodes_finished = 0;

    for _ in 0..n_steps {
        let (logits, value) = evaluate(model, vec![state.clone()].to_tensor(device), true);
        let dist = Categorical::from_logits(logits);
        let action = dist.sample(rng)?;

        let step = env.step(E::Action::from(action)).map_err(A2CError::environment)?;
        let done = step.done();

        transitions.push(Transition {
            state,
            action,
            reward: step.reward,
            value: value.reshape([1]),
            log_prob: dist.log_prob(action),
            entropy: dist.entropy(),
            done,
        });
        last_done = done;

        state = if done {
            episodes_finished += 1;
            debug!(
                terminated = step.terminated,
                truncated = step.truncated,
                "episode ended mid-rollout, resetting"
            );
            env.reset().map_err(A2CError::environment)?
        } else {
            step.next_state
        };
    }

    Ok(Rollout {
        transitions,
        last_done,
        final_state: state,
        episodes_finished,
    })
}
