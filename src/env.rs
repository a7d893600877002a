//! Environment interface
//!
//! An environment owns its own dynamics; the trainer only resets it, steps it
//! with discrete actions and reads back `(next_state, reward, terminated, truncated)`.

/// Outcome of a single environment step
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S> {
    pub next_state: S,
    pub reward: f32,
    /// The episode reached a terminal state of the MDP
    pub terminated: bool,
    /// The episode was cut short (e.g. a step limit)
    pub truncated: bool,
}

impl<S> Step<S> {
    pub fn new(next_state: S, reward: f32, terminated: bool, truncated: bool) -> Self {
        Self {
            next_state,
            reward,
            terminated,
            truncated,
        }
    }

    /// Whether the episode ended on this step, for either reason
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A sequential, fully-observed environment
///
/// Errors returned by [`reset`](Environment::reset) or [`step`](Environment::step)
/// abort the training run they occur in.
pub trait Environment {
    type State: Clone;
    /// Actions are built from the index sampled out of the policy's logits
    type Action: From<usize>;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start a new episode and return its initial state
    fn reset(&mut self) -> Result<Self::State, Self::Error>;

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::State>, Self::Error>;
}

/// Environments with a finite set of actions
pub trait DiscreteActionSpace: Environment {
    fn actions(&self) -> Vec<Self::Action>;

    fn num_actions(&self) -> usize {
        self.actions().len()
    }
}
