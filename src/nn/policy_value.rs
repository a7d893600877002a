//! Policy-value networks
//!
//! A single module maps a batch of states to action logits and a state value.
//! Modules are plain values: gradient tracking is chosen per call with the
//! `track_gradients` flag of [`evaluate`].

use burn::{
    module::AutodiffModule,
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};

/// Network queried by the A2C trainer
pub trait PolicyValueModel<B: AutodiffBackend>: AutodiffModule<B> {
    /// Forward pass over states `[batch, features]`
    ///
    /// Returns logits `[batch, actions]` and values `[batch, 1]`.
    fn forward(&self, states: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>);
}

/// Run `model` on `states`.
///
/// With `track_gradients == false` both outputs are cut from the autodiff graph,
/// so nothing computed from them can ever reach the parameters.
pub fn evaluate<B, M>(
    model: &M,
    states: Tensor<B, 2>,
    track_gradients: bool,
) -> (Tensor<B, 2>, Tensor<B, 2>)
where
    B: AutodiffBackend,
    M: PolicyValueModel<B>,
{
    let (logits, values) = model.forward(states);
    if track_gradients {
        (logits, values)
    } else {
        (logits.detach(), values.detach())
    }
}

/// Configuration for [`PolicyValueNet`]
#[derive(Config, Debug)]
pub struct PolicyValueNetConfig {
    /// Input dimension
    pub state_dim: usize,
    /// Shared trunk widths (e.g. `[128]` for one hidden layer of 128 units)
    pub hidden_layers: Vec<usize>,
    /// Number of discrete actions
    pub num_actions: usize,
}

/// Shared-trunk actor-critic network
///
/// `state → (Linear → ReLU)* → { policy head → logits, value head → V(s) }`
#[derive(Module, Debug)]
pub struct PolicyValueNet<B: Backend> {
    pub(crate) trunk: Vec<Linear<B>>,
    pub(crate) policy_head: Linear<B>,
    pub(crate) value_head: Linear<B>,
}

impl PolicyValueNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PolicyValueNet<B> {
        let mut trunk = Vec::with_capacity(self.hidden_layers.len());
        let mut width = self.state_dim;
        for &hidden in &self.hidden_layers {
            trunk.push(LinearConfig::new(width, hidden).init(device));
            width = hidden;
        }

        PolicyValueNet {
            trunk,
            policy_head: LinearConfig::new(width, self.num_actions).init(device),
            value_head: LinearConfig::new(width, 1).init(device),
        }
    }
}

impl<B: Backend> PolicyValueNet<B> {
    /// Works with any tensor dimension; the last one holds the features
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> (Tensor<B, D>, Tensor<B, D>) {
        let mut x = input;
        for layer in &self.trunk {
            x = relu(layer.forward(x));
        }

        (self.policy_head.forward(x.clone()), self.value_head.forward(x))
    }
}

impl<B: AutodiffBackend> PolicyValueModel<B> for PolicyValueNet<B> {
    fn forward(&self, states: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        PolicyValueNet::forward(self, states)
    }
}
