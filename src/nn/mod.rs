//! Neural network building blocks for the actor-critic

pub mod categorical;
pub mod policy_value;

pub use categorical::Categorical;
pub use policy_value::{evaluate, PolicyValueModel, PolicyValueNet, PolicyValueNetConfig};
