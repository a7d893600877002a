//! Synchronous n-step Advantage Actor-Critic (A2C) on [burn](https://burn.dev)
//!
//! - [`algo::a2c`]: rollout collection, n-step returns, the A2C objective and the
//!   training loop
//! - [`env`]: the environment interface, with [`gym::CartPole`] built in
//! - [`nn`]: policy-value networks and the categorical action distribution

pub mod algo;
pub mod env;
pub mod error;
pub mod gym;
pub mod nn;
pub mod traits;

pub use error::{A2CError, ConfigError};
