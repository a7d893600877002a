use std::convert::Infallible;
use std::f32::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};
use strum::{FromRepr, VariantArray};

use crate::env::{DiscreteActionSpace, Environment, Step};

const GRAVITY: f32 = 9.8;
const CART_MASS: f32 = 1.0;
const POLE_MASS: f32 = 0.1;
const TOTAL_MASS: f32 = CART_MASS + POLE_MASS;
/// Half the pole's length
const POLE_LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = POLE_MASS * POLE_LENGTH;
const FORCE_MAG: f32 = 10.0;
const DT: f32 = 0.02;
const X_THRESHOLD: f32 = 2.4;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * PI / 360.0;
const INIT_RANGE: f32 = 0.05;

/// Step limit of CartPole-v1
pub const DEFAULT_MAX_STEPS: usize = 500;

/// State representation: [x, x_dot, theta, theta_dot]
pub type CartPoleState = [f32; 4];

/// Number of entries in a [`CartPoleState`]
pub const OBSERVATION_DIM: usize = 4;

/// Actions for the [`CartPole`] environment
/// 0 = push left, 1 = push right
#[derive(FromRepr, VariantArray, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartPoleAction {
    PushLeft = 0,
    PushRight = 1,
}

impl From<usize> for CartPoleAction {
    fn from(value: usize) -> Self {
        // Anything but 1 pushes left, as with gymnasium's `action == 1` check
        Self::from_repr(value).unwrap_or(CartPoleAction::PushLeft)
    }
}

/// The classic cart-pole balancing task with discrete actions
///
/// A reward of 1 is given for every step. The episode terminates when the pole
/// leans more than 12° or the cart leaves the track, and is truncated after
/// `max_steps` steps.
#[derive(Debug, Clone)]
pub struct CartPole {
    state: CartPoleState,
    steps: usize,
    max_steps: usize,
    rng: StdRng,
}

impl CartPole {
    pub fn new(max_steps: usize) -> Self {
        Self::with_rng(max_steps, StdRng::from_entropy())
    }

    /// Reproducible initial states
    pub fn with_seed(max_steps: usize, seed: u64) -> Self {
        Self::with_rng(max_steps, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_steps: usize, rng: StdRng) -> Self {
        Self {
            state: [0.0; OBSERVATION_DIM],
            steps: 0,
            max_steps,
            rng,
        }
    }

    pub fn state(&self) -> CartPoleState {
        self.state
    }

    fn is_terminal(&self) -> bool {
        let [x, _, theta, _] = self.state;
        x.abs() > X_THRESHOLD || theta.abs() > THETA_THRESHOLD
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

impl Environment for CartPole {
    type State = CartPoleState;
    type Action = CartPoleAction;
    type Error = Infallible;

    fn reset(&mut self) -> Result<Self::State, Self::Error> {
        for value in self.state.iter_mut() {
            *value = self.rng.gen_range(-INIT_RANGE..INIT_RANGE);
        }
        self.steps = 0;
        Ok(self.state)
    }

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::State>, Self::Error> {
        let [x, x_dot, theta, theta_dot] = self.state;
        let force = match action {
            CartPoleAction::PushLeft => -FORCE_MAG,
            CartPoleAction::PushRight => FORCE_MAG,
        };

        // Euler integration of the Barto, Sutton & Anderson dynamics
        let (sin_theta, cos_theta) = theta.sin_cos();
        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.state = [
            x + DT * x_dot,
            x_dot + DT * x_acc,
            theta + DT * theta_dot,
            theta_dot + DT * theta_acc,
        ];
        self.steps += 1;

        let terminated = self.is_terminal();
        let truncated = !terminated && self.steps >= self.max_steps;

        Ok(Step::new(self.state, 1.0, terminated, truncated))
    }
}

impl DiscreteActionSpace for CartPole {
    fn actions(&self) -> Vec<Self::Action> {
        CartPoleAction::VARIANTS.to_vec()
    }
}
