use std::convert::Infallible;

use a2c_rl::{
    algo::a2c::{compute_returns, A2CAgent, A2CConfig, Rollout},
    env::{Environment, Step},
    nn::{evaluate, PolicyValueNet, PolicyValueNetConfig},
    traits::{read_floats, ToTensor},
    A2CError,
};
use burn::{
    backend::{
        ndarray::{NdArray, NdArrayDevice},
        Autodiff,
    },
    tensor::Tensor,
};
use thiserror::Error;

type TestBackend = Autodiff<NdArray>;

/// Alternates between two states, pays 1 per step and never ends
#[derive(Default)]
struct TwoState {
    flag: bool,
    resets: usize,
    steps: usize,
}

impl Environment for TwoState {
    type State = [f32; 2];
    type Action = usize;
    type Error = Infallible;

    fn reset(&mut self) -> Result<Self::State, Self::Error> {
        self.resets += 1;
        self.flag = false;
        Ok([1.0, 0.0])
    }

    fn step(&mut self, _action: usize) -> Result<Step<Self::State>, Self::Error> {
        self.steps += 1;
        self.flag = !self.flag;
        let state = if self.flag { [0.0, 1.0] } else { [1.0, 0.0] };
        Ok(Step::new(state, 1.0, false, false))
    }
}

/// Pays `reward` per step and ends every `length` steps
struct FixedLength {
    length: usize,
    reward: f32,
    truncate: bool,
    t: usize,
}

impl FixedLength {
    fn terminating(length: usize, reward: f32) -> Self {
        Self {
            length,
            reward,
            truncate: false,
            t: 0,
        }
    }

    fn truncating(length: usize, reward: f32) -> Self {
        Self {
            truncate: true,
            ..Self::terminating(length, reward)
        }
    }
}

impl Environment for FixedLength {
    type State = [f32; 2];
    type Action = usize;
    type Error = Infallible;

    fn reset(&mut self) -> Result<Self::State, Self::Error> {
        self.t = 0;
        Ok([0.0, 1.0])
    }

    fn step(&mut self, _action: usize) -> Result<Step<Self::State>, Self::Error> {
        self.t += 1;
        let ends = self.t % self.length == 0;
        let state = [self.t as f32, 1.0];
        Ok(Step::new(
            state,
            self.reward,
            ends && !self.truncate,
            ends && self.truncate,
        ))
    }
}

#[derive(Error, Debug)]
#[error("simulator lost connection after {0} steps")]
struct Disconnected(usize);

/// Fails on the `fail_at`-th step
struct Flaky {
    fail_at: usize,
    steps: usize,
}

impl Environment for Flaky {
    type State = [f32; 2];
    type Action = usize;
    type Error = Disconnected;

    fn reset(&mut self) -> Result<Self::State, Self::Error> {
        Ok([0.0, 0.0])
    }

    fn step(&mut self, _action: usize) -> Result<Step<Self::State>, Self::Error> {
        self.steps += 1;
        if self.steps >= self.fail_at {
            return Err(Disconnected(self.steps));
        }
        Ok(Step::new([0.0, 0.0], 0.0, false, false))
    }
}

/// Pays NaN rewards
struct Poisoned;

impl Environment for Poisoned {
    type State = [f32; 2];
    type Action = usize;
    type Error = Infallible;

    fn reset(&mut self) -> Result<Self::State, Self::Error> {
        Ok([0.0, 0.0])
    }

    fn step(&mut self, _action: usize) -> Result<Step<Self::State>, Self::Error> {
        Ok(Step::new([0.0, 0.0], f32::NAN, false, false))
    }
}

fn agent(config: A2CConfig) -> A2CAgent<TestBackend, PolicyValueNet<TestBackend>> {
    let device = NdArrayDevice::default();
    let model = PolicyValueNetConfig::new(2, vec![16], 2).init::<TestBackend>(&device);
    A2CAgent::new(model, config, device).expect("valid config")
}

fn outputs(agent: &A2CAgent<TestBackend, PolicyValueNet<TestBackend>>) -> Vec<f32> {
    let device = NdArrayDevice::default();
    let states: Tensor<TestBackend, 2> = vec![[1.0_f32, 0.0], [0.0, 1.0]].to_tensor(&device);
    let (logits, values) = evaluate(agent.model(), states, false);
    let mut out = read_floats(logits).unwrap();
    out.extend(read_floats(values).unwrap());
    out
}

#[test]
fn two_state_returns_before_training() {
    let mut agent = agent(A2CConfig {
        n_steps: 2,
        gamma: 1.0,
        seed: Some(3),
        ..Default::default()
    });
    let mut env = TwoState::default();

    let rollout = agent.collect(&mut env).unwrap();
    assert_eq!(rollout.len(), 2);
    assert!(!rollout.last_done);
    assert_eq!(rollout.total_reward(), 2.0);

    let bootstrap = agent.bootstrap_value(&rollout).unwrap();
    let returns = compute_returns(&rollout.rewards(), bootstrap, 1.0);
    assert!((returns[0] - (2.0 + bootstrap)).abs() < 1e-5);
    assert!((returns[1] - (1.0 + bootstrap)).abs() < 1e-5);

    let report = agent.update(rollout).unwrap();
    assert_eq!(report.bootstrap, bootstrap);
    assert_eq!(report.returns, returns);
}

#[test]
fn last_return_uses_bootstrap() {
    let gamma = 0.9;
    let mut agent = agent(A2CConfig {
        n_steps: 4,
        gamma,
        ..Default::default()
    });
    let mut env = TwoState::default();

    let rollout = agent.collect(&mut env).unwrap();
    let rewards = rollout.rewards();
    let report = agent.update(rollout).unwrap();

    assert_eq!(report.returns.len(), 4);
    let expected = rewards[3] + gamma * report.bootstrap;
    assert!((report.returns[3] - expected).abs() < 1e-5);
}

#[test]
fn terminal_last_step_bootstraps_from_zero() {
    let gamma = 0.5;
    let mut agent = agent(A2CConfig {
        n_steps: 3,
        gamma,
        seed: Some(1),
        ..Default::default()
    });
    let mut env = FixedLength::terminating(3, 2.0);

    let rollout = agent.collect(&mut env).unwrap();
    assert!(rollout.last_done);
    let report = agent.update(rollout).unwrap();

    assert_eq!(report.bootstrap, 0.0);
    assert_eq!(report.returns, vec![3.5, 3.0, 2.0]);
}

#[test]
fn truncated_last_step_bootstraps_from_zero() {
    let mut agent = agent(A2CConfig {
        n_steps: 2,
        gamma: 0.5,
        ..Default::default()
    });
    let mut env = FixedLength::truncating(2, 1.0);

    let rollout = agent.collect(&mut env).unwrap();
    let report = agent.update(rollout).unwrap();

    assert_eq!(report.bootstrap, 0.0);
    assert_eq!(report.returns, vec![1.5, 1.0]);
}

#[test]
fn returns_chain_across_a_mid_rollout_termination() {
    let gamma = 0.5;
    let mut agent = agent(A2CConfig {
        n_steps: 3,
        gamma,
        seed: Some(1),
        ..Default::default()
    });
    let mut env = FixedLength::terminating(2, 2.0);

    let rollout = agent.collect(&mut env).unwrap();
    let dones: Vec<bool> = rollout.transitions.iter().map(|t| t.done).collect();
    assert_eq!(dones, vec![false, true, false]);

    let report = agent.update(rollout).unwrap();
    let returns = &report.returns;

    // The episode boundary at step 1 does not cut the recursion
    assert!((returns[2] - (2.0 + gamma * report.bootstrap)).abs() < 1e-5);
    assert!((returns[1] - (2.0 + gamma * returns[2])).abs() < 1e-5);
    assert!((returns[0] - (2.0 + gamma * returns[1])).abs() < 1e-5);
}

#[test]
fn empty_rollout_is_rejected() {
    let mut agent = agent(A2CConfig::default());
    let before = outputs(&agent);
    let rollout = Rollout {
        transitions: vec![],
        last_done: false,
        final_state: [0.0_f32, 0.0],
        episodes_finished: 0,
    };

    let err = agent.update(rollout).unwrap_err();

    assert!(matches!(err, A2CError::EmptyRollout));
    assert_eq!(outputs(&agent), before);
}

#[test]
fn single_episode() {
    let mut agent = agent(A2CConfig::default());
    let mut env = TwoState::default();

    let history = agent.train(&mut env, 1).unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].episode, 0);
    assert!(history[0].loss.is_finite());
    assert_eq!(history[0].total_reward, 5.0);
}

#[test]
fn zero_episodes_touch_nothing() {
    let mut agent = agent(A2CConfig::default());
    let mut env = TwoState::default();
    let before = outputs(&agent);

    let history = agent.train(&mut env, 0).unwrap();

    assert!(history.is_empty());
    assert_eq!(env.resets, 0);
    assert_eq!(env.steps, 0);
    assert_eq!(outputs(&agent), before);
}

#[test]
fn training_changes_parameters() {
    let mut agent = agent(A2CConfig {
        learning_rate: 1e-2,
        ..Default::default()
    });
    let mut env = TwoState::default();
    let before = outputs(&agent);

    let history = agent.train(&mut env, 3).unwrap();

    assert_eq!(history.iter().map(|m| m.episode).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(env.resets, 3);
    assert_eq!(env.steps, 15);
    assert_ne!(outputs(&agent), before);
}

#[test]
fn loss_is_rounded_to_four_decimals() {
    let mut agent = agent(A2CConfig::default());
    let mut env = TwoState::default();

    for record in agent.train(&mut env, 5).unwrap() {
        let scaled = record.loss * 10_000.0;
        assert!((scaled - scaled.round()).abs() < 1e-6, "loss {} not rounded", record.loss);
    }
}

#[test]
fn environment_error_aborts_the_run() {
    let mut agent = agent(A2CConfig::default());
    let mut env = Flaky {
        fail_at: 8,
        steps: 0,
    };

    let err = agent.train(&mut env, 10).unwrap_err();

    assert!(matches!(err, A2CError::Environment(_)));
    assert_eq!(err.to_string(), "environment failure: simulator lost connection after 8 steps");
    assert_eq!(env.steps, 8);
}

#[test]
fn nan_rewards_stop_before_the_update() {
    let mut agent = agent(A2CConfig::default());
    let before = outputs(&agent);

    let err = agent.train(&mut Poisoned, 1).unwrap_err();

    assert!(matches!(err, A2CError::Numeric { stage: "returns", .. }));
    assert_eq!(outputs(&agent), before);
}
