// Trains the shared-trunk A2C agent on CartPole and logs progress through tracing.
// RUST_LOG=debug also shows per-update loss terms and mid-rollout resets.

use a2c_rl::{
    algo::a2c::{training_loop, A2CConfig, ValueLoss},
    A2CError,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Train an n-step A2C agent on CartPole")]
struct Args {
    /// Number of training episodes (one rollout and one update each)
    #[arg(long, default_value_t = 1000)]
    episodes: usize,
    #[arg(long, default_value_t = 0.99)]
    gamma: f32,
    #[arg(long, default_value_t = 5)]
    n_steps: usize,
    #[arg(long, default_value_t = 0.5)]
    value_coef: f32,
    #[arg(long, default_value_t = 0.01)]
    entropy_coef: f32,
    #[arg(long, default_value_t = 3e-4)]
    learning_rate: f64,
    #[arg(long)]
    gradient_clip: Option<f32>,
    /// Train the value head on (returns - values)² instead of the detached advantage
    #[arg(long)]
    value_error: bool,
    #[arg(long, default_value_t = 100)]
    log_interval: usize,
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), A2CError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = A2CConfig {
        gamma: args.gamma,
        n_steps: args.n_steps,
        value_coef: args.value_coef,
        entropy_coef: args.entropy_coef,
        learning_rate: args.learning_rate,
        gradient_clip: args.gradient_clip,
        value_loss: if args.value_error {
            ValueLoss::ValueError
        } else {
            ValueLoss::DetachedAdvantage
        },
        log_interval: args.log_interval,
        seed: args.seed,
    };
    info!(?config, episodes = args.episodes, "starting training");

    let history = training_loop(args.episodes, config)?;

    let window = &history[history.len().saturating_sub(100)..];
    if !window.is_empty() {
        let mean_reward = window.iter().map(|m| m.total_reward).sum::<f32>() / window.len() as f32;
        let mean_loss = window.iter().map(|m| m.loss).sum::<f64>() / window.len() as f64;
        info!(
            episodes = history.len(),
            mean_reward,
            mean_loss,
            "Training complete (last {} episodes)",
            window.len()
        );
    }

    Ok(())
}
