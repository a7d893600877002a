/// Discounted n-step returns
///
/// `returns[t] = rewards[t] + gamma * returns[t + 1]`, with the step past the
/// last reward standing in as `bootstrap`. Episode boundaries inside the
/// rewards are not looked at; only the bootstrap encodes termination.
pub fn compute_returns(rewards: &[f32], bootstrap: f32, gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running_return = bootstrap;

    for (ret, &reward) in returns.iter_mut().zip(rewards).rev() {
        running_return = reward + gamma * running_return;
        *ret = running_return;
    }

    returns
}
