use burn::prelude::*;

use crate::config::{EstimatorKind, TrainingConfig};

use super::trajectory::Trajectory;

const TAU: f32 = 1.0;
const ENTROPY_BETA: f32 = 0.01;

/// Discounted returns by reverse accumulation: `G_t = r_t + discount * G_{t+1}`.
fn discounted_returns(rewards: &[f32], discount: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];
    let mut accumulated = 0.0;
    for (i, &reward) in rewards.iter().enumerate().rev() {
        accumulated = discount * accumulated + reward;
        returns[i] = accumulated;
    }
    returns
}

/// Standardize returns to zero mean and unit spread. Uses the sample
/// standard deviation (n - 1) for longer sequences and the population one
/// for a single element, where it degrades to zero and the epsilon keeps
/// the division finite.
fn normalize_returns(returns: &[f32], eps: f32) -> Vec<f32> {
    let n = returns.len() as f32;
    let mean = returns.iter().sum::<f32>() / n;
    let denom = if returns.len() > 1 { n - 1.0 } else { n };
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / denom;
    let std = variance.sqrt();
    returns.iter().map(|r| (r - mean) / (std + eps)).collect()
}

/// Huber loss with unit transition point, elementwise on a rank-1 tensor.
fn smooth_l1<B: Backend>(pred: Tensor<B, 1>, target: f32) -> Tensor<B, 1> {
    let diff = pred.sub_scalar(target);
    let abs = diff.clone().abs();
    let quadratic = diff.clone() * diff * 0.5;
    let linear = abs.clone().sub_scalar(0.5);
    linear.mask_where(abs.lower_elem(1.0), quadratic)
}

/// REINFORCE with a learned value baseline.
///
/// Policy term per ply: `(G_norm - value) * -log_prob`; critic term: Huber
/// between the value estimate and the normalized return. Total loss is the
/// policy sum plus half the critic sum. Empty trajectories produce no loss.
pub fn reinforce_with_baseline<B: Backend>(
    traj: &Trajectory<B>,
    discount: f32,
    eps: f32,
) -> Option<Tensor<B, 1>> {
    if traj.is_empty() {
        return None;
    }
    let device = traj.log_probs[0].device();

    let returns = discounted_returns(&traj.rewards, discount);
    let normalized = normalize_returns(&returns, eps);

    let mut policy_loss = Tensor::<B, 1>::zeros([1], &device);
    let mut value_loss = Tensor::<B, 1>::zeros([1], &device);

    for (i, &ret) in normalized.iter().enumerate() {
        let value = traj.values[i].clone().reshape([1]);
        let advantage = value.clone().neg().add_scalar(ret);
        policy_loss = policy_loss + advantage * traj.log_probs[i].clone().neg();
        value_loss = value_loss + smooth_l1(value, ret);
    }

    Some(policy_loss + value_loss * 0.5)
}

/// Generalized advantage estimation with a zero bootstrap.
///
/// The advantage stream `gae = gae * discount * tau + delta_t` is built from
/// detached value data with `delta_t = r_t + discount * v_{t+1} - v_t`; the
/// critic term regresses the live value estimates toward zero return. The
/// policy sum also carries the entropy bonus. Empty trajectories produce no
/// loss.
pub fn gae<B: Backend>(traj: &Trajectory<B>, discount: f32) -> Option<Tensor<B, 1>> {
    if traj.is_empty() {
        return None;
    }
    let device = traj.log_probs[0].device();

    // Detached value estimates, with a zero appended for the step past the end
    let mut value_data: Vec<f32> = traj
        .values
        .iter()
        .map(|v| v.clone().into_data().to_vec::<f32>().unwrap()[0])
        .collect();
    value_data.push(0.0);

    let mut policy_loss = Tensor::<B, 1>::zeros([1], &device);
    let mut value_loss = Tensor::<B, 1>::zeros([1], &device);
    let mut gae = 0.0_f32;

    for i in (0..traj.len()).rev() {
        let advantage = traj.values[i].clone().reshape([1]).neg();
        value_loss = value_loss + advantage.clone() * advantage * 0.5;

        let delta_t = traj.rewards[i] + discount * value_data[i + 1] - value_data[i];
        gae = gae * discount * TAU + delta_t;

        policy_loss = policy_loss
            - traj.log_probs[i].clone() * gae
            - traj.entropies[i].clone() * ENTROPY_BETA;
    }

    Some(policy_loss + value_loss * 0.5)
}

impl EstimatorKind {
    /// Episode loss under the selected estimator, `None` when the agent
    /// recorded no plies
    pub fn loss<B: Backend>(
        &self,
        traj: &Trajectory<B>,
        config: &TrainingConfig,
    ) -> Option<Tensor<B, 1>> {
        match self {
            EstimatorKind::Baseline => {
                reinforce_with_baseline(traj, config.reward_discount, config.eps)
            }
            EstimatorKind::Gae => gae(traj, config.reward_discount),
        }
    }
}
