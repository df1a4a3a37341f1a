use burn::prelude::*;
use burn::tensor::activation::{log_softmax, softmax};
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::Rng;

use crate::ai::network::{init_recurrent_state, RecurrentPolicyValue, RecurrentState};
use crate::ai::opponent::ScriptedOpponent;
use crate::config::AppConfig;
use crate::game::{MancalaEnv, Side};

use super::trajectory::Trajectory;

/// Everything the trainer needs to remember about one sampled ply
pub struct PlyDecision<B: Backend> {
    /// 1-indexed hole handed to the environment
    pub action: usize,
    pub log_prob: Tensor<B, 1>,
    pub value: Tensor<B, 2>,
    pub entropy: Tensor<B, 1>,
}

/// The mover's observation: own holes and store, then the opponent's
pub(crate) fn observation(env: &MancalaEnv, side: Side) -> Vec<f32> {
    let mut obs: Vec<f32> = env.get_holes(side).into_iter().map(|s| s as f32).collect();
    obs.extend(
        env.get_holes(side.opponent())
            .into_iter()
            .map(|s| s as f32),
    );
    obs
}

/// Run the model for one ply and sample an action from its policy.
///
/// The sampled index is NOT masked to legal holes; an illegal draw flows
/// into the environment's forfeit rule. The reported entropy is the sampled
/// action's log-probability folded against the raw logits, kept exactly as
/// the training recipe defines it.
pub fn select_action<B: Backend>(
    env: &MancalaEnv,
    model: &RecurrentPolicyValue<B>,
    side: Side,
    state: RecurrentState<B>,
    device: &B::Device,
    rng: &mut StdRng,
) -> (PlyDecision<B>, RecurrentState<B>) {
    let obs = observation(env, side);
    let input =
        Tensor::<B, 1>::from_data(TensorData::from(obs.as_slice()), device).unsqueeze::<2>();
    let (logits, value, next_state) = model.forward(input, Some(state));

    let probs = softmax(logits.clone(), 1);
    let probs_vec = probs.into_data().to_vec::<f32>().unwrap();
    let sampled = sample_categorical(&probs_vec, rng);

    // Gather the sampled action's log-probability through a one-hot mask
    let mut one_hot = vec![0.0f32; probs_vec.len()];
    one_hot[sampled] = 1.0;
    let mask =
        Tensor::<B, 1>::from_data(TensorData::from(one_hot.as_slice()), device).unsqueeze::<2>();
    let log_prob = (log_softmax(logits.clone(), 1) * mask).sum_dim(1);

    let entropy = (log_prob.clone() * logits).sum_dim(1).neg().reshape([1]);

    (
        PlyDecision {
            action: sampled + 1,
            log_prob: log_prob.reshape([1]),
            value,
            entropy,
        },
        next_state,
    )
}

/// Sample an action from a categorical distribution defined by probs.
fn sample_categorical(probs: &[f32], rng: &mut StdRng) -> usize {
    let r: f32 = rng.random_range(0.0..1.0);
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return i;
        }
    }
    // Fallback to last non-zero probability action
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

/// Who answers the primary agent's moves during an episode
pub enum EpisodeOpponent<'a, B: Backend> {
    /// A second learning model with its own trajectory and recurrent state
    Learner(&'a RecurrentPolicyValue<B>),
    /// A fixed move source; its plies are not recorded
    Scripted(&'a mut dyn ScriptedOpponent),
}

/// Outcome of one played episode
pub struct EpisodeTrace<B: Backend> {
    pub primary: Trajectory<B>,
    pub opponent: Trajectory<B>,
    pub plies: usize,
    /// True when the game finished on its own, false when the ply cap cut it
    pub natural_end: bool,
    pub winner: Option<Side>,
}

/// Play one full episode on a fresh board.
///
/// The primary agent always sits north; the starting side is a coin flip.
/// Both recurrent states start zeroed. The loop leaves once the game is done
/// or the ply counter exceeds `max_game_length`, so a cap of N admits at
/// most N + 1 plies.
pub fn play_episode<B: Backend>(
    primary: &RecurrentPolicyValue<B>,
    mut opponent: EpisodeOpponent<'_, B>,
    config: &AppConfig,
    device: &B::Device,
    rng: &mut StdRng,
) -> EpisodeTrace<B> {
    let mut env = MancalaEnv::new(config.game.n_holes, config.game.n_stones);
    let mut primary_traj = Trajectory::new();
    let mut opponent_traj = Trajectory::new();
    let mut primary_state = init_recurrent_state::<B>(config.model.hidden_size, device);
    let mut opponent_state = init_recurrent_state::<B>(config.model.hidden_size, device);

    let mut to_move = if rng.random_bool(0.5) {
        Side::North
    } else {
        Side::South
    };
    let mut plies = 0;
    let natural_end;

    loop {
        let transition = match (to_move, &mut opponent) {
            (Side::North, _) => {
                let (decision, next_state) =
                    select_action(&env, primary, Side::North, primary_state, device, rng);
                primary_state = next_state;
                let t = env.step(Side::North, decision.action);
                primary_traj.push(t.reward, decision.log_prob, decision.value, decision.entropy);
                t
            }
            (Side::South, EpisodeOpponent::Learner(model)) => {
                let (decision, next_state) =
                    select_action(&env, *model, Side::South, opponent_state, device, rng);
                opponent_state = next_state;
                let t = env.step(Side::South, decision.action);
                opponent_traj.push(t.reward, decision.log_prob, decision.value, decision.entropy);
                t
            }
            (Side::South, EpisodeOpponent::Scripted(scripted)) => {
                let hole = scripted.get_move(&env, Side::South, rng);
                env.step(Side::South, hole)
            }
        };

        plies += 1;
        if transition.done || plies > config.training.max_game_length {
            natural_end = transition.done;
            break;
        }
        to_move = transition.next_to_move;
    }

    EpisodeTrace {
        primary: primary_traj,
        opponent: opponent_traj,
        plies,
        natural_end,
        winner: env.winner(),
    }
}
