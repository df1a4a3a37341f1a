use burn::prelude::*;
use burn::tensor::activation::softmax;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::Rng;

use crate::ai::network::{init_recurrent_state, RecurrentPolicyValue, RecurrentState};
use crate::ai::opponent::ScriptedOpponent;
use crate::config::AppConfig;
use crate::game::{MancalaEnv, Side};

use super::metrics::{EpisodeResult, TrainingMetrics};
use super::rollout::observation;

/// Strength summary from a batch of greedy evaluation games.
#[derive(Debug, Clone, Copy)]
pub struct EvalSummary {
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub win_rate: f32,
    pub draw_rate: f32,
    pub average_length: f32,
}

/// Pick the legal hole with the highest policy probability, threading the
/// recurrent state like a real episode.
fn greedy_action<B: Backend>(
    env: &MancalaEnv,
    model: &RecurrentPolicyValue<B>,
    side: Side,
    state: RecurrentState<B>,
    device: &B::Device,
) -> (usize, RecurrentState<B>) {
    let obs = observation(env, side);
    let input =
        Tensor::<B, 1>::from_data(TensorData::from(obs.as_slice()), device).unsqueeze::<2>();
    let (logits, _value, next_state) = model.forward(input, Some(state));
    let probs = softmax(logits, 1).into_data().to_vec::<f32>().unwrap();

    let legal = env.board().valid_moves(side);
    assert!(!legal.is_empty(), "No legal moves available");
    let mut best = legal[0];
    for &hole in &legal {
        if probs[hole - 1] > probs[best - 1] {
            best = hole;
        }
    }

    (best, next_state)
}

fn play_greedy_game<B: Backend>(
    model: &RecurrentPolicyValue<B>,
    opponent: &mut dyn ScriptedOpponent,
    model_side: Side,
    config: &AppConfig,
    device: &B::Device,
    rng: &mut StdRng,
) -> EpisodeResult {
    let mut env = MancalaEnv::new(config.game.n_holes, config.game.n_stones);
    let mut state = init_recurrent_state::<B>(config.model.hidden_size, device);
    let mut to_move = if rng.random_bool(0.5) {
        Side::North
    } else {
        Side::South
    };
    let mut plies = 0;

    loop {
        let transition = if to_move == model_side {
            let (hole, next_state) = greedy_action(&env, model, to_move, state, device);
            state = next_state;
            env.step(to_move, hole)
        } else {
            let hole = opponent.get_move(&env, to_move, rng);
            env.step(to_move, hole)
        };

        plies += 1;
        if transition.done || plies > config.training.max_game_length {
            break;
        }
        to_move = transition.next_to_move;
    }

    EpisodeResult {
        winner: env.winner(),
        game_length: plies,
    }
}

/// Play N greedy games against a scripted opponent, alternating the model's
/// seat each game, and summarize the outcomes.
pub fn evaluate_vs_scripted<B: Backend>(
    model: &RecurrentPolicyValue<B>,
    opponent: &mut dyn ScriptedOpponent,
    games: usize,
    config: &AppConfig,
    device: &B::Device,
    rng: &mut StdRng,
) -> EvalSummary {
    let mut metrics = TrainingMetrics::with_capacity(games.max(1));
    let mut wins = 0;
    let mut draws = 0;

    for game_idx in 0..games {
        let model_side = if game_idx % 2 == 0 {
            Side::North
        } else {
            Side::South
        };
        let result = play_greedy_game(model, opponent, model_side, config, device, rng);
        if result.winner == Some(model_side) {
            wins += 1;
        }
        if result.winner.is_none() {
            draws += 1;
        }
        metrics.record_episode(result);
    }

    let total = games.max(1);
    EvalSummary {
        games,
        wins,
        draws,
        win_rate: wins as f32 / total as f32,
        draw_rate: draws as f32 / total as f32,
        average_length: metrics.average_game_length(games.max(1)),
    }
}
