use rand::rngs::StdRng;
use rand::Rng;

use crate::game::{MancalaEnv, Side};

use super::alpha_pruning::AlphaPruningOpponent;

/// A fixed, non-learning move source the training loop can play against.
/// Randomness is drawn from the caller's rng so runs stay reproducible.
pub trait ScriptedOpponent {
    fn get_move(&mut self, env: &MancalaEnv, side: Side, rng: &mut StdRng) -> usize;

    fn name(&self) -> &str;
}

/// An opponent that selects uniformly at random from legal holes.
pub struct RandomOpponent;

impl ScriptedOpponent for RandomOpponent {
    fn get_move(&mut self, env: &MancalaEnv, side: Side, rng: &mut StdRng) -> usize {
        let moves = env.board().valid_moves(side);
        assert!(!moves.is_empty(), "No legal moves available");
        let idx = rng.random_range(0..moves.len());
        moves[idx]
    }

    fn name(&self) -> &str {
        "Random"
    }
}

/// Opponent selection, loadable from the `[opponent]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OpponentKind {
    Random,
    AlphaPruning { depth: usize },
}

impl Default for OpponentKind {
    fn default() -> Self {
        OpponentKind::AlphaPruning { depth: 4 }
    }
}

impl OpponentKind {
    /// Construct a fresh opponent instance
    pub fn build(&self) -> Box<dyn ScriptedOpponent> {
        match self {
            OpponentKind::Random => Box::new(RandomOpponent),
            OpponentKind::AlphaPruning { depth } => Box::new(AlphaPruningOpponent::new(*depth)),
        }
    }
}
