use rand::rngs::StdRng;

use crate::game::{MancalaEnv, Side};

use super::opponent::ScriptedOpponent;

/// Trait for evaluating a position from one side's perspective.
pub trait Heuristic: Send {
    fn evaluate(&self, env: &MancalaEnv, side: Side) -> f64;
}

/// Default heuristic: store lead plus half a point per seed still in hand.
pub struct StoreMarginHeuristic;

impl Heuristic for StoreMarginHeuristic {
    fn evaluate(&self, env: &MancalaEnv, side: Side) -> f64 {
        let board = env.board();
        let own = board.store(side) as f64 + 0.5 * board.seeds_in_holes(side) as f64;
        let opponent = board.store(side.opponent()) as f64
            + 0.5 * board.seeds_in_holes(side.opponent()) as f64;
        own - opponent
    }
}

/// Hole ordering: nearest the store first for better alpha-beta pruning.
fn move_order(n_holes: usize) -> impl Iterator<Item = usize> {
    (1..=n_holes).rev()
}

/// Fixed-depth search opponent with alpha-beta pruning.
///
/// Plain minimax rather than negamax: Kalah's extra turns mean the side to
/// move does not alternate strictly, so each node tracks whose turn it is
/// against a fixed maximizing side.
pub struct AlphaPruningOpponent {
    depth: usize,
    heuristic: Box<dyn Heuristic>,
}

impl AlphaPruningOpponent {
    pub fn new(depth: usize) -> Self {
        AlphaPruningOpponent {
            depth,
            heuristic: Box::new(StoreMarginHeuristic),
        }
    }

    pub fn with_heuristic(depth: usize, heuristic: Box<dyn Heuristic>) -> Self {
        AlphaPruningOpponent { depth, heuristic }
    }

    fn best_move(&self, env: &MancalaEnv, side: Side) -> usize {
        let legal = env.board().valid_moves(side);
        assert!(!legal.is_empty(), "No legal moves available");

        let mut best_hole = legal[0];
        let mut best_score = f64::NEG_INFINITY;

        for hole in move_order(env.board().n_holes()) {
            if !env.board().is_valid_move(side, hole) {
                continue;
            }
            let mut next = env.clone();
            let t = next.step(side, hole);
            let score = self.search(
                &next,
                t.next_to_move,
                side,
                self.depth - 1,
                f64::NEG_INFINITY,
                f64::INFINITY,
            );
            if score > best_score {
                best_score = score;
                best_hole = hole;
            }
        }

        best_hole
    }

    fn search(
        &self,
        env: &MancalaEnv,
        to_move: Side,
        max_side: Side,
        depth: usize,
        mut alpha: f64,
        mut beta: f64,
    ) -> f64 {
        if env.is_over() {
            return match env.winner() {
                Some(w) if w == max_side => 100_000.0,
                Some(_) => -100_000.0,
                None => 0.0,
            };
        }

        if depth == 0 {
            return self.heuristic.evaluate(env, max_side);
        }

        let maximizing = to_move == max_side;
        let mut best = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for hole in move_order(env.board().n_holes()) {
            if !env.board().is_valid_move(to_move, hole) {
                continue;
            }
            let mut next = env.clone();
            let t = next.step(to_move, hole);
            let score = self.search(&next, t.next_to_move, max_side, depth - 1, alpha, beta);

            if maximizing {
                if score > best {
                    best = score;
                }
                if score > alpha {
                    alpha = score;
                }
            } else {
                if score < best {
                    best = score;
                }
                if score < beta {
                    beta = score;
                }
            }
            if alpha >= beta {
                break;
            }
        }

        best
    }
}

impl ScriptedOpponent for AlphaPruningOpponent {
    fn get_move(&mut self, env: &MancalaEnv, side: Side, _rng: &mut StdRng) -> usize {
        self.best_move(env, side)
    }

    fn name(&self) -> &str {
        "AlphaPruning"
    }
}
