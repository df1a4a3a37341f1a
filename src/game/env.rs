use super::board::Board;
use super::side::Side;

/// Result of applying a single ply, as seen by the side that moved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next_to_move: Side,
    pub reward: f32,
    pub done: bool,
}

/// One position on the sowing circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Hole(Side, usize),
    Store(Side),
}

/// Kalah environment over a configurable `(n_holes, n_stones)` board.
///
/// Rewards are terminal only and always from the mover's perspective:
/// +1 for a win, -1 for a loss, 0 for a draw and for every non-terminal
/// ply. Playing an empty or out-of-range hole forfeits the game.
#[derive(Debug, Clone)]
pub struct MancalaEnv {
    board: Board,
    n_stones: u32,
    game_over: bool,
    winner: Option<Side>,
}

impl MancalaEnv {
    pub fn new(n_holes: usize, n_stones: u32) -> Self {
        MancalaEnv {
            board: Board::new(n_holes, n_stones),
            n_stones,
            game_over: false,
            winner: None,
        }
    }

    /// Start from an arbitrary position (crafted endgames, search rollouts)
    pub fn from_board(board: Board, n_stones: u32) -> Self {
        MancalaEnv {
            board,
            n_stones,
            game_over: false,
            winner: None,
        }
    }

    /// Restore the starting position
    pub fn reset(&mut self) {
        self.board = Board::new(self.board.n_holes(), self.n_stones);
        self.game_over = false;
        self.winner = None;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// One side's observation slice: `[hole 1 .. hole n, store]`
    pub fn get_holes(&self, side: Side) -> Vec<u32> {
        self.board.holes(side)
    }

    /// Apply one ply for `side`, sowing from the 1-indexed `hole`.
    ///
    /// An illegal hole ends the game immediately with the mover losing and
    /// the board untouched. A legal ply sows counterclockwise (skipping the
    /// opponent's store), applies the capture and extra-turn rules, and
    /// finishes the game once either side's holes are empty.
    pub fn step(&mut self, side: Side, hole: usize) -> Transition {
        assert!(!self.game_over, "step called on a finished game");

        if !self.board.is_valid_move(side, hole) {
            self.game_over = true;
            self.winner = Some(side.opponent());
            return Transition {
                next_to_move: side.opponent(),
                reward: -1.0,
                done: true,
            };
        }

        let mut seeds = self.board.seeds(side, hole);
        self.board.set_seeds(side, hole, 0);

        let mut slot = Slot::Hole(side, hole);
        while seeds > 0 {
            slot = self.next_slot(slot, side);
            match slot {
                Slot::Hole(s, h) => self.board.add_seeds(s, h, 1),
                Slot::Store(s) => self.board.add_to_store(s, 1),
            }
            seeds -= 1;
        }

        // Landing in an own hole that was empty captures that seed together
        // with everything in the opposite hole
        if let Slot::Hole(s, h) = slot {
            if s == side && self.board.seeds(s, h) == 1 {
                let opposite_hole = self.board.n_holes() + 1 - h;
                let captured = self.board.seeds(side.opponent(), opposite_hole);
                if captured > 0 {
                    self.board.set_seeds(side, h, 0);
                    self.board.set_seeds(side.opponent(), opposite_hole, 0);
                    self.board.add_to_store(side, captured + 1);
                }
            }
        }

        let next_to_move = if slot == Slot::Store(side) {
            side // Extra turn
        } else {
            side.opponent()
        };

        if self.board.side_empty(Side::North) || self.board.side_empty(Side::South) {
            self.finish();
            let reward = match self.winner {
                Some(w) if w == side => 1.0,
                Some(_) => -1.0,
                None => 0.0,
            };
            return Transition {
                next_to_move,
                reward,
                done: true,
            };
        }

        Transition {
            next_to_move,
            reward: 0.0,
            done: false,
        }
    }

    fn next_slot(&self, slot: Slot, mover: Side) -> Slot {
        let n = self.board.n_holes();
        match slot {
            Slot::Hole(s, h) if h < n => Slot::Hole(s, h + 1),
            Slot::Hole(s, _) if s == mover => Slot::Store(mover),
            Slot::Hole(_, _) => Slot::Hole(mover, 1),
            Slot::Store(s) => Slot::Hole(s.opponent(), 1),
        }
    }

    /// Sweep remaining hole seeds into their owners' stores and settle the
    /// winner by store comparison
    fn finish(&mut self) {
        for side in [Side::North, Side::South] {
            let remaining = self.board.seeds_in_holes(side);
            if remaining > 0 {
                for h in 1..=self.board.n_holes() {
                    self.board.set_seeds(side, h, 0);
                }
                self.board.add_to_store(side, remaining);
            }
        }
        self.game_over = true;
        let north = self.board.store(Side::North);
        let south = self.board.store(Side::South);
        self.winner = if north > south {
            Some(Side::North)
        } else if south > north {
            Some(Side::South)
        } else {
            None
        };
    }
}
