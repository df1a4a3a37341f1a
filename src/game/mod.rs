//! Core Mancala (Kalah) game logic: board representation, side types, and the
//! stepped environment the training loops play against.

mod board;
mod env;
mod side;

pub use board::Board;
pub use env::{MancalaEnv, Transition};
pub use side::Side;
