//! Learning model and scripted opponents: the recurrent policy-value network,
//! fixed search and random move sources, and opponent selection.

pub mod alpha_pruning;
pub mod network;
pub mod opponent;

pub use alpha_pruning::{AlphaPruningOpponent, Heuristic, StoreMarginHeuristic};
pub use network::{
    init_recurrent_state, RecurrentPolicyValue, RecurrentPolicyValueConfig, RecurrentState,
};
pub use opponent::{OpponentKind, RandomOpponent, ScriptedOpponent};
