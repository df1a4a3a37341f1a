//! # Mancala RL
//!
//! A Mancala (Kalah) self-play reinforcement learning trainer. A recurrent
//! policy/value network learns from full-episode REINFORCE or GAE updates
//! via the Burn ML framework, either against a second learning copy of
//! itself or against a scripted opponent.
//!
//! ## Modules
//!
//! - [`game`]: core game logic (board, sides, sowing and capture rules)
//! - [`ai`]: recurrent policy/value network and scripted opponents
//! - [`training`]: episode rollouts, loss estimators, the training loop
//! - [`checkpoint`]: model persistence and resume loading
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
