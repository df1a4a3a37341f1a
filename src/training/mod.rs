//! Training infrastructure: episode rollouts, loss estimators, the
//! self-play/vs-opponent loop, greedy evaluation, and metrics collection.

pub mod evaluation;
pub mod loss;
pub mod metrics;
pub mod rollout;
pub mod trainer;
pub mod trajectory;
