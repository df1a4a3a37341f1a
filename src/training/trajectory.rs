use burn::prelude::*;

/// Per-episode record for one learning agent: parallel vectors holding one
/// reward, log-probability, value estimate and entropy per ply the agent
/// played. Cleared by constructing a fresh trajectory each episode.
#[derive(Debug)]
pub struct Trajectory<B: Backend> {
    pub rewards: Vec<f32>,
    pub log_probs: Vec<Tensor<B, 1>>,
    pub values: Vec<Tensor<B, 2>>,
    pub entropies: Vec<Tensor<B, 1>>,
}

impl<B: Backend> Trajectory<B> {
    pub fn new() -> Self {
        Trajectory {
            rewards: Vec::new(),
            log_probs: Vec::new(),
            values: Vec::new(),
            entropies: Vec::new(),
        }
    }

    /// Record one ply
    pub fn push(
        &mut self,
        reward: f32,
        log_prob: Tensor<B, 1>,
        value: Tensor<B, 2>,
        entropy: Tensor<B, 1>,
    ) {
        self.rewards.push(reward);
        self.log_probs.push(log_prob);
        self.values.push(value);
        self.entropies.push(entropy);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

impl<B: Backend> Default for Trajectory<B> {
    fn default() -> Self {
        Self::new()
    }
}
