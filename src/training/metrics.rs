use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::game::Side;

/// Result of a single episode.
pub struct EpisodeResult {
    pub winner: Option<Side>,
    pub game_length: usize,
}

/// Episode statistics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    /// Win rate for the given side in the last N episodes.
    pub fn win_rate(&self, side: Side, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let wins = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .filter(|r| r.winner == Some(side))
            .count();
        wins as f32 / n as f32
    }

    /// Draw rate in the last N episodes.
    pub fn draw_rate(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let draws = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .filter(|r| r.winner.is_none())
            .count();
        draws as f32 / n as f32
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.game_length)
            .sum();
        total as f32 / n as f32
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Sink for scalar training curves, plugged into the trainer as an optional
/// capability.
pub trait MetricWriter {
    fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> io::Result<()>;
}

#[derive(serde::Serialize)]
struct ScalarRecord<'a> {
    step: usize,
    tag: &'a str,
    value: f32,
}

/// Metric writer emitting one JSON object per line, flushed per record so
/// curves stay readable while the run is still going. Records append to any
/// existing file, so a resumed run extends its earlier curve.
pub struct JsonlMetricWriter {
    out: BufWriter<File>,
}

impl JsonlMetricWriter {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JsonlMetricWriter {
            out: BufWriter::new(file),
        })
    }
}

impl MetricWriter for JsonlMetricWriter {
    fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> io::Result<()> {
        let record = ScalarRecord { step, tag, value };
        serde_json::to_writer(&mut self.out, &record).map_err(io::Error::other)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}
