//! Model file naming, saving, and resume loading.

use std::path::PathBuf;

use burn::module::Module;
use burn::prelude::*;
use burn::record::DefaultRecorder;

use crate::ai::network::RecurrentPolicyValue;
use crate::config::RunConfig;
use crate::error::CheckpointError;

/// Which agent a stored model file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Opponent,
}

/// Names and writes model files under the run's log directory.
///
/// Primary models land at `{log_dir}/{time_tag}_{epoch}.{suffix}`, opponent
/// models at `{log_dir}/{time_tag}_{epoch}.opp.{suffix}`.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    log_dir: PathBuf,
    time_tag: String,
    model_suffix: String,
}

impl CheckpointManager {
    pub fn from_config(run: &RunConfig) -> Self {
        CheckpointManager {
            log_dir: run.log_dir.clone(),
            time_tag: run.time_tag.clone(),
            model_suffix: run.model_suffix.clone(),
        }
    }

    /// Full file path for a role's model at an epoch. The suffix is part of
    /// the path so the recorder does not rewrite the `.opp` marker.
    pub fn model_path(&self, epoch: usize, role: Role) -> PathBuf {
        let name = match role {
            Role::Primary => format!("{}_{}.{}", self.time_tag, epoch, self.model_suffix),
            Role::Opponent => format!("{}_{}.opp.{}", self.time_tag, epoch, self.model_suffix),
        };
        self.log_dir.join(name)
    }

    /// Save the model's weights for an epoch.
    pub fn save<B: Backend>(
        &self,
        model: &RecurrentPolicyValue<B>,
        epoch: usize,
        role: Role,
    ) -> Result<(), CheckpointError> {
        let path = self.model_path(epoch, role);
        println!("Saving model: epoch={} => {}", epoch, path.display());
        model
            .clone()
            .save_file(&path, &DefaultRecorder::default())?;
        Ok(())
    }

    /// Load weights into `model` when a file exists for the epoch. A missing
    /// file is not an error; the model is handed back untouched.
    pub fn load_if_exists<B: Backend>(
        &self,
        model: RecurrentPolicyValue<B>,
        epoch: usize,
        role: Role,
        device: &B::Device,
    ) -> Result<RecurrentPolicyValue<B>, CheckpointError> {
        let path = self.model_path(epoch, role);
        if !path.exists() {
            return Ok(model);
        }

        println!("existing model found in {}", path.display());
        let model = model.load_file(&path, &DefaultRecorder::default(), device)?;
        Ok(model)
    }
}
