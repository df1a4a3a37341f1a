use std::path::{Path, PathBuf};

use crate::ai::opponent::OpponentKind;
use crate::error::ConfigError;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub run: RunConfig,
    pub opponent: OpponentKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            game: GameConfig::default(),
            model: ModelConfig::default(),
            training: TrainingConfig::default(),
            run: RunConfig::default(),
            opponent: OpponentKind::default(),
        }
    }
}

/// Board geometry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub n_holes: usize,
    pub n_stones: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            n_holes: 7,
            n_stones: 7,
        }
    }
}

/// Network layer sizes. `n_inputs` must cover both sides' holes and stores,
/// `n_outputs` one logit per hole.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_inputs: usize,
    pub n_outputs: usize,
    pub hidden_size: usize,
    pub neuron_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            n_inputs: 16,
            n_outputs: 7,
            hidden_size: 128,
            neuron_size: 128,
        }
    }
}

/// Optimizer selection for the learning agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

/// Loss estimator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimatorKind {
    Baseline,
    Gae,
}

/// Step-decay learning rate schedule parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SchedulerConfig {
    pub step_size: usize,
    pub decay: f64,
}

/// Optimization hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub optimizer: OptimizerKind,
    pub lr: f64,
    pub estimator: EstimatorKind,
    pub reward_discount: f32,
    pub eps: f32,
    pub max_clip_grad: Option<f32>,
    pub start_epoch: usize,
    pub end_epochs: usize,
    pub max_game_length: usize,
    pub seed: u64,
    // Sub-table, must serialize after the scalar values
    pub scheduler: Option<SchedulerConfig>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            optimizer: OptimizerKind::Adam,
            lr: 3e-4,
            estimator: EstimatorKind::Baseline,
            reward_discount: 0.99,
            eps: 1e-7,
            max_clip_grad: Some(40.0),
            start_epoch: 0,
            end_epochs: 10_000,
            max_game_length: 200,
            seed: 42,
            scheduler: None,
        }
    }
}

/// Run bookkeeping: console cadence, checkpoint naming and placement.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub print_interval: usize,
    pub save_interval: usize,
    pub evaluate_interval: usize,
    pub writer_interval: usize,
    pub time_tag: String,
    pub log_dir: PathBuf,
    pub model_suffix: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            print_interval: 100,
            save_interval: 1000,
            evaluate_interval: 500,
            writer_interval: 10,
            time_tag: "mancala".to_string(),
            log_dir: PathBuf::from("checkpoints"),
            model_suffix: "mpk".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            eprintln!(
                "Warning: config file '{}' not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.n_holes == 0 {
            return Err(ConfigError::Validation("game.n_holes must be >= 1".into()));
        }
        if self.game.n_stones == 0 {
            return Err(ConfigError::Validation("game.n_stones must be >= 1".into()));
        }
        if self.model.n_outputs != self.game.n_holes {
            return Err(ConfigError::Validation(
                "model.n_outputs must equal game.n_holes".into(),
            ));
        }
        if self.model.n_inputs != 2 * (self.game.n_holes + 1) {
            return Err(ConfigError::Validation(
                "model.n_inputs must equal 2 * (game.n_holes + 1)".into(),
            ));
        }
        if self.model.hidden_size == 0 {
            return Err(ConfigError::Validation(
                "model.hidden_size must be >= 1".into(),
            ));
        }
        if self.model.neuron_size == 0 {
            return Err(ConfigError::Validation(
                "model.neuron_size must be >= 1".into(),
            ));
        }
        if self.training.lr <= 0.0 {
            return Err(ConfigError::Validation("training.lr must be > 0".into()));
        }
        if self.training.reward_discount < 0.0 || self.training.reward_discount > 1.0 {
            return Err(ConfigError::Validation(
                "training.reward_discount must be in [0, 1]".into(),
            ));
        }
        if self.training.eps <= 0.0 {
            return Err(ConfigError::Validation("training.eps must be > 0".into()));
        }
        if let Some(clip) = self.training.max_clip_grad {
            if clip <= 0.0 {
                return Err(ConfigError::Validation(
                    "training.max_clip_grad must be > 0".into(),
                ));
            }
        }
        if self.training.end_epochs <= self.training.start_epoch {
            return Err(ConfigError::Validation(
                "training.end_epochs must be > training.start_epoch".into(),
            ));
        }
        if self.training.max_game_length == 0 {
            return Err(ConfigError::Validation(
                "training.max_game_length must be >= 1".into(),
            ));
        }
        if let Some(scheduler) = &self.training.scheduler {
            if scheduler.step_size == 0 {
                return Err(ConfigError::Validation(
                    "training.scheduler.step_size must be >= 1".into(),
                ));
            }
            if scheduler.decay <= 0.0 || scheduler.decay > 1.0 {
                return Err(ConfigError::Validation(
                    "training.scheduler.decay must be in (0, 1]".into(),
                ));
            }
        }
        if self.run.print_interval == 0 {
            return Err(ConfigError::Validation(
                "run.print_interval must be >= 1".into(),
            ));
        }
        if self.run.save_interval == 0 {
            return Err(ConfigError::Validation(
                "run.save_interval must be >= 1".into(),
            ));
        }
        if self.run.evaluate_interval == 0 {
            return Err(ConfigError::Validation(
                "run.evaluate_interval must be >= 1".into(),
            ));
        }
        if self.run.writer_interval == 0 {
            return Err(ConfigError::Validation(
                "run.writer_interval must be >= 1".into(),
            ));
        }
        if self.run.time_tag.is_empty() {
            return Err(ConfigError::Validation(
                "run.time_tag must not be empty".into(),
            ));
        }
        if self.run.model_suffix != "mpk" {
            return Err(ConfigError::Validation(
                "run.model_suffix must be 'mpk' (message-pack recorder)".into(),
            ));
        }
        if let OpponentKind::AlphaPruning { depth } = self.opponent {
            if depth == 0 {
                return Err(ConfigError::Validation(
                    "opponent.depth must be >= 1".into(),
                ));
            }
        }

        Ok(())
    }

    /// Render the default configuration as a TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[training]
lr = 0.001
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!((config.training.lr - 0.001).abs() < 1e-9);
        // Other fields should be defaults
        assert!((config.training.reward_discount - 0.99).abs() < 1e-6);
        assert_eq!(config.training.end_epochs, 10_000);
        assert_eq!(config.game.n_holes, 7);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        let default = AppConfig::default();
        assert!((config.training.lr - default.training.lr).abs() < 1e-9);
        assert_eq!(config.training.end_epochs, default.training.end_epochs);
        assert_eq!(config.run.time_tag, default.run.time_tag);
    }

    #[test]
    fn test_selector_enums_parse_kebab_case() {
        let toml_str = r#"
[training]
optimizer = "sgd"
estimator = "gae"

[opponent]
kind = "alpha-pruning"
depth = 6
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.training.optimizer, OptimizerKind::Sgd);
        assert_eq!(config.training.estimator, EstimatorKind::Gae);
        assert_eq!(config.opponent, OpponentKind::AlphaPruning { depth: 6 });
    }

    #[test]
    fn test_scheduler_section_parses() {
        let toml_str = r#"
[training.scheduler]
step_size = 1000
decay = 0.9
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        let scheduler = config.training.scheduler.expect("scheduler should be set");
        assert_eq!(scheduler.step_size, 1000);
        assert!((scheduler.decay - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_validation_rejects_negative_lr() {
        let mut config = AppConfig::default();
        config.training.lr = -0.001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_discount() {
        let mut config = AppConfig::default();
        config.training.reward_discount = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_eps() {
        let mut config = AppConfig::default();
        config.training.eps = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_clip_norm() {
        let mut config = AppConfig::default();
        config.training.max_clip_grad = Some(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clipping_is_optional() {
        let mut config = AppConfig::default();
        config.training.max_clip_grad = None;
        config.validate().expect("missing clip norm is allowed");
    }

    #[test]
    fn test_validation_rejects_empty_epoch_range() {
        let mut config = AppConfig::default();
        config.training.start_epoch = 100;
        config.training.end_epochs = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_game_length() {
        let mut config = AppConfig::default();
        config.training.max_game_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_mismatched_outputs() {
        let mut config = AppConfig::default();
        config.model.n_outputs = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_mismatched_inputs() {
        let mut config = AppConfig::default();
        config.game.n_holes = 4;
        config.model.n_outputs = 4;
        // n_inputs stays 16 but should be 10
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_print_interval() {
        let mut config = AppConfig::default();
        config.run.print_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_suffix() {
        let mut config = AppConfig::default();
        config.run.model_suffix = "bin".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_scheduler() {
        let mut config = AppConfig::default();
        config.training.scheduler = Some(SchedulerConfig {
            step_size: 0,
            decay: 0.9,
        });
        assert!(config.validate().is_err());

        config.training.scheduler = Some(SchedulerConfig {
            step_size: 100,
            decay: 0.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_search_depth() {
        let mut config = AppConfig::default();
        config.opponent = OpponentKind::AlphaPruning { depth: 0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config.training.end_epochs, 10_000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[game]
n_holes = 4
n_stones = 3

[model]
n_inputs = 10
n_outputs = 4
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.game.n_holes, 4);
        assert_eq!(config.model.n_inputs, 10);
        // Others are defaults
        assert!((config.training.lr - 3e-4).abs() < 1e-9);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[training]\nlr = -1.0").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config
            .validate()
            .expect("roundtripped config should be valid");
    }
}
