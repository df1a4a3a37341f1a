use std::io::Write;
use std::time::{Duration, Instant};

use burn::grad_clipping::GradientClippingConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ai::network::{RecurrentPolicyValue, RecurrentPolicyValueConfig};
use crate::checkpoint::{CheckpointManager, Role};
use crate::config::{AppConfig, OptimizerKind, SchedulerConfig, TrainingConfig};
use crate::error::TrainError;
use crate::training::metrics::MetricWriter;
use crate::training::rollout::{play_episode, EpisodeOpponent};
use crate::training::trajectory::Trajectory;

/// Who the primary agent trains against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainMode {
    /// A second learning copy of the network plays the other side.
    SelfPlay,
    /// A scripted opponent plays the other side; only the primary learns.
    VsOpponent,
}

/// Learning-rate schedule, advanced once per epoch.
#[derive(Debug, Clone)]
pub enum LrSchedule {
    Constant(f64),
    /// Step decay: `lr = base · decay^(epochs / step_size)`.
    StepDecay {
        base_lr: f64,
        step_size: usize,
        decay: f64,
        epochs_seen: usize,
    },
}

impl LrSchedule {
    pub fn from_config(lr: f64, scheduler: &Option<SchedulerConfig>) -> Self {
        match scheduler {
            Some(s) => LrSchedule::StepDecay {
                base_lr: lr,
                step_size: s.step_size,
                decay: s.decay,
                epochs_seen: 0,
            },
            None => LrSchedule::Constant(lr),
        }
    }

    pub fn current(&self) -> f64 {
        match self {
            LrSchedule::Constant(lr) => *lr,
            LrSchedule::StepDecay {
                base_lr,
                step_size,
                decay,
                epochs_seen,
            } => base_lr * decay.powi((epochs_seen / step_size) as i32),
        }
    }

    pub fn advance(&mut self) {
        if let LrSchedule::StepDecay { epochs_seen, .. } = self {
            *epochs_seen += 1;
        }
    }
}

/// A model paired with its optimizer and learning-rate schedule.
struct Learner<B: AutodiffBackend, O> {
    model: RecurrentPolicyValue<B>,
    optimizer: O,
    schedule: LrSchedule,
}

impl<B, O> Learner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<RecurrentPolicyValue<B>, B>,
{
    /// One gradient step from a full-episode trajectory. Returns the scalar
    /// loss, or `None` when the trajectory holds no plies for this agent.
    fn apply_update(
        &mut self,
        trajectory: &Trajectory<B>,
        config: &TrainingConfig,
    ) -> Option<f32> {
        let loss = config.estimator.loss(trajectory, config)?;
        let loss_value = loss.clone().into_data().to_vec::<f32>().unwrap()[0];

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optimizer
            .step(self.schedule.current(), self.model.clone(), grads);

        Some(loss_value)
    }
}

/// Evaluation callback: primary model, opponent model in self-play, config.
pub type EvalHook<B> =
    Box<dyn FnMut(&RecurrentPolicyValue<B>, Option<&RecurrentPolicyValue<B>>, &AppConfig)>;

/// Optional observers plugged into the training loop.
pub struct TrainHooks<B: Backend> {
    pub evaluation: Option<EvalHook<B>>,
    pub writer: Option<Box<dyn MetricWriter>>,
}

impl<B: Backend> TrainHooks<B> {
    pub fn none() -> Self {
        TrainHooks {
            evaluation: None,
            writer: None,
        }
    }
}

impl<B: Backend> Default for TrainHooks<B> {
    fn default() -> Self {
        TrainHooks::none()
    }
}

/// Per-epoch loss history from a finished run. A `None` entry marks an
/// epoch whose episode produced no plies for that agent.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs_run: usize,
    pub primary_losses: Vec<Option<f32>>,
    pub opponent_losses: Vec<Option<f32>>,
}

/// Run the configured training loop, dispatching on the optimizer choice.
pub fn train<B: AutodiffBackend>(
    config: &AppConfig,
    mode: TrainMode,
    hooks: TrainHooks<B>,
    device: &B::Device,
) -> Result<TrainingReport, TrainError> {
    let clip = config.training.max_clip_grad.map(GradientClippingConfig::Norm);
    match config.training.optimizer {
        OptimizerKind::Adam => {
            let oc = AdamConfig::new().with_grad_clipping(clip);
            run_training(config, mode, hooks, device, || {
                oc.init::<B, RecurrentPolicyValue<B>>()
            })
        }
        OptimizerKind::Sgd => {
            let oc = SgdConfig::new().with_gradient_clipping(clip);
            run_training(config, mode, hooks, device, || {
                oc.init::<B, RecurrentPolicyValue<B>>()
            })
        }
    }
}

fn run_training<B, O>(
    config: &AppConfig,
    mode: TrainMode,
    mut hooks: TrainHooks<B>,
    device: &B::Device,
    make_optimizer: impl Fn() -> O,
) -> Result<TrainingReport, TrainError>
where
    B: AutodiffBackend,
    O: Optimizer<RecurrentPolicyValue<B>, B>,
{
    B::seed(config.training.seed);
    let mut rng = StdRng::seed_from_u64(config.training.seed);

    std::fs::create_dir_all(&config.run.log_dir)?;
    let checkpoints = CheckpointManager::from_config(&config.run);

    let net_config = RecurrentPolicyValueConfig::new(
        config.model.n_inputs,
        config.model.n_outputs,
        config.model.hidden_size,
        config.model.neuron_size,
    );

    let start_epoch = config.training.start_epoch;
    let end_epochs = config.training.end_epochs;

    let model = checkpoints.load_if_exists(
        net_config.init::<B>(device),
        start_epoch,
        Role::Primary,
        device,
    )?;
    let mut primary = Learner {
        model,
        optimizer: make_optimizer(),
        schedule: LrSchedule::from_config(config.training.lr, &config.training.scheduler),
    };

    let mut opponent_learner = match mode {
        TrainMode::SelfPlay => {
            let model = checkpoints.load_if_exists(
                net_config.init::<B>(device),
                start_epoch,
                Role::Opponent,
                device,
            )?;
            Some(Learner {
                model,
                optimizer: make_optimizer(),
                schedule: LrSchedule::from_config(config.training.lr, &config.training.scheduler),
            })
        }
        TrainMode::VsOpponent => None,
    };

    println!("Training for time tag {} has started", config.run.time_tag);

    let start = Instant::now();
    let mut last_progress = Instant::now();
    let mut my_skips = 0usize;
    let mut opp_skips = 0usize;
    let mut report = TrainingReport {
        epochs_run: 0,
        primary_losses: Vec::new(),
        opponent_losses: Vec::new(),
    };

    for epoch in start_epoch..end_epochs {
        if last_progress.elapsed() >= Duration::from_secs(5) {
            print!("Current epoch: {}\r", epoch);
            std::io::stdout().flush()?;
            last_progress = Instant::now();
        }

        let trace = match opponent_learner.as_ref() {
            Some(opponent) => play_episode(
                &primary.model,
                EpisodeOpponent::Learner(&opponent.model),
                config,
                device,
                &mut rng,
            ),
            None => {
                let mut scripted = config.opponent.build();
                play_episode(
                    &primary.model,
                    EpisodeOpponent::Scripted(scripted.as_mut()),
                    config,
                    device,
                    &mut rng,
                )
            }
        };

        let my_loss = primary.apply_update(&trace.primary, &config.training);
        primary.schedule.advance();
        if my_loss.is_none() {
            my_skips += 1;
        }
        report.primary_losses.push(my_loss);

        let mut opp_loss = None;
        if let Some(opponent) = opponent_learner.as_mut() {
            opp_loss = opponent.apply_update(&trace.opponent, &config.training);
            opponent.schedule.advance();
            if opp_loss.is_none() {
                opp_skips += 1;
            }
            report.opponent_losses.push(opp_loss);
        }

        if epoch % config.run.print_interval == 0 {
            let elapsed = format_elapsed(start.elapsed());
            match mode {
                TrainMode::SelfPlay => println!(
                    "epoch={:8} my_loss={:.6} opp_loss={:.6} my_skips={} opp_skips={} elapsed={}",
                    epoch,
                    my_loss.unwrap_or(-1.0),
                    opp_loss.unwrap_or(-1.0),
                    my_skips,
                    opp_skips,
                    elapsed
                ),
                TrainMode::VsOpponent => println!(
                    "epoch={:8} my_loss={:.6} my_skips={} elapsed={}",
                    epoch,
                    my_loss.unwrap_or(-1.0),
                    my_skips,
                    elapsed
                ),
            }
            my_skips = 0;
            opp_skips = 0;
        }

        if epoch % config.run.save_interval == 0 {
            checkpoints.save(&primary.model, epoch, Role::Primary)?;
            if let Some(opponent) = opponent_learner.as_ref() {
                checkpoints.save(&opponent.model, epoch, Role::Opponent)?;
            }
        }

        if epoch % config.run.evaluate_interval == 0 {
            if let Some(evaluation) = hooks.evaluation.as_mut() {
                let opponent_model = opponent_learner.as_ref().map(|l| &l.model);
                evaluation(&primary.model, opponent_model, config);
            }
        }

        if mode == TrainMode::VsOpponent && epoch % config.run.writer_interval == 0 {
            if let Some(writer) = hooks.writer.as_mut() {
                writer
                    .add_scalar("loss", my_loss.unwrap_or(-1.0), epoch)
                    .map_err(TrainError::MetricWrite)?;
            }
        }

        report.epochs_run += 1;
    }

    checkpoints.save(&primary.model, end_epochs, Role::Primary)?;
    if let Some(opponent) = opponent_learner.as_ref() {
        checkpoints.save(&opponent.model, end_epochs, Role::Opponent)?;
    }

    println!(
        "Finished training, total time: {}",
        format_elapsed(start.elapsed())
    );

    Ok(report)
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::opponent::OpponentKind;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::TensorData;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn tiny_config(log_dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.game.n_holes = 3;
        config.game.n_stones = 2;
        config.model.n_inputs = 8;
        config.model.n_outputs = 3;
        config.model.hidden_size = 8;
        config.model.neuron_size = 8;
        config.training.end_epochs = 2;
        config.training.max_game_length = 30;
        config.training.seed = 7;
        config.run.log_dir = log_dir.to_path_buf();
        config.run.time_tag = "test".to_string();
        config.opponent = OpponentKind::Random;
        config
    }

    struct VecWriter {
        records: Rc<RefCell<Vec<(String, f32, usize)>>>,
    }

    impl MetricWriter for VecWriter {
        fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> io::Result<()> {
            self.records.borrow_mut().push((tag.to_string(), value, step));
            Ok(())
        }
    }

    #[test]
    fn test_lr_schedule_constant() {
        let mut schedule = LrSchedule::from_config(3e-4, &None);
        assert!((schedule.current() - 3e-4).abs() < 1e-12);
        schedule.advance();
        assert!((schedule.current() - 3e-4).abs() < 1e-12);
    }

    #[test]
    fn test_lr_schedule_step_decay() {
        let scheduler = Some(SchedulerConfig {
            step_size: 2,
            decay: 0.5,
        });
        let mut schedule = LrSchedule::from_config(0.1, &scheduler);

        assert!((schedule.current() - 0.1).abs() < 1e-12);
        schedule.advance();
        assert!((schedule.current() - 0.1).abs() < 1e-12);
        schedule.advance();
        assert!((schedule.current() - 0.05).abs() < 1e-12);
        schedule.advance();
        schedule.advance();
        assert!((schedule.current() - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_apply_update_skips_empty_trajectory() {
        let dir = tempfile::tempdir().unwrap();
        let config = tiny_config(dir.path());
        let device = Default::default();

        let model = RecurrentPolicyValueConfig::new(
            config.model.n_inputs,
            config.model.n_outputs,
            config.model.hidden_size,
            config.model.neuron_size,
        )
        .init::<TestBackend>(&device);
        let mut learner = Learner {
            model,
            optimizer: AdamConfig::new().init::<TestBackend, RecurrentPolicyValue<TestBackend>>(),
            schedule: LrSchedule::Constant(config.training.lr),
        };

        let obs = [2.0f32, 2.0, 2.0, 0.0, 2.0, 2.0, 2.0, 0.0];
        let input = Tensor::<TestBackend, 1>::from_data(TensorData::from(obs.as_slice()), &device)
            .unsqueeze::<2>();
        let (before, _, _) = learner.model.forward(input.clone(), None);

        let trajectory = Trajectory::<TestBackend>::new();
        assert_eq!(learner.apply_update(&trajectory, &config.training), None);

        // No optimizer step may run, so the weights stay bitwise identical
        let (after, _, _) = learner.model.forward(input, None);
        assert_eq!(
            before.into_data().to_vec::<f32>().unwrap(),
            after.into_data().to_vec::<f32>().unwrap()
        );
    }

    fn run_two_epochs(
        model: RecurrentPolicyValue<TestBackend>,
        opponent_model: RecurrentPolicyValue<TestBackend>,
        config: &AppConfig,
        device: &<TestBackend as Backend>::Device,
    ) -> Vec<Option<f32>> {
        let mut rng = StdRng::seed_from_u64(config.training.seed);
        let mut primary = Learner {
            model,
            optimizer: AdamConfig::new().init::<TestBackend, RecurrentPolicyValue<TestBackend>>(),
            schedule: LrSchedule::Constant(config.training.lr),
        };
        let mut opponent = Learner {
            model: opponent_model,
            optimizer: AdamConfig::new().init::<TestBackend, RecurrentPolicyValue<TestBackend>>(),
            schedule: LrSchedule::Constant(config.training.lr),
        };

        let mut losses = Vec::new();
        for _ in 0..2 {
            let trace = play_episode(
                &primary.model,
                EpisodeOpponent::Learner(&opponent.model),
                config,
                device,
                &mut rng,
            );
            losses.push(primary.apply_update(&trace.primary, &config.training));
            let _ = opponent.apply_update(&trace.opponent, &config.training);
        }
        losses
    }

    #[test]
    fn test_two_epoch_self_play_losses_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = tiny_config(dir.path());
        config.training.max_game_length = 50;
        let device = Default::default();

        // Both runs start from the same weights so only the seeded rng and
        // the update math can influence the outcome.
        let net_config = RecurrentPolicyValueConfig::new(
            config.model.n_inputs,
            config.model.n_outputs,
            config.model.hidden_size,
            config.model.neuron_size,
        );
        let primary = net_config.init::<TestBackend>(&device);
        let opponent = net_config.init::<TestBackend>(&device);

        let losses_a = run_two_epochs(primary.clone(), opponent.clone(), &config, &device);
        let losses_b = run_two_epochs(primary, opponent, &config, &device);

        assert_eq!(losses_a, losses_b);
    }

    #[test]
    fn test_self_play_reports_losses_for_both_agents() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();

        let report = train::<TestBackend>(
            &tiny_config(dir.path()),
            TrainMode::SelfPlay,
            TrainHooks::none(),
            &device,
        )
        .unwrap();

        assert_eq!(report.epochs_run, 2);
        assert_eq!(report.primary_losses.len(), 2);
        assert_eq!(report.opponent_losses.len(), 2);
        for loss in report.primary_losses.iter().flatten() {
            assert!(loss.is_finite());
        }
    }

    #[test]
    fn test_self_play_writes_checkpoints_for_both_agents() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = tiny_config(dir.path());
        config.run.save_interval = 1;
        let device = Default::default();

        train::<TestBackend>(&config, TrainMode::SelfPlay, TrainHooks::none(), &device).unwrap();

        for epoch in [0, 1, 2] {
            assert!(dir.path().join(format!("test_{}.mpk", epoch)).exists());
            assert!(dir.path().join(format!("test_{}.opp.mpk", epoch)).exists());
        }
    }

    #[test]
    fn test_vs_opponent_only_primary_learns() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = tiny_config(dir.path());
        config.run.save_interval = 1;
        let device = Default::default();

        let report =
            train::<TestBackend>(&config, TrainMode::VsOpponent, TrainHooks::none(), &device)
                .unwrap();

        assert_eq!(report.primary_losses.len(), 2);
        assert!(report.opponent_losses.is_empty());
        assert!(dir.path().join("test_1.mpk").exists());
        assert!(!dir.path().join("test_1.opp.mpk").exists());
    }

    #[test]
    fn test_writer_records_vs_opponent_losses() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = tiny_config(dir.path());
        config.training.end_epochs = 3;
        config.run.writer_interval = 1;
        let device = Default::default();

        let records = Rc::new(RefCell::new(Vec::new()));
        let hooks = TrainHooks {
            evaluation: None,
            writer: Some(Box::new(VecWriter {
                records: Rc::clone(&records),
            })),
        };

        train::<TestBackend>(&config, TrainMode::VsOpponent, hooks, &device).unwrap();

        let records = records.borrow();
        assert_eq!(records.len(), 3);
        for (epoch, (tag, _value, step)) in records.iter().enumerate() {
            assert_eq!(tag, "loss");
            assert_eq!(*step, epoch);
        }
    }

    #[test]
    fn test_writer_ignored_in_self_play() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = tiny_config(dir.path());
        config.run.writer_interval = 1;
        let device = Default::default();

        let records = Rc::new(RefCell::new(Vec::new()));
        let hooks = TrainHooks {
            evaluation: None,
            writer: Some(Box::new(VecWriter {
                records: Rc::clone(&records),
            })),
        };

        train::<TestBackend>(&config, TrainMode::SelfPlay, hooks, &device).unwrap();
        assert!(records.borrow().is_empty());
    }

    #[test]
    fn test_eval_hook_runs_on_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = tiny_config(dir.path());
        config.training.end_epochs = 4;
        config.run.evaluate_interval = 2;
        let device = Default::default();

        let calls = Rc::new(RefCell::new(0usize));
        let calls_in_hook = Rc::clone(&calls);
        let hooks = TrainHooks {
            evaluation: Some(Box::new(move |_model, opponent_model, _config| {
                assert!(opponent_model.is_some());
                *calls_in_hook.borrow_mut() += 1;
            })),
            writer: None,
        };

        train::<TestBackend>(&config, TrainMode::SelfPlay, hooks, &device).unwrap();
        assert_eq!(*calls.borrow(), 2);
    }
}
