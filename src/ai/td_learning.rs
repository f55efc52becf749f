use std::fmt::{Display, Formatter};
use std::io::Write;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ai::error::{PolicyError, TrainingError};
use crate::ai::network::ValueNetwork;
use crate::ai::policy::{self, Choice, Policy, ValueEstimator};
use crate::config::{ConfigError, ExplorationBootstrap, TrainingConfig};
use crate::game::{Board, GameStatus, Outcome, Player, FEATURE_SIZE};
use crate::report::Reporter;

type Reward = f64;
type Value = f64;

/// TD target for a position whose move led to `reward`, with `bootstrap` being
/// the value the opponent can reach from there.
fn calculate_target(reward: Reward, bootstrap: Value, gamma: f64) -> Value {
    reward + gamma * bootstrap
}

/// Finished games counted by outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcomes {
    pub x_wins: usize,
    pub o_wins: usize,
    pub draws: usize,
}

impl Outcomes {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win(Player::X) => self.x_wins += 1,
            Outcome::Win(Player::O) => self.o_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.x_wins + self.o_wins + self.draws
    }

    pub fn wins(&self, player: Player) -> usize {
        match player {
            Player::X => self.x_wins,
            Player::O => self.o_wins,
        }
    }
}

impl Display for Outcomes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "X won {} times, O won {} times, and there were {} draws",
            self.x_wins, self.o_wins, self.draws
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeSummary {
    pub outcome: Outcome,
    pub plies: usize,
    /// Plies whose move was drawn at random.
    pub explored: usize,
    /// Sum of `|target - value before the update|` over all plies.
    pub td_error: f64,
}

struct Step {
    board: Board,
    explored: bool,
    td_error: f64,
}

/// Accumulates statistics between two progress reports.
#[derive(Default)]
struct Window {
    outcomes: Outcomes,
    td_error: f64,
    plies: usize,
}

/// Self-play TD(0) trainer.
///
/// Every ply moves the estimate of the pre-move position towards
/// `reward + gamma * v`, where `reward` comes from the status after the move and
/// `v` is the best value the opponent can reach from there (zero once the game
/// is over). `X` maximizes the value, `O` minimizes it.
pub struct Model {
    config: TrainingConfig,
    network: ValueNetwork,
    rng: ChaCha8Rng,
    exploration_level: f64,
    current_learning_rate: f64,
    episode: usize,
    outcomes: Outcomes,
}

impl Model {
    pub fn new(config: TrainingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (mut init_rng, rng) = match config.seed {
            Some(seed) => (
                ChaCha8Rng::seed_from_u64(seed),
                ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (ChaCha8Rng::from_entropy(), ChaCha8Rng::from_entropy()),
        };
        let network = ValueNetwork::new(FEATURE_SIZE, config.hidden_size, 1, &mut init_rng);
        Ok(Self {
            exploration_level: config.epsilon,
            current_learning_rate: config.learning_rate,
            config,
            network,
            rng,
            episode: 0,
            outcomes: Outcomes::default(),
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn network(&self) -> &ValueNetwork {
        &self.network
    }

    pub fn into_network(self) -> ValueNetwork {
        self.network
    }

    pub fn exploration_level(&self) -> f64 {
        self.exploration_level
    }

    pub fn learning_rate(&self) -> f64 {
        self.current_learning_rate
    }

    /// Number of finished episodes.
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Outcomes of all finished episodes.
    pub fn outcomes(&self) -> Outcomes {
        self.outcomes
    }

    /// Runs the configured number of episodes and reports progress every
    /// `report_interval` episodes.
    pub fn train<W: Write>(
        &mut self,
        reporter: &mut Reporter<W>,
    ) -> Result<Outcomes, TrainingError> {
        let mut window = Window::default();
        for _ in 0..self.config.episodes {
            let summary = self.run_episode(reporter)?;
            window.outcomes.record(summary.outcome);
            window.td_error += summary.td_error;
            window.plies += summary.plies;

            if self.episode % self.config.report_interval == 0 {
                reporter.msg(format_args!(
                    "episode {}: exploration level {:.4}, learning rate {:.4}, mean td error {:.4}, {}",
                    self.episode,
                    self.exploration_level,
                    self.current_learning_rate,
                    window.td_error / window.plies.max(1) as f64,
                    window.outcomes,
                ));
                window = Window::default();
            }
        }
        reporter.msg(format_args!(
            "{} episodes: {}",
            self.outcomes.total(),
            self.outcomes
        ));
        Ok(self.outcomes)
    }

    /// Plays one self-play game from the empty board, updating the network after
    /// every ply, then decays exploration and learning rate.
    pub fn run_episode<W: Write>(
        &mut self,
        reporter: &mut Reporter<W>,
    ) -> Result<EpisodeSummary, TrainingError> {
        let mut board = Board::new();
        let mut player = Player::X;
        let mut plies = 0;
        let mut explored = 0;
        let mut td_error = 0.0;
        let outcome = loop {
            if let GameStatus::Finished(outcome) = board.status() {
                break outcome;
            }
            let step = self.step(board, player)?;
            board = step.board;
            td_error += step.td_error.abs();
            plies += 1;
            explored += usize::from(step.explored);
            reporter.board(&board);
            player = player.other();
        };
        if reporter.is_verbose() {
            reporter.msg(format_args!(
                "episode {} summary: {:?} after {} plies ({} explored), total td error {:.4}",
                self.episode, outcome, plies, explored, td_error
            ));
        }

        self.outcomes.record(outcome);
        self.episode += 1;
        self.decay();
        Ok(EpisodeSummary {
            outcome,
            plies,
            explored,
            td_error,
        })
    }

    fn decay(&mut self) {
        if self.exploration_level > self.config.epsilon_min {
            self.exploration_level = (self.exploration_level * self.config.epsilon_decay)
                .max(self.config.epsilon_min);
        }
        self.current_learning_rate = self.config.learning_rate
            / (1.0 + self.config.learning_rate_decay * self.episode as f64);
    }

    fn step(&mut self, board: Board, player: Player) -> Result<Step, TrainingError> {
        let features = board.features();
        let value = self.network.estimate(&board)?;

        let epsilon_greedy = Policy::new(self.exploration_level);
        let estimator = policy::estimator(
            &self.network,
            &self.config.rewards,
            self.config.terminal_values,
        );
        let choice = epsilon_greedy.choose(estimator.as_ref(), board, player, &mut self.rng)?;
        let bootstrap_from = match self.config.exploration_bootstrap {
            ExplorationBootstrap::Greedy if choice.explored => {
                Policy::best(estimator.as_ref(), board, player)?.board
            }
            _ => choice.board,
        };
        let target = self.calculate_target(estimator.as_ref(), bootstrap_from, player.other())?;
        drop(estimator);

        self.update_value(&features, target)?;
        Ok(Step {
            board: choice.board,
            explored: choice.explored,
            td_error: target - value,
        })
    }

    fn calculate_target(
        &self,
        estimator: &dyn ValueEstimator,
        board: Board,
        opponent: Player,
    ) -> Result<Value, PolicyError> {
        let status = board.status();
        let reward = self.config.rewards.reward(status);
        let bootstrap = match status {
            GameStatus::Running => {
                let Choice { value, .. } = Policy::best(estimator, board, opponent)?;
                value
            }
            GameStatus::Finished(_) => 0.0,
        };
        Ok(calculate_target(reward, bootstrap, self.config.gamma))
    }

    fn update_value(&mut self, features: &[f64], target: Value) -> Result<(), TrainingError> {
        self.network
            .update(features, &[target], self.current_learning_rate)?;
        Ok(())
    }
}
