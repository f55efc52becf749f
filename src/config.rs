use crate::game::{GameStatus, Outcome, Player};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Rewards observed after a move, keyed by the status of the resulting board.
///
/// The value network ends in a sigmoid, so every reward has to lie in `[0, 1]`.
/// `X` wins map high, `O` wins map low.
///
/// The scale is not centred on zero: with `gamma < 1` every bootstrapped
/// target shrinks towards `0`, which is the `O` win value, so discounting
/// favours the minimizer. Use `gamma = 1` for a symmetric treatment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardConfig {
    pub x_win: f64,
    pub o_win: f64,
    pub draw: f64,
    /// Reward for a move that leaves the game running.
    pub step: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            x_win: 1.0,
            o_win: 0.0,
            draw: 0.5,
            step: 0.0,
        }
    }
}

impl RewardConfig {
    pub fn reward(&self, status: GameStatus) -> f64 {
        match status {
            GameStatus::Running => self.step,
            GameStatus::Finished(outcome) => self.terminal(outcome),
        }
    }

    pub fn terminal(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Win(Player::X) => self.x_win,
            Outcome::Win(Player::O) => self.o_win,
            Outcome::Draw => self.draw,
        }
    }
}

/// Which successor feeds the bootstrap term after an exploratory move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExplorationBootstrap {
    /// The successor that was actually played.
    #[default]
    Taken,
    /// The successor the greedy rule would have played.
    Greedy,
}

/// How candidate successors that end the game are valued.
///
/// `Exact` is the default and departs from scoring every candidate with the
/// network: updates only ever touch running positions, so the network never
/// learns finished ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TerminalValues {
    /// Ask the network, like for any other position.
    Estimated,
    /// Use the configured reward of the outcome.
    #[default]
    Exact,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingConfig {
    pub episodes: usize,
    pub hidden_size: usize,
    pub learning_rate: f64,
    /// `lr = initial_lr / (1 + decay * episode)`; zero keeps the rate fixed.
    pub learning_rate_decay: f64,
    pub epsilon: f64,
    /// Multiplier applied to epsilon after every episode.
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    pub gamma: f64,
    pub seed: Option<u64>,
    pub rewards: RewardConfig,
    pub exploration_bootstrap: ExplorationBootstrap,
    pub terminal_values: TerminalValues,
    /// Episodes between two progress reports.
    pub report_interval: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 100_000,
            hidden_size: 16,
            learning_rate: 0.1,
            learning_rate_decay: 0.0,
            epsilon: 1.0,
            epsilon_decay: 0.9995,
            epsilon_min: 0.05,
            gamma: 0.9,
            seed: None,
            rewards: RewardConfig::default(),
            exploration_bootstrap: ExplorationBootstrap::default(),
            terminal_values: TerminalValues::default(),
            report_interval: 1000,
        }
    }
}

fn check_unit_interval(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid_parameter(
            name,
            format!("{} is outside of [0, 1]", value),
        ));
    }
    Ok(())
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.episodes == 0 {
            return Err(ConfigError::invalid_parameter("episodes", "must be > 0"));
        }
        if self.hidden_size == 0 {
            return Err(ConfigError::invalid_parameter("hidden size", "must be > 0"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::invalid_parameter(
                "learning rate",
                format!("{} is not a positive number", self.learning_rate),
            ));
        }
        if !(self.learning_rate_decay >= 0.0 && self.learning_rate_decay.is_finite()) {
            return Err(ConfigError::invalid_parameter(
                "learning rate decay",
                format!("{} is not a non-negative number", self.learning_rate_decay),
            ));
        }
        check_unit_interval("epsilon", self.epsilon)?;
        check_unit_interval("epsilon floor", self.epsilon_min)?;
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(ConfigError::invalid_parameter(
                "epsilon decay",
                format!("{} is outside of (0, 1]", self.epsilon_decay),
            ));
        }
        check_unit_interval("gamma", self.gamma)?;
        check_unit_interval("x win reward", self.rewards.x_win)?;
        check_unit_interval("o win reward", self.rewards.o_win)?;
        check_unit_interval("draw reward", self.rewards.draw)?;
        check_unit_interval("step reward", self.rewards.step)?;
        if self.report_interval == 0 {
            return Err(ConfigError::invalid_parameter(
                "report interval",
                "must be > 0",
            ));
        }
        Ok(())
    }
}
