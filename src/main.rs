extern crate td_tic_tac_toe;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use td_tic_tac_toe::ai::agent::{self, Agent};
use td_tic_tac_toe::ai::Model;
use td_tic_tac_toe::config::{ExplorationBootstrap, RewardConfig, TerminalValues, TrainingConfig};
use td_tic_tac_toe::report::Reporter;

/// Train a tic-tac-toe value network through TD(0) self-play.
#[derive(Parser)]
#[command(name = "td-tic-tac-toe", version)]
struct Cli {
    /// Number of self-play episodes
    #[arg(long, env = "TTT_EPISODES", default_value_t = 100_000)]
    episodes: usize,

    /// Width of the hidden layer
    #[arg(long, env = "TTT_HIDDEN_SIZE", default_value_t = 16)]
    hidden_size: usize,

    #[arg(long, env = "TTT_LEARNING_RATE", default_value_t = 0.1)]
    learning_rate: f64,

    /// lr = learning_rate / (1 + decay * episode)
    #[arg(long, env = "TTT_LEARNING_RATE_DECAY", default_value_t = 0.0)]
    learning_rate_decay: f64,

    /// Initial exploration rate
    #[arg(long, env = "TTT_EPSILON", default_value_t = 1.0)]
    epsilon: f64,

    /// Factor applied to epsilon after every episode
    #[arg(long, env = "TTT_EPSILON_DECAY", default_value_t = 0.9995)]
    epsilon_decay: f64,

    /// Epsilon never decays below this value
    #[arg(long, env = "TTT_EPSILON_MIN", default_value_t = 0.05)]
    epsilon_min: f64,

    /// Discount factor
    #[arg(long, env = "TTT_GAMMA", default_value_t = 0.9)]
    gamma: f64,

    /// Seed for weight initialization and exploration
    #[arg(long, env = "TTT_SEED")]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1.0)]
    x_win_reward: f64,

    #[arg(long, default_value_t = 0.0)]
    o_win_reward: f64,

    #[arg(long, default_value_t = 0.5)]
    draw_reward: f64,

    /// Reward for a move that leaves the game running
    #[arg(long, default_value_t = 0.0)]
    step_reward: f64,

    /// Successor used for the bootstrap term after an exploratory move
    #[arg(long, value_enum, default_value_t = ExplorationBootstrap::Taken)]
    exploration_bootstrap: ExplorationBootstrap,

    /// How candidate moves that end the game are valued
    #[arg(long, value_enum, default_value_t = TerminalValues::Exact)]
    terminal_values: TerminalValues,

    /// Episodes between progress reports
    #[arg(long, default_value_t = 1000)]
    report_interval: usize,

    /// Games played against a random opponent from each seat after training
    #[arg(long, default_value_t = 1000)]
    eval_games: usize,

    /// Print the board after every ply
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all diagnostics
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            episodes: self.episodes,
            hidden_size: self.hidden_size,
            learning_rate: self.learning_rate,
            learning_rate_decay: self.learning_rate_decay,
            epsilon: self.epsilon,
            epsilon_decay: self.epsilon_decay,
            epsilon_min: self.epsilon_min,
            gamma: self.gamma,
            seed: self.seed,
            rewards: RewardConfig {
                x_win: self.x_win_reward,
                o_win: self.o_win_reward,
                draw: self.draw_reward,
                step: self.step_reward,
            },
            exploration_bootstrap: self.exploration_bootstrap,
            terminal_values: self.terminal_values,
            report_interval: self.report_interval,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.training_config();
    let mut model = match Model::new(config) {
        Ok(model) => model,
        Err(err) => Cli::command().error(ErrorKind::InvalidValue, err).exit(),
    };

    let mut reporter = Reporter::stderr("td-tic-tac-toe", cli.verbose, cli.quiet);
    reporter.msg(format_args!("training for {} episodes", cli.episodes));
    model.train(&mut reporter)?;

    if cli.eval_games > 0 {
        let mut rng = match cli.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(2)),
            None => ChaCha8Rng::from_entropy(),
        };
        let rewards = model.config().rewards;
        let terminal_values = model.config().terminal_values;
        let agent = Agent::new(model.into_network(), rewards, terminal_values);
        let evaluation = agent::evaluate(&agent, cli.eval_games, &mut rng)?;
        reporter.msg(format_args!("against random moves as X: {}", evaluation.as_x));
        reporter.msg(format_args!("against random moves as O: {}", evaluation.as_o));
    }
    reporter.msg(format_args!("done"));

    Ok(())
}
