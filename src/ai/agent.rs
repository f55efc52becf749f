use rand::Rng;

use crate::ai::error::PolicyError;
use crate::ai::network::ValueNetwork;
use crate::ai::policy::{self, Policy};
use crate::ai::td_learning::Outcomes;
use crate::config::{RewardConfig, TerminalValues};
use crate::game::{Board, GameStatus, Move, Outcome, Player};

/// Greedy player backed by a trained network.
#[derive(Clone, Debug)]
pub struct Agent {
    network: ValueNetwork,
    rewards: RewardConfig,
    terminal_values: TerminalValues,
}

impl Agent {
    pub fn new(
        network: ValueNetwork,
        rewards: RewardConfig,
        terminal_values: TerminalValues,
    ) -> Self {
        Self {
            network,
            rewards,
            terminal_values,
        }
    }

    /// Returns the move the network rates best for `player`.
    pub fn get_action(&self, board: &Board, player: Player) -> Result<Move, PolicyError> {
        let estimator = policy::estimator(&self.network, &self.rewards, self.terminal_values);
        Ok(Policy::best(estimator.as_ref(), *board, player)?.mv)
    }
}

pub enum MoveStrategy<'a> {
    Random,
    Greedy(&'a Agent),
}

impl MoveStrategy<'_> {
    pub fn get_move<R: Rng>(
        &self,
        board: &Board,
        player: Player,
        rng: &mut R,
    ) -> Result<Move, PolicyError> {
        match self {
            MoveStrategy::Random => Policy::random(*board, player, rng),
            MoveStrategy::Greedy(agent) => agent.get_action(board, player),
        }
    }
}

/// Plays one game from the empty board. `x` moves first.
pub fn play_game<R: Rng>(
    x: &MoveStrategy,
    o: &MoveStrategy,
    rng: &mut R,
) -> Result<Outcome, PolicyError> {
    let mut board = Board::new();
    let mut player = Player::X;
    loop {
        if let GameStatus::Finished(outcome) = board.status() {
            return Ok(outcome);
        }
        let strategy = match player {
            Player::X => x,
            Player::O => o,
        };
        let mv = strategy.get_move(&board, player, rng)?;
        board = board.apply(mv);
        player = player.other();
    }
}

/// Results of an agent playing against a random opponent from both seats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub as_x: Outcomes,
    pub as_o: Outcomes,
}

/// Plays `games` games with `agent` as `X` and as many as `O` against uniformly
/// random moves.
pub fn evaluate<R: Rng>(
    agent: &Agent,
    games: usize,
    rng: &mut R,
) -> Result<Evaluation, PolicyError> {
    let greedy = MoveStrategy::Greedy(agent);
    let random = MoveStrategy::Random;
    let mut evaluation = Evaluation::default();
    for _ in 0..games {
        evaluation.as_x.record(play_game(&greedy, &random, rng)?);
        evaluation.as_o.record(play_game(&random, &greedy, rng)?);
    }
    Ok(evaluation)
}
