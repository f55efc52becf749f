use rand::distributions::Uniform;
use rand::Rng;
use smallvec::SmallVec;

use crate::ai::error::{NetworkError, PolicyError};
use crate::ai::network::ValueNetwork;
use crate::config::{RewardConfig, TerminalValues};
use crate::game::{Board, Cell, GameStatus, Move, Player};

/// Anything that can score a position. Higher values favour `X`.
pub trait ValueEstimator {
    fn estimate(&self, board: &Board) -> Result<f64, NetworkError>;
}

/// Only networks with a single output can score a position.
impl ValueEstimator for ValueNetwork {
    fn estimate(&self, board: &Board) -> Result<f64, NetworkError> {
        match self.predict(&board.features())?.as_slice() {
            [value] => Ok(*value),
            output => Err(NetworkError::output_size_mismatch(1, output.len())),
        }
    }
}

/// Values finished positions by their reward and defers everything else to `inner`.
pub struct ExactTerminals<'a, E: ?Sized> {
    inner: &'a E,
    rewards: &'a RewardConfig,
}

impl<'a, E: ValueEstimator + ?Sized> ExactTerminals<'a, E> {
    pub fn new(inner: &'a E, rewards: &'a RewardConfig) -> Self {
        Self { inner, rewards }
    }
}

impl<E: ValueEstimator + ?Sized> ValueEstimator for ExactTerminals<'_, E> {
    fn estimate(&self, board: &Board) -> Result<f64, NetworkError> {
        match board.status() {
            GameStatus::Finished(outcome) => Ok(self.rewards.terminal(outcome)),
            GameStatus::Running => self.inner.estimate(board),
        }
    }
}

/// The estimator used for move selection with the given terminal valuation.
pub fn estimator<'a>(
    network: &'a ValueNetwork,
    rewards: &'a RewardConfig,
    terminal_values: TerminalValues,
) -> Box<dyn ValueEstimator + 'a> {
    match terminal_values {
        TerminalValues::Estimated => Box::new(network),
        TerminalValues::Exact => Box::new(ExactTerminals::new(network, rewards)),
    }
}

impl<E: ValueEstimator + ?Sized> ValueEstimator for &E {
    fn estimate(&self, board: &Board) -> Result<f64, NetworkError> {
        (**self).estimate(board)
    }
}

/// A move picked by [`Policy::choose`] together with the position it leads to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Choice {
    pub mv: Move,
    pub board: Board,
    /// Estimated value of `board`.
    pub value: f64,
    /// Set when the move was drawn at random instead of picked greedily.
    pub explored: bool,
}

type Moves = SmallVec<[Move; Cell::COUNT]>;

fn pick_random<R: Rng>(moves: &[Move], rng: &mut R) -> Move {
    moves[rng.sample(Uniform::from(0..moves.len()))]
}

/// Epsilon-greedy move selection. `X` maximizes the estimated value of the
/// resulting position and `O` minimizes it; ties go to the first cell in scan order.
///
/// Candidates are scored by whatever estimator is passed in. The trainer and
/// [`Agent`](crate::ai::Agent) build it with [`estimator`], which by default
/// ([`TerminalValues::Exact`]) scores a successor that ends the game by its
/// reward instead of asking the network. [`TerminalValues::Estimated`] asks the
/// network for every candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Policy {
    epsilon: f64,
}

impl Policy {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// A policy that never explores.
    pub fn greedy() -> Self {
        Self::new(0.0)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn choose<E, R>(
        &self,
        estimator: &E,
        board: Board,
        player: Player,
        rng: &mut R,
    ) -> Result<Choice, PolicyError>
    where
        E: ValueEstimator + ?Sized,
        R: Rng,
    {
        let moves: Moves = board.legal_moves(player).collect();
        if moves.is_empty() {
            return Err(PolicyError::NoLegalMove { player, board });
        }
        if self.epsilon > 0.0 && rng.sample(Uniform::from(0.0..1.0)) < self.epsilon {
            let mv = pick_random(&moves, rng);
            let next = board.apply(mv);
            return Ok(Choice {
                mv,
                board: next,
                value: estimator.estimate(&next)?,
                explored: true,
            });
        }
        Self::pick_best(estimator, board, player, &moves)
    }

    /// Uniformly random legal move, ignoring any estimates.
    pub fn random<R: Rng>(board: Board, player: Player, rng: &mut R) -> Result<Move, PolicyError> {
        let moves: Moves = board.legal_moves(player).collect();
        if moves.is_empty() {
            return Err(PolicyError::NoLegalMove { player, board });
        }
        Ok(pick_random(&moves, rng))
    }

    /// Greedy choice for `player`, as if epsilon were zero.
    pub fn best<E>(estimator: &E, board: Board, player: Player) -> Result<Choice, PolicyError>
    where
        E: ValueEstimator + ?Sized,
    {
        let moves: Moves = board.legal_moves(player).collect();
        Self::pick_best(estimator, board, player, &moves)
    }

    fn pick_best<E>(
        estimator: &E,
        board: Board,
        player: Player,
        moves: &[Move],
    ) -> Result<Choice, PolicyError>
    where
        E: ValueEstimator + ?Sized,
    {
        let mut best: Option<Choice> = None;
        for mv in moves {
            let next = board.apply(*mv);
            let value = estimator.estimate(&next)?;
            let improves = match &best {
                None => true,
                Some(current) if player.is_maximizing() => value > current.value,
                Some(current) => value < current.value,
            };
            if improves {
                best = Some(Choice {
                    mv: *mv,
                    board: next,
                    value,
                    explored: false,
                });
            }
        }
        best.ok_or(PolicyError::NoLegalMove { player, board })
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::game::{Outcome, FEATURE_SIZE};

    /// Scores a position by the lowest cell index taken by `X`.
    struct FirstX;

    impl ValueEstimator for FirstX {
        fn estimate(&self, board: &Board) -> Result<f64, NetworkError> {
            Ok(board.field(Player::X).trailing_zeros() as f64 / 10.0)
        }
    }

    struct Constant(f64);

    impl ValueEstimator for Constant {
        fn estimate(&self, _: &Board) -> Result<f64, NetworkError> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl ValueEstimator for Broken {
        fn estimate(&self, _: &Board) -> Result<f64, NetworkError> {
            Err(NetworkError::input_size_mismatch(FEATURE_SIZE, 0))
        }
    }

    fn cell(index: usize) -> Cell {
        Cell::try_from(index).unwrap()
    }

    #[test]
    fn test_maximizing_player() {
        let board = Board::from_fields(0, 0b000010001).unwrap();
        // a single X mark on cell c scores c / 10
        let choice = Policy::best(&FirstX, board, Player::X).unwrap();
        assert_eq!(choice.mv, Move::new(Player::X, cell(8)));
        assert_eq!(choice.value, 0.8);
        assert_eq!(choice.board, board.apply(choice.mv));
        assert!(!choice.explored);
    }

    #[test]
    fn test_ties_go_to_first_cell() {
        let board = Board::new().apply(Move::new(Player::X, cell(0)));
        let choice = Policy::best(&FirstX, board, Player::O).unwrap();
        assert_eq!(choice.mv, Move::new(Player::O, cell(1)));

        let choice = Policy::best(&Constant(0.3), Board::new(), Player::X).unwrap();
        assert_eq!(choice.mv, Move::new(Player::X, cell(0)));
    }

    #[test]
    fn test_minimizing_player() {
        let rewards = RewardConfig::default();
        // X X .
        // O O .
        // . . .
        let board = Board::from_fields(0b000000011, 0b000011000).unwrap();
        let constant = Constant(0.3);
        let exact = ExactTerminals::new(&constant, &rewards);

        let choice = Policy::best(&exact, board, Player::O).unwrap();
        assert_eq!(choice.mv, Move::new(Player::O, cell(5)));
        assert_eq!(
            choice.board.status(),
            GameStatus::Finished(Outcome::Win(Player::O))
        );
        assert_eq!(choice.value, rewards.o_win);

        let choice = Policy::best(&exact, board, Player::X).unwrap();
        assert_eq!(choice.mv, Move::new(Player::X, cell(2)));
        assert_eq!(choice.value, rewards.x_win);

        // without exact terminals every candidate ties
        let choice = Policy::best(&constant, board, Player::O).unwrap();
        assert_eq!(choice.mv, Move::new(Player::O, cell(2)));
    }

    #[test]
    fn test_greedy_is_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let policy = Policy::greedy();
        let board = Board::new();
        let first = policy.choose(&FirstX, board, Player::X, &mut rng).unwrap();
        for _ in 0..10 {
            assert_eq!(
                policy.choose(&FirstX, board, Player::X, &mut rng).unwrap(),
                first
            );
        }
    }

    #[test]
    fn test_full_exploration() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let policy = Policy::new(1.0);
        let board = Board::from_fields(0b000000011, 0b000011000).unwrap();
        let mut seen = [false; Cell::COUNT];
        for _ in 0..200 {
            let choice = policy.choose(&FirstX, board, Player::X, &mut rng).unwrap();
            assert!(choice.explored);
            assert!(board.is_legal(choice.mv));
            assert_eq!(choice.value, FirstX.estimate(&choice.board).unwrap());
            seen[choice.mv.cell().index()] = true;
        }
        itertools::assert_equal(
            seen.iter().enumerate().filter(|(_, s)| **s).map(|(i, _)| i),
            [2, 5, 6, 7, 8],
        );
    }

    #[test]
    fn test_no_legal_move() {
        let board = Board::from_fields(0b101011010, 0b010100101).unwrap();
        assert_eq!(
            Policy::best(&FirstX, board, Player::X).unwrap_err(),
            PolicyError::NoLegalMove {
                player: Player::X,
                board
            }
        );
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(Policy::new(1.0)
            .choose(&FirstX, board, Player::O, &mut rng)
            .is_err());
    }

    #[test]
    fn test_estimator_error_propagates() {
        assert_eq!(
            Policy::best(&Broken, Board::new(), Player::X).unwrap_err(),
            PolicyError::Network(NetworkError::input_size_mismatch(FEATURE_SIZE, 0))
        );
    }

    #[test]
    fn test_random_move() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let board = Board::from_fields(0b011111111, 0).unwrap();
        assert_eq!(
            Policy::random(board, Player::O, &mut rng).unwrap(),
            Move::new(Player::O, cell(8))
        );
        let full = board.apply(Move::new(Player::O, cell(8)));
        assert!(Policy::random(full, Player::X, &mut rng).is_err());
    }

    #[test]
    fn test_network_estimator() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let network = ValueNetwork::new(FEATURE_SIZE, 4, 1, &mut rng);
        let value = network.estimate(&Board::new()).unwrap();
        assert_eq!(value, network.predict(&[0.0; FEATURE_SIZE]).unwrap()[0]);

        let rewards = RewardConfig::default();
        let won = Board::from_fields(0b000000111, 0b000011000).unwrap();
        let exact = estimator(&network, &rewards, TerminalValues::Exact);
        assert_eq!(exact.estimate(&won).unwrap(), rewards.x_win);
        let estimated = estimator(&network, &rewards, TerminalValues::Estimated);
        assert_eq!(
            estimated.estimate(&won).unwrap(),
            network.predict(&won.features()).unwrap()[0]
        );
    }

    #[test]
    fn test_network_estimator_needs_single_output() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let network = ValueNetwork::new(FEATURE_SIZE, 4, 2, &mut rng);
        assert_eq!(
            network.estimate(&Board::new()).unwrap_err(),
            NetworkError::output_size_mismatch(1, 2)
        );
        assert_eq!(
            Policy::best(&network, Board::new(), Player::X).unwrap_err(),
            PolicyError::Network(NetworkError::output_size_mismatch(1, 2))
        );
    }
}
