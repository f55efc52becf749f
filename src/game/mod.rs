pub mod board;
pub mod error;
pub mod player;

pub use board::{
    Board, Cell, FeatureVector, GameResult, GameStatus, Move, Outcome, FEATURE_SIZE,
    WINNING_PATTERNS,
};
pub use error::GameError;
pub use player::Player;
