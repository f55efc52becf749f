use crate::game::{Board, Player};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum NetworkError {
    #[error("input vector has length {found}, network expects {expected}")]
    InputSizeMismatch { expected: usize, found: usize },
    #[error("target vector has length {found}, network expects {expected}")]
    TargetSizeMismatch { expected: usize, found: usize },
    #[error("network produced {found} outputs, expected {expected}")]
    OutputSizeMismatch { expected: usize, found: usize },
}

impl NetworkError {
    pub fn input_size_mismatch(expected: usize, found: usize) -> Self {
        Self::InputSizeMismatch { expected, found }
    }

    pub fn target_size_mismatch(expected: usize, found: usize) -> Self {
        Self::TargetSizeMismatch { expected, found }
    }

    pub fn output_size_mismatch(expected: usize, found: usize) -> Self {
        Self::OutputSizeMismatch { expected, found }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PolicyError {
    #[error("no legal move for player {player} on a running board:\n{board}")]
    NoLegalMove { player: Player, board: Board },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TrainingError {
    #[error("move selection failed: {0}")]
    Policy(#[from] PolicyError),
    #[error("value network update failed: {0}")]
    Network(#[from] NetworkError),
}
