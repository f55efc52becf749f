use super::Cell;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GameError {
    #[error("invalid cell (expected: 0-{max_expected}, found: {found})")]
    CellOutOfRange { max_expected: usize, found: usize },
    #[error("cell {cell} is occupied")]
    CellIsOccupied { cell: Cell },
    #[error("player field {field:#011b} has bits outside of the 3x3 grid")]
    InvalidField { field: u32 },
    #[error("player fields overlap on cells {cells:#011b}")]
    FieldsOverlap { cells: u32 },
}

impl GameError {
    pub fn cell_out_of_range(found: usize) -> Self {
        Self::CellOutOfRange {
            max_expected: Cell::COUNT - 1,
            found,
        }
    }

    pub fn cell_is_occupied(cell: Cell) -> Self {
        Self::CellIsOccupied { cell }
    }
}
