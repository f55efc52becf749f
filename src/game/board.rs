use std::fmt::{Display, Formatter};

use crate::game::error::GameError;
use crate::game::player::Player;

pub type GameResult<T> = Result<T, GameError>;

/// All nine cells of one player's field.
const FIELD: u32 = 0b111111111;

/// Rows, columns and diagonals, as bits of a single player's field.
/// Cells are numbered 0..9 from the upper left to the lower right.
pub const WINNING_PATTERNS: [u32; 8] = [
    0b000000111,
    0b000111000,
    0b111000000,
    0b001001001,
    0b010010010,
    0b100100100,
    0b100010001,
    0b001010100,
];

/// Length of the network input produced by [`Board::features`].
pub const FEATURE_SIZE: usize = 2 * Cell::COUNT;

pub type FeatureVector = [f64; FEATURE_SIZE];

/// Index of a cell on the 3x3 grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell(u8);

impl Cell {
    pub const COUNT: usize = 9;

    /// Returns all cells in scan order.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..Self::COUNT as u8).map(Cell)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn row(self) -> usize {
        self.index() / 3
    }

    pub fn col(self) -> usize {
        self.index() % 3
    }

    fn bit(self) -> u32 {
        1 << self.0
    }
}

impl TryFrom<usize> for Cell {
    type Error = GameError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value < Self::COUNT {
            Ok(Self(value as u8))
        } else {
            Err(GameError::cell_out_of_range(value))
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row(), self.col())
    }
}

/// A single mark placed by `player` on `cell`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    player: Player,
    cell: Cell,
}

impl Move {
    pub fn new(player: Player, cell: Cell) -> Self {
        Self { player, cell }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    /// The move as a board with exactly one bit set.
    pub fn bits(&self) -> u32 {
        self.cell.bit() << self.player.shift()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win(Player),
    Draw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    Finished(Outcome),
}

/// Tic-tac-toe position packed into a `u32`.
///
/// Bits 0..9 hold the cells taken by `X`, bits 16..25 the cells taken by `O`.
/// A cell is empty iff neither bit is set. Boards are values: [`Board::apply`]
/// returns a new position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Board(u32);

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from two 9-bit player fields.
    pub fn from_fields(x: u32, o: u32) -> GameResult<Self> {
        for field in [x, o] {
            if field & !FIELD != 0 {
                return Err(GameError::InvalidField { field });
            }
        }
        if x & o != 0 {
            return Err(GameError::FieldsOverlap { cells: x & o });
        }
        Ok(Self(x << Player::X.shift() | o << Player::O.shift()))
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// The 9-bit field of `player`.
    pub fn field(&self, player: Player) -> u32 {
        (self.0 >> player.shift()) & FIELD
    }

    /// Cells taken by either player.
    pub fn occupied(&self) -> u32 {
        self.field(Player::X) | self.field(Player::O)
    }

    pub fn owner(&self, cell: Cell) -> Option<Player> {
        Player::ALL
            .into_iter()
            .find(|player| self.field(*player) & cell.bit() != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True iff the target cell of `mv` is unoccupied by either player.
    pub fn is_legal(&self, mv: Move) -> bool {
        self.occupied() & mv.cell.bit() == 0
    }

    /// Returns the position after `mv`. Legality is the caller's concern.
    pub fn apply(&self, mv: Move) -> Board {
        Board(self.0 | mv.bits())
    }

    /// Same as [`Board::apply`], but rejects moves onto occupied cells.
    pub fn try_apply(&self, mv: Move) -> GameResult<Board> {
        if !self.is_legal(mv) {
            return Err(GameError::cell_is_occupied(mv.cell));
        }
        Ok(self.apply(mv))
    }

    /// Cells `player` may take, in scan order.
    pub fn legal_moves(&self, player: Player) -> impl Iterator<Item = Move> {
        let board = *self;
        Cell::all()
            .map(move |cell| Move::new(player, cell))
            .filter(move |mv| board.is_legal(*mv))
    }

    /// Scans the winning patterns in a fixed order, `X` before `O` for each
    /// pattern, and only then checks for a full board.
    pub fn status(&self) -> GameStatus {
        for pattern in WINNING_PATTERNS {
            for player in Player::ALL {
                if self.field(player) & pattern == pattern {
                    return GameStatus::Finished(Outcome::Win(player));
                }
            }
        }
        if self.occupied() == FIELD {
            return GameStatus::Finished(Outcome::Draw);
        }
        GameStatus::Running
    }

    pub fn is_final(&self) -> bool {
        matches!(self.status(), GameStatus::Finished(_))
    }

    /// Network input: `X` cells at positions 0..9, `O` cells at 9..18.
    pub fn features(&self) -> FeatureVector {
        let packed = self.field(Player::X) | self.field(Player::O) << Cell::COUNT;
        let mut features = [0.0; FEATURE_SIZE];
        for (i, feature) in features.iter_mut().enumerate() {
            if packed & (1 << i) != 0 {
                *feature = 1.0;
            }
        }
        features
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in 0..3 {
            if row > 0 {
                f.write_str("---+---+---\n")?;
            }
            let marks: Vec<String> = (0..3)
                .map(|col| match self.owner(Cell((row * 3 + col) as u8)) {
                    Some(player) => player.to_string(),
                    None => " ".to_string(),
                })
                .collect();
            writeln!(f, " {} | {} | {} ", marks[0], marks[1], marks[2])?;
        }
        Ok(())
    }
}
