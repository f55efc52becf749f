use std::fmt::{Display, Formatter};

/// One of the two sides. `X` always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::X, Player::O];

    /// Returns the opponent of `self`.
    pub fn other(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Offset of this player's 9-bit field inside a [`Board`](super::Board).
    pub(crate) fn shift(self) -> u32 {
        match self {
            Player::X => 0,
            Player::O => 16,
        }
    }

    /// Whether this player picks the successor with the highest estimated value.
    /// `O` picks the lowest one.
    pub fn is_maximizing(self) -> bool {
        matches!(self, Player::X)
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::X => f.write_str("X"),
            Player::O => f.write_str("O"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Player;

    #[test]
    fn test_other_is_involution() {
        for player in Player::ALL {
            assert_ne!(player.other(), player);
            assert_eq!(player.other().other(), player);
        }
    }

    #[test]
    fn test_fields_do_not_overlap() {
        let field = 0b111111111u32;
        assert_eq!(
            (field << Player::X.shift()) & (field << Player::O.shift()),
            0
        );
    }
}
