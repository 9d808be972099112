//! Board square addressing ("a1".."h8") and cursor movement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::Side;
use crate::error::SquareError;

const FILES: &[u8; 8] = b"abcdefgh";
const RANKS: &[u8; 8] = b"12345678";

/// A square on the 8x8 grid. `file` 0..8 maps to a..h, `rank` 0..8 maps to 1..8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoardSquare {
    file: u8,
    rank: u8,
}

/// Cursor direction as seen on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl BoardSquare {
    /// Where the analysis cursor starts.
    pub const DEFAULT_CURSOR: BoardSquare = BoardSquare { file: 4, rank: 3 };

    /// Build a square from 0-based coordinates. Returns `None` off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    /// True if a pawn of `side` arriving here promotes.
    pub fn is_promotion_rank(self, side: Side) -> bool {
        match side {
            Side::White => self.rank == 7,
            Side::Black => self.rank == 0,
        }
    }

    /// Move one step in `direction`, clamped at the board edges.
    ///
    /// With a flipped board, rank 1 is drawn on top and the h-file on the
    /// left, so both axes are inverted to keep the on-screen movement.
    pub fn step(self, direction: Direction, flipped: bool) -> Self {
        let (d_file, d_rank): (i8, i8) = match direction {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        };
        let (d_file, d_rank) = if flipped {
            (-d_file, -d_rank)
        } else {
            (d_file, d_rank)
        };

        Self {
            file: (self.file as i8 + d_file).clamp(0, 7) as u8,
            rank: (self.rank as i8 + d_rank).clamp(0, 7) as u8,
        }
    }
}

impl Default for BoardSquare {
    fn default() -> Self {
        Self::DEFAULT_CURSOR
    }
}

impl fmt::Display for BoardSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            FILES[self.file as usize] as char, RANKS[self.rank as usize] as char
        )
    }
}

impl FromStr for BoardSquare {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(SquareError::Invalid(s.to_string()));
        }
        let file = FILES.iter().position(|&c| c == bytes[0]);
        let rank = RANKS.iter().position(|&c| c == bytes[1]);
        match (file, rank) {
            (Some(file), Some(rank)) => Ok(Self {
                file: file as u8,
                rank: rank as u8,
            }),
            _ => Err(SquareError::Invalid(s.to_string())),
        }
    }
}

impl TryFrom<String> for BoardSquare {
    type Error = SquareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BoardSquare> for String {
    fn from(square: BoardSquare) -> Self {
        square.to_string()
    }
}
