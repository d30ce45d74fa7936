use crate::parsing::to_piece_type;
use crate::{PieceType, Square, SquareError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The reasons a move could not be read from long algebraic notation
#[derive(Debug, Error, Eq, PartialEq)]
pub enum MoveParseError {
  /// Moves are 4 characters, or 5 with a promotion
  #[error("expected 4 or 5 characters, found {0}")]
  Length(usize),
  /// One of the squares is not on the board
  #[error(transparent)]
  Square(#[from] SquareError),
  /// The promotion letter is not a knight, bishop, rook or queen
  #[error("invalid promotion: {0}")]
  Promotion(char),
}

/// A move from one square to another, with an optional promotion.
///
/// Castling is written as the king moving onto its rook, e.g. `e1h1`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Move {
  start: Square,
  end: Square,
  promotion: Option<PieceType>,
}

// Long algebraic notation
impl fmt::Display for Move {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.start, self.end)?;
    if let Some(kind) = self.promotion {
      write!(f, "{}", crate::parsing::to_char(kind, false))?;
    }
    Ok(())
  }
}

impl FromStr for Move {
  type Err = MoveParseError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    let length = text.chars().count();
    if !(4..=5).contains(&length) || !text.is_ascii() {
      return Err(MoveParseError::Length(length));
    }
    let start: Square = text[0..2].parse()?;
    let end: Square = text[2..4].parse()?;
    let promotion = match text[4..].chars().next() {
      Some(c) => match to_piece_type(c) {
        Some((kind, _)) if kind.is_promotion() => Some(kind),
        _ => return Err(MoveParseError::Promotion(c)),
      },
      None => None,
    };
    Ok(Self {
      start,
      end,
      promotion,
    })
  }
}

impl Move {
  /// Initialise a new move based on the start and end points
  #[must_use]
  pub const fn new(start: Square, end: Square) -> Self {
    Self {
      start,
      end,
      promotion: None,
    }
  }

  /// The same move with a promotion choice attached
  #[must_use]
  pub const fn with_promotion(mut self, kind: PieceType) -> Self {
    self.promotion = Some(kind);
    self
  }

  /// Get the start position of the move
  #[must_use]
  pub const fn start(&self) -> Square {
    self.start
  }

  /// Get the end position of the move
  #[must_use]
  pub const fn end(&self) -> Square {
    self.end
  }

  /// Get the promotion involved in the move if there is one
  #[must_use]
  pub const fn promotion(&self) -> Option<PieceType> {
    self.promotion
  }
}
