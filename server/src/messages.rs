use crate::error::MoveRejection;
use crate::ids::{MatchId, PlayerId, RecordId};
use crate::rating::RatingUpdate;
use crate::session::{Cause, MatchStatus};
use serde::{Deserialize, Serialize};
use stranger_chess::{Move, PieceType, Square};

/// A seated player as announced to clients
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Seat {
  /// Account id
  pub player: PlayerId,
  /// Display name
  pub name: String,
  /// Rating when the match started
  pub rating: i32,
}

/// Messages fanned out to the connections attached to a match
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
  /// Both seats are filled
  MatchStarted {
    /// The match
    match_id: MatchId,
    /// The white player
    white: Seat,
    /// The black player
    black: Seat,
  },
  /// A move was accepted
  MoveApplied {
    /// The match
    match_id: MatchId,
    /// Long algebraic notation
    #[serde(rename = "move")]
    notation: String,
    /// The position after the move
    fen: String,
  },
  /// One side offered a draw
  DrawOffered {
    /// The match
    match_id: MatchId,
    /// Whether white made the offer
    white: bool,
  },
  /// The match is over
  MatchEnded {
    /// The match
    match_id: MatchId,
    /// The final status
    status: MatchStatus,
    /// What ended it
    cause: Cause,
    /// Human readable summary
    description: String,
    /// Absent when the match was aborted
    ratings: Option<RatingUpdate>,
    /// The persisted record, if one was opened
    record: Option<RecordId>,
  },
  /// Only sent to the player whose request was refused
  MoveRejected {
    /// The match
    match_id: MatchId,
    /// Why
    reason: String,
  },
}

/// A move as submitted by a client: 0-based columns and rows plus an optional promotion letter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MoveSpec {
  /// Origin file
  pub start_col: u8,
  /// Origin rank
  pub start_row: u8,
  /// Destination file
  pub end_col: u8,
  /// Destination rank
  pub end_row: u8,
  /// `q`, `r`, `b` or `n`
  #[serde(default)]
  pub promotion: Option<char>,
}

impl MoveSpec {
  /// Check the coordinates and promotion letter
  pub fn decode(&self) -> Result<Move, MoveRejection> {
    let square = |col: u8, row: u8| {
      Square::try_new(usize::from(col), usize::from(row))
        .ok_or_else(|| MoveRejection::Malformed(format!("square ({col}, {row}) is off the board")))
    };
    let r#move = Move::new(
      square(self.start_col, self.start_row)?,
      square(self.end_col, self.end_row)?,
    );
    match self.promotion {
      None => Ok(r#move),
      Some(letter) => match PieceType::from_letter(letter) {
        Some(kind) if kind.is_promotion() => Ok(r#move.with_promotion(kind)),
        _ => Err(MoveRejection::Malformed(format!(
          "cannot promote to {letter:?}"
        ))),
      },
    }
  }
}

impl From<Move> for MoveSpec {
  fn from(r#move: Move) -> Self {
    // squares are always below 8
    let start = r#move.start();
    let end = r#move.end();
    Self {
      start_col: start.file() as u8,
      start_row: start.rank() as u8,
      end_col: end.file() as u8,
      end_row: end.rank() as u8,
      promotion: r#move.promotion().map(PieceType::letter),
    }
  }
}
