use crate::{Board, Hash};

/// Half-moves without a pawn move or capture before the game is drawn
pub const FIFTY_MOVE_LIMIT: u32 = 100;

/// Occurrences of one position that draw the game
pub const REPETITION_LIMIT: usize = 3;

/// represents the status of the game
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Gamestate {
  /// The game continues
  InProgress,
  /// The side to move is mated, the flag is `true` when white won
  Checkmate(bool),
  /// The side to move has no moves but is not in check
  Stalemate,
  /// The same position occurred for the third time
  Repetition,
  /// 100 half-moves without a pawn move or capture
  Move50,
}

impl Gamestate {
  /// Whether the game is over
  #[must_use]
  pub const fn is_terminal(self) -> bool {
    !matches!(self, Self::InProgress)
  }
}

/// Judge a position after a move has been played and the turn passed.
///
/// `positions` holds the fingerprint of every position so far, the current one last.
/// Only fingerprints from `last_irreversible` onwards can repeat.
pub fn arbitrate(
  board: &mut Board,
  white_to_move: bool,
  halfmoves: u32,
  positions: &[Hash],
  last_irreversible: usize,
) -> Gamestate {
  if halfmoves >= FIFTY_MOVE_LIMIT {
    return Gamestate::Move50;
  }
  if !board.can_side_move(white_to_move) {
    return if board.is_king_in_check(white_to_move) {
      Gamestate::Checkmate(!white_to_move)
    } else {
      Gamestate::Stalemate
    };
  }
  if let Some(current) = positions.last() {
    let window = positions.get(last_irreversible..).unwrap_or_default();
    if window.iter().filter(|hash| *hash == current).count() >= REPETITION_LIMIT {
      return Gamestate::Repetition;
    }
  }
  Gamestate::InProgress
}
