use crate::Position;

/// Count the leaves of the legal move tree to a given depth.
///
/// Each promotion choice is a separate leaf.
#[must_use]
pub fn perft(position: &Position, depth: usize) -> usize {
  if depth == 0 {
    return 1;
  }
  let mut board = position.board.clone();
  let moves = board.legal_moves(position.white_to_move);
  if depth == 1 {
    return moves.len();
  }
  let mut result = 0;
  for r#move in moves {
    let mut next = Position {
      board: board.clone(),
      white_to_move: !position.white_to_move,
      ..*position
    };
    next.board.play(r#move);
    result += perft(&next, depth - 1);
  }
  result
}
