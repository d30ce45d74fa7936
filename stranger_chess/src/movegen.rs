use crate::{Board, Piece, PieceType, Square, SIZE};

const ORTHOGONAL: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(isize, isize); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_JUMPS: [(isize, isize); 8] = [
  (1, 2),
  (2, 1),
  (2, -1),
  (1, -2),
  (-1, -2),
  (-2, -1),
  (-2, 1),
  (-1, 2),
];
const KING_STEPS: [(isize, isize); 8] = [
  (1, 0),
  (1, 1),
  (0, 1),
  (-1, 1),
  (-1, 0),
  (-1, -1),
  (0, -1),
  (1, -1),
];

const fn forward(white: bool) -> isize {
  if white {
    1
  } else {
    -1
  }
}

// the rank a pawn lands on when capturing en passant
const fn en_passant_rank(white: bool) -> usize {
  if white {
    SIZE - 3
  } else {
    2
  }
}

impl Board {
  /// Squares the piece could capture on if an enemy stood there.
  ///
  /// Sliders stop at the first occupied square and only include it when it holds an enemy.
  #[must_use]
  pub fn threatened_squares(&self, piece: &Piece) -> Vec<Square> {
    match piece.kind {
      PieceType::Pawn => self.pawn_threats(piece),
      PieceType::Knight => self.jumps(piece, &KNIGHT_JUMPS),
      PieceType::Bishop => self.slides(piece, &DIAGONAL),
      PieceType::Rook => self.slides(piece, &ORTHOGONAL),
      PieceType::Queen => {
        let mut squares = self.slides(piece, &ORTHOGONAL);
        squares.extend(self.slides(piece, &DIAGONAL));
        squares
      }
      PieceType::King => self.jumps(piece, &KING_STEPS),
    }
  }

  /// Squares the piece may try to move to before the king safety test.
  ///
  /// Pawn advances and castling targets are added to the threatened set.
  /// Castling targets are the rook's own square.
  #[must_use]
  pub fn movable_squares(&self, piece: &Piece) -> Vec<Square> {
    let mut squares = self.threatened_squares(piece);
    match piece.kind {
      PieceType::Pawn => self.pawn_advances(piece, &mut squares),
      PieceType::King => self.castling_targets(piece, &mut squares),
      _ => (),
    }
    squares
  }

  fn is_friendly(&self, square: Square, white: bool) -> bool {
    self
      .piece_at(square)
      .map_or(false, |piece| piece.white == white)
  }

  fn jumps(&self, piece: &Piece, offsets: &[(isize, isize)]) -> Vec<Square> {
    offsets
      .iter()
      .filter_map(|(files, ranks)| piece.square.offset(*files, *ranks))
      .filter(|square| !self.is_friendly(*square, piece.white))
      .collect()
  }

  fn slides(&self, piece: &Piece, directions: &[(isize, isize)]) -> Vec<Square> {
    let mut squares = Vec::new();
    for (files, ranks) in directions {
      let mut current = piece.square;
      while let Some(next) = current.offset(*files, *ranks) {
        match self.piece_at(next) {
          None => squares.push(next),
          Some(other) => {
            if other.white != piece.white {
              squares.push(next);
            }
            break;
          }
        }
        current = next;
      }
    }
    squares
  }

  fn pawn_threats(&self, piece: &Piece) -> Vec<Square> {
    let mut squares = Vec::new();
    for files in [-1, 1] {
      if let Some(target) = piece.square.offset(files, forward(piece.white)) {
        match self.piece_at(target) {
          Some(other) if other.white != piece.white => squares.push(target),
          None
            if self.phantom() == Some(target)
              && target.rank() == en_passant_rank(piece.white) =>
          {
            squares.push(target);
          }
          _ => (),
        }
      }
    }
    squares
  }

  fn pawn_advances(&self, piece: &Piece, squares: &mut Vec<Square>) {
    let step = forward(piece.white);
    if let Some(single) = piece.square.offset(0, step) {
      if self.piece_at(single).is_none() {
        squares.push(single);
        if !piece.moved {
          if let Some(double) = piece.square.offset(0, 2 * step) {
            if self.piece_at(double).is_none() {
              squares.push(double);
            }
          }
        }
      }
    }
  }

  fn castling_targets(&self, piece: &Piece, squares: &mut Vec<Square>) {
    if piece.moved {
      return;
    }
    for file in [0, SIZE - 1] {
      let rook = Square::new(file, piece.square.rank());
      if self.is_castling_move(piece.square, rook) {
        squares.push(rook);
      }
    }
  }
}
