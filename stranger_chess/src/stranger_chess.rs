#![forbid(unsafe_code)]
#![warn(missing_docs, unused)]
//! The rules engine for Stranger Chess
//!
//! Holds the 8x8 board, per-piece move and threat generation,
//! the try/test/undo legality protocol and the arbiter that decides
//! when a game is over.

use array2d::Array2D;
use enum_iterator::Sequence;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use crate::arbiter::{arbitrate, Gamestate};
pub use crate::keys::Hash;
pub use crate::moves::{Move, MoveParseError};
pub use crate::parsing::{FenError, Position};

mod arbiter;
mod keys;
mod movegen;
mod moves;
mod parsing;

/// Move path enumeration
pub mod perft;
/// Well known positions
pub mod positions;

#[cfg(test)]
mod tests;

/// The number of files and ranks on the board
pub const SIZE: usize = 8;

const BACK_RANK: [PieceType; SIZE] = [
  PieceType::Rook,
  PieceType::Knight,
  PieceType::Bishop,
  PieceType::Queen,
  PieceType::King,
  PieceType::Bishop,
  PieceType::Knight,
  PieceType::Rook,
];

/// Index into per-colour arrays, black first
const fn side(white: bool) -> usize {
  white as usize
}

/// A square could not be read from text
#[derive(Debug, Error, Eq, PartialEq)]
#[error("invalid square: {0:?}")]
pub struct SquareError(pub String);

/// A square on the board, identified by file (column) and rank (row).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Square {
  file: usize,
  rank: usize,
}

impl Square {
  /// Create a square from 0-based file and rank.
  ///
  /// # Panics
  ///
  /// Coordinates off the board are a programming error.
  #[must_use]
  pub fn new(file: usize, rank: usize) -> Self {
    assert!(
      file < SIZE && rank < SIZE,
      "square ({file}, {rank}) is off the board"
    );
    Self { file, rank }
  }

  /// Create a square, or `None` if the coordinates are off the board.
  #[must_use]
  pub const fn try_new(file: usize, rank: usize) -> Option<Self> {
    if file < SIZE && rank < SIZE {
      Some(Self { file, rank })
    } else {
      None
    }
  }

  /// The 0-based file
  #[must_use]
  pub const fn file(self) -> usize {
    self.file
  }

  /// The 0-based rank
  #[must_use]
  pub const fn rank(self) -> usize {
    self.rank
  }

  /// The square shifted by the given number of files and ranks, if still on the board.
  #[must_use]
  pub fn offset(self, files: isize, ranks: isize) -> Option<Self> {
    let file = self.file.checked_add_signed(files)?;
    let rank = self.rank.checked_add_signed(ranks)?;
    Self::try_new(file, rank)
  }

  // array2d is indexed (row, column)
  const fn index(self) -> (usize, usize) {
    (self.rank, self.file)
  }
}

impl fmt::Display for Square {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", (b'a' + self.file as u8) as char, self.rank + 1)
  }
}

impl FromStr for Square {
  type Err = SquareError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
      (Some(file @ 'a'..='h'), Some(rank @ '1'..='8'), None) => Ok(Self {
        file: file as usize - 'a' as usize,
        rank: rank as usize - '1' as usize,
      }),
      _ => Err(SquareError(text.to_owned())),
    }
  }
}

/// The six kinds of piece
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Sequence)]
pub enum PieceType {
  /// Pawn
  Pawn,
  /// Knight
  Knight,
  /// Bishop
  Bishop,
  /// Rook
  Rook,
  /// Queen
  Queen,
  /// King
  King,
}

impl PieceType {
  /// Whether a pawn may be promoted to this kind
  #[must_use]
  pub const fn is_promotion(self) -> bool {
    matches!(self, Self::Knight | Self::Bishop | Self::Rook | Self::Queen)
  }

  /// The kind named by a FEN letter of either case
  #[must_use]
  pub fn from_letter(letter: char) -> Option<Self> {
    parsing::to_piece_type(letter).map(|(kind, _)| kind)
  }

  /// The lowercase FEN letter
  #[must_use]
  pub const fn letter(self) -> char {
    parsing::to_char(self, false)
  }
}

/// A piece standing on the board
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Piece {
  /// What kind of piece it is
  pub kind: PieceType,
  /// `true` for white
  pub white: bool,
  /// Whether the piece has moved since the game started
  pub moved: bool,
  /// Where the piece stands
  pub square: Square,
}

impl Piece {
  /// An unmoved piece. The square is overwritten when the piece is placed.
  #[must_use]
  pub const fn new(kind: PieceType, white: bool, square: Square) -> Self {
    Self {
      kind,
      white,
      moved: false,
      square,
    }
  }
}

/// Board state saved by a speculative move, restored by [`Board::unmove`]
#[must_use]
#[derive(Debug)]
pub struct Undo {
  squares: [Option<(Square, Option<Piece>)>; 4],
  phantom: Option<Square>,
  kings: [Option<Square>; 2],
}

/// An 8x8 board.
///
/// Tracks both kings for constant time check lookup and the phantom square
/// left behind by a pawn's double step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
  squares: Array2D<Option<Piece>>,
  kings: [Option<Square>; 2],
  phantom: Option<Square>,
}

impl Default for Board {
  fn default() -> Self {
    Self::empty()
  }
}

impl Board {
  /// A board with no pieces on it
  #[must_use]
  pub fn empty() -> Self {
    Self {
      squares: Array2D::filled_with(None, SIZE, SIZE),
      kings: [None; 2],
      phantom: None,
    }
  }

  /// The standard starting position
  #[must_use]
  pub fn standard() -> Self {
    let mut board = Self::empty();
    for (file, kind) in BACK_RANK.into_iter().enumerate() {
      for (white, back, pawns) in [(true, 0, 1), (false, SIZE - 1, SIZE - 2)] {
        let square = Square::new(file, back);
        board.place(Piece::new(kind, white, square), square);
        let square = Square::new(file, pawns);
        board.place(Piece::new(PieceType::Pawn, white, square), square);
      }
    }
    board
  }

  /// The piece on a square, if any
  #[must_use]
  pub fn piece_at(&self, square: Square) -> Option<Piece> {
    self.squares[square.index()]
  }

  /// Put a piece on a square, replacing whatever was there.
  pub fn place(&mut self, mut piece: Piece, square: Square) {
    self.take(square);
    piece.square = square;
    self.put(piece);
  }

  /// The square of a side's king
  #[must_use]
  pub const fn king(&self, white: bool) -> Option<Square> {
    self.kings[side(white)]
  }

  /// The square a pawn skipped on the previous move, if it double stepped
  #[must_use]
  pub const fn phantom(&self) -> Option<Square> {
    self.phantom
  }

  /// All pieces of one colour
  #[must_use]
  pub fn pieces(&self, white: bool) -> Vec<Piece> {
    self
      .squares
      .elements_row_major_iter()
      .flatten()
      .filter(|piece| piece.white == white)
      .copied()
      .collect()
  }

  fn take(&mut self, square: Square) -> Option<Piece> {
    let piece = self.squares[square.index()].take();
    if let Some(piece) = piece {
      if piece.kind == PieceType::King && self.kings[side(piece.white)] == Some(square) {
        self.kings[side(piece.white)] = None;
      }
    }
    piece
  }

  fn put(&mut self, piece: Piece) {
    if piece.kind == PieceType::King {
      self.kings[side(piece.white)] = Some(piece.square);
    }
    self.squares[piece.square.index()] = Some(piece);
  }

  /// Relocate a piece unconditionally and return whatever it captured.
  ///
  /// Does nothing if the start square is empty.
  /// An en passant capture removes the pawn beside the destination.
  pub fn make_move(&mut self, start: Square, end: Square) -> Option<Piece> {
    let mut piece = self.take(start)?;
    let captured = if piece.kind == PieceType::Pawn
      && self.phantom == Some(end)
      && start.file != end.file
      && self.piece_at(end).is_none()
    {
      self.take(Square::new(end.file, start.rank))
    } else {
      self.take(end)
    };
    self.phantom = if piece.kind == PieceType::Pawn && start.rank.abs_diff(end.rank) == 2 {
      Some(Square::new(start.file, (start.rank + end.rank) / 2))
    } else {
      None
    };
    piece.moved = true;
    piece.square = end;
    self.put(piece);
    captured
  }

  fn save(&self, squares: &[Square]) -> Undo {
    let mut saved = [None; 4];
    for (slot, square) in saved.iter_mut().zip(squares) {
      *slot = Some((*square, self.piece_at(*square)));
    }
    Undo {
      squares: saved,
      phantom: self.phantom,
      kings: self.kings,
    }
  }

  /// Make a move that will be reverted with [`Board::unmove`].
  pub fn move_temporary(&mut self, start: Square, end: Square) -> Undo {
    let undo = self.save(&[start, end, Square::new(end.file, start.rank)]);
    self.make_move(start, end);
    undo
  }

  /// Restore the board to exactly how it was before a temporary move.
  pub fn unmove(&mut self, undo: Undo) {
    for (square, piece) in undo.squares.into_iter().flatten().rev() {
      self.squares[square.index()] = piece;
    }
    self.phantom = undo.phantom;
    self.kings = undo.kings;
  }

  /// Whether moving `start` to `end` is a castling request.
  ///
  /// Castling is encoded as the king moving onto its own rook.
  #[must_use]
  pub fn is_castling_move(&self, start: Square, end: Square) -> bool {
    match (self.piece_at(start), self.piece_at(end)) {
      (Some(king), Some(rook)) => {
        king.kind == PieceType::King
          && rook.kind == PieceType::Rook
          && king.white == rook.white
          && !king.moved
          && !rook.moved
          && castling_destinations(start, end).is_some()
      }
      _ => false,
    }
  }

  /// Move the king two squares towards the rook and the rook to the king's far side.
  pub fn make_castling_move(&mut self, king: Square, rook: Square) {
    let Some((king_to, rook_to)) = castling_destinations(king, rook) else {
      return;
    };
    if self.piece_at(king).is_none() || self.piece_at(rook).is_none() {
      return;
    }
    if let (Some(mut king), Some(mut rook)) = (self.take(king), self.take(rook)) {
      king.moved = true;
      king.square = king_to;
      rook.moved = true;
      rook.square = rook_to;
      self.put(king);
      self.put(rook);
    }
    self.phantom = None;
  }

  /// Castle in a way that will be reverted with [`Board::unmove`].
  pub fn castle_temporary(&mut self, king: Square, rook: Square) -> Undo {
    let undo = match castling_destinations(king, rook) {
      Some((king_to, rook_to)) => self.save(&[king, rook, king_to, rook_to]),
      None => self.save(&[]),
    };
    self.make_castling_move(king, rook);
    undo
  }

  /// Replace the kind of the piece on a square, keeping everything else.
  pub fn promote(&mut self, square: Square, kind: PieceType) {
    if let Some(piece) = &mut self.squares[square.index()] {
      piece.kind = kind;
    }
  }

  /// Whether a pawn moving from `start` to `end` reaches the last rank
  #[must_use]
  pub fn promotion_due(&self, start: Square, end: Square) -> bool {
    self.piece_at(start).map_or(false, |piece| {
      piece.kind == PieceType::Pawn && end.rank == if piece.white { SIZE - 1 } else { 0 }
    })
  }

  /// Whether any piece of the given colour threatens a square
  #[must_use]
  pub fn is_attacked(&self, square: Square, by_white: bool) -> bool {
    self
      .pieces(by_white)
      .iter()
      .any(|piece| self.threatened_squares(piece).contains(&square))
  }

  /// Whether a side's king is threatened
  #[must_use]
  pub fn is_king_in_check(&self, white: bool) -> bool {
    self
      .king(white)
      .map_or(false, |king| self.is_attacked(king, !white))
  }

  /// Whether a move passes every legality rule.
  ///
  /// The move is applied, the mover's king is tested and the board is
  /// restored before returning.
  pub fn is_valid_move(&mut self, start: Square, end: Square) -> bool {
    let Some(piece) = self.piece_at(start) else {
      return false;
    };
    if !self.movable_squares(&piece).contains(&end) {
      return false;
    }
    if self.is_castling_move(start, end) {
      if self.is_king_in_check(piece.white) {
        return false;
      }
      let step = if end.file > start.file { 1 } else { -1 };
      let (low, high) = (start.file.min(end.file), start.file.max(end.file));
      if (low + 1..high).any(|file| self.piece_at(Square::new(file, start.rank)).is_some()) {
        return false;
      }
      let Some(transit) = start.offset(step, 0) else {
        return false;
      };
      if !self.survives(piece.white, |board| board.move_temporary(start, transit)) {
        return false;
      }
      self.survives(piece.white, |board| board.castle_temporary(start, end))
    } else {
      self.survives(piece.white, |board| board.move_temporary(start, end))
    }
  }

  fn survives(&mut self, white: bool, apply: impl FnOnce(&mut Self) -> Undo) -> bool {
    let undo = apply(self);
    let safe = !self.is_king_in_check(white);
    self.unmove(undo);
    safe
  }

  /// Whether a side has at least one legal move
  pub fn can_side_move(&mut self, white: bool) -> bool {
    for piece in self.pieces(white) {
      for end in self.movable_squares(&piece) {
        if self.is_valid_move(piece.square, end) {
          return true;
        }
      }
    }
    false
  }

  /// Every legal move for a side, with each promotion choice listed separately.
  pub fn legal_moves(&mut self, white: bool) -> Vec<Move> {
    let mut moves = Vec::new();
    for piece in self.pieces(white) {
      for end in self.movable_squares(&piece) {
        if self.is_valid_move(piece.square, end) {
          if self.promotion_due(piece.square, end) {
            for kind in enum_iterator::all::<PieceType>().filter(|kind| kind.is_promotion()) {
              moves.push(Move::new(piece.square, end).with_promotion(kind));
            }
          } else {
            moves.push(Move::new(piece.square, end));
          }
        }
      }
    }
    moves
  }

  /// Apply a move without checking it, returning any captured piece.
  pub fn play(&mut self, r#move: Move) -> Option<Piece> {
    if self.is_castling_move(r#move.start(), r#move.end()) {
      self.make_castling_move(r#move.start(), r#move.end());
      return None;
    }
    let captured = self.make_move(r#move.start(), r#move.end());
    if let Some(kind) = r#move.promotion() {
      self.promote(r#move.end(), kind);
    }
    captured
  }

  /// Castling availability in FEN order: white short, white long, black short, black long
  #[must_use]
  pub fn castling_rights(&self) -> [bool; 4] {
    let mut rights = [false; 4];
    for (i, (white, rook_file)) in [(true, SIZE - 1), (true, 0), (false, SIZE - 1), (false, 0)]
      .into_iter()
      .enumerate()
    {
      if let Some(king) = self.king(white) {
        rights[i] = self.is_castling_move(king, Square::new(rook_file, king.rank));
      }
    }
    rights
  }
}

/// Final king and rook squares for a castling pair
fn castling_destinations(king: Square, rook: Square) -> Option<(Square, Square)> {
  if king.rank != rook.rank || king.file == rook.file {
    return None;
  }
  let step = if rook.file > king.file { 1 } else { -1 };
  Some((king.offset(2 * step, 0)?, king.offset(step, 0)?))
}
