use crate::{Board, Piece, PieceType, Square, SquareError, SIZE};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An enum to represent the reasons for a FEN to be invalid.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum FenError {
  /// An unrecognised piece was encountered
  #[error("invalid piece found: {0}")]
  InvalidPiece(char),
  /// The board does not have 8 ranks
  #[error("expected 8 ranks, found {0}")]
  RankCount(usize),
  /// A rank does not have 8 squares
  #[error("rank {rank} has {width} squares")]
  RankWidth {
    /// The rank, counting from 1
    rank: usize,
    /// How many squares the rank described
    width: usize,
  },
  /// Each side needs exactly one king
  #[error("expected one {colour} king, found {count}")]
  KingCount {
    /// "white" or "black"
    colour: &'static str,
    /// How many kings that side had
    count: usize,
  },
  /// Required fields are missing
  #[error("required field (side to move) missing")]
  MissingFields,
  /// The side to move is not `w` or `b`
  #[error("invalid side to move: {0}")]
  InvalidSide(String),
  /// An unexpected castling letter
  #[error("invalid castling right: {0}")]
  InvalidCastling(char),
  /// The en passant field is not a square
  #[error(transparent)]
  InvalidEnPassant(#[from] SquareError),
  /// A move counter is not a number
  #[error("invalid move counter: {0}")]
  InvalidCounter(String),
}

/// Convert a FEN letter to a piece kind and colour
pub(crate) fn to_piece_type(c: char) -> Option<(PieceType, bool)> {
  let kind = match c.to_ascii_lowercase() {
    'p' => PieceType::Pawn,
    'n' => PieceType::Knight,
    'b' => PieceType::Bishop,
    'r' => PieceType::Rook,
    'q' => PieceType::Queen,
    'k' => PieceType::King,
    _ => return None,
  };
  Some((kind, c.is_ascii_uppercase()))
}

/// Convert a piece kind to its FEN letter, uppercase for white
pub(crate) const fn to_char(kind: PieceType, white: bool) -> char {
  let c = match kind {
    PieceType::Pawn => 'p',
    PieceType::Knight => 'n',
    PieceType::Bishop => 'b',
    PieceType::Rook => 'r',
    PieceType::Queen => 'q',
    PieceType::King => 'k',
  };
  if white {
    c.to_ascii_uppercase()
  } else {
    c
  }
}

/// A board together with the side to move and the move counters
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
  /// The pieces
  pub board: Board,
  /// Whether white moves next
  pub white_to_move: bool,
  /// Half-moves since the last pawn move or capture
  pub halfmoves: u32,
  /// Starts at 1 and increases after each black move
  pub fullmoves: u32,
}

impl Default for Position {
  fn default() -> Self {
    Self::startpos()
  }
}

impl Position {
  /// The standard starting position
  #[must_use]
  pub fn startpos() -> Self {
    Self {
      board: Board::standard(),
      white_to_move: true,
      halfmoves: 0,
      fullmoves: 1,
    }
  }

  /// The full FEN record
  #[must_use]
  pub fn fen(&self) -> String {
    self.to_string()
  }

  /// The fingerprint used for repetition detection
  #[must_use]
  pub fn hash(&self) -> crate::Hash {
    self.board.hash(self.white_to_move)
  }
}

impl Board {
  /// The piece placement field of a FEN record
  #[must_use]
  pub fn placement(&self) -> String {
    let mut rows = Vec::new();
    for rank in (0..SIZE).rev() {
      let mut squares = 0;
      let mut output = String::new();
      for file in 0..SIZE {
        match self.piece_at(Square::new(file, rank)) {
          Some(piece) => {
            if squares > 0 {
              output += &squares.to_string();
              squares = 0;
            }
            output.push(to_char(piece.kind, piece.white));
          }
          None => squares += 1,
        }
      }
      if squares > 0 {
        output += &squares.to_string();
      }
      rows.push(output);
    }
    rows.join("/")
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut castling: String = self
      .board
      .castling_rights()
      .iter()
      .zip(['K', 'Q', 'k', 'q'])
      .filter(|(right, _)| **right)
      .map(|(_, c)| c)
      .collect();
    if castling.is_empty() {
      castling.push('-');
    }
    let en_passant = self
      .board
      .phantom()
      .map_or_else(|| "-".to_owned(), |square| square.to_string());
    write!(
      f,
      "{} {} {castling} {en_passant} {} {}",
      self.board.placement(),
      if self.white_to_move { 'w' } else { 'b' },
      self.halfmoves,
      self.fullmoves,
    )
  }
}

fn parse_counter(field: Option<&str>, default: u32) -> Result<u32, FenError> {
  field.map_or(Ok(default), |text| {
    text
      .parse()
      .map_err(|_| FenError::InvalidCounter(text.to_owned()))
  })
}

impl FromStr for Position {
  type Err = FenError;

  fn from_str(fen: &str) -> Result<Self, Self::Err> {
    let mut fields = fen.split_whitespace();
    let placement = fields.next().ok_or(FenError::MissingFields)?;
    let white_to_move = match fields.next() {
      Some("w") => true,
      Some("b") => false,
      Some(other) => return Err(FenError::InvalidSide(other.to_owned())),
      None => return Err(FenError::MissingFields),
    };
    let castling = fields.next().unwrap_or("-");
    let en_passant = fields.next().unwrap_or("-");
    let halfmoves = parse_counter(fields.next(), 0)?;
    let fullmoves = parse_counter(fields.next(), 1)?;

    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != SIZE {
      return Err(FenError::RankCount(ranks.len()));
    }
    let mut board = Board::empty();
    let mut kings = [0; 2];
    for (i, row) in ranks.iter().enumerate() {
      let rank = SIZE - 1 - i;
      let mut file = 0;
      for c in row.chars() {
        if let Some(skip) = c.to_digit(10) {
          file += skip as usize;
          continue;
        }
        let (kind, white) = to_piece_type(c).ok_or(FenError::InvalidPiece(c))?;
        if file >= SIZE {
          return Err(FenError::RankWidth {
            rank: rank + 1,
            width: file + 1,
          });
        }
        if kind == PieceType::King {
          kings[usize::from(white)] += 1;
        }
        let square = Square::new(file, rank);
        let mut piece = Piece::new(kind, white, square);
        // only castling pieces and pawns carry a meaningful flag
        piece.moved = match kind {
          PieceType::Pawn => rank != if white { 1 } else { SIZE - 2 },
          PieceType::King | PieceType::Rook => true,
          _ => false,
        };
        board.place(piece, square);
        file += 1;
      }
      if file != SIZE {
        return Err(FenError::RankWidth {
          rank: rank + 1,
          width: file,
        });
      }
    }
    for (white, colour) in [(true, "white"), (false, "black")] {
      let count = kings[usize::from(white)];
      if count != 1 {
        return Err(FenError::KingCount { colour, count });
      }
    }

    for c in castling.chars() {
      let (white, rook_file) = match c {
        'K' => (true, SIZE - 1),
        'Q' => (true, 0),
        'k' => (false, SIZE - 1),
        'q' => (false, 0),
        '-' => continue,
        _ => return Err(FenError::InvalidCastling(c)),
      };
      let home = if white { 0 } else { SIZE - 1 };
      let king = Square::new(4, home);
      let rook = Square::new(rook_file, home);
      if let (Some(mut k), Some(mut r)) = (board.piece_at(king), board.piece_at(rook)) {
        if k.kind == PieceType::King
          && r.kind == PieceType::Rook
          && k.white == white
          && r.white == white
        {
          k.moved = false;
          r.moved = false;
          board.place(k, king);
          board.place(r, rook);
        }
      }
    }

    if en_passant != "-" {
      board.phantom = Some(en_passant.parse()?);
    }

    Ok(Self {
      board,
      white_to_move,
      halfmoves,
      fullmoves,
    })
  }
}
