use crate::{Board, PieceType, Square, SIZE};
use array2d::Array2D;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaChaRng;
use std::sync::OnceLock;

/// A Zobrist fingerprint of a position
pub type Hash = u64;

// one key per kind and colour
const PIECE_KEYS: usize = 12;

struct ZobristKeys {
  pieces: Array2D<[Hash; PIECE_KEYS]>,
  en_passant: Array2D<Hash>,
  to_move: Hash,
  castling: [Hash; 4],
}

impl ZobristKeys {
  fn new() -> Self {
    // seed generated from random.org
    let mut rng = ChaChaRng::seed_from_u64(0xbe76_25d8_a3ac_f287);
    let mut keys = Self {
      pieces: Array2D::filled_with([0; PIECE_KEYS], SIZE, SIZE),
      en_passant: Array2D::filled_with(0, SIZE, SIZE),
      to_move: rng.gen(),
      castling: [0; 4],
    };

    rng.fill(&mut keys.castling);

    for i in 0..SIZE {
      for j in 0..SIZE {
        rng.fill(&mut keys.pieces[(i, j)]);
        keys.en_passant[(i, j)] = rng.gen();
      }
    }

    keys
  }
}

fn keys() -> &'static ZobristKeys {
  static KEYS: OnceLock<ZobristKeys> = OnceLock::new();
  KEYS.get_or_init(ZobristKeys::new)
}

const fn piece_index(kind: PieceType, white: bool) -> usize {
  kind as usize + if white { PIECE_KEYS / 2 } else { 0 }
}

impl Board {
  /// Fingerprint of the placement, side to move, castling rights and en passant square.
  ///
  /// Equal positions under the repetition rule have equal hashes.
  #[must_use]
  pub fn hash(&self, white_to_move: bool) -> Hash {
    let keys = keys();
    let mut hash = 0;
    for i in 0..SIZE {
      for j in 0..SIZE {
        if let Some(piece) = self.piece_at(Square::new(j, i)) {
          hash ^= keys.pieces[(i, j)][piece_index(piece.kind, piece.white)];
        }
      }
    }
    if white_to_move {
      hash ^= keys.to_move;
    }
    for (key, right) in keys.castling.iter().zip(self.castling_rights()) {
      if right {
        hash ^= key;
      }
    }
    if let Some(square) = self.phantom() {
      hash ^= keys.en_passant[(square.rank(), square.file())];
    }
    hash
  }
}
