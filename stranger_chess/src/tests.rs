use crate::perft::perft;
use crate::positions::{KIWIPETE, PROMOTIONS, ROOK_ENDGAME, STARTPOS};
use crate::{
  arbitrate, Board, FenError, Gamestate, Hash, Move, MoveParseError, PieceType, Position, Square,
};

fn position(fen: &str) -> Position {
  fen.parse().unwrap()
}

fn square(name: &str) -> Square {
  name.parse().unwrap()
}

/// Plays moves the way a match does, keeping the clocks and position history.
struct Game {
  position: Position,
  history: Vec<Hash>,
  last_irreversible: usize,
}

impl Game {
  fn new(position: Position) -> Self {
    Self {
      history: vec![position.hash()],
      position,
      last_irreversible: 0,
    }
  }

  fn play(&mut self, text: &str) -> Gamestate {
    let r#move: Move = text.parse().unwrap();
    let board = &mut self.position.board;
    assert!(
      board.is_valid_move(r#move.start(), r#move.end()),
      "{text} should be legal"
    );
    let pawn = board.piece_at(r#move.start()).unwrap().kind == PieceType::Pawn;
    let captured = board.play(r#move);
    self.position.white_to_move = !self.position.white_to_move;
    if pawn || captured.is_some() {
      self.position.halfmoves = 0;
    } else {
      self.position.halfmoves += 1;
    }
    self.history.push(self.position.hash());
    if pawn || captured.is_some() {
      self.last_irreversible = self.history.len() - 1;
    }
    arbitrate(
      &mut self.position.board,
      self.position.white_to_move,
      self.position.halfmoves,
      &self.history,
      self.last_irreversible,
    )
  }

  fn is_legal(&mut self, text: &str) -> bool {
    let r#move: Move = text.parse().unwrap();
    self
      .position
      .board
      .is_valid_move(r#move.start(), r#move.end())
  }
}

fn play_all(game: &mut Game, moves: &[&str]) -> Gamestate {
  let mut state = Gamestate::InProgress;
  for r#move in moves {
    assert_eq!(state, Gamestate::InProgress);
    state = game.play(r#move);
  }
  state
}

#[test]
fn startpos_matches_fen() {
  assert_eq!(Position::startpos(), position(STARTPOS));
  assert_eq!(Position::startpos().fen(), STARTPOS);
}

#[test]
fn fen_round_trip() {
  for fen in [KIWIPETE, ROOK_ENDGAME, PROMOTIONS] {
    assert_eq!(position(fen).to_string(), fen);
  }
}

#[test]
fn fen_errors() {
  assert_eq!(
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w - - 0 1".parse::<Position>(),
    Err(FenError::KingCount {
      colour: "white",
      count: 0
    })
  );
  assert_eq!(
    "rnbqkbnr/ppppxppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse::<Position>(),
    Err(FenError::InvalidPiece('x'))
  );
  assert_eq!(
    "rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse::<Position>(),
    Err(FenError::RankCount(7))
  );
  assert_eq!(
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR".parse::<Position>(),
    Err(FenError::MissingFields)
  );
}

#[test]
fn move_notation() {
  let promotion: Move = "e7e8q".parse().unwrap();
  assert_eq!(promotion.promotion(), Some(PieceType::Queen));
  assert_eq!(promotion.to_string(), "e7e8q");
  assert_eq!(
    "e1h1".parse::<Move>().unwrap(),
    Move::new(square("e1"), square("h1"))
  );
  assert_eq!("e2".parse::<Move>(), Err(MoveParseError::Length(2)));
  assert_eq!("e7e8k".parse::<Move>(), Err(MoveParseError::Promotion('k')));
  assert!(matches!(
    "i2i4".parse::<Move>(),
    Err(MoveParseError::Square(_))
  ));
}

#[test]
#[should_panic]
fn off_board_square() {
  let _ = Square::new(8, 0);
}

#[test]
fn perft_startpos() {
  let startpos = Position::startpos();
  assert_eq!(perft(&startpos, 1), 20);
  assert_eq!(perft(&startpos, 2), 400);
  assert_eq!(perft(&startpos, 3), 8_902);
}

#[test]
fn perft_kiwipete() {
  let kiwipete = position(KIWIPETE);
  assert_eq!(perft(&kiwipete, 1), 48);
  assert_eq!(perft(&kiwipete, 2), 2_039);
}

#[test]
fn perft_rook_endgame() {
  let endgame = position(ROOK_ENDGAME);
  assert_eq!(perft(&endgame, 1), 14);
  assert_eq!(perft(&endgame, 2), 191);
  assert_eq!(perft(&endgame, 3), 2_812);
}

#[test]
fn perft_promotions() {
  let promotions = position(PROMOTIONS);
  assert_eq!(perft(&promotions, 1), 6);
  assert_eq!(perft(&promotions, 2), 264);
}

#[test]
fn scholars_mate() {
  let mut game = Game::new(Position::startpos());
  let state = play_all(
    &mut game,
    &["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"],
  );
  assert_eq!(state, Gamestate::Checkmate(true));
  assert!(game.position.board.is_king_in_check(false));
  assert!(!game.position.board.can_side_move(false));
}

#[test]
fn stalemate() {
  let mut board = position("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").board;
  assert!(!board.is_king_in_check(false));
  assert_eq!(
    arbitrate(&mut board, false, 0, &[], 0),
    Gamestate::Stalemate
  );
}

#[test]
fn castling_both_ways() {
  let mut game = Game::new(position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1"));
  assert!(game.is_legal("e1h1"));
  assert!(game.is_legal("e1a1"));

  let mut short = game.position.board.clone();
  short.play("e1h1".parse().unwrap());
  assert_eq!(short.piece_at(square("g1")).unwrap().kind, PieceType::King);
  assert_eq!(short.piece_at(square("f1")).unwrap().kind, PieceType::Rook);
  assert!(short.piece_at(square("e1")).is_none());
  assert!(short.piece_at(square("h1")).is_none());
  assert_eq!(short.king(true), Some(square("g1")));

  let mut long = game.position.board.clone();
  long.play("e1a1".parse().unwrap());
  assert_eq!(long.piece_at(square("c1")).unwrap().kind, PieceType::King);
  assert_eq!(long.piece_at(square("d1")).unwrap().kind, PieceType::Rook);
  assert!(long.piece_at(square("a1")).is_none());
  assert!(long.piece_at(square("b1")).is_none());
}

#[test]
fn castling_blocked() {
  let mut queenside = Game::new(position("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1"));
  assert!(!queenside.is_legal("e1a1"));
  assert!(queenside.is_legal("e1h1"));

  let mut kingside = Game::new(position("r3k2r/8/8/8/8/8/8/R3KB1R w KQkq - 0 1"));
  assert!(kingside.is_legal("e1a1"));
  assert!(!kingside.is_legal("e1h1"));

  let mut black = Game::new(position("r2qk1nr/8/8/8/8/8/8/4K3 b kq - 0 1"));
  assert!(!black.is_legal("e8a8"));
  assert!(!black.is_legal("e8h8"));
}

#[test]
fn castling_through_attack() {
  // in check
  let mut game = Game::new(position("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1"));
  assert!(!game.is_legal("e1h1"));
  assert!(!game.is_legal("e1a1"));

  // transit square attacked
  let mut game = Game::new(position("5rk1/8/8/8/8/8/8/R3K2R w KQ - 0 1"));
  assert!(!game.is_legal("e1h1"));
  assert!(game.is_legal("e1a1"));

  // destination attacked
  let mut game = Game::new(position("6rk/8/8/8/8/8/8/R3K2R w KQ - 0 1"));
  assert!(!game.is_legal("e1h1"));
  assert!(game.is_legal("e1a1"));

  // only the rook's path is attacked
  let mut game = Game::new(position("1r4k1/8/8/8/8/8/8/R3K2R w KQ - 0 1"));
  assert!(game.is_legal("e1a1"));
}

#[test]
fn castling_needs_unmoved_rook() {
  let mut game = Game::new(position("r3k2r/8/8/8/8/8/8/R3K2R w Kkq - 0 1"));
  assert!(game.is_legal("e1h1"));
  assert!(!game.is_legal("e1a1"));
  assert_eq!(game.position.board.castling_rights(), [true, false, true, true]);

  play_all(&mut game, &["h1h2", "a8a7", "h2h1"]);
  assert!(!game.is_legal("e8a8"));
  assert!(game.is_legal("e8h8"));
  assert_eq!(game.position.board.castling_rights(), [false, false, true, false]);
}

#[test]
fn en_passant_immediately() {
  let mut game = Game::new(Position::startpos());
  play_all(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5"]);
  assert_eq!(game.position.board.phantom(), Some(square("d6")));
  assert!(!game.is_legal("e5f6"));
  assert_eq!(game.play("e5d6"), Gamestate::InProgress);
  let board = &game.position.board;
  assert!(board.piece_at(square("d5")).is_none());
  assert!(board.piece_at(square("e5")).is_none());
  let pawn = board.piece_at(square("d6")).unwrap();
  assert_eq!(pawn.kind, PieceType::Pawn);
  assert!(pawn.white);
  assert_eq!(game.position.halfmoves, 0);
}

#[test]
fn en_passant_expires() {
  let mut game = Game::new(Position::startpos());
  play_all(
    &mut game,
    &["e2e4", "a7a6", "e4e5", "d7d5", "h2h3", "h7h6"],
  );
  assert_eq!(game.position.board.phantom(), None);
  assert!(!game.is_legal("e5d6"));
}

#[test]
fn own_phantom_is_not_a_target() {
  let mut game = Game::new(position("4k3/8/8/8/8/8/PP6/4K3 w - - 0 1"));
  game.play("a2a4");
  assert_eq!(game.position.board.phantom(), Some(square("a3")));
  let pawn = game.position.board.piece_at(square("b2")).unwrap();
  assert!(!game
    .position
    .board
    .threatened_squares(&pawn)
    .contains(&square("a3")));
}

#[test]
fn promotion_kinds() {
  let mut board = position("8/P6k/8/8/8/8/8/K7 w - - 0 1").board;
  let moves = board.legal_moves(true);
  let promotions: Vec<&Move> = moves
    .iter()
    .filter(|r#move| r#move.promotion().is_some())
    .collect();
  assert_eq!(promotions.len(), 4);

  for kind in [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
  ] {
    let mut promoted = board.clone();
    assert!(promoted.promotion_due(square("a7"), square("a8")));
    promoted.play(Move::new(square("a7"), square("a8")).with_promotion(kind));
    let piece = promoted.piece_at(square("a8")).unwrap();
    assert_eq!(piece.kind, kind);
    assert!(piece.white);
    assert!(promoted.piece_at(square("a7")).is_none());
    for file in 0..8 {
      for rank in 0..8 {
        let other = Square::new(file, rank);
        if other != square("a7") && other != square("a8") {
          assert_eq!(promoted.piece_at(other), board.piece_at(other));
        }
      }
    }
  }
}

#[test]
fn promote_in_place() {
  let mut board = Board::standard();
  board.promote(square("e2"), PieceType::Knight);
  let piece = board.piece_at(square("e2")).unwrap();
  assert_eq!(piece.kind, PieceType::Knight);
  assert!(piece.white);
  assert!(!piece.moved);
}

fn assert_restores(fen: &str) {
  let mut board = position(fen).board;
  for white in [true, false] {
    for piece in board.pieces(white) {
      for end in board.movable_squares(&piece) {
        let before = board.clone();
        let undo = if board.is_castling_move(piece.square, end) {
          board.castle_temporary(piece.square, end)
        } else {
          board.move_temporary(piece.square, end)
        };
        assert_ne!(board, before);
        board.unmove(undo);
        assert_eq!(board, before, "{}{end} was not restored", piece.square);

        board.is_valid_move(piece.square, end);
        assert_eq!(board, before);
      }
    }
  }
}

#[test]
fn temporary_moves_restore() {
  assert_restores(STARTPOS);
  assert_restores(KIWIPETE);
  assert_restores(ROOK_ENDGAME);
  assert_restores(PROMOTIONS);
  assert_restores("rnbqkbnr/ppp2ppp/4p3/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3");
}

#[test]
fn first_move_flag_restored() {
  let mut board = Board::standard();
  let undo = board.move_temporary(square("e2"), square("e4"));
  assert!(board.piece_at(square("e4")).unwrap().moved);
  assert_eq!(board.phantom(), Some(square("e3")));
  board.unmove(undo);
  assert!(!board.piece_at(square("e2")).unwrap().moved);
  assert_eq!(board.phantom(), None);
  assert_eq!(board, Board::standard());
}

#[test]
fn pinned_piece_cannot_move() {
  let mut board = position("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").board;
  assert!(!board.is_valid_move(square("e2"), square("d3")));
  assert!(board
    .legal_moves(true)
    .iter()
    .all(|r#move| r#move.start() != square("e2")));
  assert!(!board.is_valid_move(square("e1"), square("e2")));
}

#[test]
fn legal_moves_keep_king_safe() {
  for fen in [KIWIPETE, ROOK_ENDGAME, PROMOTIONS] {
    let mut position = position(fen);
    let white = position.white_to_move;
    for r#move in position.board.legal_moves(white) {
      let mut board = position.board.clone();
      board.play(r#move);
      assert!(
        !board.is_king_in_check(white),
        "{} leaves the king in check",
        r#move
      );
      for side in [true, false] {
        let kings = board.pieces(side);
        assert_eq!(kings.iter().filter(|p| p.kind == PieceType::King).count(), 1);
      }
    }
  }
}

#[test]
fn empty_start_is_invalid() {
  let mut board = Board::standard();
  assert!(!board.is_valid_move(square("e4"), square("e5")));
  assert_eq!(board.make_move(square("e4"), square("e5")), None);
  assert_eq!(board, Board::standard());
}

#[test]
fn fifty_move_rule() {
  let mut mated = position("R5k1/5ppp/8/8/8/8/8/6K1 b - - 100 60").board;
  assert_eq!(
    arbitrate(&mut mated, false, 100, &[], 0),
    Gamestate::Move50
  );
  assert_eq!(
    arbitrate(&mut mated, false, 99, &[], 0),
    Gamestate::Checkmate(true)
  );

  let mut board = Board::standard();
  assert_eq!(arbitrate(&mut board, true, 99, &[], 0), Gamestate::InProgress);
}

#[test]
fn threefold_repetition() {
  let mut game = Game::new(Position::startpos());
  let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
  assert_eq!(play_all(&mut game, &shuffle), Gamestate::InProgress);
  assert_eq!(play_all(&mut game, &shuffle[..3]), Gamestate::InProgress);
  assert_eq!(game.play(shuffle[3]), Gamestate::Repetition);
}

#[test]
fn repetition_window() {
  let mut board = Board::standard();
  let start = board.hash(true);
  let other = start ^ 1;
  let history = [start, start, other, start, start];
  assert_eq!(
    arbitrate(&mut board, true, 0, &history, 2),
    Gamestate::InProgress
  );
  assert_eq!(
    arbitrate(&mut board, true, 0, &history, 0),
    Gamestate::Repetition
  );
}

#[test]
fn hash_tracks_rights() {
  let plain = position("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1");
  let castling = position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
  assert_ne!(plain.hash(), castling.hash());
  assert_ne!(plain.board.hash(true), plain.board.hash(false));
  assert_eq!(castling.hash(), castling.clone().hash());
}
