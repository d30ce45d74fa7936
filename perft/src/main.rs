use stranger_chess::perft::perft;
use stranger_chess::positions::{KIWIPETE, MIDDLEGAME, PROMOTIONS, ROOK_ENDGAME, STARTPOS};
use stranger_chess::Position;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use threadpool::ThreadPool;

// The legality probe is unmake based, so this is slower than a bitboard generator
const LIMIT: usize = 500_000;

fn print_time(fen: &str, time: Duration, depth: usize, nodes: usize) {
  let secs = time.as_secs();
  let millis = time.as_millis();
  let kilonodes = nodes / usize::max(millis as usize, 1);
  let time = if secs >= 30 {
    format!("{secs} s")
  } else {
    format!("{millis} ms")
  };
  println!("{fen} {time} for depth {depth} ({kilonodes} knodes/s)");
}

fn perft_test(fen: &'static str, results: &[usize]) {
  let position: Position = match fen.parse() {
    Ok(position) => position,
    Err(error) => panic!("{fen}: {error}"),
  };
  assert_eq!(position.to_string(), fen);
  let start = Instant::now();
  let mut max = 0;
  let mut nodes = 0;
  for (i, result) in results.iter().enumerate() {
    if result <= &LIMIT {
      max = i;
      nodes += result;
    } else {
      break;
    }
  }
  #[cfg(feature = "parallel")]
  let pool = ThreadPool::default();

  for (i, result) in results.iter().enumerate().take(max) {
    let position = position.clone();
    let result = *result;
    let closure = move || assert_eq!(perft(&position, i), result, "{fen} depth {i}");
    #[cfg(feature = "parallel")]
    pool.execute(closure);
    #[cfg(not(feature = "parallel"))]
    closure();
  }

  // split the deepest search by root move
  let (tx, rx) = channel();
  let mut board = position.board.clone();
  let moves = board.legal_moves(position.white_to_move);
  let num_moves = moves.len();
  for r#move in moves {
    let tx = tx.clone();
    let mut child = Position {
      white_to_move: !position.white_to_move,
      ..position.clone()
    };
    child.board.play(r#move);
    let closure = move || {
      // the receiver outlives every job
      let _ = tx.send(perft(&child, max - 1));
    };
    #[cfg(feature = "parallel")]
    pool.execute(closure);
    #[cfg(not(feature = "parallel"))]
    closure();
  }
  #[cfg(feature = "parallel")]
  pool.join();
  assert_eq!(rx.iter().take(num_moves).sum::<usize>(), results[max]);
  print_time(fen, start.elapsed(), max, nodes);
}

fn main() {
  let start = Instant::now();

  perft_test(STARTPOS, &[1, 20, 400, 8_902, 197_281, 4_865_609]);

  // positions 2-6 from https://www.chessprogramming.org/Perft_Results
  perft_test(KIWIPETE, &[1, 48, 2_039, 97_862, 4_085_603]);
  perft_test(ROOK_ENDGAME, &[1, 14, 191, 2_812, 43_238, 674_624]);
  perft_test(PROMOTIONS, &[1, 6, 264, 9_467, 422_333, 15_833_292]);
  perft_test(
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    &[1, 44, 1_486, 62_379, 2_103_487],
  );
  perft_test(MIDDLEGAME, &[1, 46, 2_079, 89_890, 3_894_594]);

  println!("{} ms", start.elapsed().as_millis());
}
