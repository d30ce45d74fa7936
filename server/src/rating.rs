//! Elo rating updates

use crate::session::MatchStatus;
use serde::{Deserialize, Serialize};

/// New ratings after a match, with the change for each side
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
  /// White's new rating
  pub white: i32,
  /// Black's new rating
  pub black: i32,
  /// How far white's rating moved
  pub white_change: i32,
  /// How far black's rating moved
  pub black_change: i32,
}

/// Expected score of a player against an opponent, between 0 and 1
#[must_use]
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
  1.0 / (1.0 + 10f64.powf(f64::from(opponent - rating) / 400.0))
}

/// Rating change for a player scoring `score` (1, 0.5 or 0) against an opponent
#[must_use]
pub fn rating_change(rating: i32, opponent: i32, score: f64, k_factor: f64) -> i32 {
  (k_factor * (score - expected_score(rating, opponent))).round() as i32
}

/// Ratings after a decided or drawn match; `None` for aborted or live matches.
#[must_use]
pub fn update(white: i32, black: i32, status: MatchStatus, k_factor: f64) -> Option<RatingUpdate> {
  let white_score = match status {
    MatchStatus::WhiteWon => 1.0,
    MatchStatus::BlackWon => 0.0,
    MatchStatus::Drawn => 0.5,
    _ => return None,
  };
  let white_change = rating_change(white, black, white_score, k_factor);
  let black_change = rating_change(black, white, 1.0 - white_score, k_factor);
  Some(RatingUpdate {
    white: white + white_change,
    black: black + black_change,
    white_change,
    black_change,
  })
}
