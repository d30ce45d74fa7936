use crate::ids::{MatchId, PlayerId, RecordId};
use crate::session::{Cause, MatchStatus};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Display data for an account
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Profile {
  /// Name shown to the opponent
  pub name: String,
  /// `None` for accounts that have not played a rated match
  pub rating: Option<i32>,
}

/// Looks up accounts by their external id
pub trait Identities: Send + Sync {
  /// The account's profile, or `None` if it does not exist
  fn lookup(&self, player: &PlayerId) -> Option<Profile>;
}

/// Append-only storage for finished and ongoing match records
pub trait RecordSink: Send + Sync {
  /// Start a record when both players are seated
  fn open(&self, match_id: MatchId, white: &PlayerId, black: &PlayerId) -> RecordId;
  /// Add a move and the position it produced
  fn append(&self, record: RecordId, r#move: &str, fen: &str);
  /// Close the record with the final result
  fn finish(&self, record: RecordId, status: MatchStatus, cause: Cause);
}

/// Writes updated ratings back to the account store
pub trait RatingStore: Send + Sync {
  /// Save a player's new rating
  fn store(&self, player: &PlayerId, rating: i32);
}

/// A persisted match
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
  /// The match it records
  pub match_id: MatchId,
  /// The white player
  pub white: PlayerId,
  /// The black player
  pub black: PlayerId,
  /// Each move in long algebraic notation with the FEN after it
  pub moves: Vec<(String, String)>,
  /// Set once the match is over
  pub result: Option<(MatchStatus, Cause)>,
}

/// Keeps accounts and records in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
  profiles: Mutex<HashMap<PlayerId, Profile>>,
  records: Mutex<Vec<Record>>,
}

impl MemoryStore {
  /// An empty store
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Create or replace an account
  pub fn register(&self, player: impl Into<PlayerId>, name: &str, rating: Option<i32>) {
    self.profiles.lock().insert(
      player.into(),
      Profile {
        name: name.to_owned(),
        rating,
      },
    );
  }

  /// The stored rating of an account
  #[must_use]
  pub fn rating(&self, player: &PlayerId) -> Option<i32> {
    self.profiles.lock().get(player)?.rating
  }

  /// A copy of a record
  #[must_use]
  pub fn record(&self, record: RecordId) -> Option<Record> {
    let index = usize::try_from(record.0).ok()?;
    self.records.lock().get(index).cloned()
  }
}

impl Identities for MemoryStore {
  fn lookup(&self, player: &PlayerId) -> Option<Profile> {
    self.profiles.lock().get(player).cloned()
  }
}

impl RecordSink for MemoryStore {
  fn open(&self, match_id: MatchId, white: &PlayerId, black: &PlayerId) -> RecordId {
    let mut records = self.records.lock();
    records.push(Record {
      match_id,
      white: white.clone(),
      black: black.clone(),
      moves: Vec::new(),
      result: None,
    });
    RecordId(records.len() as u64 - 1)
  }

  fn append(&self, record: RecordId, r#move: &str, fen: &str) {
    if let Some(record) = self.records.lock().get_mut(record.0 as usize) {
      record.moves.push((r#move.to_owned(), fen.to_owned()));
    }
  }

  fn finish(&self, record: RecordId, status: MatchStatus, cause: Cause) {
    if let Some(record) = self.records.lock().get_mut(record.0 as usize) {
      record.result = Some((status, cause));
    }
  }
}

impl RatingStore for MemoryStore {
  fn store(&self, player: &PlayerId, rating: i32) {
    if let Some(profile) = self.profiles.lock().get_mut(player) {
      profile.rating = Some(rating);
    }
  }
}
