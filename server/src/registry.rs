use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::error::{LobbyError, SubmitError};
use crate::ids::{ConnectionId, MatchId, PlayerId, RecordId};
use crate::messages::{Event, MoveSpec, Seat};
use crate::rating;
use crate::session::{Applied, Match, MatchStatus, Outcome, Seating};
use crate::store::{Identities, MemoryStore, RatingStore, RecordSink};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

struct Attachment {
  id: ConnectionId,
  player: PlayerId,
  connection: Box<dyn Connection>,
}

/// A live match with everything attached to it
struct Table {
  session: Match,
  attachments: Vec<Attachment>,
  waiting: Option<Seat>,
  seats: Option<(Seat, Seat)>,
  record: Option<RecordId>,
  code: Option<String>,
}

impl Table {
  fn new(session: Match) -> Self {
    Self {
      session,
      attachments: Vec::new(),
      waiting: None,
      seats: None,
      record: None,
      code: None,
    }
  }

  fn started_event(&self) -> Option<Event> {
    let (white, black) = self.seats.clone()?;
    Some(Event::MatchStarted {
      match_id: self.session.id(),
      white,
      black,
    })
  }

  /// Deliver to every selected attachment, dropping the ones that fail
  fn deliver(&mut self, event: &Event, selected: impl Fn(&Attachment) -> bool) {
    let match_id = self.session.id();
    self.attachments.retain(|attachment| {
      if !selected(attachment) {
        return true;
      }
      match attachment.connection.send(event) {
        Ok(()) => true,
        Err(error) => {
          warn!(
            match_id = %match_id,
            connection = %attachment.id,
            player = %attachment.player,
            %error,
            "dropping attachment"
          );
          false
        }
      }
    });
  }

  fn broadcast(&mut self, event: &Event) {
    self.deliver(event, |_| true);
  }

  fn broadcast_except(&mut self, sender: &PlayerId, event: &Event) {
    self.deliver(event, |attachment| &attachment.player != sender);
  }

  fn send_to(&mut self, player: &PlayerId, event: &Event) {
    self.deliver(event, |attachment| &attachment.player == player);
  }
}

/// Directory of live matches.
///
/// Each match sits behind its own lock, so operations on one match are applied
/// one at a time while unrelated matches proceed in parallel. A map guard is
/// never held while a match lock is taken.
pub struct Registry {
  matches: DashMap<MatchId, Arc<Mutex<Table>>>,
  codes: DashMap<String, MatchId>,
  identities: Arc<dyn Identities>,
  records: Arc<dyn RecordSink>,
  ratings: Arc<dyn RatingStore>,
  config: ServerConfig,
  next_connection: AtomicU64,
}

impl Registry {
  /// A registry backed by the given collaborators
  #[must_use]
  pub fn new(
    identities: Arc<dyn Identities>,
    records: Arc<dyn RecordSink>,
    ratings: Arc<dyn RatingStore>,
    config: ServerConfig,
  ) -> Self {
    Self {
      matches: DashMap::new(),
      codes: DashMap::new(),
      identities,
      records,
      ratings,
      config,
      next_connection: AtomicU64::new(0),
    }
  }

  /// A registry using one in-memory store for every collaborator
  #[must_use]
  pub fn in_memory(store: &Arc<MemoryStore>, config: ServerConfig) -> Self {
    Self::new(store.clone(), store.clone(), store.clone(), config)
  }

  /// The configuration in use
  #[must_use]
  pub const fn config(&self) -> &ServerConfig {
    &self.config
  }

  /// Number of live matches
  #[must_use]
  pub fn len(&self) -> usize {
    self.matches.len()
  }

  /// Whether no match is live
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.matches.is_empty()
  }

  fn lookup(&self, id: MatchId) -> Result<Arc<Mutex<Table>>, LobbyError> {
    self
      .matches
      .get(&id)
      .map(|table| Arc::clone(table.value()))
      .ok_or(LobbyError::NotFound(id))
  }

  fn lookup_live(&self, id: MatchId) -> Result<Arc<Mutex<Table>>, SubmitError> {
    self.lookup(id).map_err(|_| SubmitError::NotFound(id))
  }

  /// Status of a live match
  #[must_use]
  pub fn status(&self, id: MatchId) -> Option<MatchStatus> {
    Some(self.lookup(id).ok()?.lock().session.status())
  }

  /// FEN of a live match's position
  #[must_use]
  pub fn fen(&self, id: MatchId) -> Option<String> {
    let table = self.lookup(id).ok()?;
    let table = table.lock();
    table.session.position().map(stranger_chess::Position::fen)
  }

  /// The player whose move it is
  #[must_use]
  pub fn player_to_move(&self, id: MatchId) -> Option<PlayerId> {
    let table = self.lookup(id).ok()?;
    let table = table.lock();
    table.session.to_move().cloned()
  }

  fn insert(&self, session: Match) -> MatchId {
    let id = session.id();
    self
      .matches
      .insert(id, Arc::new(Mutex::new(Table::new(session))));
    id
  }

  /// Create an empty public match
  pub fn create_match(&self) -> MatchId {
    let id = self.insert(Match::new(
      MatchId::new(),
      false,
      self.config.abort_plies(),
    ));
    info!(match_id = %id, "match created");
    id
  }

  fn generate_code(&self) -> String {
    rand::thread_rng()
      .sample_iter(&Alphanumeric)
      .take(self.config.code_length())
      .map(|c| char::from(c).to_ascii_uppercase())
      .collect()
  }

  /// Create a private match, returning its id and join code
  pub fn create_private(&self) -> (MatchId, String) {
    let id = MatchId::new();
    let code = loop {
      let code = self.generate_code();
      if let Entry::Vacant(slot) = self.codes.entry(code.clone()) {
        slot.insert(id);
        break code;
      }
    };
    let mut table = Table::new(Match::new(id, true, self.config.abort_plies()));
    table.code = Some(code.clone());
    self.matches.insert(id, Arc::new(Mutex::new(table)));
    info!(match_id = %id, "private match created");
    (id, code)
  }

  fn seat_for(&self, player: &PlayerId) -> Result<Seat, LobbyError> {
    let profile = self
      .identities
      .lookup(player)
      .ok_or_else(|| LobbyError::UnknownPlayer(player.clone()))?;
    Ok(Seat {
      player: player.clone(),
      name: profile.name,
      rating: profile.rating.unwrap_or_else(|| self.config.default_rating()),
    })
  }

  /// Seat a player. Profiles are looked up once, as each player sits down.
  fn seat(&self, table: &mut Table, player: PlayerId) -> Result<MatchStatus, LobbyError> {
    let joining = self.seat_for(&player)?;
    let waiting_is_white = !self.config.random_colours() || rand::random();
    let id = table.session.id();
    match table.session.seat(player, waiting_is_white)? {
      Seating::Waiting => {
        info!(match_id = %id, player = %joining.player, "waiting for opponent");
        table.waiting = Some(joining);
      }
      Seating::Started => {
        let Some(first) = table.waiting.take() else {
          error!(match_id = %id, "match started without a waiting seat");
          return Ok(table.session.status());
        };
        let (white, black) = if table.session.white() == Some(&joining.player) {
          (joining, first)
        } else {
          (first, joining)
        };
        table.record = Some(self.records.open(id, &white.player, &black.player));
        info!(match_id = %id, white = %white.player, black = %black.player, "match started");
        table.seats = Some((white, black));
        if let Some(code) = table.code.take() {
          self.codes.remove(&code);
        }
        if let Some(event) = table.started_event() {
          table.broadcast(&event);
        }
      }
    }
    Ok(table.session.status())
  }

  /// Take a seat in a public match
  pub fn join_match(&self, id: MatchId, player: PlayerId) -> Result<MatchStatus, LobbyError> {
    let table = self.lookup(id)?;
    let mut table = table.lock();
    if table.session.is_private() {
      return Err(LobbyError::Private(id));
    }
    self.seat(&mut table, player)
  }

  /// Join the first public match with a free seat
  pub fn join_open(&self, player: PlayerId) -> Result<(MatchId, MatchStatus), LobbyError> {
    let candidates: Vec<(MatchId, Arc<Mutex<Table>>)> = self
      .matches
      .iter()
      .map(|entry| (*entry.key(), Arc::clone(entry.value())))
      .collect();
    for (id, table) in candidates {
      let mut table = table.lock();
      if table.session.is_open() && !table.session.has_player(&player) {
        return Ok((id, self.seat(&mut table, player)?));
      }
    }
    Err(LobbyError::NoOpenMatch)
  }

  /// Join an open public match, or create one and wait in it
  pub fn join_random(&self, player: PlayerId) -> Result<(MatchId, MatchStatus), LobbyError> {
    self.seat_for(&player)?;
    match self.join_open(player.clone()) {
      Err(LobbyError::NoOpenMatch) => {
        let id = self.create_match();
        Ok((id, self.join_match(id, player)?))
      }
      joined => joined,
    }
  }

  /// Join a private match by its code
  pub fn join_private(
    &self,
    code: &str,
    player: PlayerId,
  ) -> Result<(MatchId, MatchStatus), LobbyError> {
    let code = code.trim().to_ascii_uppercase();
    let id = self
      .codes
      .get(&code)
      .map(|entry| *entry.value())
      .ok_or_else(|| LobbyError::UnknownCode(code.clone()))?;
    let table = self.lookup(id)?;
    let mut table = table.lock();
    Ok((id, self.seat(&mut table, player)?))
  }

  /// Validate and play a move.
  ///
  /// A refusal is only reported to the submitting player's connections.
  pub fn submit_move(
    &self,
    id: MatchId,
    player: &PlayerId,
    request: MoveSpec,
  ) -> Result<Applied, SubmitError> {
    let table = self.lookup_live(id)?;
    let mut table = table.lock();
    let result = request
      .decode()
      .map_err(SubmitError::from)
      .and_then(|r#move| table.session.submit_move(player, r#move));
    match result {
      Err(error) => {
        debug!(match_id = %id, player = %player, %error, "move rejected");
        table.send_to(
          player,
          &Event::MoveRejected {
            match_id: id,
            reason: error.to_string(),
          },
        );
        Err(error)
      }
      Ok(applied) => {
        let notation = applied.r#move.to_string();
        if let Some(record) = table.record {
          self.records.append(record, &notation, &applied.fen);
        }
        table.broadcast(&Event::MoveApplied {
          match_id: id,
          notation,
          fen: applied.fen.clone(),
        });
        if let Some(outcome) = applied.outcome {
          self.finish(&mut table, outcome);
        }
        Ok(applied)
      }
    }
  }

  /// Offer a draw, ending the match if the opponent has offered too
  pub fn offer_draw(&self, id: MatchId, player: &PlayerId) -> Result<Option<Outcome>, SubmitError> {
    let table = self.lookup_live(id)?;
    let mut table = table.lock();
    match table.session.offer_draw(player) {
      Ok(Some(outcome)) => {
        self.finish(&mut table, outcome);
        Ok(Some(outcome))
      }
      Ok(None) => {
        let white = table.session.side_of(player).unwrap_or_default();
        table.broadcast_except(
          player,
          &Event::DrawOffered {
            match_id: id,
            white,
          },
        );
        Ok(None)
      }
      Err(error) => {
        self.reject(&mut table, player, &error);
        Err(error)
      }
    }
  }

  /// Accept the opponent's draw offer
  pub fn accept_draw(&self, id: MatchId, player: &PlayerId) -> Result<Outcome, SubmitError> {
    let table = self.lookup_live(id)?;
    let mut table = table.lock();
    match table.session.accept_draw(player) {
      Ok(outcome) => {
        self.finish(&mut table, outcome);
        Ok(outcome)
      }
      Err(error) => {
        self.reject(&mut table, player, &error);
        Err(error)
      }
    }
  }

  /// Resign, or abort if the match has barely begun
  pub fn resign(&self, id: MatchId, player: &PlayerId) -> Result<Outcome, SubmitError> {
    let table = self.lookup_live(id)?;
    let mut table = table.lock();
    match table.session.resign(player) {
      Ok(outcome) => {
        self.finish(&mut table, outcome);
        Ok(outcome)
      }
      Err(error) => {
        self.reject(&mut table, player, &error);
        Err(error)
      }
    }
  }

  fn reject(&self, table: &mut Table, player: &PlayerId, error: &SubmitError) {
    let match_id = table.session.id();
    debug!(match_id = %match_id, player = %player, %error, "request rejected");
    table.send_to(
      player,
      &Event::MoveRejected {
        match_id,
        reason: error.to_string(),
      },
    );
  }

  /// Attach a connection for a player or spectator.
  ///
  /// If the match is already under way the connection is told who is playing.
  pub fn attach_connection(
    &self,
    id: MatchId,
    connection: impl Connection + 'static,
    player: PlayerId,
  ) -> Result<ConnectionId, LobbyError> {
    let table = self.lookup(id)?;
    let mut table = table.lock();
    let connection_id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
    let attachment = Attachment {
      id: connection_id,
      player,
      connection: Box::new(connection),
    };
    if table.session.status() == MatchStatus::InProgress {
      if let Some(event) = table.started_event() {
        if let Err(error) = attachment.connection.send(&event) {
          warn!(match_id = %id, connection = %connection_id, %error, "connection closed on attach");
          return Ok(connection_id);
        }
      }
    }
    debug!(match_id = %id, connection = %connection_id, player = %attachment.player, "attached");
    table.attachments.push(attachment);
    Ok(connection_id)
  }

  /// Detach a connection.
  ///
  /// When a seated player loses their last connection the match is aborted in
  /// the opening or forfeited afterwards.
  pub fn detach_connection(
    &self,
    id: MatchId,
    connection: ConnectionId,
  ) -> Result<Option<Outcome>, LobbyError> {
    let table = self.lookup(id)?;
    let mut table = table.lock();
    let Some(index) = table
      .attachments
      .iter()
      .position(|attachment| attachment.id == connection)
    else {
      return Ok(None);
    };
    let attachment = table.attachments.remove(index);
    debug!(match_id = %id, connection = %connection, player = %attachment.player, "detached");
    if table
      .attachments
      .iter()
      .any(|other| other.player == attachment.player)
    {
      return Ok(None);
    }
    match table.session.disconnect(&attachment.player) {
      Ok(outcome) => {
        self.finish(&mut table, outcome);
        Ok(Some(outcome))
      }
      // spectators leave without consequence
      Err(_) => Ok(None),
    }
  }

  /// Settle ratings, close the record, announce the result and drop the match.
  fn finish(&self, table: &mut Table, outcome: Outcome) {
    let id = table.session.id();
    let ratings = table.seats.as_ref().and_then(|(white, black)| {
      let update = rating::update(
        white.rating,
        black.rating,
        outcome.status,
        self.config.k_factor(),
      )?;
      self.ratings.store(&white.player, update.white);
      self.ratings.store(&black.player, update.black);
      Some(update)
    });
    if let Some(record) = table.record {
      self.records.finish(record, outcome.status, outcome.cause);
    }
    let description = outcome.description();
    info!(match_id = %id, status = %outcome.status, "{description}");
    table.broadcast(&Event::MatchEnded {
      match_id: id,
      status: outcome.status,
      cause: outcome.cause,
      description,
      ratings,
      record: table.record,
    });
    if let Some(code) = table.code.take() {
      self.codes.remove(&code);
    }
    self.matches.remove(&id);
    info!(match_id = %id, "match removed");
  }

  /// Abort every live match and empty the registry
  pub fn shutdown(&self) {
    let tables: Vec<Arc<Mutex<Table>>> = self
      .matches
      .iter()
      .map(|entry| Arc::clone(entry.value()))
      .collect();
    for table in tables {
      let mut table = table.lock();
      if let Some(outcome) = table.session.abort() {
        self.finish(&mut table, outcome);
      }
    }
    self.codes.clear();
    info!("registry shut down");
  }
}
