use crate::error::{LobbyError, MoveRejection, SubmitError};
use crate::ids::{MatchId, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;
use stranger_chess::{arbitrate, Gamestate, Hash, Move, PieceType, Position};

/// Where a match is in its lifecycle
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
  /// Created, nobody seated
  NotStarted,
  /// One player is waiting in a public match
  WaitingForOpponent,
  /// A private match waiting for its code to be used
  WaitingPrivate,
  /// Both seats are filled and moves are accepted
  InProgress,
  /// Ended in a draw
  Drawn,
  /// White won
  WhiteWon,
  /// Black won
  BlackWon,
  /// Ended before it counted, ratings are unchanged
  Aborted,
}

impl MatchStatus {
  /// Whether the match is over
  #[must_use]
  pub const fn is_terminal(self) -> bool {
    matches!(
      self,
      Self::Drawn | Self::WhiteWon | Self::BlackWon | Self::Aborted
    )
  }

  /// The status of a match won by one side
  #[must_use]
  pub const fn won_by(white: bool) -> Self {
    if white {
      Self::WhiteWon
    } else {
      Self::BlackWon
    }
  }
}

impl fmt::Display for MatchStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::NotStarted => "not started",
      Self::WaitingForOpponent => "waiting for an opponent",
      Self::WaitingPrivate => "waiting for a private opponent",
      Self::InProgress => "in progress",
      Self::Drawn => "drawn",
      Self::WhiteWon => "won by white",
      Self::BlackWon => "won by black",
      Self::Aborted => "aborted",
    })
  }
}

/// How a match ended
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
  /// The side to move was mated
  Checkmate,
  /// A player resigned
  Resignation,
  /// A player disconnected after the opening
  Abandonment,
  /// The side to move had no moves and was not in check
  Stalemate,
  /// Third occurrence of a position
  Repetition,
  /// 100 half-moves without a pawn move or capture
  FiftyMoveRule,
  /// Both players offered a draw
  Agreement,
  /// Left before the match counted
  Aborted,
}

impl Cause {
  const fn noun(self) -> &'static str {
    match self {
      Self::Checkmate => "checkmate",
      Self::Resignation => "resignation",
      Self::Abandonment => "abandonment",
      Self::Stalemate => "stalemate",
      Self::Repetition => "repetition",
      Self::FiftyMoveRule => "fifty move rule",
      Self::Agreement => "agreement",
      Self::Aborted => "abort",
    }
  }
}

/// The terminal status of a match and why it was reached
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
  /// Drawn, won or aborted
  pub status: MatchStatus,
  /// What ended it
  pub cause: Cause,
}

impl Outcome {
  /// A human readable summary, e.g. "White won by checkmate"
  #[must_use]
  pub fn description(&self) -> String {
    match self.status {
      MatchStatus::WhiteWon => format!("White won by {}", self.cause.noun()),
      MatchStatus::BlackWon => format!("Black won by {}", self.cause.noun()),
      MatchStatus::Drawn => format!("Draw by {}", self.cause.noun()),
      MatchStatus::Aborted => "Game aborted".to_owned(),
      status => format!("Game {status}"),
    }
  }

  fn from_gamestate(state: Gamestate) -> Option<Self> {
    let (status, cause) = match state {
      Gamestate::InProgress => return None,
      Gamestate::Checkmate(white) => (MatchStatus::won_by(white), Cause::Checkmate),
      Gamestate::Stalemate => (MatchStatus::Drawn, Cause::Stalemate),
      Gamestate::Repetition => (MatchStatus::Drawn, Cause::Repetition),
      Gamestate::Move50 => (MatchStatus::Drawn, Cause::FiftyMoveRule),
    };
    Some(Self { status, cause })
  }
}

/// Result of filling a seat
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Seating {
  /// The player waits for an opponent
  Waiting,
  /// The player completed the pair and the match began
  Started,
}

/// A move accepted by a match
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Applied {
  /// The move as played
  pub r#move: Move,
  /// The position after it
  pub fen: String,
  /// Set when the move ended the match
  pub outcome: Option<Outcome>,
}

/// One game between two players.
///
/// Not synchronised: the registry serialises every call on a match.
#[derive(Clone, Debug)]
pub struct Match {
  id: MatchId,
  private: bool,
  abort_plies: usize,
  position: Option<Position>,
  white: Option<PlayerId>,
  black: Option<PlayerId>,
  waiting: Option<PlayerId>,
  moves: Vec<Move>,
  positions: Vec<Hash>,
  last_irreversible: usize,
  draw_offers: [bool; 2],
  status: MatchStatus,
  outcome: Option<Outcome>,
}

impl Match {
  /// An empty match. Private matches wait for a code instead of public matchmaking.
  #[must_use]
  pub fn new(id: MatchId, private: bool, abort_plies: usize) -> Self {
    Self {
      id,
      private,
      abort_plies,
      position: None,
      white: None,
      black: None,
      waiting: None,
      moves: Vec::new(),
      positions: Vec::new(),
      last_irreversible: 0,
      draw_offers: [false; 2],
      status: if private {
        MatchStatus::WaitingPrivate
      } else {
        MatchStatus::NotStarted
      },
      outcome: None,
    }
  }

  /// The match id
  #[must_use]
  pub const fn id(&self) -> MatchId {
    self.id
  }

  /// Whether the match is joined by code
  #[must_use]
  pub const fn is_private(&self) -> bool {
    self.private
  }

  /// The current status
  #[must_use]
  pub const fn status(&self) -> MatchStatus {
    self.status
  }

  /// How the match ended, once it has
  #[must_use]
  pub const fn outcome(&self) -> Option<Outcome> {
    self.outcome
  }

  /// The live position, seeded when the second player sits down
  #[must_use]
  pub const fn position(&self) -> Option<&Position> {
    self.position.as_ref()
  }

  /// Moves played so far
  #[must_use]
  pub fn moves(&self) -> &[Move] {
    &self.moves
  }

  /// The white player
  #[must_use]
  pub const fn white(&self) -> Option<&PlayerId> {
    self.white.as_ref()
  }

  /// The black player
  #[must_use]
  pub const fn black(&self) -> Option<&PlayerId> {
    self.black.as_ref()
  }

  /// The player seated while the match waits for an opponent
  #[must_use]
  pub const fn waiting(&self) -> Option<&PlayerId> {
    self.waiting.as_ref()
  }

  /// Pending draw offers as `[black, white]`
  #[must_use]
  pub const fn draw_offers(&self) -> [bool; 2] {
    self.draw_offers
  }

  /// Whether a public match still has a free seat
  #[must_use]
  pub fn is_open(&self) -> bool {
    !self.private
      && matches!(
        self.status,
        MatchStatus::NotStarted | MatchStatus::WaitingForOpponent
      )
  }

  /// Whether the player holds or waits for a seat
  #[must_use]
  pub fn has_player(&self, player: &PlayerId) -> bool {
    [&self.white, &self.black, &self.waiting]
      .into_iter()
      .any(|seat| seat.as_ref() == Some(player))
  }

  /// `Some(true)` for white, `Some(false)` for black
  #[must_use]
  pub fn side_of(&self, player: &PlayerId) -> Option<bool> {
    if self.white.as_ref() == Some(player) {
      Some(true)
    } else if self.black.as_ref() == Some(player) {
      Some(false)
    } else {
      None
    }
  }

  /// The player whose turn it is
  #[must_use]
  pub fn to_move(&self) -> Option<&PlayerId> {
    let position = self.position.as_ref()?;
    if position.white_to_move {
      self.white.as_ref()
    } else {
      self.black.as_ref()
    }
  }

  /// Seat a player.
  ///
  /// The first player waits; the second completes the pair, colours are assigned
  /// and the starting position is set up.
  pub fn seat(&mut self, player: PlayerId, waiting_is_white: bool) -> Result<Seating, LobbyError> {
    if self.status.is_terminal() {
      return Err(LobbyError::NotFound(self.id));
    }
    if self.white.is_some() || self.black.is_some() {
      return Err(LobbyError::Full(self.id));
    }
    let Some(first) = self.waiting.take() else {
      self.waiting = Some(player);
      if !self.private {
        self.status = MatchStatus::WaitingForOpponent;
      }
      return Ok(Seating::Waiting);
    };
    if first == player {
      self.waiting = Some(first);
      return Err(LobbyError::AlreadySeated(player));
    }
    if waiting_is_white {
      self.white = Some(first);
      self.black = Some(player);
    } else {
      self.white = Some(player);
      self.black = Some(first);
    }
    let position = Position::startpos();
    self.positions = vec![position.hash()];
    self.position = Some(position);
    self.status = MatchStatus::InProgress;
    Ok(Seating::Started)
  }

  fn end(&mut self, status: MatchStatus, cause: Cause) -> Outcome {
    let outcome = Outcome { status, cause };
    self.status = status;
    self.outcome = Some(outcome);
    outcome
  }

  fn seated_side(&self, player: &PlayerId) -> Result<bool, SubmitError> {
    if self.status != MatchStatus::InProgress {
      return Err(SubmitError::Inactive(self.status));
    }
    self
      .side_of(player)
      .ok_or(SubmitError::Rejected(MoveRejection::NotAPlayer))
  }

  /// Validate and play a move for a player, then judge the new position.
  pub fn submit_move(&mut self, player: &PlayerId, r#move: Move) -> Result<Applied, SubmitError> {
    let white = self.seated_side(player)?;
    let Some(position) = self.position.as_mut() else {
      return Err(SubmitError::Inactive(self.status));
    };
    if position.white_to_move != white {
      return Err(MoveRejection::NotYourTurn.into());
    }
    let (start, end) = (r#move.start(), r#move.end());
    let board = &mut position.board;
    let piece = board
      .piece_at(start)
      .ok_or(MoveRejection::NoPiece(start))?;
    if piece.white != white {
      return Err(MoveRejection::NotYourPiece(start).into());
    }
    if !board.is_valid_move(start, end) {
      return Err(MoveRejection::Illegal(r#move).into());
    }
    let promotes = !board.is_castling_move(start, end) && board.promotion_due(start, end);
    match (promotes, r#move.promotion()) {
      (true, None) => return Err(MoveRejection::MissingPromotion(r#move).into()),
      (false, Some(_)) => return Err(MoveRejection::UnexpectedPromotion(r#move).into()),
      (true, Some(kind)) if !kind.is_promotion() => {
        return Err(MoveRejection::Malformed(r#move.to_string()).into())
      }
      _ => (),
    }

    let captured = board.play(r#move);
    let irreversible = piece.kind == PieceType::Pawn || captured.is_some();
    if irreversible {
      position.halfmoves = 0;
    } else {
      position.halfmoves += 1;
    }
    if !position.white_to_move {
      position.fullmoves += 1;
    }
    position.white_to_move = !position.white_to_move;
    self.moves.push(r#move);
    self.draw_offers = [false; 2];
    self.positions.push(position.hash());
    if irreversible {
      self.last_irreversible = self.positions.len() - 1;
    }

    let state = arbitrate(
      &mut position.board,
      position.white_to_move,
      position.halfmoves,
      &self.positions,
      self.last_irreversible,
    );
    let fen = position.fen();
    let outcome =
      Outcome::from_gamestate(state).map(|outcome| self.end(outcome.status, outcome.cause));
    Ok(Applied {
      r#move,
      fen,
      outcome,
    })
  }

  /// Record a draw offer. Returns the outcome if the opponent had already offered one.
  pub fn offer_draw(&mut self, player: &PlayerId) -> Result<Option<Outcome>, SubmitError> {
    let white = self.seated_side(player)?;
    self.draw_offers[usize::from(white)] = true;
    if self.draw_offers == [true; 2] {
      Ok(Some(self.end(MatchStatus::Drawn, Cause::Agreement)))
    } else {
      Ok(None)
    }
  }

  /// Accept the opponent's pending draw offer.
  pub fn accept_draw(&mut self, player: &PlayerId) -> Result<Outcome, SubmitError> {
    let white = self.seated_side(player)?;
    if !self.draw_offers[usize::from(!white)] {
      return Err(MoveRejection::NoDrawOffer.into());
    }
    self.draw_offers[usize::from(white)] = true;
    Ok(self.end(MatchStatus::Drawn, Cause::Agreement))
  }

  /// Resign. Within the opening half-moves this aborts instead.
  pub fn resign(&mut self, player: &PlayerId) -> Result<Outcome, SubmitError> {
    self.forfeit(player, Cause::Resignation)
  }

  /// A player left. Within the opening half-moves this aborts, later it loses.
  pub fn disconnect(&mut self, player: &PlayerId) -> Result<Outcome, SubmitError> {
    self.forfeit(player, Cause::Abandonment)
  }

  fn forfeit(&mut self, player: &PlayerId, cause: Cause) -> Result<Outcome, SubmitError> {
    if self.status.is_terminal() {
      return Err(SubmitError::Inactive(self.status));
    }
    if self.status != MatchStatus::InProgress {
      return if self.waiting.as_ref() == Some(player) {
        Ok(self.end(MatchStatus::Aborted, Cause::Aborted))
      } else {
        Err(MoveRejection::NotAPlayer.into())
      };
    }
    let white = self.seated_side(player)?;
    if self.moves.len() < self.abort_plies {
      Ok(self.end(MatchStatus::Aborted, Cause::Aborted))
    } else {
      Ok(self.end(MatchStatus::won_by(!white), cause))
    }
  }

  /// End a live match without a result
  pub fn abort(&mut self) -> Option<Outcome> {
    if self.status.is_terminal() {
      None
    } else {
      Some(self.end(MatchStatus::Aborted, Cause::Aborted))
    }
  }
}
