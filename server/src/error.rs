use crate::ids::{MatchId, PlayerId};
use crate::session::MatchStatus;
use stranger_chess::{Move, Square};
use thiserror::Error;

/// Failures while finding or joining a match
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LobbyError {
  /// No live match has this id
  #[error("match {0} not found")]
  NotFound(MatchId),
  /// Both seats are taken
  #[error("match {0} is full")]
  Full(MatchId),
  /// Nobody is waiting for an opponent
  #[error("no open match available")]
  NoOpenMatch,
  /// No private match uses this code
  #[error("no private match with code {0}")]
  UnknownCode(String),
  /// Private matches are joined by code
  #[error("match {0} is private")]
  Private(MatchId),
  /// The identity service does not know this player
  #[error("unknown player {0}")]
  UnknownPlayer(PlayerId),
  /// The player is already waiting in this match
  #[error("{0} is already seated")]
  AlreadySeated(PlayerId),
}

/// Why a move or draw request was refused. The board is left unchanged.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MoveRejection {
  /// The submitter does not hold either seat
  #[error("not a player in this match")]
  NotAPlayer,
  /// The other side is to move
  #[error("not your turn")]
  NotYourTurn,
  /// The origin square is empty
  #[error("no piece on {0}")]
  NoPiece(Square),
  /// The origin holds an opposing piece
  #[error("the piece on {0} is not yours")]
  NotYourPiece(Square),
  /// The move could not be decoded
  #[error("malformed move: {0}")]
  Malformed(String),
  /// The destination is not reachable or leaves the king in check
  #[error("illegal move: {0}")]
  Illegal(Move),
  /// A pawn reached the last rank without a promotion choice
  #[error("promotion required for {0}")]
  MissingPromotion(Move),
  /// A promotion was given for a move that does not promote
  #[error("{0} does not promote")]
  UnexpectedPromotion(Move),
  /// There is no opposing draw offer to accept
  #[error("no draw offer to accept")]
  NoDrawOffer,
}

/// Failures of in-match operations
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SubmitError {
  /// No live match has this id
  #[error("match {0} not found")]
  NotFound(MatchId),
  /// The match has not started or is already over
  #[error("match is {0}")]
  Inactive(MatchStatus),
  /// The request was refused
  #[error(transparent)]
  Rejected(#[from] MoveRejection),
}

/// A message could not be handed to a connection
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum DeliveryError {
  /// The receiving side has gone away
  #[error("connection closed")]
  Closed,
}

/// A configuration value could not be used
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
  /// The value does not parse as the parameter's type
  #[error("invalid value {value:?} for {key}")]
  Invalid {
    /// The environment key
    key: &'static str,
    /// The rejected text
    value: String,
  },
  /// The value must be greater than zero
  #[error("{0} must be positive")]
  NotPositive(&'static str),
}
