#![forbid(unsafe_code)]
#![warn(missing_docs, unused)]
//! Match coordination for Stranger Chess
//!
//! Seats players, serialises their moves through the rules engine,
//! fans events out to attached connections and settles ratings when
//! a match ends.

pub use crate::config::ServerConfig;
pub use crate::connection::Connection;
pub use crate::error::{ConfigError, DeliveryError, LobbyError, MoveRejection, SubmitError};
pub use crate::ids::{ConnectionId, MatchId, PlayerId, RecordId};
pub use crate::messages::{Event, MoveSpec, Seat};
pub use crate::rating::RatingUpdate;
pub use crate::registry::Registry;
pub use crate::session::{Applied, Cause, Match, MatchStatus, Outcome, Seating};
pub use crate::store::{Identities, MemoryStore, Profile, RatingStore, Record, RecordSink};

/// Environment driven settings
pub mod config;
mod connection;
mod error;
mod ids;
mod messages;
/// Elo calculations
pub mod rating;
mod registry;
mod session;
mod store;
