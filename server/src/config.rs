use crate::error::ConfigError;
use std::str::FromStr;

/// Elo sensitivity constant
pub const K_FACTOR_KEY: &str = "STRANGER_K_FACTOR";
/// Rating given to accounts that have none yet
pub const DEFAULT_RATING_KEY: &str = "STRANGER_DEFAULT_RATING";
/// Resigning or leaving before this many half-moves aborts the match
pub const ABORT_PLIES_KEY: &str = "STRANGER_ABORT_PLIES";
/// Length of private match codes
pub const CODE_LENGTH_KEY: &str = "STRANGER_PRIVATE_CODE_LENGTH";
/// Whether colours are assigned at random when the second player sits down
pub const RANDOM_COLOURS_KEY: &str = "STRANGER_RANDOM_COLOURS";

/// A Configuration parameter value.
/// Only Modified when the environment sets it, so defaults can change between releases.
#[derive(Clone, Debug)]
enum Value<T> {
  Modified(T),
  Default,
}

trait Parameter {
  type Type: FromStr + Clone;
  const KEY: &'static str;

  fn default_value() -> Self::Type;
}

fn load<P: Parameter>(
  lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Value<P::Type>, ConfigError> {
  match lookup(P::KEY) {
    Some(text) => text
      .trim()
      .parse()
      .map(Value::Modified)
      .map_err(|_| ConfigError::Invalid {
        key: P::KEY,
        value: text,
      }),
    None => Ok(Value::Default),
  }
}

fn get_value<P: Parameter>(raw: &Value<P::Type>) -> P::Type {
  match raw {
    Value::Modified(value) => value.clone(),
    Value::Default => P::default_value(),
  }
}

struct KFactor;

impl Parameter for KFactor {
  type Type = f64;
  const KEY: &'static str = K_FACTOR_KEY;

  fn default_value() -> f64 {
    32.0
  }
}

struct DefaultRating;

impl Parameter for DefaultRating {
  type Type = i32;
  const KEY: &'static str = DEFAULT_RATING_KEY;

  fn default_value() -> i32 {
    1200
  }
}

struct AbortPlies;

impl Parameter for AbortPlies {
  type Type = usize;
  const KEY: &'static str = ABORT_PLIES_KEY;

  fn default_value() -> usize {
    2
  }
}

struct CodeLength;

impl Parameter for CodeLength {
  type Type = usize;
  const KEY: &'static str = CODE_LENGTH_KEY;

  fn default_value() -> usize {
    6
  }
}

struct RandomColours;

impl Parameter for RandomColours {
  type Type = bool;
  const KEY: &'static str = RANDOM_COLOURS_KEY;

  fn default_value() -> bool {
    true
  }
}

/// Tunables for the match registry
#[derive(Clone, Debug)]
pub struct ServerConfig {
  k_factor: Value<f64>,
  default_rating: Value<i32>,
  abort_plies: Value<usize>,
  code_length: Value<usize>,
  random_colours: Value<bool>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      k_factor: Value::Default,
      default_rating: Value::Default,
      abort_plies: Value::Default,
      code_length: Value::Default,
      random_colours: Value::Default,
    }
  }
}

impl ServerConfig {
  /// Read every parameter from the process environment
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Read every parameter through a key lookup; missing keys keep their defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let config = Self {
      k_factor: load::<KFactor>(&lookup)?,
      default_rating: load::<DefaultRating>(&lookup)?,
      abort_plies: load::<AbortPlies>(&lookup)?,
      code_length: load::<CodeLength>(&lookup)?,
      random_colours: load::<RandomColours>(&lookup)?,
    };
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if !(self.k_factor() > 0.0) {
      return Err(ConfigError::NotPositive(K_FACTOR_KEY));
    }
    if self.code_length() == 0 {
      return Err(ConfigError::NotPositive(CODE_LENGTH_KEY));
    }
    Ok(())
  }

  /// Elo sensitivity constant
  #[must_use]
  pub fn k_factor(&self) -> f64 {
    get_value::<KFactor>(&self.k_factor)
  }

  /// Rating used for accounts without one
  #[must_use]
  pub fn default_rating(&self) -> i32 {
    get_value::<DefaultRating>(&self.default_rating)
  }

  /// Half-moves a match needs before leaving it counts as a loss
  #[must_use]
  pub fn abort_plies(&self) -> usize {
    get_value::<AbortPlies>(&self.abort_plies)
  }

  /// Length of generated private codes
  #[must_use]
  pub fn code_length(&self) -> usize {
    get_value::<CodeLength>(&self.code_length)
  }

  /// Whether seating randomises colours
  #[must_use]
  pub fn random_colours(&self) -> bool {
    get_value::<RandomColours>(&self.random_colours)
  }

  /// Seat the first joiner as white instead of flipping a coin
  #[must_use]
  pub fn with_fixed_colours(mut self) -> Self {
    self.random_colours = Value::Modified(false);
    self
  }

  /// Override the Elo sensitivity constant
  #[must_use]
  pub fn with_k_factor(mut self, k_factor: f64) -> Self {
    self.k_factor = Value::Modified(k_factor);
    self
  }
}
