//! The record-or-error unit produced by every enumeration step.
//!
//! A scan never aborts on a single bad manifest, table row, or blob entry:
//! each discovered unit becomes one [`Outcome`], either a complete
//! [`GameRecord`] or a [`ScanError`] describing why that unit could not be
//! read. Callers receive the complete sequence and decide for themselves
//! whether a scan with some errors is a failure.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::record::{GameId, GameRecord};

/// An error observed while discovering one unit (or one platform).
///
/// Carries a message plus an optional causing error. Cloneable so outcomes
/// can be stored, split, and merged freely.
#[derive(Debug, Clone)]
pub struct ScanError {
    message: String,
    source: Option<Arc<dyn Error + Send + Sync + 'static>>,
}

impl ScanError {
    /// Create an error from a message alone.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping the causing error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// The error message, without the cause.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for ScanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

/// One discovered unit: a complete record, or the reason there isn't one.
///
/// Invariant: never both. A unit that fails partway yields an explicit
/// error, not a half-filled record.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A fully normalized record.
    Game(GameRecord),
    /// The unit could not be read.
    Error(ScanError),
}

impl Outcome {
    /// Shorthand for an error outcome from a message.
    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error(ScanError::new(message))
    }

    /// Whether this outcome carries a record.
    pub fn is_game(&self) -> bool {
        matches!(self, Outcome::Game(_))
    }

    /// Whether this outcome carries an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    /// The record, if any.
    pub fn game(&self) -> Option<&GameRecord> {
        match self {
            Outcome::Game(game) => Some(game),
            Outcome::Error(_) => None,
        }
    }

    /// The error, if any.
    pub fn err(&self) -> Option<&ScanError> {
        match self {
            Outcome::Game(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }

    /// Consume into the record, if any.
    pub fn into_game(self) -> Option<GameRecord> {
        match self {
            Outcome::Game(game) => Some(game),
            Outcome::Error(_) => None,
        }
    }

    /// Consume into the error, if any.
    pub fn into_err(self) -> Option<ScanError> {
        match self {
            Outcome::Game(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }
}

impl From<GameRecord> for Outcome {
    fn from(game: GameRecord) -> Self {
        Outcome::Game(game)
    }
}

impl From<ScanError> for Outcome {
    fn from(error: ScanError) -> Self {
        Outcome::Error(error)
    }
}

/// Split an outcome sequence into its records and its errors.
pub fn split_outcomes(
    outcomes: impl IntoIterator<Item = Outcome>,
) -> (Vec<GameRecord>, Vec<ScanError>) {
    let mut games = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Game(game) => games.push(game),
            Outcome::Error(error) => errors.push(error),
        }
    }
    (games, errors)
}

/// Collect an outcome sequence into an identity-keyed map plus the errors.
///
/// The first record observed for an identity wins; later duplicates are
/// dropped. Both this and [`split_outcomes`] consume a single enumeration,
/// so callers never pay for a second scan to get the lookup shape.
pub fn collect_by_id(
    outcomes: impl IntoIterator<Item = Outcome>,
) -> (HashMap<GameId, GameRecord>, Vec<ScanError>) {
    let mut games: HashMap<GameId, GameRecord> = HashMap::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Game(game) => {
                games.entry(game.id.clone()).or_insert(game);
            }
            Outcome::Error(error) => errors.push(error),
        }
    }
    (games, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_display_without_source() {
        let error = ScanError::new("unable to find Steam");
        assert_eq!(error.to_string(), "unable to find Steam");
    }

    #[test]
    fn test_scan_error_display_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = ScanError::with_source("failed to read manifest", io);
        let text = error.to_string();
        assert!(text.contains("failed to read manifest"));
        assert!(text.contains("gone"));
        assert!(Error::source(&error).is_some());
    }

    #[test]
    fn test_outcome_accessors() {
        let game = Outcome::from(GameRecord::new("1", "One"));
        let error = Outcome::error("broken");

        assert!(game.is_game() && !game.is_error());
        assert!(error.is_error() && !error.is_game());
        assert_eq!(game.game().map(|g| g.name.as_str()), Some("One"));
        assert_eq!(error.err().map(|e| e.message()), Some("broken"));
    }

    #[test]
    fn test_split_outcomes() {
        let outcomes = vec![
            Outcome::from(GameRecord::new("1", "One")),
            Outcome::error("bad row"),
            Outcome::from(GameRecord::new("2", "Two")),
        ];
        let (games, errors) = split_outcomes(outcomes);
        assert_eq!(games.len(), 2);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_collect_by_id_first_record_wins() {
        let outcomes = vec![
            Outcome::from(GameRecord::new("abc", "First")),
            Outcome::from(GameRecord::new("ABC", "Second")),
        ];
        let (games, errors) = collect_by_id(outcomes);
        assert_eq!(games.len(), 1);
        assert!(errors.is_empty());
        assert_eq!(games[&GameId::new("abc")].name, "First");
    }
}
