use shared::PlayerId;
use std::fmt;

/// Recoverable failures raised by the arena. None of them are fatal: the
/// caller logs and drops the offending event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// A frame or packet that cannot be applied.
    InvalidInputFrame { reason: String },
    /// An event referenced a player that is not (or no longer) connected.
    UnknownPlayer(PlayerId),
    /// The roster is at capacity.
    ServerFull,
    /// A world configuration the arena cannot run with.
    InvalidConfiguration { reason: String },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInputFrame { reason } => write!(f, "invalid input frame: {}", reason),
            Self::UnknownPlayer(id) => write!(f, "unknown player {}", id),
            Self::ServerFull => write!(f, "server full"),
            Self::InvalidConfiguration { reason } => write!(f, "invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ArenaError::UnknownPlayer(9).to_string(), "unknown player 9");
        assert_eq!(ArenaError::ServerFull.to_string(), "server full");
        let err = ArenaError::InvalidInputFrame {
            reason: "stale sequence 3".to_string(),
        };
        assert_eq!(err.to_string(), "invalid input frame: stale sequence 3");
        let err = ArenaError::InvalidConfiguration {
            reason: "width 0".to_string(),
        };
        assert_eq!(err.to_string(), "invalid configuration: width 0");
    }
}
