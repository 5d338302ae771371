use thiserror::Error;

/// Errors surfaced by the engine's external-facing parsers. Recoverable by design: every
/// variant is reported back to the host as text and the caller continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid move string: {0}")]
    InvalidMoveString(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}
