use thiserror::Error;

/// Errors surfaced by the engine facade. Search interruption and timeout are
/// not represented here: they are folded into the search report at the root
/// of the search and never escape as errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed FEN or move text. `offset` is the byte offset of the first
    /// character that could not be consumed.
    #[error("parse error at offset {offset}: {reason}")]
    Parse { offset: usize, reason: String },

    /// Syntactically valid move that is not in the current legal-move set.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A position whose fields violate the board invariants (missing king,
    /// pawn on a promotion rank, inconsistent castling rights, ...).
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// Transposition-table allocation failed at startup.
    #[error("transposition table allocation failed ({bytes} bytes)")]
    TableAlloc { bytes: usize },
}

impl EngineError {
    pub fn parse(offset: usize, reason: impl Into<String>) -> Self {
        EngineError::Parse {
            offset,
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidPosition(reason.into())
    }
}
