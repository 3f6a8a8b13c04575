use std::io;

use thiserror::Error;

/// Failure to construct a board, either from dimensions or from a serialized
/// description. Always fatal at startup; the server never starts serving with
/// a bad board.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board dimensions must be strictly positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("board description is empty")]
    Empty,

    #[error("invalid board header {0:?}, expected two positive integers `W H`")]
    InvalidHeader(String),

    #[error("board has {found} lines but the header announced {expected}")]
    LineCountMismatch { expected: usize, found: usize },

    #[error("invalid board line {0:?}, expected single-space-separated 0/1 tokens")]
    InvalidLine(String),

    #[error("board line {line} has {found} columns but the header announced {expected}")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("failed to read board file: {0}")]
    Io(#[from] io::Error),
}
