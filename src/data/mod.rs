//! Plain data types for the game state. All behavior lives in [`crate::logic`].

/// The three states a square moves through: every square starts untouched,
/// and once dug it never leaves that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareState {
    Untouched,
    Flagged,
    Dug,
}

/// A single cell of the board.
///
/// `neighbor_bombs` is the count of direct neighbors holding a bomb, cached
/// at dig time; it is `Some` exactly when the square is dug, and a dug square
/// never holds a bomb itself.
#[derive(Debug, Clone)]
pub struct Square {
    pub(crate) state: SquareState,
    pub(crate) has_bomb: bool,
    pub(crate) neighbor_bombs: Option<u8>,
}

/// A coordinate on the board, `(0, 0)` being the top left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

/// The shared minesweeper board: a `width` x `height` grid of squares,
/// stored row-major with the square at `(x, y)` at index `x + y * width`.
///
/// Dimensions are fixed at construction. The board itself carries no lock;
/// the server wraps the one board of the process in a mutex and serializes
/// every operation, including compound check-then-dig sequences, through it.
#[derive(Debug)]
pub struct Board {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) squares: Vec<Square>,
}
