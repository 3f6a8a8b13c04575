//! Game rules: the square state machine and the board flood-fill dig.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::Path;

use rand::Rng;

use crate::{
    data::{Board, Position, Square, SquareState},
    error::BoardError,
};

/// A square has at most 8 direct neighbors.
const MAX_NEIGHBORS: usize = 8;

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl Square {
    /// A fresh untouched square.
    pub fn new(has_bomb: bool) -> Self {
        Self {
            state: SquareState::Untouched,
            has_bomb,
            neighbor_bombs: None,
        }
    }

    pub fn state(&self) -> SquareState {
        self.state
    }

    pub fn has_bomb(&self) -> bool {
        self.has_bomb
    }

    /// Number of direct neighbors holding a bomb, `None` until the square is dug.
    pub fn neighbor_bombs(&self) -> Option<u8> {
        self.neighbor_bombs
    }

    /// Flag the square if untouched, otherwise do nothing.
    pub fn flag(&mut self) {
        if self.state == SquareState::Untouched {
            self.state = SquareState::Flagged;
        }
        self.check_rep();
    }

    /// Remove the flag if flagged, otherwise do nothing.
    pub fn deflag(&mut self) {
        if self.state == SquareState::Flagged {
            self.state = SquareState::Untouched;
        }
        self.check_rep();
    }

    /// Dig an untouched square, caching how many of the given direct
    /// neighbors hold a bomb.
    ///
    /// A direct dig removes the square's own bomb; reacting to the detonation
    /// is the caller's job, before calling this. A propagated dig must never
    /// reach a bomb, which [`Board::dig_at`] guarantees by only propagating
    /// through bomb-free neighborhoods.
    pub fn dig(&mut self, neighbor_bombs: &[bool], by_propagation: bool) {
        debug_assert_eq!(
            self.state,
            SquareState::Untouched,
            "only untouched squares can be dug"
        );
        debug_assert!(
            neighbor_bombs.len() <= MAX_NEIGHBORS,
            "a square has at most {MAX_NEIGHBORS} neighbors"
        );

        if by_propagation {
            debug_assert!(!self.has_bomb, "propagation must never reach a bomb");
        } else {
            self.has_bomb = false;
        }

        self.state = SquareState::Dug;
        self.neighbor_bombs = Some(neighbor_bombs.iter().filter(|&&bomb| bomb).count() as u8);
        self.check_rep();
    }

    /// Reflect that a bomb next to this square has been detonated and removed
    /// from the board. Does nothing unless the square is dug with a non-zero
    /// cached count.
    pub fn decrement_neighbor_bombs(&mut self) {
        if let Some(count) = self.neighbor_bombs
            && count > 0
        {
            self.neighbor_bombs = Some(count - 1);
        }
        self.check_rep();
    }

    fn check_rep(&self) {
        #[cfg(debug_assertions)]
        {
            match self.state {
                SquareState::Dug => {
                    let count = self
                        .neighbor_bombs
                        .expect("a dug square caches its neighbor bomb count");
                    assert!(count as usize <= MAX_NEIGHBORS);
                    assert!(!self.has_bomb, "a dug square never holds a bomb");
                }
                SquareState::Untouched | SquareState::Flagged => {
                    assert!(self.neighbor_bombs.is_none());
                }
            }
        }
    }
}

impl Board {
    /// Build a random board with the given dimensions. Each square
    /// independently has a 1 in 4 chance of holding a bomb; every square
    /// starts untouched.
    pub fn from_dimensions(width: usize, height: usize) -> Result<Self, BoardError> {
        if width < 1 || height < 1 {
            return Err(BoardError::InvalidDimensions { width, height });
        }

        let mut rng = rand::rng();
        let squares = (0..width * height)
            .map(|_| Square::new(rng.random_ratio(1, 4)))
            .collect();

        let board = Self {
            width,
            height,
            squares,
        };
        board.check_rep();
        Ok(board)
    }

    /// Parse a serialized board description: a `W H` header line followed by
    /// exactly H lines of exactly W single-space-separated 0/1 tokens, where
    /// 1 marks a bomb.
    pub fn from_serialized(text: &str) -> Result<Self, BoardError> {
        let mut lines = text.lines();
        let header = lines.next().ok_or(BoardError::Empty)?;

        let [width, height] = header.split(' ').collect::<Vec<_>>()[..] else {
            return Err(BoardError::InvalidHeader(header.to_string()));
        };
        if !is_integer(width) || !is_integer(height) {
            return Err(BoardError::InvalidHeader(header.to_string()));
        }
        let width: usize = width
            .parse()
            .map_err(|_| BoardError::InvalidHeader(header.to_string()))?;
        let height: usize = height
            .parse()
            .map_err(|_| BoardError::InvalidHeader(header.to_string()))?;
        if width < 1 || height < 1 {
            return Err(BoardError::InvalidDimensions { width, height });
        }

        let body: Vec<&str> = lines.collect();
        if body.len() != height {
            return Err(BoardError::LineCountMismatch {
                expected: height,
                found: body.len(),
            });
        }

        let mut squares = Vec::with_capacity(width * height);
        for (i, line) in body.iter().enumerate() {
            let tokens: Vec<&str> = line.split(' ').collect();
            if tokens.iter().any(|token| !matches!(*token, "0" | "1")) {
                return Err(BoardError::InvalidLine(line.to_string()));
            }
            if tokens.len() != width {
                return Err(BoardError::ColumnCountMismatch {
                    line: i + 1,
                    expected: width,
                    found: tokens.len(),
                });
            }
            squares.extend(tokens.iter().map(|&token| Square::new(token == "1")));
        }

        let board = Self {
            width,
            height,
            squares,
        };
        board.check_rep();
        Ok(board)
    }

    /// Read and parse a serialized board description from a file.
    pub fn from_file(path: &Path) -> Result<Self, BoardError> {
        let text = fs::read_to_string(path)?;
        Self::from_serialized(&text)
    }

    /// Build a board from prepared columns of squares, the outer dimension
    /// being the width. Intended for tests.
    ///
    /// # Panics
    /// If the grid is empty or the columns are of unequal length.
    pub fn from_grid(columns: Vec<Vec<Square>>) -> Self {
        let width = columns.len();
        assert!(width > 0, "grid must not be empty");
        let height = columns[0].len();
        assert!(height > 0, "columns must not be empty");
        assert!(
            columns.iter().all(|column| column.len() == height),
            "columns must be of equal length"
        );

        let mut squares = Vec::with_capacity(width * height);
        for y in 0..height {
            for column in &columns {
                squares.push(column[y].clone());
            }
        }

        let board = Self {
            width,
            height,
            squares,
        };
        board.check_rep();
        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Convert signed protocol coordinates to an on-board position, `None` if
    /// they fall outside the board.
    pub fn position_at(&self, x: i64, y: i64) -> Option<Position> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(Position::new(x as usize, y as usize))
        } else {
            None
        }
    }

    /// True if the square at `position` currently holds a bomb.
    pub fn contains_bomb(&self, position: Position) -> bool {
        self.square(position).has_bomb()
    }

    /// Dig at `position`, cascading the reveal through bomb-free
    /// neighborhoods.
    ///
    /// `contains_bomb` reports whether the caller observed a bomb at
    /// `position` immediately before this call, under the same lock; if true,
    /// the cached counts of all neighbors are decremented because the dig
    /// removes that bomb from the board. Whether a dig is the detonating one
    /// and whether it happens by propagation are deliberately separate paths:
    /// propagated digs always pass a dedicated flag and never detonate.
    ///
    /// The cascade runs on an explicit worklist rather than recursing, so a
    /// large bomb-free board cannot overflow the stack. A dequeued square is
    /// dug only if still untouched, so each square is processed at most once
    /// and the loop terminates.
    pub fn dig_at(&mut self, position: Position, contains_bomb: bool) {
        if self.square(position).state() != SquareState::Untouched {
            return;
        }

        let neighbors = self.neighbor_positions(position);
        let bomb_flags = self.neighbor_bomb_flags(&neighbors);
        self.square_mut(position).dig(&bomb_flags, false);
        if contains_bomb {
            for &neighbor in &neighbors {
                self.square_mut(neighbor).decrement_neighbor_bombs();
            }
        }

        let mut worklist = VecDeque::new();
        if bomb_flags.iter().all(|&bomb| !bomb) {
            worklist.extend(neighbors);
        }
        while let Some(current) = worklist.pop_front() {
            if self.square(current).state() != SquareState::Untouched {
                continue;
            }
            let neighbors = self.neighbor_positions(current);
            let bomb_flags = self.neighbor_bomb_flags(&neighbors);
            self.square_mut(current).dig(&bomb_flags, true);
            if bomb_flags.iter().all(|&bomb| !bomb) {
                worklist.extend(neighbors);
            }
        }
        self.check_rep();
    }

    /// Flag the square at `position` if untouched, otherwise do nothing.
    pub fn flag_at(&mut self, position: Position) {
        self.square_mut(position).flag();
        self.check_rep();
    }

    /// Remove the flag at `position` if flagged, otherwise do nothing.
    pub fn deflag_at(&mut self, position: Position) {
        self.square_mut(position).deflag();
        self.check_rep();
    }

    /// The in-bounds direct neighbors of `position`: 3, 5 or 8 of them
    /// depending on corners and edges.
    fn neighbor_positions(&self, position: Position) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(MAX_NEIGHBORS);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let Some(neighbor) =
                    self.position_at(position.x as i64 + dx, position.y as i64 + dy)
                {
                    neighbors.push(neighbor);
                }
            }
        }
        neighbors
    }

    fn neighbor_bomb_flags(&self, neighbors: &[Position]) -> Vec<bool> {
        neighbors
            .iter()
            .map(|&neighbor| self.square(neighbor).has_bomb())
            .collect()
    }

    fn square(&self, position: Position) -> &Square {
        &self.squares[self.index(position)]
    }

    fn square_mut(&mut self, position: Position) -> &mut Square {
        let index = self.index(position);
        &mut self.squares[index]
    }

    fn index(&self, position: Position) -> usize {
        debug_assert!(
            position.x < self.width && position.y < self.height,
            "position out of bounds"
        );
        position.x + position.y * self.width
    }

    fn check_rep(&self) {
        #[cfg(debug_assertions)]
        {
            assert!(self.width > 0 && self.height > 0);
            assert_eq!(self.squares.len(), self.width * self.height);
        }
    }
}

/// Renders the board in the wire format: one line per row, tokens joined by
/// single spaces, no trailing newline. `-` untouched, `F` flagged, a blank
/// for a dug square with no bombs nearby, the digit otherwise.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            if y > 0 {
                f.write_str("\n")?;
            }
            for x in 0..self.width {
                if x > 0 {
                    f.write_str(" ")?;
                }
                let square = &self.squares[x + y * self.width];
                match square.state() {
                    SquareState::Untouched => f.write_str("-")?,
                    SquareState::Flagged => f.write_str("F")?,
                    SquareState::Dug => match square.neighbor_bombs().unwrap_or(0) {
                        0 => f.write_str(" ")?,
                        count => write!(f, "{count}")?,
                    },
                }
            }
        }
        Ok(())
    }
}

fn is_integer(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}
