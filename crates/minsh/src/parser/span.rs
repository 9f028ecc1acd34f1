//! Source location tracking for syntax errors
//!
//! Input is a single command line, so positions carry a column and a byte
//! offset only.

/// A position in a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based column number (in characters)
    pub column: usize,
    /// 0-based byte offset from start of input
    pub offset: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// Create a new position at column 1, offset 0.
    pub fn new() -> Self {
        Self {
            column: 1,
            offset: 0,
        }
    }

    /// Advance position by one character.
    pub fn advance(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        self.column += 1;
    }
}

/// A span of the line (start to end position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Span {
    /// Create a span from start to end positions.
    pub fn from_positions(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Starting column.
    pub fn column(&self) -> usize {
        self.start.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_advance() {
        let mut pos = Position::new();
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 0);

        pos.advance('a');
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 1);

        // multi-byte chars advance the offset by their UTF-8 length
        pos.advance('é');
        assert_eq!(pos.column, 3);
        assert_eq!(pos.offset, 3);
    }

    #[test]
    fn test_span_column() {
        let mut end = Position::new();
        end.advance('x');
        let span = Span::from_positions(Position::new(), end);
        assert_eq!(span.column(), 1);
        assert_eq!(Span::from_positions(end, end).column(), 2);
    }
}
