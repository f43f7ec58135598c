use std::fmt::Display;
use std::ops::Range;

// a (row, column) position in a source file, both counted from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

// the start and end position of a node in a source file.
// `end` is the position just past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(start: Position, end: Position) -> Location {
        debug_assert!(start <= end, "location starts after it ends");
        Location { start, end }
    }

    /// Whether `other` lies entirely within this location.
    pub fn contains(&self, other: &Location) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Maps this location back onto byte offsets of `source`, for renderers
    /// that work on byte ranges. Positions past the end of a row or of the
    /// source are clamped.
    pub fn byte_range(&self, source: &str) -> Range<usize> {
        let start = byte_offset(source, self.start);
        let end = byte_offset(source, self.end).max(start);
        start..end
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn byte_offset(source: &str, position: Position) -> usize {
    let mut row = 1;
    let mut row_start = 0;

    for (i, c) in source.char_indices() {
        if row == position.row {
            break;
        }
        if c == '\n' {
            row += 1;
            row_start = i + 1;
        }
    }
    if row < position.row {
        return source.len();
    }

    let line = &source[row_start..];
    let line = line.split('\n').next().unwrap_or(line);
    let within = line
        .char_indices()
        .nth(position.col.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line.len());

    row_start + within
}

// located nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub location: Location,
    pub data: T,
}

impl<T> Located<T> {
    pub fn new(location: Location, data: T) -> Located<T> {
        Located { location, data }
    }
}
