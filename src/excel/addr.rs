//! A1-style cell references and ranges.

use crate::error::{FormpressError, FormpressResult};
use std::fmt;

/// Largest column OOXML allows (XFD).
const MAX_COL: u32 = 16_384;
/// Largest row OOXML allows.
const MAX_ROW: u32 = 1_048_576;

/// A single cell address, 1-based in both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1 reference like `C6`. Absolute markers (`$C$6`) are
    /// accepted and ignored.
    pub fn parse(s: &str) -> FormpressResult<Self> {
        let bad = || FormpressError::CellRef(s.to_string());
        let mut chars = s.chars().peekable();

        if chars.peek() == Some(&'$') {
            chars.next();
        }
        let mut col: u32 = 0;
        let mut letters = 0;
        while let Some(&ch) = chars.peek() {
            if !ch.is_ascii_alphabetic() {
                break;
            }
            col = col * 26 + (ch.to_ascii_uppercase() as u8 - b'A' + 1) as u32;
            letters += 1;
            if letters > 3 {
                return Err(bad());
            }
            chars.next();
        }
        if letters == 0 {
            return Err(bad());
        }

        if chars.peek() == Some(&'$') {
            chars.next();
        }
        let digits: String = chars.collect();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let row: u32 = digits.parse().map_err(|_| bad())?;

        if row == 0 || row > MAX_ROW || col > MAX_COL {
            return Err(bad());
        }
        Ok(Self { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_letters(self.col), self.row)
    }
}

/// Column number (1-based) to Excel letters: 1 -> "A", 27 -> "AA".
pub fn col_letters(col: u32) -> String {
    let mut idx = col;
    let mut s = String::new();
    while idx > 0 {
        let rem = ((idx - 1) % 26) as u8;
        s.insert(0, (b'A' + rem) as char);
        idx = (idx - 1) / 26;
    }
    s
}

/// An inclusive rectangular range, normalized so `start` is the top-left
/// corner. The top-left cell is the range's merge master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse a range like `A1:B2`. Corners may come in any order.
    pub fn parse(s: &str) -> FormpressResult<Self> {
        let (a, b) = s
            .split_once(':')
            .ok_or_else(|| FormpressError::CellRef(s.to_string()))?;
        Ok(Self::new(CellRef::parse(a)?, CellRef::parse(b)?))
    }

    /// The master cell holding the range's value and style.
    pub fn master(&self) -> CellRef {
        self.start
    }

    pub fn contains(&self, at: CellRef) -> bool {
        at.row >= self.start.row
            && at.row <= self.end.row
            && at.col >= self.start.col
            && at.col <= self.end.col
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// All cell addresses inside the range, row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellRef::new(row, col))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
