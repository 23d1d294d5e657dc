//! Macaron grid: the boolean matrix behind every box.
//!
//! A cell is `true` while the macaron is still in the box. Dimensions are fixed
//! at creation; cells only ever go from `true` to `false`.
//!
//! Rendering uses a fixed glyph for remaining macarons and a random drink from
//! [`PLACEHOLDERS`] for eaten ones, so an emptied box looks like a party.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Glyph for a macaron still in the box.
pub const MACARON: char = '🍪';
/// Glyphs drawn at random for an eaten cell.
pub const PLACEHOLDERS: [char; 5] = ['🥂', '🍷', '🍸', '🍹', '🍾'];
/// Largest accepted row or column count.
pub const MAX_SIDE: usize = u8::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid dimensions must be between 1 and 255, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("cell ({row}, {col}) is outside a {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("no macarons left")]
    Empty,
}

/// Result of biting into a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bite {
    /// The macaron was there and is now gone.
    Eaten,
    /// Somebody got there first; nothing changed.
    AlreadyGone,
    /// No macarons remain after this bite (whether or not it flipped a cell).
    Emptied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid", into = "RawGrid")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

#[derive(Serialize, Deserialize)]
struct RawGrid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = String;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        check_dimensions(raw.rows, raw.cols).map_err(|e| e.to_string())?;
        if raw.cells.len() != raw.rows * raw.cols {
            return Err(format!(
                "grid has {} cells, expected {}x{}",
                raw.cells.len(),
                raw.rows,
                raw.cols
            ));
        }
        Ok(Grid {
            rows: raw.rows,
            cols: raw.cols,
            cells: raw.cells,
        })
    }
}

fn check_dimensions(rows: usize, cols: usize) -> Result<(), GridError> {
    if rows == 0 || cols == 0 || rows > MAX_SIDE || cols > MAX_SIDE {
        return Err(GridError::InvalidDimensions { rows, cols });
    }
    Ok(())
}

impl From<Grid> for RawGrid {
    fn from(g: Grid) -> Self {
        RawGrid {
            rows: g.rows,
            cols: g.cols,
            cells: g.cells,
        }
    }
}

impl Grid {
    /// Create a full box of `rows` x `cols` macarons.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        check_dimensions(rows, cols)?;
        Ok(Grid {
            rows,
            cols,
            cells: vec![true; rows * cols],
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of macarons still in the box.
    pub fn remaining(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|c| *c)
    }

    /// Whether the macaron at zero-based `(row, col)` is still there.
    pub fn is_present(&self, row: usize, col: usize) -> Result<bool, GridError> {
        let idx = self.index(row, col)?;
        Ok(self.cells[idx])
    }

    /// Uniformly pick one remaining macaron; zero-based `(row, col)`.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(usize, usize), GridError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Err(GridError::Empty);
        }
        let nth = rng.gen_range(0..remaining);
        let idx = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .nth(nth)
            .map(|(i, _)| i)
            .ok_or(GridError::Empty)?;
        Ok((idx / self.cols, idx % self.cols))
    }

    /// Eat the macaron at zero-based `(row, col)`.
    pub fn consume(&mut self, row: usize, col: usize) -> Result<Bite, GridError> {
        let idx = self.index(row, col)?;
        let flipped = std::mem::replace(&mut self.cells[idx], false);
        if self.is_empty() {
            Ok(Bite::Emptied)
        } else if flipped {
            Ok(Bite::Eaten)
        } else {
            Ok(Bite::AlreadyGone)
        }
    }

    /// Emoji picture of the box, one line per row.
    pub fn render<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut out = String::with_capacity(self.cells.len() * 4 + self.rows);
        for (r, row) in self.cells.chunks(self.cols).enumerate() {
            if r > 0 {
                out.push('\n');
            }
            for present in row {
                if *present {
                    out.push(MACARON);
                } else {
                    out.push(PLACEHOLDERS[rng.gen_range(0..PLACEHOLDERS.len())]);
                }
            }
        }
        out
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if row >= self.rows || col >= self.cols {
            return Err(GridError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }
}
