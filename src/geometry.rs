use crate::{ConfigError, Px};

/// How a cell size is derived from the host display's width: a fixed margin
/// is reserved for window chrome and the rest is split into `divisor`
/// columns. The defaults are the reference desktop sizing; a terminal shell
/// will want a margin of zero and its own clamped display metric.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellSizing {
    pub margin: Px,
    pub divisor: Px,
}

impl Default for CellSizing {
    fn default() -> Self {
        CellSizing { margin: 300, divisor: 45 }
    }
}

impl CellSizing {
    pub fn cell_size(&self, display_width: Px) -> Result<Px, ConfigError> {
        let cell = display_width.saturating_sub(self.margin) / self.divisor;
        if cell == 0 {
            return Err(ConfigError::ZeroCellSize { display_width });
        }
        Ok(cell)
    }
}

/// Pixel layout of a board: `cols` x `rows` cells of `cell` pixels each.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    cols: u16,
    rows: u16,
    cell: Px,
    width: Px,
    height: Px,
}

impl Geometry {
    pub fn new(cols: u16, rows: u16, cell: Px) -> Result<Self, ConfigError> {
        // The starting body needs four columns on its row
        if cols < 4 || rows == 0 {
            return Err(ConfigError::BoardTooSmall { cols, rows });
        }

        let overflow = || ConfigError::BoardOverflow { cols, rows, cell };
        let width = cols.checked_mul(cell).ok_or_else(overflow)?;
        let height = rows.checked_mul(cell).ok_or_else(overflow)?;

        Ok(Geometry { cols, rows, cell, width, height })
    }

    pub fn window_size(&self) -> (Px, Px) {
        (self.width, self.height)
    }

    /// Starting head anchor: roughly the middle of the board, shifted left
    /// so the rightward initial layout stays centered.
    pub fn origin(&self) -> (Px, Px) {
        (self.cell * ((self.cols - 4) / 2), self.cell * ((self.rows - 1) / 2))
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cell(&self) -> Px {
        self.cell
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Move a coordinate from one cell size to another, truncating: the quotient
/// is taken against the old size first, so a coordinate that is not an exact
/// multiple of `old` loses its remainder. The truncation is deliberate
/// legacy behavior and is kept as is.
pub fn rescale(old: Px, new: Px, coord: Px) -> Px {
    coord / old * new
}
