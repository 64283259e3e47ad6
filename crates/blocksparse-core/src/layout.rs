//! Sparsity layouts over a tile grid
//!
//! A [`SparseLayout`] fixes which tiles of a `tile_rows × tile_cols` grid
//! are stored and builds both lookup orientations from it. Payloads are
//! always stored in row-major tile order; the column-oriented index points
//! back into that order through its payload slots, so a single sparse
//! tensor can be consumed through either index.

use crate::error::{Error, Result};
use crate::tile::{Orientation, TileIndex};
use serde::{Deserialize, Serialize};

/// Serialized form of a layout; validated on the way in
#[derive(Clone, Debug, Serialize, Deserialize)]
struct LayoutRepr {
    tile_rows: usize,
    tile_cols: usize,
    blocks: Vec<[u16; 2]>,
}

/// Which tiles of a grid are nonzero, indexed by row and by column
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayoutRepr", into = "LayoutRepr")]
pub struct SparseLayout {
    tile_rows: usize,
    tile_cols: usize,
    row_index: TileIndex,
    col_index: TileIndex,
}

impl SparseLayout {
    /// Build a layout from a row-major boolean mask of `tile_rows × tile_cols`
    pub fn from_mask(tile_rows: usize, tile_cols: usize, mask: &[bool]) -> Result<Self> {
        if mask.len() != tile_rows * tile_cols {
            return Err(Error::size_mismatch(
                tile_rows * tile_cols,
                mask.len(),
                "layout mask",
            ));
        }
        Self::check_grid(tile_rows, tile_cols)?;

        let mut row_blocks = Vec::new();
        let mut row_table = Vec::with_capacity(tile_rows + 1);
        row_table.push(0u32);
        for r in 0..tile_rows {
            for c in 0..tile_cols {
                if mask[r * tile_cols + c] {
                    row_blocks.extend_from_slice(&[r as u16, c as u16]);
                }
            }
            row_table.push((row_blocks.len() / 2) as u32);
        }

        // Payload position of every stored tile in row-major order
        let mut payload = vec![u32::MAX; tile_rows * tile_cols];
        let mut next = 0u32;
        for (cell, &on) in payload.iter_mut().zip(mask) {
            if on {
                *cell = next;
                next += 1;
            }
        }

        let mut col_blocks = Vec::with_capacity(row_blocks.len());
        let mut col_slots = Vec::with_capacity(next as usize);
        let mut col_table = Vec::with_capacity(tile_cols + 1);
        col_table.push(0u32);
        for c in 0..tile_cols {
            for r in 0..tile_rows {
                if mask[r * tile_cols + c] {
                    col_blocks.extend_from_slice(&[r as u16, c as u16]);
                    col_slots.push(payload[r * tile_cols + c]);
                }
            }
            col_table.push(col_slots.len() as u32);
        }

        let row_index = TileIndex::new(Orientation::Row, tile_cols, row_blocks, row_table)?;
        let col_index =
            TileIndex::with_slots(Orientation::Col, tile_rows, col_blocks, col_table, col_slots)?;

        log::debug!(
            "Built sparse layout: {}x{} tiles, {} stored",
            tile_rows,
            tile_cols,
            row_index.n_blocks()
        );

        Ok(Self {
            tile_rows,
            tile_cols,
            row_index,
            col_index,
        })
    }

    /// Build a layout from a list of `(tile_row, tile_col)` coordinates
    ///
    /// Order of `coords` does not matter; duplicates are rejected.
    pub fn from_coordinates(
        tile_rows: usize,
        tile_cols: usize,
        coords: &[[u16; 2]],
    ) -> Result<Self> {
        Self::check_grid(tile_rows, tile_cols)?;
        let mut mask = vec![false; tile_rows * tile_cols];
        for &[r, c] in coords {
            let (r, c) = (r as usize, c as usize);
            if r >= tile_rows || c >= tile_cols {
                return Err(Error::invalid_tile_index(format!(
                    "tile ({r}, {c}) outside the {tile_rows}x{tile_cols} grid"
                )));
            }
            if std::mem::replace(&mut mask[r * tile_cols + c], true) {
                return Err(Error::invalid_tile_index(format!(
                    "tile ({r}, {c}) listed twice"
                )));
            }
        }
        Self::from_mask(tile_rows, tile_cols, &mask)
    }

    /// Every tile stored
    pub fn dense(tile_rows: usize, tile_cols: usize) -> Result<Self> {
        Self::from_mask(tile_rows, tile_cols, &vec![true; tile_rows * tile_cols])
    }

    /// Tiles on and below the diagonal of an `n × n` grid (causal masks)
    pub fn lower_triangular(n: usize) -> Result<Self> {
        let mask: Vec<bool> = (0..n * n).map(|i| i % n <= i / n).collect();
        Self::from_mask(n, n, &mask)
    }

    fn check_grid(tile_rows: usize, tile_cols: usize) -> Result<()> {
        // Coordinates are stored as u16
        let limit = u16::MAX as usize + 1;
        if tile_rows > limit || tile_cols > limit {
            return Err(Error::invalid_tile_index(format!(
                "{tile_rows}x{tile_cols} tile grid exceeds 16-bit coordinates"
            )));
        }
        Ok(())
    }

    /// Number of tile-rows in the grid
    pub fn tile_rows(&self) -> usize {
        self.tile_rows
    }

    /// Number of tile-columns in the grid
    pub fn tile_cols(&self) -> usize {
        self.tile_cols
    }

    /// Number of stored tiles
    pub fn n_blocks(&self) -> usize {
        self.row_index.n_blocks()
    }

    /// Fraction of grid tiles that are stored
    pub fn density(&self) -> f64 {
        let total = self.tile_rows * self.tile_cols;
        if total == 0 {
            0.0
        } else {
            self.n_blocks() as f64 / total as f64
        }
    }

    /// Index keyed on tile-rows; entry order is payload order
    pub fn row_index(&self) -> &TileIndex {
        &self.row_index
    }

    /// Index keyed on tile-columns; slots point at row-major payloads
    pub fn col_index(&self) -> &TileIndex {
        &self.col_index
    }

    /// Index with the requested orientation
    pub fn index_for(&self, orientation: Orientation) -> &TileIndex {
        match orientation {
            Orientation::Row => &self.row_index,
            Orientation::Col => &self.col_index,
        }
    }

    /// Whether tile `(r, c)` is stored
    pub fn contains(&self, tile_row: usize, tile_col: usize) -> bool {
        tile_row < self.tile_rows
            && self
                .row_index
                .lookup(tile_row)
                .map(|row| row.iter().any(|&[_, c]| c as usize == tile_col))
                .unwrap_or(false)
    }

    /// Row-major coordinate list, the storage order of payloads
    pub fn coordinates(&self) -> &[[u16; 2]] {
        self.row_index.coordinates()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize and validate from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TryFrom<LayoutRepr> for SparseLayout {
    type Error = Error;

    fn try_from(repr: LayoutRepr) -> Result<Self> {
        Self::from_coordinates(repr.tile_rows, repr.tile_cols, &repr.blocks)
    }
}

impl From<SparseLayout> for LayoutRepr {
    fn from(layout: SparseLayout) -> Self {
        Self {
            tile_rows: layout.tile_rows,
            tile_cols: layout.tile_cols,
            blocks: layout.coordinates().to_vec(),
        }
    }
}
