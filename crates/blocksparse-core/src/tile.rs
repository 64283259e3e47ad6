//! Tile index for block-sparse matrices
//!
//! A block-sparse matrix is a grid of 32×32 tiles of which only a subset is
//! stored. The [`TileIndex`] records the position of every stored tile and
//! a prefix-offset lookup table, so all tiles touching one tile-row (or
//! tile-column) are found in O(1).
//!
//! Memory layout of the index:
//! ```text
//! blocks: [r0, c0, r1, c1, ...]        (u16 pairs, 2 × total_blocks)
//! table:  [0, ..., total_blocks]        (u32, n_lines + 1)
//! slots:  [s0, s1, ...]                 (u32, payload position per entry)
//! ```
//! - `table[i]..table[i + 1]` is the range of entries in line `i`
//! - Empty lines have `table[i] == table[i + 1]`
//! - `slots[e]` locates the 32×32 payload of entry `e` in the sparse tensor

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Edge length of a tile
pub const TILE: usize = 32;

/// Number of values in one tile
pub const TILE_AREA: usize = TILE * TILE;

/// Number of tiles needed to cover `extent` rows or columns
#[inline]
pub fn tiles_for(extent: usize) -> usize {
    extent.div_ceil(TILE)
}

/// Reinterpret a flat `[r0, c0, r1, c1, ...]` list as coordinate pairs
///
/// Fails when the list has odd length.
pub fn coordinate_pairs(blocks: &[u16]) -> Result<&[[u16; 2]]> {
    bytemuck::try_cast_slice(blocks).map_err(|_| {
        Error::invalid_tile_index(format!(
            "coordinate list must hold (row, col) pairs, got {} values",
            blocks.len()
        ))
    })
}

/// Which coordinate the lookup table is keyed on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// `table[i]` groups tiles whose tile-row is `i`
    Row,
    /// `table[i]` groups tiles whose tile-column is `i`
    Col,
}

impl Orientation {
    /// Coordinate the table is keyed on
    #[inline]
    pub fn line_of(self, coord: [u16; 2]) -> usize {
        match self {
            Orientation::Row => coord[0] as usize,
            Orientation::Col => coord[1] as usize,
        }
    }

    /// The other coordinate
    #[inline]
    pub fn cross_of(self, coord: [u16; 2]) -> usize {
        match self {
            Orientation::Row => coord[1] as usize,
            Orientation::Col => coord[0] as usize,
        }
    }

    /// The opposite orientation
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Row => Orientation::Col,
            Orientation::Col => Orientation::Row,
        }
    }
}

/// Immutable index of the nonzero tiles of a block-sparse matrix
///
/// Coordinates are always `(tile_row, tile_col)` in the frame of the stored
/// matrix, whatever the orientation. Shared read-only across batches and
/// calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileIndex {
    orientation: Orientation,
    cross_tiles: usize,
    blocks: Vec<u16>,
    table: Vec<u32>,
    slots: Vec<u32>,
}

impl TileIndex {
    /// Create an index whose entry `e` owns payload `e`
    ///
    /// # Arguments
    /// * `orientation` - which coordinate `table` is keyed on
    /// * `cross_tiles` - tile extent of the other axis
    /// * `blocks` - flat coordinate list, pairs of (tile-row, tile-col)
    /// * `table` - prefix offsets, one more than the number of lines
    pub fn new(
        orientation: Orientation,
        cross_tiles: usize,
        blocks: Vec<u16>,
        table: Vec<u32>,
    ) -> Result<Self> {
        let n = blocks.len() / 2;
        let slots = (0..n as u32).collect();
        Self::with_slots(orientation, cross_tiles, blocks, table, slots)
    }

    /// Create an index with an explicit payload position per entry
    pub fn with_slots(
        orientation: Orientation,
        cross_tiles: usize,
        blocks: Vec<u16>,
        table: Vec<u32>,
        slots: Vec<u32>,
    ) -> Result<Self> {
        let index = Self {
            orientation,
            cross_tiles,
            blocks,
            table,
            slots,
        };
        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<()> {
        let coords = coordinate_pairs(&self.blocks)?;
        let total = coords.len();

        let (first, last) = match (self.table.first(), self.table.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                return Err(Error::invalid_tile_index(
                    "lookup table must have at least one offset",
                ))
            }
        };
        if first != 0 {
            return Err(Error::invalid_tile_index(format!(
                "table[0] must be 0, got {first}"
            )));
        }
        if last as usize != total {
            return Err(Error::invalid_tile_index(format!(
                "last table offset {last} does not match {total} blocks"
            )));
        }
        if let Some(i) = self.table.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::invalid_tile_index(format!(
                "table is not monotonic at line {i}: {} > {}",
                self.table[i],
                self.table[i + 1]
            )));
        }

        for line in 0..self.n_lines() {
            let range = self.table[line] as usize..self.table[line + 1] as usize;
            for (offset, &coord) in coords[range.clone()].iter().enumerate() {
                if self.orientation.line_of(coord) != line {
                    return Err(Error::invalid_tile_index(format!(
                        "entry {} at ({}, {}) is listed under {:?} {line}",
                        range.start + offset,
                        coord[0],
                        coord[1],
                        self.orientation
                    )));
                }
                if self.orientation.cross_of(coord) >= self.cross_tiles {
                    return Err(Error::invalid_tile_index(format!(
                        "entry {} at ({}, {}) lies outside the {} tile cross extent",
                        range.start + offset,
                        coord[0],
                        coord[1],
                        self.cross_tiles
                    )));
                }
            }
        }

        if self.slots.len() != total {
            return Err(Error::invalid_tile_index(format!(
                "{} payload slots for {total} blocks",
                self.slots.len()
            )));
        }
        let mut seen = vec![false; total];
        for &slot in &self.slots {
            let slot = slot as usize;
            if slot >= total || std::mem::replace(&mut seen[slot], true) {
                return Err(Error::invalid_tile_index(format!(
                    "payload slot {slot} is out of range or repeated"
                )));
            }
        }
        Ok(())
    }

    /// Orientation of the lookup table
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of lines (tile-rows or tile-columns) covered by the table
    pub fn n_lines(&self) -> usize {
        self.table.len() - 1
    }

    /// Tile extent of the axis the table is not keyed on
    pub fn cross_tiles(&self) -> usize {
        self.cross_tiles
    }

    /// Total number of stored tiles
    pub fn n_blocks(&self) -> usize {
        self.slots.len()
    }

    /// Flat coordinate list
    pub fn blocks(&self) -> &[u16] {
        &self.blocks
    }

    /// Prefix-offset lookup table
    pub fn table(&self) -> &[u32] {
        &self.table
    }

    /// Payload position of every entry
    pub fn slots(&self) -> &[u32] {
        &self.slots
    }

    /// Coordinate pairs in list order
    pub fn coordinates(&self) -> &[[u16; 2]] {
        // Length was checked to be even in validate()
        bytemuck::cast_slice(&self.blocks)
    }

    /// Entry range of line `i`
    pub fn range(&self, line: usize) -> Result<std::ops::Range<usize>> {
        if line >= self.n_lines() {
            return Err(Error::invalid_tile_index(format!(
                "line {line} out of range for {} lines",
                self.n_lines()
            )));
        }
        Ok(self.table[line] as usize..self.table[line + 1] as usize)
    }

    /// Coordinates of every tile in line `i`
    pub fn lookup(&self, line: usize) -> Result<&[[u16; 2]]> {
        let range = self.range(line)?;
        Ok(&self.coordinates()[range])
    }

    /// `(coordinate, payload slot)` of every tile in line `i`, in list order
    ///
    /// Callers iterate `0..n_lines()`, so the range is not rechecked.
    pub fn entries(&self, line: usize) -> impl Iterator<Item = ([u16; 2], usize)> + '_ {
        let range = self.table[line] as usize..self.table[line + 1] as usize;
        self.coordinates()[range.clone()]
            .iter()
            .copied()
            .zip(self.slots[range].iter().map(|&s| s as usize))
    }
}

/// Copy a tile out of `src`, transposing it when `transpose` is set
///
/// Transposition happens on the 32×32 values only; the tile's position in
/// storage is unchanged.
#[inline]
pub fn load_tile(src: &[f32], transpose: bool) -> [f32; TILE_AREA] {
    debug_assert_eq!(src.len(), TILE_AREA);
    let mut tile = [0.0f32; TILE_AREA];
    if transpose {
        for (i, row) in src.chunks_exact(TILE).enumerate() {
            for (j, &v) in row.iter().enumerate() {
                tile[j * TILE + i] = v;
            }
        }
    } else {
        tile.copy_from_slice(src);
    }
    tile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_for() {
        assert_eq!(tiles_for(0), 0);
        assert_eq!(tiles_for(1), 1);
        assert_eq!(tiles_for(32), 1);
        assert_eq!(tiles_for(33), 2);
        assert_eq!(tiles_for(96), 3);
    }

    #[test]
    fn test_coordinate_pairs() {
        let flat = [0u16, 1, 2, 3];
        let pairs = coordinate_pairs(&flat).unwrap();
        assert_eq!(pairs, &[[0, 1], [2, 3]]);

        let odd = [0u16, 1, 2];
        assert!(matches!(
            coordinate_pairs(&odd),
            Err(Error::InvalidTileIndex(_))
        ));
    }

    #[test]
    fn test_row_index_lookup() {
        // 3 tile-rows: row 0 -> (0,0),(0,2); row 1 empty; row 2 -> (2,1)
        let index = TileIndex::new(
            Orientation::Row,
            3,
            vec![0, 0, 0, 2, 2, 1],
            vec![0, 2, 2, 3],
        )
        .unwrap();

        assert_eq!(index.n_lines(), 3);
        assert_eq!(index.n_blocks(), 3);
        assert_eq!(index.lookup(0).unwrap(), &[[0, 0], [0, 2]]);
        assert!(index.lookup(1).unwrap().is_empty());
        assert_eq!(index.lookup(2).unwrap(), &[[2, 1]]);
        assert!(index.lookup(3).is_err());

        let entries: Vec<_> = index.entries(0).collect();
        assert_eq!(entries, vec![([0, 0], 0), ([0, 2], 1)]);
    }

    #[test]
    fn test_col_index_with_slots() {
        // Row-major payloads: 0=(0,0) 1=(0,1) 2=(1,1); grouped by column
        let index = TileIndex::with_slots(
            Orientation::Col,
            2,
            vec![0, 0, 0, 1, 1, 1],
            vec![0, 1, 3],
            vec![0, 1, 2],
        )
        .unwrap();
        let col1: Vec<_> = index.entries(1).collect();
        assert_eq!(col1, vec![([0, 1], 1), ([1, 1], 2)]);
    }

    #[test]
    fn test_rejects_bad_table_start() {
        let err = TileIndex::new(Orientation::Row, 1, vec![0, 0], vec![1, 1]).unwrap_err();
        assert!(err.to_string().contains("table[0]"));
    }

    #[test]
    fn test_rejects_non_monotonic_table() {
        let err = TileIndex::new(
            Orientation::Row,
            2,
            vec![0, 0, 1, 0],
            vec![0, 2, 1, 2],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTileIndex(_)));
    }

    #[test]
    fn test_rejects_wrong_total() {
        let err = TileIndex::new(Orientation::Row, 1, vec![0, 0], vec![0, 0]).unwrap_err();
        assert!(err.to_string().contains("does not match"));

        let err = TileIndex::new(Orientation::Row, 1, vec![], vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidTileIndex(_)));
    }

    #[test]
    fn test_rejects_misfiled_and_out_of_grid_entries() {
        // Entry (1, 0) filed under row 0
        let err = TileIndex::new(Orientation::Row, 1, vec![1, 0], vec![0, 1, 1]).unwrap_err();
        assert!(err.to_string().contains("listed under"));

        // Column 4 outside a 2-tile cross extent
        let err = TileIndex::new(Orientation::Row, 2, vec![0, 4], vec![0, 1]).unwrap_err();
        assert!(err.to_string().contains("cross extent"));
    }

    #[test]
    fn test_rejects_repeated_slots() {
        let err = TileIndex::with_slots(
            Orientation::Row,
            2,
            vec![0, 0, 0, 1],
            vec![0, 2],
            vec![1, 1],
        )
        .unwrap_err();
        assert!(err.to_string().contains("repeated"));
    }

    #[test]
    fn test_empty_index() {
        let index = TileIndex::new(Orientation::Col, 4, vec![], vec![0, 0, 0]).unwrap();
        assert_eq!(index.n_lines(), 2);
        assert_eq!(index.n_blocks(), 0);
        assert_eq!(index.entries(1).count(), 0);
    }

    #[test]
    fn test_load_tile_transpose() {
        let src: Vec<f32> = (0..TILE_AREA).map(|v| v as f32).collect();
        let plain = load_tile(&src, false);
        assert_eq!(&plain[..], &src[..]);

        let t = load_tile(&src, true);
        assert_eq!(t[1], src[TILE]);
        assert_eq!(t[TILE], src[1]);
        assert_eq!(t[3 * TILE + 5], src[5 * TILE + 3]);
    }

    #[test]
    fn test_orientation_helpers() {
        let coord = [3u16, 7];
        assert_eq!(Orientation::Row.line_of(coord), 3);
        assert_eq!(Orientation::Row.cross_of(coord), 7);
        assert_eq!(Orientation::Col.line_of(coord), 7);
        assert_eq!(Orientation::Col.cross_of(coord), 3);
        assert_eq!(Orientation::Row.flipped(), Orientation::Col);
    }
}
