//! Tile grid (the destructible playfield)
//!
//! A fixed 13×13 matrix of cells. Reads outside the grid return `Empty` and
//! writes outside it are ignored, so boundary probes never need guarding.

use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::consts::{MAP_HEIGHT, MAP_WIDTH, TILE_SIZE};

/// Contents of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileType {
    #[default]
    Empty,
    Brick,
    Steel,
    Water,
    Base,
    Forest,
    Ice,
    Floor,
    /// The objective; losing it ends the game
    Eagle,
}

impl TileType {
    /// Decode a level-data tile index
    pub fn from_index(index: u8) -> Option<TileType> {
        Some(match index {
            0 => TileType::Empty,
            1 => TileType::Brick,
            2 => TileType::Steel,
            3 => TileType::Water,
            4 => TileType::Base,
            5 => TileType::Forest,
            6 => TileType::Ice,
            7 => TileType::Floor,
            8 => TileType::Eagle,
            _ => return None,
        })
    }

    pub fn index(self) -> u8 {
        match self {
            TileType::Empty => 0,
            TileType::Brick => 1,
            TileType::Steel => 2,
            TileType::Water => 3,
            TileType::Base => 4,
            TileType::Forest => 5,
            TileType::Ice => 6,
            TileType::Floor => 7,
            TileType::Eagle => 8,
        }
    }

    /// Whether a tank may occupy this cell
    pub fn blocks_tank(self, water_passage: bool) -> bool {
        match self {
            TileType::Brick | TileType::Steel | TileType::Base | TileType::Eagle => true,
            TileType::Water => !water_passage,
            TileType::Empty | TileType::Floor | TileType::Forest | TileType::Ice => false,
        }
    }

    fn from_char(c: char) -> TileType {
        match c {
            'B' => TileType::Brick,
            'S' => TileType::Steel,
            'W' => TileType::Water,
            'b' => TileType::Base,
            'F' => TileType::Forest,
            'I' => TileType::Ice,
            '_' => TileType::Floor,
            'E' => TileType::Eagle,
            _ => TileType::Empty,
        }
    }
}

/// Built-in stage layout. Top row holds the three enemy spawn points, the
/// bottom row the eagle flanked by the two player spawns.
const DEFAULT_LAYOUT: [&str; MAP_HEIGHT] = [
    ".............",
    ".B.B.B.B.B.B.",
    ".B.B.B.B.B.B.",
    ".B.B.BSB.B.B.",
    ".B.B.FFF.B.B.",
    "II...B.B...WW",
    "SS.BB...BB.SS",
    ".....B.B.....",
    ".B.B.BBB.B.B.",
    ".B.B.B.B.B.B.",
    ".B.B.....B.B.",
    ".B.B.BBB.B.B.",
    ".....BEB.....",
];

/// The destructible tile map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    cells: Vec<TileType>,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::default_layout()
    }
}

impl TileGrid {
    /// A grid with every cell empty
    pub fn empty() -> Self {
        Self {
            cells: vec![TileType::Empty; MAP_WIDTH * MAP_HEIGHT],
        }
    }

    /// The built-in stage
    pub fn default_layout() -> Self {
        let mut grid = Self::empty();
        for (row, line) in DEFAULT_LAYOUT.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                grid.set_tile(col as i32, row as i32, TileType::from_char(c));
            }
        }
        grid
    }

    /// Build from a row-major matrix of tiles; missing cells stay empty and
    /// extra cells are dropped.
    pub fn from_rows(rows: &[Vec<TileType>]) -> Self {
        let mut grid = Self::empty();
        for (row, line) in rows.iter().enumerate() {
            for (col, &tile) in line.iter().enumerate() {
                grid.set_tile(col as i32, row as i32, tile);
            }
        }
        grid
    }

    #[inline]
    fn index(col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col as usize >= MAP_WIDTH || row as usize >= MAP_HEIGHT {
            return None;
        }
        Some(row as usize * MAP_WIDTH + col as usize)
    }

    /// Tile at a cell; `Empty` outside the grid
    pub fn tile(&self, col: i32, row: i32) -> TileType {
        Self::index(col, row)
            .map(|i| self.cells[i])
            .unwrap_or(TileType::Empty)
    }

    /// Overwrite a cell; no-op outside the grid
    pub fn set_tile(&mut self, col: i32, row: i32, tile: TileType) {
        if let Some(i) = Self::index(col, row) {
            self.cells[i] = tile;
        }
    }

    /// Grid size in cells (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (MAP_WIDTH, MAP_HEIGHT)
    }

    pub fn tile_size(&self) -> f32 {
        TILE_SIZE
    }

    /// Cell holding the objective, if the map has one
    pub fn objective(&self) -> Option<(i32, i32)> {
        self.cells
            .iter()
            .position(|&t| t == TileType::Eagle)
            .map(|i| ((i % MAP_WIDTH) as i32, (i / MAP_WIDTH) as i32))
    }

    /// True if any cell under `rect` stops a tank
    pub fn blocks(&self, rect: &Rect, water_passage: bool) -> bool {
        rect.covered_cells()
            .any(|(col, row)| self.tile(col, row).blocks_tank(water_passage))
    }

    /// True if any cell under `rect` is of the given type
    pub fn any_under(&self, rect: &Rect, tile: TileType) -> bool {
        rect.covered_cells().any(|(col, row)| self.tile(col, row) == tile)
    }

    /// Row-major copy of the matrix
    pub fn rows(&self) -> Vec<Vec<TileType>> {
        self.cells.chunks(MAP_WIDTH).map(|r| r.to_vec()).collect()
    }

    pub fn count(&self, tile: TileType) -> usize {
        self.cells.iter().filter(|&&t| t == tile).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_reads_empty() {
        let grid = TileGrid::default_layout();
        assert_eq!(grid.tile(-1, 0), TileType::Empty);
        assert_eq!(grid.tile(0, 13), TileType::Empty);
        assert_eq!(grid.tile(100, 100), TileType::Empty);
    }

    #[test]
    fn test_out_of_bounds_write_is_noop() {
        let mut grid = TileGrid::empty();
        grid.set_tile(-1, 5, TileType::Steel);
        grid.set_tile(13, 5, TileType::Steel);
        assert_eq!(grid, TileGrid::empty());
    }

    #[test]
    fn test_default_layout_objective_and_spawns() {
        let grid = TileGrid::default_layout();
        assert_eq!(grid.objective(), Some((6, 12)));
        assert_eq!(grid.count(TileType::Eagle), 1);
        // Spawn cells are clear
        for (col, row) in [(0, 0), (6, 0), (12, 0), (4, 12), (8, 12)] {
            assert_eq!(grid.tile(col, row), TileType::Empty, "({col},{row})");
        }
    }

    #[test]
    fn test_tile_index_roundtrip_covers_all() {
        for i in 0..=8u8 {
            let tile = TileType::from_index(i).unwrap();
            assert_eq!(tile.index(), i);
        }
        assert_eq!(TileType::from_index(9), None);
    }

    #[test]
    fn test_blocking_set() {
        assert!(TileType::Brick.blocks_tank(false));
        assert!(TileType::Water.blocks_tank(false));
        assert!(!TileType::Water.blocks_tank(true));
        assert!(!TileType::Forest.blocks_tank(false));
        assert!(!TileType::Ice.blocks_tank(false));
        assert!(TileType::Base.blocks_tank(true));
    }
}
