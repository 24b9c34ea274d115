//! Grid of road tiles and the adjacency rules that shape them

use super::types::Direction;

/// Shape of a grid cell, named after the neighbors it connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileType {
    #[default]
    Empty,
    Alone,
    Up,
    Right,
    Down,
    Left,
    UpRight,
    RightDown,
    DownLeft,
    UpLeft,
    UpDown,
    RightLeft,
    UpRightDown,
    RightDownLeft,
    UpDownLeft,
    UpRightLeft,
    UpRightDownLeft,
}

/// Tile shape for every neighbor mask (bit 0 = up, 1 = right, 2 = down, 3 = left)
const TILE_TYPE_BY_MASK: [TileType; 16] = [
    TileType::Alone,           // 0b0000
    TileType::Up,              // 0b0001
    TileType::Right,           // 0b0010
    TileType::UpRight,         // 0b0011
    TileType::Down,            // 0b0100
    TileType::UpDown,          // 0b0101
    TileType::RightDown,       // 0b0110
    TileType::UpRightDown,     // 0b0111
    TileType::Left,            // 0b1000
    TileType::UpLeft,          // 0b1001
    TileType::RightLeft,       // 0b1010
    TileType::UpRightLeft,     // 0b1011
    TileType::DownLeft,        // 0b1100
    TileType::UpDownLeft,      // 0b1101
    TileType::RightDownLeft,   // 0b1110
    TileType::UpRightDownLeft, // 0b1111
];

impl TileType {
    /// Classify a road tile from its neighbor-presence mask
    pub fn from_mask(mask: u8) -> TileType {
        TILE_TYPE_BY_MASK[(mask & 0b1111) as usize]
    }

    /// Neighbor-presence mask of this shape, `None` for empty cells
    pub fn mask(self) -> Option<u8> {
        if self == TileType::Empty {
            return None;
        }
        TILE_TYPE_BY_MASK
            .iter()
            .position(|t| *t == self)
            .map(|mask| mask as u8)
    }

    pub fn is_empty(self) -> bool {
        self == TileType::Empty
    }

    /// Directions carrying a road segment.
    ///
    /// A lone tile still carries one stub so it can host traffic.
    pub fn segment_directions(self) -> Vec<Direction> {
        match self {
            TileType::Empty => Vec::new(),
            TileType::Alone => vec![Direction::Up],
            other => {
                let mask = other.mask().unwrap_or(0);
                Direction::ALL
                    .into_iter()
                    .filter(|d| mask & d.bit() != 0)
                    .collect()
            }
        }
    }

    /// Box-drawing character for text maps
    pub fn glyph(self) -> char {
        match self {
            TileType::Empty => ' ',
            TileType::Alone => '□',
            TileType::Up => '╵',
            TileType::Right => '╶',
            TileType::Down => '╷',
            TileType::Left => '╴',
            TileType::UpRight => '└',
            TileType::RightDown => '┌',
            TileType::DownLeft => '┐',
            TileType::UpLeft => '┘',
            TileType::UpDown => '│',
            TileType::RightLeft => '─',
            TileType::UpRightDown => '├',
            TileType::RightDownLeft => '┬',
            TileType::UpDownLeft => '┤',
            TileType::UpRightLeft => '┴',
            TileType::UpRightDownLeft => '┼',
        }
    }

    /// Whether traffic through this tile is arbitrated (T-junctions and crossings)
    pub fn is_intersection(self) -> bool {
        self.mask().is_some_and(|mask| mask.count_ones() >= 3)
    }
}

/// A non-empty grid neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub row: usize,
    pub col: usize,
    pub tile_type: TileType,
}

/// Non-empty neighbors of a cell, indexed by [`Direction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors([Option<Neighbor>; 4]);

impl Neighbors {
    pub fn get(&self, direction: Direction) -> Option<&Neighbor> {
        self.0[direction.index()].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &Neighbor)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.get(d).map(|n| (d, n)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mask(&self) -> u8 {
        self.iter().fold(0, |mask, (d, _)| mask | d.bit())
    }
}

/// Row-major matrix of tile shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMatrix {
    rows: usize,
    cols: usize,
    tiles: Vec<TileType>,
}

impl TileMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            tiles: vec![TileType::Empty; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Packed cell key, `row * cols + col`
    pub fn key(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Tile at a cell; out-of-bounds cells read as empty
    pub fn get(&self, row: usize, col: usize) -> TileType {
        if !self.contains(row, col) {
            return TileType::Empty;
        }
        self.tiles[self.key(row, col)]
    }

    /// Cell one step away in `direction`, if it lies on the grid
    pub fn step(&self, row: usize, col: usize, direction: Direction) -> Option<(usize, usize)> {
        let (dr, dc) = direction.grid_offset();
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        self.contains(r, c).then_some((r, c))
    }

    pub fn neighbors(&self, row: usize, col: usize) -> Neighbors {
        let mut neighbors = Neighbors::default();
        for direction in Direction::ALL {
            if let Some((r, c)) = self.step(row, col, direction) {
                let tile_type = self.get(r, c);
                if !tile_type.is_empty() {
                    neighbors.0[direction.index()] = Some(Neighbor {
                        row: r,
                        col: c,
                        tile_type,
                    });
                }
            }
        }
        neighbors
    }

    /// Shape a cell should have given its current neighbors.
    ///
    /// Empty cells stay empty unless `was_added` marks them as just placed.
    pub fn evaluate_type(&self, row: usize, col: usize, was_added: bool) -> TileType {
        if !was_added && self.get(row, col).is_empty() {
            return TileType::Empty;
        }
        TileType::from_mask(self.neighbors(row, col).mask())
    }

    fn update_tile(&mut self, row: usize, col: usize, was_added: bool) {
        let tile_type = self.evaluate_type(row, col, was_added);
        let key = self.key(row, col);
        self.tiles[key] = tile_type;
    }

    fn update_neighbors(&mut self, row: usize, col: usize) {
        for direction in Direction::ALL {
            if let Some((r, c)) = self.step(row, col, direction) {
                self.update_tile(r, c, false);
            }
        }
    }

    /// Place a road tile. Returns false, without touching the grid, when the
    /// cell is off the grid, already occupied, or isolated while
    /// `restrict_to_neighbors` is set.
    pub fn add_tile(&mut self, row: usize, col: usize, restrict_to_neighbors: bool) -> bool {
        if !self.contains(row, col) || !self.get(row, col).is_empty() {
            return false;
        }
        if restrict_to_neighbors && self.neighbors(row, col).is_empty() {
            return false;
        }

        self.update_tile(row, col, true);
        self.update_neighbors(row, col);
        true
    }

    /// Clear a road tile. Returns false when there is nothing to remove.
    pub fn remove_tile(&mut self, row: usize, col: usize) -> bool {
        if !self.contains(row, col) || self.get(row, col).is_empty() {
            return false;
        }

        let key = self.key(row, col);
        self.tiles[key] = TileType::Empty;
        self.update_neighbors(row, col);
        true
    }

    /// Number of non-empty cells
    pub fn tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_empty()).count()
    }

    /// Snapshot of the grid, one vector per row
    pub fn grid(&self) -> Vec<Vec<TileType>> {
        self.tiles.chunks(self.cols.max(1)).map(|row| row.to_vec()).collect()
    }
}
