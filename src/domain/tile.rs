/// Collision grid: a sparse map of solid tiles plus the authored rooms.
///
/// A tile key is present iff that tile is solid. Everything that walks a
/// neighbourhood or a span clamps it to the grid first, so no lookup is ever
/// made outside `0..width` × `0..height`.
///
/// The grid is built once per level and never mutated while the level runs.

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use super::geometry::{Rect, TileKey};
use crate::error::{LevelError, Result};

/// Two opposite corners of an authored room, in tile coordinates (inclusive).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RoomRect {
    pub a: TileKey,
    pub b: TileKey,
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    tiles: HashMap<TileKey, Rect>,
    rooms: Vec<BTreeSet<TileKey>>,
    width: i32,
    height: i32,
    tile_size: i32,
    world_size: (i32, i32),
    neighborhood_range: i32,
}

// ── Construction ──

impl TileGrid {
    /// Build from a row-major occupancy array (`0` = empty, anything else = solid).
    ///
    /// The array must be exactly `height` rows of `width` cells; a mismatch is
    /// fatal rather than truncated. The tile size must be positive and the
    /// world extent must fit in `i32` units.
    pub fn build(
        width: usize,
        height: usize,
        rows: &[Vec<u8>],
        rooms: &[RoomRect],
        tile_size: i32,
        neighborhood_range: i32,
    ) -> Result<Self> {
        if tile_size <= 0 {
            return Err(LevelError::BadTileSize(tile_size));
        }
        let extent = |tiles: usize| i32::try_from(tiles).ok().and_then(|n| n.checked_mul(tile_size));
        let world_size = match (extent(width), extent(height)) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(LevelError::WorldTooLarge { width, height, tile_size }),
        };

        if rows.len() != height {
            return Err(LevelError::RowCountMismatch { expected: height, found: rows.len() });
        }

        let mut tiles = HashMap::new();
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(LevelError::ColumnCountMismatch { row: y, expected: width, found: row.len() });
            }
            for (x, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let (x, y) = (x as i32, y as i32);
                tiles.insert((x, y), Rect::new(x * tile_size, y * tile_size, tile_size, tile_size));
            }
        }

        let mut grid = TileGrid {
            tiles,
            rooms: Vec::with_capacity(rooms.len()),
            width: width as i32,
            height: height as i32,
            tile_size,
            world_size,
            neighborhood_range: neighborhood_range.max(0),
        };
        grid.rooms = rooms.iter().map(|room| grid.collect_room(room)).collect();

        tracing::debug!(
            width, height,
            solid = grid.tiles.len(),
            rooms = grid.rooms.len(),
            "tile grid built"
        );
        Ok(grid)
    }

    /// Empty tiles inside the rectangle, clipped to the grid.
    fn collect_room(&self, room: &RoomRect) -> BTreeSet<TileKey> {
        let xs = self.clamp_x(room.a.0.min(room.b.0), room.a.0.max(room.b.0));
        let ys = self.clamp_y(room.a.1.min(room.b.1), room.a.1.max(room.b.1));

        let mut keys = BTreeSet::new();
        for x in xs {
            for y in ys.clone() {
                if !self.tiles.contains_key(&(x, y)) {
                    keys.insert((x, y));
                }
            }
        }
        keys
    }
}

// ── Queries ──

impl TileGrid {
    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }
    pub fn tile_size(&self) -> i32 { self.tile_size }

    /// World extent in units: `(width × tile, height × tile)`.
    pub fn world_size(&self) -> (i32, i32) {
        self.world_size
    }

    pub fn solid_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_solid(&self, key: TileKey) -> bool {
        self.tiles.contains_key(&key)
    }

    pub fn tile(&self, key: TileKey) -> Option<&Rect> {
        self.tiles.get(&key)
    }

    pub fn in_bounds(&self, key: TileKey) -> bool {
        key.0 >= 0 && key.0 < self.width && key.1 >= 0 && key.1 < self.height
    }

    /// The tile a point lies in. No existence or bounds check.
    pub fn tile_key_for(&self, x: i32, y: i32) -> TileKey {
        (x.div_euclid(self.tile_size), y.div_euclid(self.tile_size))
    }

    /// Same as [`tile_key_for`](Self::tile_key_for) for float positions.
    pub fn tile_key_for_f32(&self, x: f32, y: f32) -> TileKey {
        self.tile_key_for(x.floor() as i32, y.floor() as i32)
    }

    /// World-space centre of a tile.
    pub fn tile_center(&self, key: TileKey) -> (i32, i32) {
        let half = self.tile_size / 2;
        (key.0 * self.tile_size + half, key.1 * self.tile_size + half)
    }

    /// Solid tiles a rect could touch: every tile from the one holding its
    /// top-left corner to the one holding its bottom-right edge, inclusive.
    pub fn tiles_near(&self, rect: &Rect) -> Vec<Rect> {
        let xs = self.clamp_x(
            rect.left().div_euclid(self.tile_size),
            rect.right().div_euclid(self.tile_size),
        );
        let ys = self.clamp_y(
            rect.top().div_euclid(self.tile_size),
            rect.bottom().div_euclid(self.tile_size),
        );
        self.collect_solid(xs, ys)
    }

    /// Solid tiles in the 3×3 block around a point.
    pub fn surrounding_tiles(&self, x: f32, y: f32) -> Vec<Rect> {
        let (tx, ty) = self.tile_key_for_f32(x, y);
        self.collect_solid(self.clamp_x(tx - 1, tx + 1), self.clamp_y(ty - 1, ty + 1))
    }

    /// Empty tiles in the configured neighbourhood of a point, excluding the
    /// tile the point itself lies in. Keys are in column-major scan order.
    pub fn empty_tile_keys_around(&self, x: i32, y: i32) -> Vec<TileKey> {
        let own = self.tile_key_for(x, y);
        let r = self.neighborhood_range;

        let mut keys = vec![];
        for tx in self.clamp_x(own.0 - r, own.0 + r) {
            for ty in self.clamp_y(own.1 - r, own.1 + r) {
                let key = (tx, ty);
                if key != own && !self.tiles.contains_key(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Empty tiles of a room, or `None` for an unknown room id.
    pub fn room_tile_keys(&self, room_id: usize) -> Option<&BTreeSet<TileKey>> {
        self.rooms.get(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Does the room contain this tile? Unknown rooms contain nothing.
    pub fn room_contains(&self, room_id: usize, key: TileKey) -> bool {
        self.rooms.get(room_id).map_or(false, |room| room.contains(&key))
    }

    fn collect_solid(&self, xs: RangeInclusive<i32>, ys: RangeInclusive<i32>) -> Vec<Rect> {
        let mut rects = vec![];
        for tx in xs {
            for ty in ys.clone() {
                if let Some(rect) = self.tiles.get(&(tx, ty)) {
                    rects.push(*rect);
                }
            }
        }
        rects
    }

    // An inverted range (lo > hi) is empty, which is what a fully
    // out-of-grid span should produce.
    fn clamp_x(&self, lo: i32, hi: i32) -> RangeInclusive<i32> {
        lo.max(0)..=hi.min(self.width - 1)
    }

    fn clamp_y(&self, lo: i32, hi: i32) -> RangeInclusive<i32> {
        lo.max(0)..=hi.min(self.height - 1)
    }
}

#[cfg(test)]
impl TileGrid {
    /// Build from a diagram: `#` = solid, anything else = empty.
    pub fn from_diagram(rows: &[&str], rooms: &[RoomRect], tile_size: i32) -> Self {
        let height = rows.len();
        let width = rows[0].len();
        let cells: Vec<Vec<u8>> = rows
            .iter()
            .map(|row| row.chars().map(|c| u8::from(c == '#')).collect())
            .collect();
        TileGrid::build(width, height, &cells, rooms, tile_size, 2).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_keys_only_solid_tiles() {
        let g = TileGrid::from_diagram(&[
            "#..",
            ".#.",
            "..#",
        ], &[], 128);
        assert_eq!(g.solid_count(), 3);
        assert_eq!(g.tile((1, 1)), Some(&Rect::new(128, 128, 128, 128)));
        assert!(g.tile((1, 0)).is_none());
        assert_eq!(g.world_size(), (384, 384));
    }

    #[test]
    fn build_rejects_row_count_mismatch() {
        let rows = vec![vec![0u8; 3]; 2];
        let err = TileGrid::build(3, 3, &rows, &[], 128, 2).unwrap_err();
        assert!(matches!(err, LevelError::RowCountMismatch { expected: 3, found: 2 }));
    }

    #[test]
    fn build_rejects_column_count_mismatch() {
        let rows = vec![vec![0u8; 3], vec![0u8; 2]];
        let err = TileGrid::build(3, 2, &rows, &[], 128, 2).unwrap_err();
        assert!(matches!(err, LevelError::ColumnCountMismatch { row: 1, expected: 3, found: 2 }));
    }

    #[test]
    fn build_rejects_non_positive_tile_size() {
        let rows = vec![vec![0u8; 3]; 3];
        for size in [0, -16] {
            let err = TileGrid::build(3, 3, &rows, &[], size, 2).unwrap_err();
            assert!(matches!(err, LevelError::BadTileSize(s) if s == size));
        }
    }

    #[test]
    fn build_rejects_world_wider_than_i32() {
        let rows = vec![vec![0u8; 20_000_000]];
        let err = TileGrid::build(20_000_000, 1, &rows, &[], 128, 2).unwrap_err();
        assert!(matches!(err, LevelError::WorldTooLarge { width: 20_000_000, height: 1, tile_size: 128 }));
    }

    #[test]
    fn tile_key_floors_negative_positions() {
        let g = TileGrid::from_diagram(&["..."], &[], 128);
        assert_eq!(g.tile_key_for(0, 0), (0, 0));
        assert_eq!(g.tile_key_for(127, 128), (0, 1));
        assert_eq!(g.tile_key_for(-1, -129), (-1, -2));
        assert_eq!(g.tile_key_for_f32(-0.5, 255.9), (-1, 1));
    }

    #[test]
    fn tiles_near_covers_touched_span() {
        let g = TileGrid::from_diagram(&[
            "####",
            "####",
            "####",
        ], &[], 100);
        // Spans x 50..150 → tiles 0..=1, y 120..180 → tile 1
        let near = g.tiles_near(&Rect::new(50, 120, 100, 60));
        assert_eq!(near.len(), 2 * 1);
        // Bottom-right edge exactly on a tile boundary still pulls in the next tile
        let near = g.tiles_near(&Rect::new(0, 0, 100, 100));
        assert_eq!(near.len(), 4);
    }

    #[test]
    fn tiles_near_clamps_outside_grid() {
        let g = TileGrid::from_diagram(&["##", "##"], &[], 100);
        assert_eq!(g.tiles_near(&Rect::new(-500, -500, 50, 50)).len(), 0);
        assert_eq!(g.tiles_near(&Rect::new(-50, -50, 100, 100)).len(), 1);
        assert_eq!(g.tiles_near(&Rect::new(150, 150, 500, 500)).len(), 1);
    }

    #[test]
    fn empty_neighbours_of_lone_block() {
        // 3×3 grid with only the middle occupied
        let g = TileGrid::from_diagram(&[
            "...",
            ".#.",
            "...",
        ], &[], 128);
        let (cx, cy) = g.tile_center((1, 1));
        let keys = g.empty_tile_keys_around(cx, cy);
        assert_eq!(keys.len(), 8);
        assert!(!keys.contains(&(1, 1)));
        for x in 0..3 {
            for y in 0..3 {
                if (x, y) != (1, 1) {
                    assert!(keys.contains(&(x, y)), "missing ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn empty_neighbours_exclude_own_and_solid() {
        let g = TileGrid::from_diagram(&[
            "#....",
            ".....",
            ".....",
            ".....",
            "....#",
        ], &[], 128);
        let (cx, cy) = g.tile_center((2, 2));
        let keys = g.empty_tile_keys_around(cx, cy);
        // 25 - own - two solid corners
        assert_eq!(keys.len(), 22);
        assert!(!keys.contains(&(2, 2)));
        assert!(!keys.contains(&(0, 0)));
    }

    #[test]
    fn empty_neighbours_clamped_at_corner() {
        let g = TileGrid::from_diagram(&["....", "....", "....", "...."], &[], 128);
        let keys = g.empty_tile_keys_around(10, 10);
        // 3×3 in-bounds block minus own tile
        assert_eq!(keys.len(), 8);
        assert!(keys.iter().all(|k| g.in_bounds(*k)));
    }

    #[test]
    fn rooms_hold_only_empty_tiles_clipped_to_grid() {
        let rooms = [
            RoomRect { a: (0, 0), b: (1, 1) },
            RoomRect { a: (5, 5), b: (1, 1) }, // reversed corners, runs off the grid
        ];
        let g = TileGrid::from_diagram(&[
            "#..",
            "...",
            "..#",
        ], &rooms, 128);
        let first = g.room_tile_keys(0).unwrap();
        assert_eq!(first.len(), 3);
        assert!(!first.contains(&(0, 0)));

        let second = g.room_tile_keys(1).unwrap();
        assert_eq!(second.iter().copied().collect::<Vec<_>>(), vec![(1, 1), (1, 2), (2, 1)]);

        // Rooms may overlap
        assert!(g.room_contains(0, (1, 1)) && g.room_contains(1, (1, 1)));
        assert!(g.room_tile_keys(7).is_none());
        assert!(!g.room_contains(7, (1, 1)));
    }

    #[test]
    fn surrounding_tiles_is_three_by_three() {
        let g = TileGrid::from_diagram(&[
            "#####",
            "#####",
            "#####",
        ], &[], 10);
        assert_eq!(g.surrounding_tiles(25.0, 15.0).len(), 9);
        assert_eq!(g.surrounding_tiles(0.0, 0.0).len(), 4);
    }
}
