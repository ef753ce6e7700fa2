//! Axis-aligned geometry for the tile world
//!
//! Everything in the playfield is an axis-aligned box in pixel space with
//! y pointing down: tanks, bullets, pickups and grid cells.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::TILE_SIZE;
use crate::tile_of;

/// Cardinal facing shared by tanks and bullets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step in screen space (y down)
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn at(pos: Vec2, size: f32) -> Self {
        Self::new(pos.x, pos.y, size, size)
    }

    /// Rectangle of a grid cell
    pub fn cell(col: i32, row: i32) -> Self {
        Self::new(
            col as f32 * TILE_SIZE,
            row as f32 * TILE_SIZE,
            TILE_SIZE,
            TILE_SIZE,
        )
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict AABB overlap; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    /// True if the rectangle lies fully inside `[0, width] × [0, height]`
    pub fn inside_field(&self, width: f32, height: f32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.right() <= width && self.bottom() <= height
    }

    /// Grid cells the rectangle overlaps, row-major (top-to-bottom, then
    /// left-to-right). Cells the rectangle merely touches are excluded.
    pub fn covered_cells(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let col0 = tile_of(self.x);
        let row0 = tile_of(self.y);
        let col1 = ((self.right() / TILE_SIZE).ceil() as i32 - 1).max(col0);
        let row1 = ((self.bottom() / TILE_SIZE).ceil() as i32 - 1).max(row0);
        (row0..=row1).flat_map(move |row| (col0..=col1).map(move |col| (col, row)))
    }
}

/// Face of a cell struck by a moving box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionFace {
    Top,
    Bottom,
    Left,
    Right,
}

impl CollisionFace {
    /// Axis-aligned unit normal used for reflection
    pub fn normal(self) -> Vec2 {
        match self {
            CollisionFace::Top => Vec2::new(0.0, 1.0),
            CollisionFace::Bottom => Vec2::new(0.0, -1.0),
            CollisionFace::Left => Vec2::new(1.0, 0.0),
            CollisionFace::Right => Vec2::new(-1.0, 0.0),
        }
    }

    /// Which boundary of `target` the box crossed going from `prev` to `curr`
    ///
    /// Vertical crossings are checked first. Returns `None` when the box was
    /// already overlapping the target in the previous sample.
    pub fn crossed(prev: &Rect, curr: &Rect, target: &Rect) -> Option<CollisionFace> {
        if prev.bottom() <= target.y && curr.bottom() > target.y {
            return Some(CollisionFace::Top);
        }
        if prev.y >= target.bottom() && curr.y < target.bottom() {
            return Some(CollisionFace::Bottom);
        }
        if prev.right() <= target.x && curr.right() > target.x {
            return Some(CollisionFace::Left);
        }
        if prev.x >= target.right() && curr.x < target.right() {
            return Some(CollisionFace::Right);
        }
        None
    }

    /// Face a box travelling along `velocity` would strike first
    pub fn facing(velocity: Vec2) -> CollisionFace {
        if velocity.y.abs() >= velocity.x.abs() {
            if velocity.y >= 0.0 {
                CollisionFace::Top
            } else {
                CollisionFace::Bottom
            }
        } else if velocity.x >= 0.0 {
            CollisionFace::Left
        } else {
            CollisionFace::Right
        }
    }
}
