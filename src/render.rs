//! Renderer seam
//!
//! Drawing lives outside the crate. The browser build hands the snapshot to a
//! JS hook as JSON; the native binary prints a character map.

use crate::consts::TILE_SIZE;
use crate::tile_of;
use crate::sim::{EnemyKind, Snapshot, TankKind, TileType};

/// Draws a captured frame
pub trait Renderer {
    fn draw(&mut self, snapshot: &Snapshot);
}

fn tile_glyph(index: u8) -> char {
    match TileType::from_index(index) {
        Some(TileType::Empty) | None => '.',
        Some(TileType::Brick) => '#',
        Some(TileType::Steel) => '@',
        Some(TileType::Water) => '~',
        Some(TileType::Base) => '=',
        Some(TileType::Forest) => '%',
        Some(TileType::Ice) => '-',
        Some(TileType::Floor) => '_',
        Some(TileType::Eagle) => 'E',
    }
}

fn tank_glyph(kind: TankKind) -> char {
    match kind {
        TankKind::Player { slot } => char::from_digit(slot + 1, 10).unwrap_or('P'),
        TankKind::Enemy { kind } => match kind {
            EnemyKind::Normal => 'n',
            EnemyKind::Fast => 'f',
            EnemyKind::Heavy => 'h',
            EnemyKind::Super => 's',
            EnemyKind::Light => 'l',
            EnemyKind::ArmoredCar => 'a',
            EnemyKind::AntiTank => 't',
        },
    }
}

/// Character cell under a pixel point, if on the board
fn cell_of(x: f32, y: f32, width: usize, height: usize) -> Option<(usize, usize)> {
    let (col, row) = (tile_of(x), tile_of(y));
    if col < 0 || row < 0 {
        return None;
    }
    let (col, row) = (col as usize, row as usize);
    (col < width && row < height).then_some((col, row))
}

/// One character per tile. Forest hides tanks as it does on screen.
pub fn render_text(snapshot: &Snapshot) -> String {
    let mut board: Vec<Vec<char>> = snapshot
        .tiles
        .iter()
        .map(|row| row.iter().map(|&t| tile_glyph(t)).collect())
        .collect();
    let (width, height) = (snapshot.width, snapshot.height);

    let mut mark = |x: f32, y: f32, glyph: char| {
        if let Some((col, row)) = cell_of(x, y, width, height) {
            let cell = &mut board[row][col];
            if *cell != '%' {
                *cell = glyph;
            }
        }
    };

    for p in &snapshot.powerups {
        mark(p.pos.x + TILE_SIZE / 2.0, p.pos.y + TILE_SIZE / 2.0, '+');
    }
    for b in &snapshot.bullets {
        mark(b.pos.x + b.size / 2.0, b.pos.y + b.size / 2.0, '*');
    }
    for t in &snapshot.tanks {
        mark(t.pos.x + t.size / 2.0, t.pos.y + t.size / 2.0, tank_glyph(t.kind));
    }

    let mut out = String::with_capacity((width + 1) * height + 64);
    for row in board {
        out.extend(row);
        out.push('\n');
    }
    for p in &snapshot.players {
        out.push_str(&format!(
            "P{} score {} lives {} weapon {}\n",
            p.slot + 1,
            p.score,
            p.lives,
            p.weapon_level
        ));
    }
    out.push_str(&format!(
        "level {} enemies left {} phase {:?}\n",
        snapshot.level, snapshot.enemies_remaining, snapshot.phase
    ));
    out
}

/// Keeps the last frame as text
#[derive(Debug, Default)]
pub struct TextRenderer {
    pub frame: String,
}

impl Renderer for TextRenderer {
    fn draw(&mut self, snapshot: &Snapshot) {
        self.frame = render_text(snapshot);
    }
}
