//! Collision resolution for bullets and tanks
//!
//! The heart of the game: bullets eat through terrain according to their
//! power level, optionally bounce off walls, damage tanks on the opposing
//! side, and cancel against equally matched bullets. Tanks treat each
//! other as solid.

use glam::Vec2;

use super::bullet::Bullet;
use super::geometry::{CollisionFace, Direction, Rect};
use super::grid::{TileGrid, TileType};
use super::state::GameEvent;
use super::tank::Tank;
use crate::reflect;

/// What happened to one bullet against the tile grid this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileResolution {
    /// Cells cleared to `Empty`, in scan order
    pub destroyed: Vec<(i32, i32)>,
    /// Tile that consumed the bullet, if any
    pub stopped_by: Option<TileType>,
    /// Face the bullet bounced off, if it bounced
    pub bounced: Option<CollisionFace>,
    pub objective_destroyed: bool,
}

/// Resolve a bullet's swept path against the grid
///
/// Cells are visited row-major over the union of the previous and current
/// bullet rectangles. Scanning stops at the first terminal interaction or
/// bounce, so a bullet never clears more bricks than its budget allows.
pub fn bullet_vs_tiles(
    bullet: &mut Bullet,
    grid: &mut TileGrid,
    events: &mut Vec<GameEvent>,
) -> TileResolution {
    let mut out = TileResolution::default();
    if !bullet.active {
        return out;
    }

    let config = bullet.config();
    let swept = bullet.swept_rect();

    for (col, row) in swept.covered_cells() {
        match grid.tile(col, row) {
            TileType::Brick => {
                if bullet.brick_budget_left() > 0 {
                    clear_brick(bullet, grid, col, row, &mut out, events);
                }
                if bullet.can_bounce() {
                    bounce(bullet, col, row, &mut out, events);
                    break;
                }
                if !config.can_penetrate_brick || bullet.brick_budget_left() == 0 {
                    bullet.deactivate();
                    out.stopped_by = Some(TileType::Brick);
                    break;
                }
            }
            TileType::Steel => {
                if config.can_penetrate_steel {
                    grid.set_tile(col, row, TileType::Empty);
                    out.destroyed.push((col, row));
                    events.push(GameEvent::SteelDestroyed { col, row });
                    bullet.deactivate();
                    out.stopped_by = Some(TileType::Steel);
                    break;
                }
                events.push(GameEvent::MetalHit);
                if bullet.can_bounce() {
                    bounce(bullet, col, row, &mut out, events);
                    break;
                }
                bullet.deactivate();
                out.stopped_by = Some(TileType::Steel);
                break;
            }
            tile @ (TileType::Water | TileType::Base) => {
                bullet.deactivate();
                out.stopped_by = Some(tile);
                break;
            }
            TileType::Eagle => {
                bullet.deactivate();
                out.stopped_by = Some(TileType::Eagle);
                out.objective_destroyed = true;
                events.push(GameEvent::ObjectiveDestroyed);
                break;
            }
            TileType::Empty | TileType::Floor | TileType::Forest | TileType::Ice => {}
        }
    }

    out
}

fn clear_brick(
    bullet: &mut Bullet,
    grid: &mut TileGrid,
    col: i32,
    row: i32,
    out: &mut TileResolution,
    events: &mut Vec<GameEvent>,
) {
    grid.set_tile(col, row, TileType::Empty);
    bullet.bricks_destroyed += 1;
    out.destroyed.push((col, row));
    events.push(GameEvent::BrickDestroyed { col, row });
}

/// Reflect off the struck cell and step back out of it
fn bounce(
    bullet: &mut Bullet,
    col: i32,
    row: i32,
    out: &mut TileResolution,
    events: &mut Vec<GameEvent>,
) {
    let cell = Rect::cell(col, row);
    let face = CollisionFace::crossed(&bullet.previous_rect(), &bullet.rect(), &cell)
        .unwrap_or_else(|| CollisionFace::facing(bullet.velocity));

    bullet.bounce_count += 1;
    let speed = bullet.config().speed * bullet.bounce_damping.powi(bullet.bounce_count as i32);
    bullet.velocity = reflect(bullet.velocity, face.normal()).normalize_or_zero() * speed;
    bullet.direction = heading(bullet.velocity);
    bullet.pos = bullet.previous;
    // The last allowed bounce still reflects, then the bullet is spent
    if bullet.bounce_count >= bullet.max_bounces {
        bullet.deactivate();
    }

    log::debug!(
        "bullet bounced off ({col},{row}) {:?}, bounce {}/{}",
        face,
        bullet.bounce_count,
        bullet.max_bounces
    );
    out.bounced = Some(face);
    events.push(GameEvent::BulletBounced);
}

/// Dominant-axis facing of a velocity
fn heading(velocity: Vec2) -> Direction {
    if velocity.y.abs() >= velocity.x.abs() {
        if velocity.y < 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    } else if velocity.x < 0.0 {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// One bullet striking one tank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TankHit {
    /// Position of the target in the list passed in
    pub index: usize,
    /// Target was shielded and took no damage
    pub absorbed: bool,
    /// Target's health reached zero
    pub killed: bool,
}

/// Resolve a bullet against the opposing side's tanks, in list order
///
/// The caller passes only valid targets (enemies for player bullets,
/// players for enemy bullets), so friendly fire is impossible here. A
/// tank-piercing bullet kills non-armored targets outright and carries on;
/// everything else stops at the first live tank it touches.
pub fn bullet_vs_tanks<'a>(
    bullet: &mut Bullet,
    targets: impl IntoIterator<Item = &'a mut Tank>,
) -> Vec<TankHit> {
    let mut hits = Vec::new();
    if !bullet.active {
        return hits;
    }

    let swept = bullet.swept_rect();
    let pierces = bullet.config().pierces_tanks;

    for (index, tank) in targets.into_iter().enumerate() {
        if !tank.is_alive() || !swept.overlaps(&tank.rect()) {
            continue;
        }

        if tank.is_shielded() {
            bullet.deactivate();
            hits.push(TankHit {
                index,
                absorbed: true,
                killed: false,
            });
            break;
        }

        if pierces && !tank.armored {
            tank.health = 0;
            hits.push(TankHit {
                index,
                absorbed: false,
                killed: true,
            });
            continue;
        }

        tank.health -= 1;
        bullet.deactivate();
        hits.push(TankHit {
            index,
            absorbed: false,
            killed: !tank.is_alive(),
        });
        break;
    }

    hits
}

/// Cancel bullets of equal power level whose paths this step overlap.
/// Returns the number of pairs cancelled.
///
/// Swept rectangles keep fast head-on pairs from skipping past each other
/// under a long frame step.
pub fn bullet_vs_bullets(bullets: &mut [Bullet]) -> usize {
    let mut pairs = 0;
    for i in 0..bullets.len() {
        for j in (i + 1)..bullets.len() {
            let (a, b) = (&bullets[i], &bullets[j]);
            if !a.active || !b.active || a.power_level != b.power_level {
                continue;
            }
            if a.swept_rect().overlaps(&b.swept_rect()) {
                bullets[i].deactivate();
                bullets[j].deactivate();
                pairs += 1;
                break;
            }
        }
    }
    pairs
}

/// Should a tank that just moved by `delta` be pushed back?
///
/// True when its rectangle overlaps another live tank and the move brought
/// the two closer together. `PlayerTank::respawn` places a tank on its spawn
/// point without checking `GameState::tank_at`, so a player can come back on
/// top of another tank. Blocking every overlap would pin both in place; the
/// distance test lets them drive apart.
pub fn tank_blocked<'a>(
    mover: &Tank,
    delta: Vec2,
    others: impl IntoIterator<Item = &'a Tank>,
) -> bool {
    if delta == Vec2::ZERO {
        return false;
    }
    let rect = mover.rect();
    let now = rect.center();
    let before = now - delta;
    others.into_iter().any(|other| {
        if !other.is_alive() {
            return false;
        }
        let other_rect = other.rect();
        if !rect.overlaps(&other_rect) {
            return false;
        }
        let c = other_rect.center();
        now.distance_squared(c) < before.distance_squared(c)
    })
}
