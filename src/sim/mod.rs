//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, held in the game state
//! - Stable iteration order (list order, row-major grid scans)
//! - No rendering, audio or platform dependencies

pub mod bullet;
pub mod collision;
pub mod geometry;
pub mod grid;
pub mod powerup;
pub mod score;
pub mod snapshot;
pub mod state;
pub mod tank;
pub mod tick;

pub use bullet::{
    BULLET_LEVELS, BounceRule, Bullet, BulletColor, BulletConfig, BulletPool, Cannon, FireOrder,
    bullet_config,
};
pub use collision::{
    TankHit, TileResolution, bullet_vs_bullets, bullet_vs_tanks, bullet_vs_tiles, tank_blocked,
};
pub use geometry::{CollisionFace, Direction, Rect};
pub use grid::{TileGrid, TileType};
pub use powerup::{Collectible, PowerUp, PowerUpKind, PowerUpManager};
pub use score::ScoreKeeper;
pub use snapshot::{Snapshot, TankKind};
pub use state::{GameEvent, GameOverReason, GamePhase, GameState};
pub use tank::{EnemyKind, EnemyStats, EnemyTank, PlayerTank, Tank};
pub use tick::{PlayerIntent, TickInput, tick};
