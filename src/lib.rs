//! Battle City - A tile-based tank arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile grid, tanks, bullets, collisions, power-ups)
//! - `level`: Level data (built-in campaign and JSON level files)
//! - `settings`: Player-facing configuration
//! - `input`, `audio`, `render`: Collaborator seams for the platform layer

pub mod audio;
pub mod error;
pub mod input;
pub mod level;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::GameError;
pub use level::LevelData;
pub use settings::{BounceSettings, Settings};

/// Game configuration constants
pub mod consts {
    /// Edge length of one grid cell in pixels
    pub const TILE_SIZE: f32 = 32.0;
    /// Grid dimensions (cells)
    pub const MAP_WIDTH: usize = 13;
    pub const MAP_HEIGHT: usize = 13;
    /// Playfield size in pixels
    pub const FIELD_WIDTH: f32 = TILE_SIZE * MAP_WIDTH as f32;
    pub const FIELD_HEIGHT: f32 = TILE_SIZE * MAP_HEIGHT as f32;

    /// Fixed step used by the headless runner (seconds)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest step a single frame may advance the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Tank hitbox edge (pixels); smaller than a tile so one-cell corridors are passable
    pub const TANK_SIZE: f32 = 28.0;
    pub const PLAYER_SPEED: f32 = 80.0;
    pub const PLAYER_START_LIVES: u32 = 3;
    /// Off-axis distance from a tile boundary tolerated before snapping
    pub const SNAP_THRESHOLD: f32 = 2.0;
    /// How long a tank keeps drifting after releasing the throttle on ice
    pub const ICE_SLIDE_TIME: f32 = 0.25;

    /// Bullet hitbox edge (pixels)
    pub const BULLET_SIZE: f32 = 8.0;
    /// Bullets are culled once this far outside the playfield
    pub const BULLET_BOUNDS_MARGIN: f32 = 16.0;
    /// Bullets pre-allocated in the pool
    pub const BULLET_POOL_SIZE: usize = 50;

    /// Enemy wave defaults
    pub const MAX_ENEMIES_PER_LEVEL: u32 = 20;
    pub const MAX_ON_SCREEN_ENEMIES: u32 = 4;
    pub const ENEMY_SPAWN_INTERVAL: f32 = 3.0;
    /// Spawn invulnerability window for new enemies (seconds)
    pub const ENEMY_SPAWN_SHIELD: f32 = 3.0;
    /// Random direction-change interval bounds (seconds)
    pub const ENEMY_TURN_MIN: f32 = 1.0;
    pub const ENEMY_TURN_MAX: f32 = 3.0;
    /// Seconds between enemy shoot decisions, and the chance a decision fires
    pub const ENEMY_SHOOT_INTERVAL: f32 = 1.0;
    pub const ENEMY_SHOOT_CHANCE: f64 = 0.5;

    /// Power-up lifetime, flashing window and pickup grace period (seconds)
    pub const POWER_UP_DURATION: f32 = 15.0;
    pub const POWER_UP_FLASH_TIME: f32 = 3.0;
    pub const POWER_UP_SPAWN_DELAY: f32 = 0.5;

    /// Effect durations (seconds)
    pub const HELMET_DURATION: f32 = 15.0;
    pub const CLOCK_DURATION: f32 = 10.0;
    pub const SHOVEL_DURATION: f32 = 20.0;
    pub const RESPAWN_SHIELD: f32 = 3.0;

    /// Score needed for each bonus life
    pub const EXTRA_LIFE_SCORE: u64 = 20_000;
}

/// Reflect a velocity across a surface normal: v' = v - 2(v·n)n
///
/// `normal` must already be unit length; collision code only ever passes
/// axis-aligned normals, so nothing is normalized here.
#[inline]
pub fn reflect(velocity: glam::Vec2, normal: glam::Vec2) -> glam::Vec2 {
    debug_assert!((normal.length_squared() - 1.0).abs() < 1e-4);
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Grid cell containing a pixel coordinate (may be outside the grid)
#[inline]
pub fn tile_of(pixel: f32) -> i32 {
    (pixel / consts::TILE_SIZE).floor() as i32
}
