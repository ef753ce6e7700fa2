//! Bullets, the power-level table and the bullet free list
//!
//! A bullet's power level fully determines its speed, the shooter's fire
//! cooldown, how many bricks it may break, whether it breaks steel or
//! pierces tanks, and its colour. All of that is read from `BULLET_LEVELS`
//! at fire time and never stored independently.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Rect};
use crate::consts::{BULLET_BOUNDS_MARGIN, BULLET_POOL_SIZE, BULLET_SIZE, FIELD_HEIGHT, FIELD_WIDTH};

/// Bullet tint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BulletColor {
    #[default]
    White,
    Silver,
    Gold,
    /// Star pickup override
    Yellow,
    /// Gun pickup override
    Red,
}

impl BulletColor {
    pub fn as_css(self) -> &'static str {
        match self {
            BulletColor::White => "white",
            BulletColor::Silver => "silver",
            BulletColor::Gold => "gold",
            BulletColor::Yellow => "yellow",
            BulletColor::Red => "red",
        }
    }
}

/// Behaviour of one power level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletConfig {
    /// Pixels per second
    pub speed: f32,
    /// Minimum seconds between shots from the same cannon
    pub fire_cooldown: f32,
    pub color: BulletColor,
    pub can_penetrate_brick: bool,
    /// Bricks one bullet may break over its lifetime
    pub brick_penetration_count: u32,
    pub can_penetrate_steel: bool,
    /// Kills non-armored tanks outright and keeps flying
    pub pierces_tanks: bool,
}

pub const MIN_POWER_LEVEL: u8 = 1;
pub const MAX_POWER_LEVEL: u8 = 3;

pub const BULLET_LEVELS: [BulletConfig; 3] = [
    BulletConfig {
        speed: 192.0,
        fire_cooldown: 0.9,
        color: BulletColor::White,
        can_penetrate_brick: false,
        brick_penetration_count: 1,
        can_penetrate_steel: false,
        pierces_tanks: false,
    },
    BulletConfig {
        speed: 256.0,
        fire_cooldown: 0.7,
        color: BulletColor::Silver,
        can_penetrate_brick: true,
        brick_penetration_count: 1,
        can_penetrate_steel: false,
        pierces_tanks: false,
    },
    BulletConfig {
        speed: 320.0,
        fire_cooldown: 0.5,
        color: BulletColor::Gold,
        can_penetrate_brick: true,
        brick_penetration_count: 2,
        can_penetrate_steel: true,
        pierces_tanks: true,
    },
];

/// Clamp a power level into the table's domain
#[inline]
pub fn clamp_level(level: u8) -> u8 {
    level.clamp(MIN_POWER_LEVEL, MAX_POWER_LEVEL)
}

/// Table lookup; out-of-range levels clamp to 1 or 3
pub fn bullet_config(level: u8) -> &'static BulletConfig {
    &BULLET_LEVELS[(clamp_level(level) - 1) as usize]
}

/// Optional bounce capability handed to a bullet at fire time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceRule {
    pub max_bounces: u32,
    /// Speed multiplier applied per bounce (1.0 = no loss)
    pub damping: f32,
}

impl Default for BounceRule {
    /// No bouncing
    fn default() -> Self {
        Self {
            max_bounces: 0,
            damping: 1.0,
        }
    }
}

/// Everything needed to launch a bullet
#[derive(Debug, Clone, Copy)]
pub struct FireOrder {
    /// Top-left of the bullet at spawn
    pub origin: Vec2,
    pub direction: Direction,
    pub power_level: u8,
    pub color_override: Option<BulletColor>,
    pub enemy_owned: bool,
    /// Index of the shooter within its side (player slot or enemy id)
    pub owner: u32,
    pub bounce: BounceRule,
}

/// A projectile
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub pos: Vec2,
    /// Position before the most recent `update`, for swept collision
    pub previous: Vec2,
    pub velocity: Vec2,
    pub direction: Direction,
    pub power_level: u8,
    pub color: BulletColor,
    pub active: bool,
    pub enemy_owned: bool,
    pub owner: u32,
    pub bricks_destroyed: u32,
    pub bounce_count: u32,
    pub max_bounces: u32,
    pub bounce_damping: f32,
}

impl Default for Bullet {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            previous: Vec2::ZERO,
            velocity: Vec2::ZERO,
            direction: Direction::Up,
            power_level: MIN_POWER_LEVEL,
            color: BulletColor::White,
            active: false,
            enemy_owned: false,
            owner: 0,
            bricks_destroyed: 0,
            bounce_count: 0,
            max_bounces: 0,
            bounce_damping: 1.0,
        }
    }
}

impl Bullet {
    /// Power-level behaviour for this bullet
    pub fn config(&self) -> &'static BulletConfig {
        bullet_config(self.power_level)
    }

    /// Put the bullet in flight. Every derived field comes from the table.
    fn launch(&mut self, order: &FireOrder) {
        let level = clamp_level(order.power_level);
        let config = bullet_config(level);
        self.pos = order.origin;
        self.previous = order.origin;
        self.direction = order.direction;
        self.power_level = level;
        self.velocity = order.direction.unit() * config.speed;
        self.color = order.color_override.unwrap_or(config.color);
        self.active = true;
        self.enemy_owned = order.enemy_owned;
        self.owner = order.owner;
        self.bricks_destroyed = 0;
        self.bounce_count = 0;
        self.max_bounces = order.bounce.max_bounces;
        self.bounce_damping = order.bounce.damping;
    }

    /// Advance along the velocity; culls the bullet once it leaves the
    /// playfield plus margin.
    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.previous = self.pos;
        self.pos += self.velocity * dt;

        let m = BULLET_BOUNDS_MARGIN;
        if self.pos.x < -m
            || self.pos.y < -m
            || self.pos.x > FIELD_WIDTH + m
            || self.pos.y > FIELD_HEIGHT + m
        {
            self.active = false;
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::at(self.pos, BULLET_SIZE)
    }

    pub fn previous_rect(&self) -> Rect {
        Rect::at(self.previous, BULLET_SIZE)
    }

    /// Area covered between the previous and current sample
    pub fn swept_rect(&self) -> Rect {
        self.previous_rect().union(&self.rect())
    }

    pub fn brick_budget_left(&self) -> u32 {
        self.config()
            .brick_penetration_count
            .saturating_sub(self.bricks_destroyed)
    }

    pub fn can_bounce(&self) -> bool {
        self.bounce_count < self.max_bounces
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Return to the pristine pooled state
    pub fn reset(&mut self) {
        *self = Bullet::default();
    }
}

/// Per-shooter fire gate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cannon {
    last_fired_at: Option<f32>,
}

impl Cannon {
    /// Seconds until a shot at `level` is allowed again
    pub fn cooldown_left(&self, now: f32, level: u8) -> f32 {
        match self.last_fired_at {
            Some(t) => (bullet_config(level).fire_cooldown - (now - t)).max(0.0),
            None => 0.0,
        }
    }

    pub fn ready(&self, now: f32, level: u8) -> bool {
        match self.last_fired_at {
            Some(t) => now - t >= bullet_config(level).fire_cooldown,
            None => true,
        }
    }

    /// Launch `bullet` if the cooldown for the order's power level has
    /// elapsed. On refusal neither the bullet nor the cannon changes.
    pub fn fire(&mut self, bullet: &mut Bullet, order: &FireOrder, now: f32) -> bool {
        if !self.ready(now, order.power_level) {
            return false;
        }
        bullet.launch(order);
        self.last_fired_at = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_fired_at = None;
    }
}

/// Free list of spent bullets
#[derive(Debug, Clone)]
pub struct BulletPool {
    free: Vec<Bullet>,
}

impl Default for BulletPool {
    fn default() -> Self {
        Self::new(BULLET_POOL_SIZE)
    }
}

impl BulletPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: vec![Bullet::default(); capacity],
        }
    }

    /// Take a reset bullet, allocating if the list is empty
    pub fn acquire(&mut self) -> Bullet {
        self.free.pop().unwrap_or_default()
    }

    /// Reset and return a bullet to the free list
    pub fn release(&mut self, mut bullet: Bullet) {
        bullet.reset();
        self.free.push(bullet);
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}
