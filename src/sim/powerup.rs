//! Power-up lifecycle
//!
//! The manager only tracks spawn, expiry and consumption. Applying the
//! effect of a collected item is up to the caller.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::consts::{POWER_UP_DURATION, POWER_UP_FLASH_TIME, POWER_UP_SPAWN_DELAY, TILE_SIZE};

/// Collectible item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Temporary invincibility
    Helmet,
    /// Weapon level +1
    Star,
    /// Destroy every enemy on screen
    Bomb,
    /// Freeze enemies
    Clock,
    /// Steel walls around the base
    Shovel,
    /// Extra life
    Tank,
    /// Cross water
    Boat,
    /// Maximum weapon level
    Gun,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 8] = [
        PowerUpKind::Helmet,
        PowerUpKind::Star,
        PowerUpKind::Bomb,
        PowerUpKind::Clock,
        PowerUpKind::Shovel,
        PowerUpKind::Tank,
        PowerUpKind::Boat,
        PowerUpKind::Gun,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "helmet" => Some(PowerUpKind::Helmet),
            "star" => Some(PowerUpKind::Star),
            "bomb" | "grenade" => Some(PowerUpKind::Bomb),
            "clock" | "timer" => Some(PowerUpKind::Clock),
            "shovel" => Some(PowerUpKind::Shovel),
            "tank" | "life" => Some(PowerUpKind::Tank),
            "boat" | "ship" => Some(PowerUpKind::Boat),
            "gun" | "pistol" => Some(PowerUpKind::Gun),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PowerUpKind::Helmet => "helmet",
            PowerUpKind::Star => "star",
            PowerUpKind::Bomb => "bomb",
            PowerUpKind::Clock => "clock",
            PowerUpKind::Shovel => "shovel",
            PowerUpKind::Tank => "tank",
            PowerUpKind::Boat => "boat",
            PowerUpKind::Gun => "gun",
        }
    }
}

/// A spawned item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    /// Top-left corner in pixels
    pub pos: Vec2,
    pub spawn_time: f32,
    pub expires_at: f32,
    /// Cleared once collected
    pub active: bool,
}

impl PowerUp {
    pub fn is_expired(&self, now: f32) -> bool {
        now >= self.expires_at
    }
}

/// Read-only view of an item the player may pick up right now
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Collectible {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    /// Inside the final warning window before expiry
    pub is_flashing: bool,
}

impl Collectible {
    pub fn rect(&self) -> Rect {
        Rect::at(self.pos, TILE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpManager {
    entries: Vec<PowerUp>,
    next_id: u32,
}

impl Default for PowerUpManager {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl PowerUpManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an item of a given kind. Returns its id.
    pub fn spawn(&mut self, pos: Vec2, kind: PowerUpKind, now: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(PowerUp {
            id,
            kind,
            pos,
            spawn_time: now,
            expires_at: now + POWER_UP_DURATION,
            active: true,
        });
        log::debug!("power-up {} #{id} spawned at {pos}", kind.as_str());
        id
    }

    /// Place an item drawn uniformly from `allowed` (every kind when empty)
    pub fn spawn_random(
        &mut self,
        pos: Vec2,
        allowed: &[PowerUpKind],
        now: f32,
        rng: &mut impl Rng,
    ) -> u32 {
        let pool: &[PowerUpKind] = if allowed.is_empty() {
            &PowerUpKind::ALL
        } else {
            allowed
        };
        let kind = pool[rng.random_range(0..pool.len())];
        self.spawn(pos, kind, now)
    }

    /// Items that are active, unexpired and past the pickup grace period
    pub fn list_collectible(&self, now: f32) -> Vec<Collectible> {
        self.entries
            .iter()
            .filter(|p| p.active && !p.is_expired(now))
            .filter(|p| now - p.spawn_time >= POWER_UP_SPAWN_DELAY)
            .map(|p| Collectible {
                id: p.id,
                kind: p.kind,
                pos: p.pos,
                is_flashing: p.expires_at - now <= POWER_UP_FLASH_TIME,
            })
            .collect()
    }

    /// Consume an item. Fails for unknown, already collected or expired
    /// ids, leaving everything untouched.
    pub fn activate(&mut self, id: u32, now: f32) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|p| p.id == id && p.active && !p.is_expired(now))
        {
            Some(entry) => {
                entry.active = false;
                true
            }
            None => false,
        }
    }

    /// Drop collected and expired entries
    pub fn tick(&mut self, now: f32) {
        self.entries.retain(|p| p.active && !p.is_expired(now));
    }

    pub fn kind_of(&self, id: u32) -> Option<PowerUpKind> {
        self.entries.iter().find(|p| p.id == id).map(|p| p.kind)
    }

    pub fn entries(&self) -> &[PowerUp] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
