//! Game state and core simulation types
//!
//! `GameState` is the whole simulation context: the grid, every tank and
//! bullet, the power-up manager, the seeded RNG and the objective flag.
//! It is passed explicitly into each tick; nothing lives in globals.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bullet::{Bullet, BulletPool, clamp_level};
use super::geometry::Rect;
use super::grid::{TileGrid, TileType};
use super::powerup::{PowerUpKind, PowerUpManager};
use super::score::ScoreKeeper;
use super::tank::{EnemyKind, EnemyTank, PlayerTank};
use crate::consts::*;
use crate::error::GameError;
use crate::level::LevelData;
use crate::settings::Settings;

/// Top-row columns enemies enter from, used round-robin
pub const ENEMY_SPAWN_COLS: [i32; 3] = [0, (MAP_WIDTH / 2) as i32, MAP_WIDTH as i32 - 1];

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    ObjectiveDestroyed,
    OutOfLives,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Time is frozen until unpaused
    Paused,
    /// Every enemy of the level is destroyed
    LevelComplete,
    /// Run ended
    GameOver(GameOverReason),
}

/// Things that happened during a tick, for the audio and UI layers
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Shot { enemy_owned: bool },
    BrickDestroyed { col: i32, row: i32 },
    /// A steel cell was shot through
    SteelDestroyed { col: i32, row: i32 },
    /// A bullet glanced off steel
    MetalHit,
    BulletBounced,
    BulletsCancelled,
    /// A shielded tank absorbed a bullet
    ShieldHit,
    TankHit { enemy: bool },
    EnemySpawned { id: u32, kind: EnemyKind },
    /// `by` is the player slot, `None` for a bomb
    EnemyDestroyed { id: u32, kind: EnemyKind, by: Option<u32> },
    PlayerDestroyed { slot: u32 },
    PlayerRespawned { slot: u32 },
    ExtraLife { slot: u32 },
    PowerUpSpawned { id: u32, kind: PowerUpKind },
    PowerUpCollected { slot: u32, kind: PowerUpKind },
    ObjectiveDestroyed,
    Paused,
    Resumed,
    LevelComplete { level: u32 },
    GameOver { reason: GameOverReason },
}

/// Cells hardened by a shovel and what they were before
#[derive(Debug, Clone, PartialEq)]
pub struct ShovelEffect {
    pub remaining: f32,
    pub saved: Vec<((i32, i32), TileType)>,
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub settings: Settings,
    pub level: LevelData,
    pub grid: TileGrid,
    /// Indexed by player slot
    pub players: Vec<PlayerTank>,
    /// Indexed by player slot
    pub scores: Vec<ScoreKeeper>,
    pub enemies: Vec<EnemyTank>,
    pub bullets: Vec<Bullet>,
    pub pool: BulletPool,
    pub powerups: PowerUpManager,
    /// Simulation clock (seconds)
    pub time: f32,
    pub phase: GamePhase,
    pub objective_destroyed: bool,
    /// Drained by the host each frame
    pub events: Vec<GameEvent>,
    /// Enemies still waiting to enter, popped from the back
    pub enemy_queue: Vec<EnemyKind>,
    pub enemies_destroyed: u32,
    /// Seconds until the next enemy may enter
    pub spawn_timer: f32,
    pub(crate) next_spawn_point: usize,
    /// Seconds of clock freeze left
    pub freeze_timer: f32,
    pub shovel: Option<ShovelEffect>,
    pub(crate) allowed_items: Vec<PowerUpKind>,
    pub(crate) drop_chance: f32,
    next_enemy_id: u32,
}

impl GameState {
    /// Start a run on the given level
    pub fn new(seed: u64, settings: Settings, level: LevelData) -> Result<Self, GameError> {
        let player_count = if settings.two_player { 2 } else { 1 };
        let lives = level.player_config.initial_lives.max(1);
        let players = (0..player_count)
            .map(|slot| PlayerTank::new(slot, PlayerTank::spawn_point(slot)))
            .collect();
        let scores = (0..player_count).map(|_| ScoreKeeper::new(lives)).collect();

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            settings,
            level: LevelData::default(),
            grid: TileGrid::empty(),
            players,
            scores,
            enemies: Vec::new(),
            bullets: Vec::new(),
            pool: BulletPool::default(),
            powerups: PowerUpManager::new(),
            time: 0.0,
            phase: GamePhase::Playing,
            objective_destroyed: false,
            events: Vec::new(),
            enemy_queue: Vec::new(),
            enemies_destroyed: 0,
            spawn_timer: 0.0,
            next_spawn_point: 0,
            freeze_timer: 0.0,
            shovel: None,
            allowed_items: Vec::new(),
            drop_chance: 0.0,
            next_enemy_id: 1,
        };

        let initial = clamp_level(level.player_config.initial_level);
        state.load_level(level)?;
        for player in &mut state.players {
            player.tank.bullet_level = initial;
        }
        log::info!(
            "Game started: seed {seed}, {player_count} player(s), {lives} lives"
        );
        Ok(state)
    }

    /// Start a run on a built-in level (1-based)
    pub fn campaign(seed: u64, settings: Settings, level: u32) -> Result<Self, GameError> {
        Self::new(seed, settings, LevelData::builtin(level)?)
    }

    /// Replace the playfield with a new level. Players keep score, lives
    /// and weapon upgrades.
    pub fn load_level(&mut self, level: LevelData) -> Result<(), GameError> {
        level.validate()?;
        self.grid = level.build_grid()?;
        self.allowed_items = level.allowed_power_ups()?;
        self.drop_chance = level.drop_chance(self.settings.powerup_drop_chance);

        let mut roster = level.enemy_roster()?;
        roster.shuffle(&mut self.rng);
        roster.truncate(level.total_enemies() as usize);
        self.enemy_queue = roster;

        for bullet in self.bullets.drain(..) {
            self.pool.release(bullet);
        }
        self.enemies.clear();
        self.powerups.clear();
        self.enemies_destroyed = 0;
        self.spawn_timer = 0.0;
        self.next_spawn_point = 0;
        self.freeze_timer = 0.0;
        self.shovel = None;
        self.objective_destroyed = false;
        self.phase = GamePhase::Playing;

        let shield = level.player_config.respawn_invincible_time;
        for (player, score) in self.players.iter_mut().zip(&self.scores) {
            if !score.is_out() {
                player.return_to_spawn(shield);
            }
        }

        log::info!(
            "Level {} loaded: {} enemies, {} on screen, spawn every {}s",
            level.level_id,
            self.enemy_queue.len(),
            level.max_on_screen(),
            level.enemy_config.spawn_interval
        );
        self.level = level;
        Ok(())
    }

    /// Move on to the next built-in level after a clear. Returns false when
    /// there is no next level or the current one is not cleared.
    pub fn advance_level(&mut self) -> Result<bool, GameError> {
        if self.phase != GamePhase::LevelComplete {
            return Ok(false);
        }
        let next = self.level.level_id + 1;
        if next > crate::level::CAMPAIGN_LENGTH {
            log::info!("Campaign complete");
            return Ok(false);
        }
        self.load_level(LevelData::builtin(next)?)?;
        Ok(true)
    }

    /// Hand pending events to the caller
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Enemies not yet destroyed, including those still queued
    pub fn enemies_remaining(&self) -> usize {
        self.enemy_queue.len() + self.enemies.iter().filter(|e| e.tank.is_alive()).count()
    }

    pub fn enemies_frozen(&self) -> bool {
        self.freeze_timer > 0.0
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver(_))
    }

    pub(crate) fn next_enemy_id(&mut self) -> u32 {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        id
    }

    /// Top-left of an enemy spawn point
    pub fn enemy_spawn_pos(index: usize) -> Vec2 {
        let col = ENEMY_SPAWN_COLS[index % ENEMY_SPAWN_COLS.len()];
        Vec2::new(col as f32 * TILE_SIZE, 0.0)
    }

    /// True if any live tank overlaps the rectangle
    pub fn tank_at(&self, rect: &Rect) -> bool {
        self.players
            .iter()
            .map(|p| &p.tank)
            .chain(self.enemies.iter().map(|e| &e.tank))
            .any(|t| t.is_alive() && t.rect().overlaps(rect))
    }

    /// Random cell a tank could stand on, for item drops
    pub(crate) fn random_open_cell(&mut self) -> Option<(i32, i32)> {
        let (w, h) = self.grid.dimensions();
        let open: Vec<(i32, i32)> = (0..h as i32)
            .flat_map(|row| (0..w as i32).map(move |col| (col, row)))
            .filter(|&(col, row)| !self.grid.tile(col, row).blocks_tank(false))
            .collect();
        if open.is_empty() {
            return None;
        }
        Some(open[self.rng.random_range(0..open.len())])
    }

    /// Apply a collected item to the player in `slot`
    pub fn apply_power_up(&mut self, slot: u32, kind: PowerUpKind) {
        let index = slot as usize;
        if index >= self.players.len() {
            return;
        }
        match kind {
            PowerUpKind::Helmet => {
                let tank = &mut self.players[index].tank;
                tank.shield = tank.shield.max(HELMET_DURATION);
            }
            PowerUpKind::Star => self.players[index].upgrade_weapon(),
            PowerUpKind::Gun => self.players[index].max_weapon(),
            PowerUpKind::Boat => self.players[index].tank.water_passage = true,
            PowerUpKind::Tank => {
                self.scores[index].gain_life();
                self.events.push(GameEvent::ExtraLife { slot });
            }
            PowerUpKind::Clock => self.freeze_timer = CLOCK_DURATION,
            PowerUpKind::Bomb => {
                for enemy in self.enemies.iter_mut().filter(|e| e.tank.is_alive()) {
                    enemy.tank.health = 0;
                    self.events.push(GameEvent::EnemyDestroyed {
                        id: enemy.id,
                        kind: enemy.kind,
                        by: None,
                    });
                }
            }
            PowerUpKind::Shovel => self.harden_objective(),
        }
        log::debug!("Player {} collected {}", slot + 1, kind.as_str());
        self.events.push(GameEvent::PowerUpCollected { slot, kind });
    }

    /// Turn the ring around the eagle to steel for a while
    fn harden_objective(&mut self) {
        let Some((ocol, orow)) = self.grid.objective() else {
            return;
        };
        let mut effect = self.shovel.take().unwrap_or(ShovelEffect {
            remaining: 0.0,
            saved: Vec::new(),
        });
        effect.remaining = SHOVEL_DURATION;

        let (w, h) = self.grid.dimensions();
        for row in orow - 1..=orow + 1 {
            for col in ocol - 1..=ocol + 1 {
                if (col, row) == (ocol, orow)
                    || col < 0
                    || row < 0
                    || col >= w as i32
                    || row >= h as i32
                {
                    continue;
                }
                let tile = self.grid.tile(col, row);
                if !matches!(tile, TileType::Brick | TileType::Floor | TileType::Empty) {
                    continue;
                }
                if !effect.saved.iter().any(|(cell, _)| *cell == (col, row)) {
                    effect.saved.push(((col, row), tile));
                }
                self.grid.set_tile(col, row, TileType::Steel);
            }
        }
        self.shovel = Some(effect);
    }

    /// Count down the shovel and put the saved tiles back when it ends
    pub(crate) fn tick_shovel(&mut self, dt: f32) {
        let Some(effect) = &mut self.shovel else {
            return;
        };
        effect.remaining -= dt;
        if effect.remaining > 0.0 {
            return;
        }
        if let Some(effect) = self.shovel.take() {
            for ((col, row), tile) in effect.saved {
                self.grid.set_tile(col, row, tile);
            }
        }
    }
}
