//! Read-only view of the simulation for renderers
//!
//! Captured after a tick and serialized as-is for the web front end.

use glam::Vec2;
use serde::Serialize;

use super::geometry::Direction;
use super::powerup::Collectible;
use super::state::{GamePhase, GameState};
use super::tank::EnemyKind;
use crate::consts::BULLET_SIZE;
use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "side", rename_all = "lowercase")]
pub enum TankKind {
    Player { slot: u32 },
    Enemy { kind: EnemyKind },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankView {
    pub kind: TankKind,
    pub pos: Vec2,
    pub direction: Direction,
    pub size: f32,
    pub shielded: bool,
    pub health: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulletView {
    pub pos: Vec2,
    pub direction: Direction,
    pub size: f32,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub slot: u32,
    pub score: u64,
    pub lives: u32,
    pub weapon_level: u8,
}

/// Everything a frame needs to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub level: u32,
    pub time: f32,
    pub phase: GamePhase,
    pub tile_size: f32,
    pub width: usize,
    pub height: usize,
    /// Row-major tile indices
    pub tiles: Vec<Vec<u8>>,
    pub tanks: Vec<TankView>,
    pub bullets: Vec<BulletView>,
    pub powerups: Vec<Collectible>,
    pub players: Vec<PlayerView>,
    pub enemies_remaining: usize,
    pub enemies_frozen: bool,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let (width, height) = state.grid.dimensions();
        let tiles = state
            .grid
            .rows()
            .into_iter()
            .map(|row| row.into_iter().map(|t| t.index()).collect())
            .collect();

        let players = state
            .players
            .iter()
            .filter(|p| p.tank.is_alive())
            .map(|p| TankView {
                kind: TankKind::Player { slot: p.slot },
                pos: p.tank.pos,
                direction: p.tank.direction,
                size: p.tank.size,
                shielded: p.tank.is_shielded(),
                health: p.tank.health,
            });
        let enemies = state
            .enemies
            .iter()
            .filter(|e| e.tank.is_alive())
            .map(|e| TankView {
                kind: TankKind::Enemy { kind: e.kind },
                pos: e.tank.pos,
                direction: e.tank.direction,
                size: e.tank.size,
                shielded: e.tank.is_shielded(),
                health: e.tank.health,
            });

        Self {
            level: state.level.level_id,
            time: state.time,
            phase: state.phase,
            tile_size: state.grid.tile_size(),
            width,
            height,
            tiles,
            tanks: players.chain(enemies).collect(),
            bullets: state
                .bullets
                .iter()
                .filter(|b| b.active)
                .map(|b| BulletView {
                    pos: b.pos,
                    direction: b.direction,
                    size: BULLET_SIZE,
                    color: b.color.as_css(),
                })
                .collect(),
            powerups: state.powerups.list_collectible(state.time),
            players: state
                .players
                .iter()
                .zip(&state.scores)
                .map(|(p, s)| PlayerView {
                    slot: p.slot,
                    score: s.score,
                    lives: s.lives,
                    weapon_level: p.tank.bullet_level,
                })
                .collect(),
            enemies_remaining: state.enemies_remaining(),
            enemies_frozen: state.enemies_frozen(),
        }
    }

    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_capture_initial_state() {
        let state = GameState::campaign(3, Settings::default(), 1).unwrap();
        let snap = Snapshot::capture(&state);
        assert_eq!(snap.tiles.len(), 13);
        assert_eq!(snap.tiles[12][6], 8);
        assert_eq!(snap.tanks.len(), 1);
        assert_eq!(snap.tanks[0].kind, TankKind::Player { slot: 0 });
        assert_eq!(snap.players[0].lives, 3);
        assert_eq!(snap.enemies_remaining, 20);
        assert_eq!(snap.phase, GamePhase::Playing);
    }

    #[test]
    fn test_json_shape() {
        let state = GameState::campaign(3, Settings::default(), 1).unwrap();
        let json = Snapshot::capture(&state).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tile_size"], 32.0);
        assert_eq!(value["tanks"][0]["kind"]["side"], "player");
        assert_eq!(value["phase"], "Playing");
    }
}
