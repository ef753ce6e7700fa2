//! Level data
//!
//! Levels come from the built-in campaign or from JSON files. A level
//! supplies the starting tile matrix plus the enemy wave parameters, and is
//! consumed once when the level loads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;
use crate::sim::{EnemyKind, PowerUpKind, TileGrid, TileType};

/// Number of built-in levels
pub const CAMPAIGN_LENGTH: u32 = 10;

/// Enemy composition of each built-in level, before the per-level cap
const CAMPAIGN: [&[(EnemyKind, u32)]; CAMPAIGN_LENGTH as usize] = [
    &[(EnemyKind::Normal, 20)],
    &[(EnemyKind::Normal, 15), (EnemyKind::Fast, 5)],
    &[(EnemyKind::Normal, 10), (EnemyKind::Fast, 5), (EnemyKind::Heavy, 5)],
    &[(EnemyKind::Fast, 5), (EnemyKind::Heavy, 10), (EnemyKind::Super, 5)],
    &[
        (EnemyKind::Normal, 10),
        (EnemyKind::Fast, 10),
        (EnemyKind::Heavy, 5),
        (EnemyKind::Super, 5),
    ],
    &[
        (EnemyKind::Normal, 15),
        (EnemyKind::Fast, 10),
        (EnemyKind::Heavy, 10),
        (EnemyKind::Super, 5),
    ],
    &[
        (EnemyKind::Normal, 5),
        (EnemyKind::Fast, 15),
        (EnemyKind::Heavy, 10),
        (EnemyKind::Super, 10),
    ],
    &[
        (EnemyKind::Normal, 10),
        (EnemyKind::Fast, 10),
        (EnemyKind::Heavy, 15),
        (EnemyKind::Super, 10),
    ],
    &[
        (EnemyKind::Normal, 5),
        (EnemyKind::Fast, 15),
        (EnemyKind::Heavy, 15),
        (EnemyKind::Super, 15),
    ],
    &[
        (EnemyKind::Normal, 20),
        (EnemyKind::Fast, 20),
        (EnemyKind::Heavy, 20),
        (EnemyKind::Super, 10),
    ],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            tile_size: TILE_SIZE,
        }
    }
}

/// One sparse tile placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub x: i64,
    pub y: i64,
    #[serde(rename = "type")]
    pub tile: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub total_count: u32,
    pub max_on_screen: u32,
    /// Seconds between spawns
    pub spawn_interval: f32,
    /// Enemy type name to count
    pub types: BTreeMap<String, u32>,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            total_count: MAX_ENEMIES_PER_LEVEL,
            max_on_screen: MAX_ON_SCREEN_ENEMIES,
            spawn_interval: ENEMY_SPAWN_INTERVAL,
            types: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub initial_lives: u32,
    pub initial_level: u8,
    pub respawn_invincible_time: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_lives: PLAYER_START_LIVES,
            initial_level: 1,
            respawn_invincible_time: RESPAWN_SHIELD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    /// Chance a destroyed enemy drops an item
    pub spawn_probability: f32,
    /// Item names; empty means every kind
    pub allowed_items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearReward {
    pub score_bonus: u64,
    pub extra_life: bool,
}

/// A level file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub level_id: u32,
    pub level_name: String,
    pub difficulty: u32,
    pub map_config: MapConfig,
    /// Sparse placements on an otherwise empty map
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub map_tiles: Vec<TilePlacement>,
    /// Dense row-major tile indices; takes precedence over `map_tiles`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<Vec<u8>>>,
    pub enemy_config: EnemyConfig,
    pub player_config: PlayerConfig,
    /// Absent means the settings' drop chance and every item kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_config: Option<ItemConfig>,
    pub special_rules: Vec<String>,
    pub clear_reward: ClearReward,
}

impl Default for LevelData {
    fn default() -> Self {
        Self {
            level_id: 1,
            level_name: String::new(),
            difficulty: 1,
            map_config: MapConfig::default(),
            map_tiles: Vec::new(),
            tiles: None,
            enemy_config: EnemyConfig::default(),
            player_config: PlayerConfig::default(),
            item_config: None,
            special_rules: Vec::new(),
            clear_reward: ClearReward::default(),
        }
    }
}

impl LevelData {
    /// Built-in campaign level (1-based)
    pub fn builtin(level: u32) -> Result<LevelData, GameError> {
        if level == 0 || level > CAMPAIGN_LENGTH {
            return Err(GameError::LevelOutOfRange {
                level,
                max: CAMPAIGN_LENGTH,
            });
        }
        let types = CAMPAIGN[(level - 1) as usize]
            .iter()
            .map(|&(kind, count)| (kind.as_str().to_string(), count))
            .collect();
        Ok(LevelData {
            level_id: level,
            level_name: format!("Stage {level}"),
            difficulty: level,
            enemy_config: EnemyConfig {
                types,
                ..EnemyConfig::default()
            },
            ..LevelData::default()
        })
    }

    /// Parse and validate a level file's contents
    pub fn from_json(json: &str) -> Result<LevelData, GameError> {
        let level: LevelData = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<LevelData, GameError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check everything that `build_grid`, `enemy_roster` and
    /// `allowed_power_ups` would reject
    pub fn validate(&self) -> Result<(), GameError> {
        if (self.map_config.width, self.map_config.height) != (MAP_WIDTH, MAP_HEIGHT) {
            return Err(GameError::MapSizeMismatch {
                expected: (MAP_WIDTH, MAP_HEIGHT),
                actual: (self.map_config.width, self.map_config.height),
            });
        }
        self.build_grid()?;
        self.enemy_roster()?;
        self.allowed_power_ups()?;
        Ok(())
    }

    /// Starting tile matrix
    pub fn build_grid(&self) -> Result<TileGrid, GameError> {
        let grid = if let Some(rows) = &self.tiles {
            let width = rows.first().map_or(0, |r| r.len());
            if rows.len() != MAP_HEIGHT || rows.iter().any(|r| r.len() != MAP_WIDTH) {
                return Err(GameError::MapSizeMismatch {
                    expected: (MAP_WIDTH, MAP_HEIGHT),
                    actual: (width, rows.len()),
                });
            }
            let mut decoded = Vec::with_capacity(MAP_HEIGHT);
            for (y, row) in rows.iter().enumerate() {
                let mut line = Vec::with_capacity(MAP_WIDTH);
                for (x, &index) in row.iter().enumerate() {
                    line.push(TileType::from_index(index).ok_or(GameError::UnknownTile {
                        index,
                        x,
                        y,
                    })?);
                }
                decoded.push(line);
            }
            TileGrid::from_rows(&decoded)
        } else if !self.map_tiles.is_empty() {
            let mut grid = TileGrid::empty();
            for p in &self.map_tiles {
                if p.x < 0 || p.y < 0 || p.x >= MAP_WIDTH as i64 || p.y >= MAP_HEIGHT as i64 {
                    return Err(GameError::TileOutOfBounds { x: p.x, y: p.y });
                }
                let tile = TileType::from_index(p.tile).ok_or(GameError::UnknownTile {
                    index: p.tile,
                    x: p.x as usize,
                    y: p.y as usize,
                })?;
                grid.set_tile(p.x as i32, p.y as i32, tile);
            }
            grid
        } else {
            TileGrid::default_layout()
        };

        if grid.objective().is_none() {
            return Err(GameError::NoObjective);
        }
        Ok(grid)
    }

    /// Every enemy the level's mix names, in a stable order. Mixes short of
    /// `total_count` are padded with normal tanks.
    pub fn enemy_roster(&self) -> Result<Vec<EnemyKind>, GameError> {
        let mut roster = Vec::new();
        for (name, &count) in &self.enemy_config.types {
            let kind =
                EnemyKind::from_name(name).ok_or_else(|| GameError::UnknownEnemyType(name.clone()))?;
            roster.extend(std::iter::repeat_n(kind, count as usize));
        }
        let total = self.total_enemies() as usize;
        if roster.len() < total {
            roster.resize(total, EnemyKind::Normal);
        }
        Ok(roster)
    }

    /// Enemies that will spawn this level
    pub fn total_enemies(&self) -> u32 {
        self.enemy_config.total_count.min(MAX_ENEMIES_PER_LEVEL)
    }

    pub fn max_on_screen(&self) -> u32 {
        self.enemy_config.max_on_screen.max(1)
    }

    pub fn allowed_power_ups(&self) -> Result<Vec<PowerUpKind>, GameError> {
        let Some(items) = &self.item_config else {
            return Ok(Vec::new());
        };
        items
            .allowed_items
            .iter()
            .map(|name| {
                PowerUpKind::from_name(name).ok_or_else(|| GameError::UnknownPowerUp(name.clone()))
            })
            .collect()
    }

    /// Drop chance for destroyed enemies, falling back to `default`
    pub fn drop_chance(&self, default: f32) -> f32 {
        self.item_config
            .as_ref()
            .map_or(default, |items| items.spawn_probability)
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_are_valid() {
        for level in 1..=CAMPAIGN_LENGTH {
            let data = LevelData::builtin(level).unwrap();
            data.validate().unwrap();
            assert!(data.enemy_roster().unwrap().len() >= 20);
            assert_eq!(data.total_enemies(), 20);
        }
        assert!(matches!(
            LevelData::builtin(11),
            Err(GameError::LevelOutOfRange { level: 11, .. })
        ));
        assert!(LevelData::builtin(0).is_err());
    }

    #[test]
    fn test_campaign_mix() {
        let roster = LevelData::builtin(2).unwrap().enemy_roster().unwrap();
        assert_eq!(roster.iter().filter(|&&k| k == EnemyKind::Fast).count(), 5);
        assert_eq!(roster.iter().filter(|&&k| k == EnemyKind::Normal).count(), 15);
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let data = LevelData::from_json("{}").unwrap();
        assert_eq!(data.build_grid().unwrap(), TileGrid::default_layout());
        assert_eq!(data.enemy_roster().unwrap(), vec![EnemyKind::Normal; 20]);
        assert_eq!(data.player_config.initial_lives, 3);
        assert_eq!(data.drop_chance(0.2), 0.2);
    }

    #[test]
    fn test_sparse_tiles() {
        let json = r#"{
            "level_id": 4,
            "level_name": "Fortress",
            "map_tiles": [
                {"x": 6, "y": 12, "type": 8},
                {"x": 6, "y": 11, "type": 2},
                {"x": 0, "y": 5, "type": 3}
            ],
            "enemy_config": {"total_count": 6, "types": {"armor": 2, "light": 4}},
            "item_config": {"spawn_probability": 0.5, "allowed_items": ["star", "helmet"]}
        }"#;
        let data = LevelData::from_json(json).unwrap();
        let grid = data.build_grid().unwrap();
        assert_eq!(grid.tile(6, 11), TileType::Steel);
        assert_eq!(grid.tile(0, 5), TileType::Water);
        assert_eq!(grid.tile(1, 1), TileType::Empty);

        let roster = data.enemy_roster().unwrap();
        assert_eq!(roster.len(), 6);
        assert_eq!(
            roster.iter().filter(|&&k| k == EnemyKind::ArmoredCar).count(),
            2
        );
        assert_eq!(
            data.allowed_power_ups().unwrap(),
            vec![PowerUpKind::Star, PowerUpKind::Helmet]
        );
        assert_eq!(data.drop_chance(0.2), 0.5);
    }

    #[test]
    fn test_validation_errors() {
        let bad_size = r#"{"map_config": {"width": 10, "height": 13, "tile_size": 32}}"#;
        assert!(matches!(
            LevelData::from_json(bad_size),
            Err(GameError::MapSizeMismatch { .. })
        ));

        let no_eagle = r#"{"map_tiles": [{"x": 1, "y": 1, "type": 1}]}"#;
        assert!(matches!(
            LevelData::from_json(no_eagle),
            Err(GameError::NoObjective)
        ));

        let off_map = r#"{"map_tiles": [{"x": 13, "y": 0, "type": 8}]}"#;
        assert!(matches!(
            LevelData::from_json(off_map),
            Err(GameError::TileOutOfBounds { x: 13, y: 0 })
        ));

        let bad_tile = r#"{"map_tiles": [{"x": 1, "y": 1, "type": 42}]}"#;
        assert!(matches!(
            LevelData::from_json(bad_tile),
            Err(GameError::UnknownTile { index: 42, .. })
        ));

        let bad_enemy = r#"{"enemy_config": {"types": {"tiger": 3}}}"#;
        assert!(matches!(
            LevelData::from_json(bad_enemy),
            Err(GameError::UnknownEnemyType(_))
        ));

        let bad_item = r#"{"item_config": {"allowed_items": ["laser"]}}"#;
        assert!(matches!(
            LevelData::from_json(bad_item),
            Err(GameError::UnknownPowerUp(_))
        ));

        assert!(matches!(
            LevelData::from_json("not json"),
            Err(GameError::Json(_))
        ));
    }

    #[test]
    fn test_dense_tiles() {
        let mut rows = vec![vec![0u8; MAP_WIDTH]; MAP_HEIGHT];
        rows[12][6] = 8;
        rows[0][0] = 6;
        let data = LevelData {
            tiles: Some(rows.clone()),
            ..LevelData::default()
        };
        let grid = data.build_grid().unwrap();
        assert_eq!(grid.tile(0, 0), TileType::Ice);
        assert_eq!(grid.objective(), Some((6, 12)));

        rows.pop();
        let short = LevelData {
            tiles: Some(rows),
            ..LevelData::default()
        };
        assert!(matches!(
            short.build_grid(),
            Err(GameError::MapSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_json_roundtrip_keeps_level() {
        let data = LevelData::builtin(5).unwrap();
        let back = LevelData::from_json(&data.to_json().unwrap()).unwrap();
        assert_eq!(back, data);
    }
}
