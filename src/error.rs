use std::fmt;

/// Failures of the outer surfaces: level and settings files
///
/// Game-rule outcomes (a refused shot, an expired pickup) are never errors.
#[derive(Debug)]
pub enum GameError {
    Io(std::io::Error),
    Json(serde_json::Error),
    MapSizeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    UnknownTile { index: u8, x: usize, y: usize },
    TileOutOfBounds { x: i64, y: i64 },
    NoObjective,
    UnknownEnemyType(String),
    UnknownPowerUp(String),
    LevelOutOfRange { level: u32, max: u32 },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::Json(e) => write!(f, "invalid json: {e}"),
            Self::MapSizeMismatch { expected, actual } => write!(
                f,
                "map size mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::UnknownTile { index, x, y } => {
                write!(f, "unknown tile index {index} at ({x},{y})")
            }
            Self::TileOutOfBounds { x, y } => write!(f, "tile ({x},{y}) is outside the map"),
            Self::NoObjective => write!(f, "map has no eagle tile"),
            Self::UnknownEnemyType(name) => write!(f, "unknown enemy type: {name}"),
            Self::UnknownPowerUp(name) => write!(f, "unknown power-up: {name}"),
            Self::LevelOutOfRange { level, max } => {
                write!(f, "level {level} out of range (1..={max})")
            }
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GameError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for GameError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
