//! Game settings and preferences
//!
//! Persisted in LocalStorage on the web; read from a JSON file natively.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_FRAME_DT;
use crate::error::GameError;
use crate::sim::BounceRule;

/// Optional bullet ricochet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceSettings {
    pub enabled: bool,
    /// Wall hits a bullet survives
    pub max_bounces: u32,
    /// Speed multiplier applied per bounce (1.0 = no loss)
    pub damping: f32,
}

impl Default for BounceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_bounces: 3,
            damping: 1.0,
        }
    }
}

impl BounceSettings {
    /// Rule handed to newly fired bullets
    pub fn rule(&self) -> BounceRule {
        if self.enabled {
            BounceRule {
                max_bounces: self.max_bounces,
                damping: self.damping.clamp(0.0, 1.0),
            }
        } else {
            BounceRule::default()
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bounce: BounceSettings,
    /// Tanks keep drifting briefly on ice
    pub ice_slip: bool,
    pub two_player: bool,
    /// Upper bound on a single simulation step (seconds)
    pub max_frame_dt: f32,
    /// Enemy drop chance when the level does not set one
    pub powerup_drop_chance: f32,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bounce: BounceSettings::default(),
            ice_slip: true,
            two_player: false,
            max_frame_dt: MAX_FRAME_DT,
            powerup_drop_chance: 0.2,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Parse settings; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Settings, GameError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Frame step clamp, never larger than the hard limit
    pub fn frame_dt_limit(&self) -> f32 {
        if self.max_frame_dt > 0.0 {
            self.max_frame_dt.min(MAX_FRAME_DT)
        } else {
            MAX_FRAME_DT
        }
    }

    /// Gain applied to every cue
    pub fn effect_volume(&self) -> f32 {
        crate::audio::mix_volume(self.master_volume, self.sfx_volume, self.muted)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Settings, GameError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "battle_city_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
