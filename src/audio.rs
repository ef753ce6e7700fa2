//! Sound cues for game events
//!
//! The simulation only emits [`GameEvent`]s. Hosts map them to cues with
//! [`sound_for`] and hand them to an [`AudioSink`]. On the web the cues are
//! synthesized with the Web Audio API, no sample files needed.

use crate::sim::{GameEvent, GameOverReason};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player cannon
    Shoot,
    /// Enemy cannon, quieter
    EnemyShoot,
    BrickBreak,
    /// Steel shot through
    SteelBreak,
    /// Bullet glanced off steel
    MetalHit,
    Ricochet,
    /// Two bullets cancelled
    BulletClash,
    /// Shield absorbed a hit
    ShieldHit,
    /// Armored tank lost health
    ArmorHit,
    Explosion,
    PowerUpAppear,
    PowerUpCollect,
    ExtraLife,
    Pause,
    LevelClear,
    /// Eagle destroyed
    BaseLost,
    GameOver,
}

impl SoundEffect {
    pub fn name(self) -> &'static str {
        match self {
            SoundEffect::Shoot => "shoot",
            SoundEffect::EnemyShoot => "enemy_shoot",
            SoundEffect::BrickBreak => "brick_break",
            SoundEffect::SteelBreak => "steel_break",
            SoundEffect::MetalHit => "metal_hit",
            SoundEffect::Ricochet => "ricochet",
            SoundEffect::BulletClash => "bullet_clash",
            SoundEffect::ShieldHit => "shield_hit",
            SoundEffect::ArmorHit => "armor_hit",
            SoundEffect::Explosion => "explosion",
            SoundEffect::PowerUpAppear => "powerup_appear",
            SoundEffect::PowerUpCollect => "powerup_collect",
            SoundEffect::ExtraLife => "extra_life",
            SoundEffect::Pause => "pause",
            SoundEffect::LevelClear => "level_clear",
            SoundEffect::BaseLost => "base_lost",
            SoundEffect::GameOver => "game_over",
        }
    }
}

/// Cue for an event, `None` for silent bookkeeping events
pub fn sound_for(event: &GameEvent) -> Option<SoundEffect> {
    let effect = match event {
        GameEvent::Shot { enemy_owned: false } => SoundEffect::Shoot,
        GameEvent::Shot { enemy_owned: true } => SoundEffect::EnemyShoot,
        GameEvent::BrickDestroyed { .. } => SoundEffect::BrickBreak,
        GameEvent::SteelDestroyed { .. } => SoundEffect::SteelBreak,
        GameEvent::MetalHit => SoundEffect::MetalHit,
        GameEvent::BulletBounced => SoundEffect::Ricochet,
        GameEvent::BulletsCancelled => SoundEffect::BulletClash,
        GameEvent::ShieldHit => SoundEffect::ShieldHit,
        GameEvent::TankHit { .. } => SoundEffect::ArmorHit,
        GameEvent::EnemyDestroyed { .. } | GameEvent::PlayerDestroyed { .. } => {
            SoundEffect::Explosion
        }
        GameEvent::PowerUpSpawned { .. } => SoundEffect::PowerUpAppear,
        GameEvent::PowerUpCollected { .. } => SoundEffect::PowerUpCollect,
        GameEvent::ExtraLife { .. } => SoundEffect::ExtraLife,
        GameEvent::Paused | GameEvent::Resumed => SoundEffect::Pause,
        GameEvent::LevelComplete { .. } => SoundEffect::LevelClear,
        GameEvent::ObjectiveDestroyed => SoundEffect::BaseLost,
        GameEvent::GameOver {
            reason: GameOverReason::OutOfLives | GameOverReason::ObjectiveDestroyed,
        } => SoundEffect::GameOver,
        GameEvent::EnemySpawned { .. } | GameEvent::PlayerRespawned { .. } => return None,
    };
    Some(effect)
}

/// Anything that can play a cue
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Play the cue of every event in order
    fn play_events(&mut self, events: &[GameEvent]) {
        for effect in events.iter().filter_map(sound_for) {
            self.play(effect);
        }
    }
}

/// Headless sink that logs cues at debug level
#[derive(Debug, Default)]
pub struct LogAudio {
    pub played: usize,
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        self.played += 1;
        log::debug!("sound: {}", effect.name());
    }
}

/// Combined gain for master and effect volumes, each clamped to 0..=1
pub fn mix_volume(master: f32, sfx: f32, muted: bool) -> f32 {
    if muted {
        0.0
    } else {
        master.clamp(0.0, 1.0) * sfx.clamp(0.0, 1.0)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{mix_volume, AudioSink, SoundEffect};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioSink for AudioManager {
        fn play(&mut self, effect: SoundEffect) {
            AudioManager::play(self, effect);
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_sfx_volume(&mut self, vol: f32) {
            self.sfx_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        /// Take volume preferences from settings
        pub fn apply_settings(&mut self, settings: &Settings) {
            self.set_master_volume(settings.master_volume);
            self.set_sfx_volume(settings.sfx_volume);
            self.set_muted(settings.muted);
        }

        fn effective_volume(&self) -> f32 {
            mix_volume(self.master_volume, self.sfx_volume, self.muted)
        }

        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Browsers start suspended until a gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Shoot => self.play_shot(ctx, vol, 1.0),
                SoundEffect::EnemyShoot => self.play_shot(ctx, vol, 0.4),
                SoundEffect::BrickBreak => self.play_brick_break(ctx, vol),
                SoundEffect::SteelBreak => self.play_steel_break(ctx, vol),
                SoundEffect::MetalHit => self.play_ping(ctx, vol, 900.0, OscillatorType::Square),
                SoundEffect::Ricochet => self.play_ricochet(ctx, vol),
                SoundEffect::BulletClash => self.play_ping(ctx, vol, 500.0, OscillatorType::Triangle),
                SoundEffect::ShieldHit => self.play_ping(ctx, vol, 1200.0, OscillatorType::Sine),
                SoundEffect::ArmorHit => self.play_armor_hit(ctx, vol),
                SoundEffect::Explosion => self.play_explosion(ctx, vol),
                SoundEffect::PowerUpAppear => self.play_arpeggio(ctx, vol, &[400.0, 600.0], 0.06),
                SoundEffect::PowerUpCollect => {
                    self.play_arpeggio(ctx, vol, &[600.0, 800.0, 1000.0], 0.08)
                }
                SoundEffect::ExtraLife => {
                    self.play_arpeggio(ctx, vol, &[523.0, 659.0, 784.0, 1047.0], 0.1)
                }
                SoundEffect::Pause => self.play_ping(ctx, vol, 440.0, OscillatorType::Triangle),
                SoundEffect::LevelClear => {
                    self.play_arpeggio(ctx, vol, &[392.0, 523.0, 659.0, 784.0], 0.12)
                }
                SoundEffect::BaseLost => self.play_base_lost(ctx, vol),
                SoundEffect::GameOver => {
                    self.play_arpeggio(ctx, vol, &[400.0, 350.0, 300.0, 200.0], 0.2)
                }
            }
        }

        // === Sound generators ===

        /// Oscillator routed through a gain node to the output
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Short square chirp
        fn play_shot(&self, ctx: &AudioContext, vol: f32, level: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 880.0, OscillatorType::Square) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.2 * level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                .ok();
            osc.frequency().set_value_at_time(880.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(220.0, t + 0.08)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }

        /// Single decaying tone
        fn play_ping(&self, ctx: &AudioContext, vol: f32, freq: f32, osc_type: OscillatorType) {
            let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }

        /// Crumbling crackle over a low thump
        fn play_brick_break(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 120.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                    .ok();
                osc.frequency().set_value_at_time(120.0, t).ok();
                osc.frequency().set_value_at_time(900.0, t + 0.02).ok();
                osc.frequency().set_value_at_time(160.0, t + 0.04).ok();
                osc.frequency().set_value_at_time(700.0, t + 0.06).ok();
                osc.frequency().set_value_at_time(90.0, t + 0.09).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.18).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 60.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.12).ok();
            }
        }

        /// Deep metallic clang
        fn play_steel_break(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 80.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.5, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.frequency().set_value_at_time(80.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(40.0, t + 0.2)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.3).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 400.0, OscillatorType::Square) {
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                    .ok();
                osc.frequency().set_value_at_time(400.0, t).ok();
                osc.frequency().set_value_at_time(300.0, t + 0.05).ok();
                osc.frequency().set_value_at_time(200.0, t + 0.1).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.25).ok();
            }
        }

        /// Rising whine
        fn play_ricochet(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 1200.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.2, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                .ok();
            osc.frequency().set_value_at_time(1200.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(2400.0, t + 0.12)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.16).ok();
        }

        /// Dull thud
        fn play_armor_hit(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 150.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.6, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();
            osc.frequency().set_value_at_time(150.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(60.0, t + 0.1)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        /// Low boom with a square crackle on top
        fn play_explosion(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                .ok();
            osc.frequency().set_value_at_time(100.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(30.0, t + 0.4)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.45).ok();

            if let Some((osc2, gain2)) = self.create_osc(ctx, 1500.0, OscillatorType::Square) {
                gain2.gain().set_value_at_time(vol * 0.1, t).ok();
                gain2
                    .gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc2.start().ok();
                osc2.stop_with_when(t + 0.15).ok();
            }
        }

        /// Long falling sweep
        fn play_base_lost(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Sawtooth) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.8)
                .ok();
            osc.frequency().set_value_at_time(300.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(40.0, t + 0.8)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.85).ok();
        }

        /// Notes played one after another
        fn play_arpeggio(&self, ctx: &AudioContext, vol: f32, notes: &[f32], step: f64) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * step;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + step * 1.5)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + step * 2.0).ok();
                }
            }
        }
    }
}
