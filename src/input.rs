//! Keyboard input
//!
//! The simulation never sees keys. Hosts feed raw key codes into a
//! [`KeyboardState`], and an [`InputSampler`] turns any [`InputSource`]
//! into the [`TickInput`] for the next step.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::{Direction, PlayerIntent, TickInput};

/// Game actions, independent of the physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicalKey {
    Up(u32),
    Down(u32),
    Left(u32),
    Right(u32),
    Fire(u32),
    Pause,
}

impl LogicalKey {
    fn movement(slot: u32, direction: Direction) -> Self {
        match direction {
            Direction::Up => LogicalKey::Up(slot),
            Direction::Down => LogicalKey::Down(slot),
            Direction::Left => LogicalKey::Left(slot),
            Direction::Right => LogicalKey::Right(slot),
        }
    }
}

/// Anything that can answer "is this action held right now"
pub trait InputSource {
    fn is_pressed(&self, key: LogicalKey) -> bool;
}

/// DOM `KeyboardEvent.code` bindings
pub fn binding(code: &str) -> Option<LogicalKey> {
    let key = match code {
        "ArrowUp" | "KeyW" => LogicalKey::Up(0),
        "ArrowDown" | "KeyS" => LogicalKey::Down(0),
        "ArrowLeft" | "KeyA" => LogicalKey::Left(0),
        "ArrowRight" | "KeyD" => LogicalKey::Right(0),
        "Space" => LogicalKey::Fire(0),
        "KeyI" => LogicalKey::Up(1),
        "KeyK" => LogicalKey::Down(1),
        "KeyJ" => LogicalKey::Left(1),
        "KeyL" => LogicalKey::Right(1),
        "Enter" | "NumpadEnter" => LogicalKey::Fire(1),
        "Escape" | "KeyP" => LogicalKey::Pause,
        _ => return None,
    };
    Some(key)
}

/// Set of held keys, fed from keydown/keyup
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: BTreeSet<LogicalKey>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the code is bound, so the host can swallow it
    pub fn key_down(&mut self, code: &str) -> bool {
        match binding(code) {
            Some(key) => {
                self.held.insert(key);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        match binding(code) {
            Some(key) => {
                self.held.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Forget everything, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.held.clear();
    }
}

impl InputSource for KeyboardState {
    fn is_pressed(&self, key: LogicalKey) -> bool {
        self.held.contains(&key)
    }
}

/// Turns held keys into per-tick commands
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    last_direction: [Option<Direction>; 2],
    pause_held: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, source: &impl InputSource) -> TickInput {
        let mut input = TickInput::default();
        for slot in 0..2u32 {
            let i = slot as usize;
            let direction = self.pick_direction(source, slot);
            self.last_direction[i] = direction;
            input.players[i] = PlayerIntent {
                direction,
                fire: source.is_pressed(LogicalKey::Fire(slot)),
            };
        }

        // Edge-triggered so holding the key toggles only once
        let pause = source.is_pressed(LogicalKey::Pause);
        input.pause = pause && !self.pause_held;
        self.pause_held = pause;
        input
    }

    /// Keep the current heading while it is held, otherwise the first held
    /// key in Up, Down, Left, Right order
    fn pick_direction(&self, source: &impl InputSource, slot: u32) -> Option<Direction> {
        if let Some(current) = self.last_direction[slot as usize] {
            if source.is_pressed(LogicalKey::movement(slot, current)) {
                return Some(current);
            }
        }
        Direction::ALL
            .into_iter()
            .find(|d| source.is_pressed(LogicalKey::movement(slot, *d)))
    }
}

/// Scripted driver for headless runs: wanders and keeps firing.
/// Has its own RNG so it never disturbs the simulation stream.
#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    heading: [Direction; 2],
    until_turn: [f32; 2],
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed ^ 0x5eed_a070),
            heading: [Direction::Up; 2],
            until_turn: [0.0; 2],
        }
    }

    pub fn sample(&mut self, dt: f32) -> TickInput {
        let mut input = TickInput::default();
        for i in 0..2 {
            self.until_turn[i] -= dt;
            if self.until_turn[i] <= 0.0 {
                self.heading[i] = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
                self.until_turn[i] = self.rng.random_range(0.5..2.0);
            }
            input.players[i] = PlayerIntent {
                direction: Some(self.heading[i]),
                fire: true,
            };
        }
        input
    }
}
