//! Battle City entry point
//!
//! The browser build wires keyboard listeners and the animation-frame loop.
//! The native build runs a headless game driven by an autopilot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use battle_city::Settings;
    use battle_city::audio::{AudioManager, AudioSink};
    use battle_city::input::{InputSampler, KeyboardState};
    use battle_city::sim::{GamePhase, GameState, Snapshot, tick};

    /// Pause before the next stage loads (seconds)
    const INTERMISSION: f32 = 3.0;

    // Drawing is done by the page; it registers `window.battleCity.present`
    #[wasm_bindgen(inline_js = "
        export function present(json) {
            const hook = window.battleCity && window.battleCity.present;
            if (hook) {
                hook(json);
            }
        }
    ")]
    extern "C" {
        fn present(json: &str);
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        keyboard: KeyboardState,
        sampler: InputSampler,
        audio: AudioManager,
        last_time: f64,
        intermission: f32,
        /// Set by the blur listener, consumed on the next frame
        pause_requested: bool,
    }

    impl Game {
        fn new(state: GameState) -> Self {
            let mut audio = AudioManager::new();
            audio.apply_settings(&state.settings);
            Self {
                state,
                keyboard: KeyboardState::new(),
                sampler: InputSampler::new(),
                audio,
                last_time: 0.0,
                intermission: INTERMISSION,
                pause_requested: false,
            }
        }

        fn restart(&mut self) {
            let seed = js_sys::Date::now() as u64;
            match GameState::campaign(seed, self.state.settings.clone(), 1) {
                Ok(state) => {
                    log::info!("New game with seed {seed}");
                    self.state = state;
                    self.intermission = INTERMISSION;
                }
                Err(e) => log::error!("Restart failed: {e}"),
            }
        }

        fn update(&mut self, dt: f32) {
            let mut input = self.sampler.sample(&self.keyboard);
            if self.pause_requested {
                self.pause_requested = false;
                input.pause = self.state.phase == GamePhase::Playing;
            }

            match self.state.phase {
                GamePhase::LevelComplete => {
                    self.intermission -= dt;
                    if self.intermission <= 0.0 {
                        self.intermission = INTERMISSION;
                        match self.state.advance_level() {
                            Ok(true) => log::info!("Stage {}", self.state.level.level_id),
                            Ok(false) => self.restart(),
                            Err(e) => log::error!("Failed to load next stage: {e}"),
                        }
                    }
                }
                GamePhase::GameOver(_) if input.players[0].fire => self.restart(),
                _ => tick(&mut self.state, &input, dt),
            }

            let events = self.state.drain_events();
            self.audio.play_events(&events);
        }

        fn render(&self) {
            match Snapshot::capture(&self.state).to_json() {
                Ok(json) => present(&json),
                Err(e) => log::warn!("Snapshot failed: {e}"),
            }
        }
    }

    pub fn start() {
        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let state = match GameState::campaign(seed, settings, 1) {
            Ok(state) => state,
            Err(e) => {
                log::error!("Failed to start: {e}");
                return;
            }
        };
        log::info!("Battle City starting with seed {seed}");

        let game = Rc::new(RefCell::new(Game::new(state)));
        setup_input_handlers(game.clone());
        request_animation_frame(game);
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                if g.keyboard.key_down(&event.code()) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if game.borrow_mut().keyboard.key_up(&event.code()) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Losing focus drops held keys and pauses
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.keyboard.release_all();
                g.pause_requested = true;
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // tick clamps long frames itself
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    wasm_game::start();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;

    use battle_city::audio::{AudioSink, LogAudio};
    use battle_city::consts::SIM_DT;
    use battle_city::input::Autopilot;
    use battle_city::render::{Renderer, TextRenderer};
    use battle_city::sim::{GamePhase, GameState, Snapshot, tick};
    use battle_city::{GameError, LevelData, Settings};

    /// Run the simulation headless under an autopilot and print the final board
    #[derive(Debug, Parser)]
    #[command(name = "battle-city")]
    #[command(about = "Battle City tank game, headless runner")]
    pub struct Args {
        /// Seed for the simulation and the autopilot
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Built-in stage to start on
        #[arg(long, default_value_t = 1)]
        level: u32,
        /// Custom level JSON; overrides --level
        #[arg(long)]
        level_file: Option<PathBuf>,
        /// Settings JSON
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Simulated seconds to run
        #[arg(long, default_value_t = 120.0)]
        seconds: f32,
    }

    pub fn run(args: Args) -> Result<(), GameError> {
        let settings = match &args.settings {
            Some(path) => Settings::load_file(path)?,
            None => Settings::default(),
        };
        let level = match &args.level_file {
            Some(path) => LevelData::load_file(path)?,
            None => LevelData::builtin(args.level)?,
        };
        log::info!(
            "Starting \"{}\" with seed {} for {}s",
            level.level_name,
            args.seed,
            args.seconds
        );

        let mut state = GameState::new(args.seed, settings, level)?;
        let mut pilot = Autopilot::new(args.seed);
        let mut audio = LogAudio::default();
        let steps = (args.seconds.max(0.0) / SIM_DT).ceil() as u64;

        for _ in 0..steps {
            let input = pilot.sample(SIM_DT);
            tick(&mut state, &input, SIM_DT);
            audio.play_events(&state.drain_events());

            match state.phase {
                GamePhase::LevelComplete => {
                    log::info!("Stage {} cleared at {:.1}s", state.level.level_id, state.time);
                    if !state.advance_level()? {
                        break;
                    }
                }
                GamePhase::GameOver(reason) => {
                    log::info!("Game over ({reason:?}) at {:.1}s", state.time);
                    break;
                }
                _ => {}
            }
        }

        for (slot, score) in state.scores.iter().enumerate() {
            log::info!("P{} score {} lives {}", slot + 1, score.score, score.lives);
        }
        log::info!("{} sound cues", audio.played);

        let mut renderer = TextRenderer::default();
        renderer.draw(&Snapshot::capture(&state));
        print!("{}", renderer.frame);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_args_defaults() {
            let args = Args::try_parse_from(["battle-city"]).unwrap();
            assert_eq!(args.seed, 1);
            assert_eq!(args.level, 1);
            assert_eq!(args.seconds, 120.0);
            assert!(args.level_file.is_none());
            assert!(args.settings.is_none());
        }

        #[test]
        fn test_args_flags() {
            let args = Args::try_parse_from([
                "battle-city",
                "--seed",
                "7",
                "--level",
                "3",
                "--seconds",
                "5",
                "--level-file",
                "stage.json",
            ])
            .unwrap();
            assert_eq!(args.seed, 7);
            assert_eq!(args.level, 3);
            assert_eq!(args.seconds, 5.0);
            assert_eq!(args.level_file, Some(PathBuf::from("stage.json")));
        }

        #[test]
        fn test_args_reject_bad_values() {
            assert!(Args::try_parse_from(["battle-city", "--seed", "abc"]).is_err());
            assert!(Args::try_parse_from(["battle-city", "--frames", "3"]).is_err());
        }

        #[test]
        fn test_short_run_finishes() {
            let args = Args::try_parse_from(["battle-city", "--seed", "3", "--seconds", "2"]).unwrap();
            assert!(run(args).is_ok());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args = <headless::Args as clap::Parser>::parse();
    if let Err(e) = headless::run(args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}
