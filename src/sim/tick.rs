//! Per-frame simulation step
//!
//! Order within a tick: pause handling, timers, enemy spawns, tank moves
//! (players then enemies), firing, bullets (tiles before tanks for each
//! bullet, then bullet-vs-bullet), casualties, pickups, and finally the
//! win/lose check.

use super::collision::{bullet_vs_bullets, bullet_vs_tanks, bullet_vs_tiles, tank_blocked};
use super::geometry::{Direction, Rect};
use super::state::{GameEvent, GameOverReason, GamePhase, GameState};
use super::tank::EnemyTank;
use crate::consts::*;

/// One player's controls for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerIntent {
    /// Held direction, if any
    pub direction: Option<Direction>,
    pub fire: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Indexed by player slot
    pub players: [PlayerIntent; 2],
    /// Pause toggle (edge-triggered)
    pub pause: bool,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, state.settings.frame_dt_limit())
    } else {
        0.0
    };

    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                state.events.push(GameEvent::Paused);
                log::info!("Paused");
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                state.events.push(GameEvent::Resumed);
                log::info!("Resumed");
            }
            _ => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    state.time += dt;
    update_timers(state, dt);
    spawn_enemies(state, dt);
    move_players(state, input, dt);
    let shooters = move_enemies(state, dt);
    fire(state, input, &shooters);
    update_bullets(state, dt);
    resolve_casualties(state);
    collect_power_ups(state);
    check_end_conditions(state);
}

fn update_timers(state: &mut GameState, dt: f32) {
    for player in &mut state.players {
        player.tank.tick_shield(dt);
    }
    for enemy in &mut state.enemies {
        enemy.tank.tick_shield(dt);
    }
    state.freeze_timer = (state.freeze_timer - dt).max(0.0);
    state.tick_shovel(dt);
}

/// Bring in the next queued enemy once the interval has elapsed, there is
/// room on screen and a spawn point is free
fn spawn_enemies(state: &mut GameState, dt: f32) {
    if state.enemy_queue.is_empty() {
        return;
    }
    state.spawn_timer -= dt;
    if state.spawn_timer > 0.0 {
        return;
    }

    let on_screen = state.enemies.iter().filter(|e| e.tank.is_alive()).count();
    if on_screen >= state.level.max_on_screen() as usize {
        return;
    }

    let points = super::state::ENEMY_SPAWN_COLS.len();
    for attempt in 0..points {
        let index = (state.next_spawn_point + attempt) % points;
        let pos = GameState::enemy_spawn_pos(index);
        if state.tank_at(&Rect::at(pos, TANK_SIZE)) {
            continue;
        }
        let Some(kind) = state.enemy_queue.pop() else {
            return;
        };
        let id = state.next_enemy_id();
        let enemy = EnemyTank::new(id, kind, pos, &mut state.rng);
        log::debug!("Enemy #{id} ({}) spawned at {pos}", kind.as_str());
        state.enemies.push(enemy);
        state.events.push(GameEvent::EnemySpawned { id, kind });
        state.next_spawn_point = (index + 1) % points;
        state.spawn_timer = state.level.enemy_config.spawn_interval;
        return;
    }
}

fn move_players(state: &mut GameState, input: &TickInput, dt: f32) {
    for i in 0..state.players.len() {
        if !state.players[i].tank.is_alive() {
            continue;
        }
        let intent = input.players.get(i).copied().unwrap_or_default();
        state.players[i].set_intent(intent.direction);
        let delta = state.players[i].update(dt, &state.grid, state.settings.ice_slip);

        let mover = &state.players[i].tank;
        let others = state
            .players
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, p)| &p.tank)
            .chain(state.enemies.iter().map(|e| &e.tank));
        if tank_blocked(mover, delta, others) {
            state.players[i].push_back(delta);
        }
    }
}

/// Returns the indices of enemies that decided to shoot
fn move_enemies(state: &mut GameState, dt: f32) -> Vec<usize> {
    let mut shooters = Vec::new();
    if state.enemies_frozen() {
        return shooters;
    }
    for i in 0..state.enemies.len() {
        if !state.enemies[i].tank.is_alive() {
            continue;
        }
        let step = state.enemies[i].update(dt, &state.grid, &mut state.rng);

        let mover = &state.enemies[i].tank;
        let others = state.players.iter().map(|p| &p.tank).chain(
            state
                .enemies
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, e)| &e.tank),
        );
        if tank_blocked(mover, step.delta, others) {
            state.enemies[i].bump(step.delta, &mut state.rng);
        }
        if step.wants_fire {
            shooters.push(i);
        }
    }
    shooters
}

fn fire(state: &mut GameState, input: &TickInput, shooters: &[usize]) {
    let now = state.time;
    let bounce = state.settings.bounce.rule();

    for (slot, player) in state.players.iter_mut().enumerate() {
        let wants = input.players.get(slot).is_some_and(|p| p.fire);
        if !wants || !player.tank.is_alive() {
            continue;
        }
        let order = player
            .tank
            .fire_order(false, slot as u32, player.color_override, bounce);
        let mut bullet = state.pool.acquire();
        if player.tank.cannon.fire(&mut bullet, &order, now) {
            state.bullets.push(bullet);
            state.events.push(GameEvent::Shot { enemy_owned: false });
        } else {
            state.pool.release(bullet);
        }
    }

    for &i in shooters {
        let enemy = &mut state.enemies[i];
        let order = enemy.tank.fire_order(true, enemy.id, None, bounce);
        let mut bullet = state.pool.acquire();
        if enemy.tank.cannon.fire(&mut bullet, &order, now) {
            state.bullets.push(bullet);
            state.events.push(GameEvent::Shot { enemy_owned: true });
        } else {
            state.pool.release(bullet);
        }
    }
}

fn update_bullets(state: &mut GameState, dt: f32) {
    let mut bullets = std::mem::take(&mut state.bullets);
    let mut kills: Vec<(usize, u32)> = Vec::new();

    for bullet in bullets.iter_mut() {
        bullet.update(dt);
        if !bullet.active {
            continue;
        }

        let tiles = bullet_vs_tiles(bullet, &mut state.grid, &mut state.events);
        if tiles.objective_destroyed && !state.objective_destroyed {
            state.objective_destroyed = true;
            log::info!("The eagle has fallen");
        }
        if !bullet.active {
            continue;
        }

        if bullet.enemy_owned {
            let hits = bullet_vs_tanks(bullet, state.players.iter_mut().map(|p| &mut p.tank));
            for hit in hits {
                state.events.push(if hit.absorbed {
                    GameEvent::ShieldHit
                } else if hit.killed {
                    GameEvent::PlayerDestroyed {
                        slot: hit.index as u32,
                    }
                } else {
                    GameEvent::TankHit { enemy: false }
                });
            }
        } else {
            let hits = bullet_vs_tanks(bullet, state.enemies.iter_mut().map(|e| &mut e.tank));
            for hit in hits {
                if hit.killed {
                    kills.push((hit.index, bullet.owner));
                } else {
                    state.events.push(if hit.absorbed {
                        GameEvent::ShieldHit
                    } else {
                        GameEvent::TankHit { enemy: true }
                    });
                }
            }
        }
    }

    if bullet_vs_bullets(&mut bullets) > 0 {
        state.events.push(GameEvent::BulletsCancelled);
    }

    for bullet in bullets {
        if bullet.active {
            state.bullets.push(bullet);
        } else {
            state.pool.release(bullet);
        }
    }

    for (index, slot) in kills {
        credit_kill(state, index, slot);
    }
}

/// Score an enemy kill for a player and maybe drop an item
fn credit_kill(state: &mut GameState, index: usize, slot: u32) {
    let enemy = &state.enemies[index];
    let (id, kind, points) = (enemy.id, enemy.kind, enemy.tank.score_value);
    state.events.push(GameEvent::EnemyDestroyed {
        id,
        kind,
        by: Some(slot),
    });

    if let Some(score) = state.scores.get_mut(slot as usize) {
        let bonus = score.add(points as u64);
        for _ in 0..bonus {
            state.events.push(GameEvent::ExtraLife { slot });
        }
    }

    let chance = state.drop_chance as f64;
    if chance > 0.0 && rand::Rng::random_bool(&mut state.rng, chance) {
        if let Some((col, row)) = state.random_open_cell() {
            let pos = Rect::cell(col, row);
            let id = state.powerups.spawn_random(
                glam::Vec2::new(pos.x, pos.y),
                &state.allowed_items,
                state.time,
                &mut state.rng,
            );
            if let Some(kind) = state.powerups.kind_of(id) {
                state.events.push(GameEvent::PowerUpSpawned { id, kind });
            }
        }
    }
}

/// Sweep destroyed enemies and handle players who lost their tank
fn resolve_casualties(state: &mut GameState) {
    let before = state.enemies.len();
    state.enemies.retain(|e| e.tank.is_alive());
    state.enemies_destroyed += (before - state.enemies.len()) as u32;

    let shield = state.level.player_config.respawn_invincible_time;
    for (slot, player) in state.players.iter_mut().enumerate() {
        let score = &mut state.scores[slot];
        if player.tank.is_alive() || score.is_out() {
            continue;
        }
        if score.lose_life() {
            player.respawn(shield);
            state.events.push(GameEvent::PlayerRespawned { slot: slot as u32 });
            log::debug!("Player {} respawned, {} lives left", slot + 1, score.lives);
        } else {
            log::info!("Player {} is out of lives", slot + 1);
        }
    }
}

fn collect_power_ups(state: &mut GameState) {
    let now = state.time;
    for collectible in state.powerups.list_collectible(now) {
        let taker = state
            .players
            .iter()
            .position(|p| p.tank.is_alive() && p.tank.rect().overlaps(&collectible.rect()));
        if let Some(slot) = taker {
            if state.powerups.activate(collectible.id, now) {
                state.apply_power_up(slot as u32, collectible.kind);
            }
        }
    }
    state.powerups.tick(now);
}

fn check_end_conditions(state: &mut GameState) {
    if state.objective_destroyed {
        game_over(state, GameOverReason::ObjectiveDestroyed);
        return;
    }
    if state.scores.iter().all(|s| s.is_out()) {
        game_over(state, GameOverReason::OutOfLives);
        return;
    }
    if state.enemy_queue.is_empty() && state.enemies.is_empty() {
        let reward = state.level.clear_reward.clone();
        for (slot, score) in state.scores.iter_mut().enumerate() {
            if score.is_out() {
                continue;
            }
            let bonus = score.add(reward.score_bonus);
            for _ in 0..bonus {
                state.events.push(GameEvent::ExtraLife { slot: slot as u32 });
            }
            if reward.extra_life {
                score.gain_life();
                state.events.push(GameEvent::ExtraLife { slot: slot as u32 });
            }
        }
        state.phase = GamePhase::LevelComplete;
        state.events.push(GameEvent::LevelComplete {
            level: state.level.level_id,
        });
        log::info!(
            "Level {} complete: {} enemies destroyed",
            state.level.level_id,
            state.enemies_destroyed
        );
    }
}

fn game_over(state: &mut GameState, reason: GameOverReason) {
    state.phase = GamePhase::GameOver(reason);
    state.events.push(GameEvent::GameOver { reason });
    log::info!(
        "Game over ({reason:?}) at {:.1}s, scores {:?}",
        state.time,
        state.scores.iter().map(|s| s.score).collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::grid::{TileGrid, TileType};
    use crate::sim::powerup::PowerUpKind;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn state() -> GameState {
        GameState::campaign(5, Settings::default(), 1).unwrap()
    }

    fn press(direction: Option<Direction>, fire: bool) -> TickInput {
        TickInput {
            players: [
                PlayerIntent { direction, fire },
                PlayerIntent::default(),
            ],
            pause: false,
        }
    }

    #[test]
    fn test_pause_toggles_and_freezes_time() {
        let mut s = state();
        tick(&mut s, &TickInput::default(), DT);
        let t = s.time;
        let pause = TickInput {
            pause: true,
            ..TickInput::default()
        };
        tick(&mut s, &pause, DT);
        assert_eq!(s.phase, GamePhase::Paused);
        tick(&mut s, &TickInput::default(), DT);
        assert_eq!(s.time, t);
        tick(&mut s, &pause, DT);
        assert_eq!(s.phase, GamePhase::Playing);
        assert!(s.time > t);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut s = state();
        tick(&mut s, &TickInput::default(), 5.0);
        assert!((s.time - MAX_FRAME_DT).abs() < 1e-6);
        tick(&mut s, &TickInput::default(), f32::NAN);
        assert!((s.time - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_first_enemy_spawns_immediately_then_waits() {
        let mut s = state();
        tick(&mut s, &TickInput::default(), DT);
        assert_eq!(s.enemies.len(), 1);
        // Top-left spawn point, already a step into the field
        assert_eq!(s.enemies[0].tank.pos.x, 0.0);
        assert!(s.enemies[0].tank.pos.y < 2.0);
        assert!(s.enemies[0].tank.is_shielded());
        tick(&mut s, &TickInput::default(), DT);
        assert_eq!(s.enemies.len(), 1);
        assert_eq!(s.enemy_queue.len(), 19);
    }

    #[test]
    fn test_on_screen_cap() {
        let mut s = state();
        for _ in 0..(60 * 20) {
            tick(&mut s, &TickInput::default(), DT);
            assert!(s.enemies.len() <= MAX_ON_SCREEN_ENEMIES as usize);
            if s.phase != GamePhase::Playing {
                break;
            }
        }
    }

    #[test]
    fn test_player_shot_respects_cooldown() {
        let mut s = state();
        s.enemy_queue.clear();
        s.enemies.clear();
        // Keep the level from completing
        s.enemy_queue.push(crate::sim::EnemyKind::Normal);
        s.spawn_timer = 1000.0;

        tick(&mut s, &press(None, true), DT);
        assert_eq!(s.bullets.len(), 1);
        tick(&mut s, &press(None, true), DT);
        assert_eq!(s.bullets.len(), 1);
        assert_eq!(
            s.events
                .iter()
                .filter(|e| matches!(e, GameEvent::Shot { enemy_owned: false }))
                .count(),
            1
        );
    }

    #[test]
    fn test_player_bullet_breaks_brick() {
        let mut s = state();
        s.grid = TileGrid::empty();
        s.grid.set_tile(6, 12, TileType::Eagle);
        s.grid.set_tile(4, 8, TileType::Brick);
        s.enemy_queue = vec![crate::sim::EnemyKind::Normal];
        s.spawn_timer = 1000.0;

        tick(&mut s, &press(Some(Direction::Up), true), DT);
        for _ in 0..120 {
            tick(&mut s, &press(None, false), DT);
        }
        assert_eq!(s.grid.tile(4, 8), TileType::Empty);
        assert!(s.bullets.is_empty());
        assert!(
            s.events
                .iter()
                .any(|e| matches!(e, GameEvent::BrickDestroyed { col: 4, row: 8 }))
        );
    }

    #[test]
    fn test_enemy_kill_scores_and_clears_level() {
        let mut s = state();
        s.grid = TileGrid::empty();
        s.grid.set_tile(6, 12, TileType::Eagle);
        s.enemy_queue.clear();
        let mut enemy = EnemyTank::new(
            1,
            crate::sim::EnemyKind::Fast,
            Vec2::new(128.0, 200.0),
            &mut s.rng,
        );
        enemy.tank.shield = 0.0;
        s.enemies.push(enemy);
        s.freeze_timer = 100.0;
        s.players[0].tank.bullet_level = 1;

        tick(&mut s, &press(None, true), DT);
        for _ in 0..60 {
            if s.phase != GamePhase::Playing {
                break;
            }
            tick(&mut s, &press(None, false), DT);
        }
        assert_eq!(s.scores[0].score, 200);
        assert_eq!(s.enemies_destroyed, 1);
        assert_eq!(s.phase, GamePhase::LevelComplete);
    }

    #[test]
    fn test_clear_bonus_awards_every_life_it_crosses() {
        let mut s = state();
        s.grid = TileGrid::empty();
        s.grid.set_tile(6, 12, TileType::Eagle);
        s.enemy_queue.clear();
        s.level.clear_reward.score_bonus = 40_000;
        s.level.clear_reward.extra_life = false;
        let lives = s.scores[0].lives;

        tick(&mut s, &TickInput::default(), DT);
        assert_eq!(s.phase, GamePhase::LevelComplete);
        let extra = s
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::ExtraLife { slot: 0 }))
            .count();
        assert_eq!(extra, 2);
        assert_eq!(s.scores[0].lives, lives + 2);
    }

    #[test]
    fn test_enemy_bullet_kills_player_and_respawns() {
        let mut s = state();
        s.grid = TileGrid::empty();
        s.grid.set_tile(6, 12, TileType::Eagle);
        s.enemy_queue = vec![crate::sim::EnemyKind::Normal];
        s.spawn_timer = 1000.0;
        s.players[0].tank.shield = 0.0;
        s.players[0].tank.pos = Vec2::new(128.0, 300.0);

        let mut bullet = s.pool.acquire();
        let order = crate::sim::FireOrder {
            origin: Vec2::new(138.0, 250.0),
            direction: Direction::Down,
            power_level: 1,
            color_override: None,
            enemy_owned: true,
            owner: 9,
            bounce: Default::default(),
        };
        assert!(crate::sim::Cannon::default().fire(&mut bullet, &order, 0.0));
        s.bullets.push(bullet);

        for _ in 0..30 {
            tick(&mut s, &TickInput::default(), DT);
        }
        assert_eq!(s.scores[0].lives, 2);
        assert_eq!(s.players[0].tank.pos, s.players[0].spawn);
        assert!(s.players[0].tank.is_shielded());
        assert!(s.events.contains(&GameEvent::PlayerDestroyed { slot: 0 }));
    }

    #[test]
    fn test_objective_hit_ends_game() {
        let mut s = state();
        s.enemy_queue = vec![crate::sim::EnemyKind::Normal];
        s.spawn_timer = 1000.0;
        s.grid = TileGrid::empty();
        s.grid.set_tile(6, 12, TileType::Eagle);

        let mut bullet = s.pool.acquire();
        let order = crate::sim::FireOrder {
            origin: Vec2::new(204.0, 300.0),
            direction: Direction::Down,
            power_level: 1,
            color_override: None,
            enemy_owned: true,
            owner: 1,
            bounce: Default::default(),
        };
        crate::sim::Cannon::default().fire(&mut bullet, &order, 0.0);
        s.bullets.push(bullet);

        for _ in 0..60 {
            tick(&mut s, &TickInput::default(), DT);
        }
        assert!(s.objective_destroyed);
        assert_eq!(
            s.phase,
            GamePhase::GameOver(GameOverReason::ObjectiveDestroyed)
        );
    }

    #[test]
    fn test_pickup_applies_effect() {
        let mut s = state();
        s.enemy_queue = vec![crate::sim::EnemyKind::Normal];
        s.spawn_timer = 1000.0;
        let pos = s.players[0].tank.pos;
        s.powerups.spawn(pos, PowerUpKind::Star, 0.0);

        // Grace period first
        tick(&mut s, &TickInput::default(), DT);
        assert_eq!(s.players[0].tank.bullet_level, 1);
        for _ in 0..40 {
            tick(&mut s, &TickInput::default(), DT);
        }
        assert_eq!(s.players[0].tank.bullet_level, 2);
        assert!(s.powerups.is_empty());
    }

    #[test]
    fn test_out_of_lives_ends_game() {
        let mut s = state();
        s.enemy_queue = vec![crate::sim::EnemyKind::Normal];
        s.spawn_timer = 1000.0;
        s.scores[0].lives = 1;
        s.players[0].tank.health = 0;
        tick(&mut s, &TickInput::default(), DT);
        assert_eq!(s.phase, GamePhase::GameOver(GameOverReason::OutOfLives));
    }
}
