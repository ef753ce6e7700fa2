use battle_city::input::Autopilot;
use battle_city::sim::*;
use battle_city::{LevelData, Settings};
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

const DT: f32 = 1.0 / 60.0;

fn fire(origin: Vec2, direction: Direction, level: u8, enemy_owned: bool) -> Bullet {
    let mut bullet = Bullet::default();
    let order = FireOrder {
        origin,
        direction,
        power_level: level,
        color_override: None,
        enemy_owned,
        owner: 0,
        bounce: BounceRule::default(),
    };
    assert!(Cannon::default().fire(&mut bullet, &order, 0.0));
    bullet
}

/// Step a lone bullet against the grid until it stops or leaves
fn fly(bullet: &mut Bullet, grid: &mut TileGrid, events: &mut Vec<GameEvent>) {
    for _ in 0..600 {
        bullet.update(DT);
        if !bullet.active {
            return;
        }
        bullet_vs_tiles(bullet, grid, events);
    }
}

/// A quiet board: empty grid with only the eagle, one enemy held back
fn quiet_state(seed: u64) -> GameState {
    let mut state = GameState::campaign(seed, Settings::default(), 1).unwrap();
    state.grid = TileGrid::empty();
    state.grid.set_tile(6, 12, TileType::Eagle);
    state.enemy_queue = vec![EnemyKind::Normal];
    state.spawn_timer = 1000.0;
    state
}

#[test]
fn level_one_bullet_clears_one_brick() {
    let mut grid = TileGrid::empty();
    grid.set_tile(5, 5, TileType::Brick);
    let mut events = Vec::new();

    let mut first = fire(Vec2::new(172.0, 400.0), Direction::Up, 1, false);
    fly(&mut first, &mut grid, &mut events);
    assert!(!first.active);
    assert_eq!(grid.tile(5, 5), TileType::Empty);
    assert_eq!(grid.count(TileType::Brick), 0);
    assert_eq!(events, vec![GameEvent::BrickDestroyed { col: 5, row: 5 }]);

    // Same path again: nothing left to hit
    events.clear();
    let snapshot = grid.rows();
    let mut second = fire(Vec2::new(172.0, 400.0), Direction::Up, 1, false);
    fly(&mut second, &mut grid, &mut events);
    assert_eq!(grid.rows(), snapshot);
    assert!(events.is_empty());
}

#[test]
fn level_three_bullet_pierces_a_column_of_tanks() {
    let mut rng = Pcg32::seed_from_u64(4);
    let mut enemies: Vec<EnemyTank> = [40.0, 120.0, 200.0]
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let mut e = EnemyTank::new(i as u32, EnemyKind::Normal, Vec2::new(160.0, y), &mut rng);
            e.tank.shield = 0.0;
            e
        })
        .collect();

    // Swept from below all three to above them in a single step
    let mut bullet = fire(Vec2::new(170.0, 300.0), Direction::Up, 3, false);
    bullet.previous = bullet.pos;
    bullet.pos = Vec2::new(170.0, 10.0);

    let hits = bullet_vs_tanks(&mut bullet, enemies.iter_mut().map(|e| &mut e.tank));
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.killed && !h.absorbed));
    assert!(enemies.iter().all(|e| e.tank.health == 0));
    assert!(bullet.active);
}

#[test]
fn opposing_bullets_cancel_mid_field() {
    let mut state = quiet_state(21);
    state.players[0].tank.shield = 0.0;
    state.freeze_timer = 1000.0;

    let mut enemy = EnemyTank::new(50, EnemyKind::Normal, Vec2::new(128.0, 0.0), &mut Pcg32::seed_from_u64(1));
    enemy.tank.shield = 0.0;
    let enemy_health = enemy.tank.health;
    state.enemies.push(enemy);

    // Enemy bullet heading down the player's column
    state.bullets.push(fire(Vec2::new(138.0, 40.0), Direction::Down, 1, true));

    let shoot = TickInput {
        players: [
            PlayerIntent {
                direction: None,
                fire: true,
            },
            PlayerIntent::default(),
        ],
        pause: false,
    };
    tick(&mut state, &shoot, DT);
    for _ in 0..120 {
        tick(&mut state, &TickInput::default(), DT);
    }

    let events = state.drain_events();
    assert!(events.contains(&GameEvent::BulletsCancelled));
    assert!(state.bullets.is_empty());
    assert!(state.players[0].tank.is_alive());
    assert_eq!(state.scores[0].lives, 3);
    assert_eq!(state.enemies[0].tank.health, enemy_health);
    assert!(!events.iter().any(|e| matches!(
        e,
        GameEvent::PlayerDestroyed { .. } | GameEvent::EnemyDestroyed { .. } | GameEvent::TankHit { .. }
    )));
}

#[test]
fn power_up_lifecycle() {
    let mut manager = PowerUpManager::new();
    let t0 = 2.0;
    let id = manager.spawn(Vec2::new(64.0, 64.0), PowerUpKind::Clock, t0);

    let early = manager.list_collectible(t0 + 1.0);
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].id, id);
    assert!(!early[0].is_flashing);

    let late = manager.list_collectible(t0 + 12.5);
    assert_eq!(late.len(), 1);
    assert!(late[0].is_flashing);

    assert!(manager.list_collectible(t0 + 15.1).is_empty());
    assert!(!manager.activate(id, t0 + 15.1));
}

#[test]
fn same_seed_and_inputs_replay_identically() {
    let run = |seed: u64| {
        let settings = Settings {
            two_player: true,
            ..Settings::default()
        };
        let mut state = GameState::campaign(seed, settings, 3).unwrap();
        let mut pilot = Autopilot::new(seed);
        let mut events = 0;
        for _ in 0..(60 * 30) {
            let input = pilot.sample(DT);
            tick(&mut state, &input, DT);
            events += state.drain_events().len();
        }
        (Snapshot::capture(&state).to_json().unwrap(), events)
    };

    let (a, events_a) = run(1234);
    let (b, events_b) = run(1234);
    assert_eq!(a, b);
    assert_eq!(events_a, events_b);
}

#[test]
fn custom_level_from_json_plays() {
    let json = r#"{
        "level_id": 1,
        "level_name": "Corridor",
        "map_tiles": [
            {"x": 6, "y": 12, "type": 8},
            {"x": 5, "y": 12, "type": 1},
            {"x": 7, "y": 12, "type": 1},
            {"x": 6, "y": 6, "type": 2}
        ],
        "enemy_config": {"total_count": 2, "max_on_screen": 1, "spawn_interval": 1.0, "types": {"fast": 2}},
        "item_config": {"spawn_probability": 0.0, "allowed_items": ["star"]},
        "clear_reward": {"score_bonus": 1000, "extra_life": false}
    }"#;
    let level = LevelData::from_json(json).unwrap();
    let mut state = GameState::new(8, Settings::default(), level).unwrap();
    assert_eq!(state.grid.tile(6, 6), TileType::Steel);
    assert_eq!(state.grid.tile(0, 0), TileType::Empty);
    assert_eq!(state.enemies_remaining(), 2);

    for _ in 0..(60 * 5) {
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.enemies.len() <= 1);
        assert!(state.enemies.iter().all(|e| e.kind == EnemyKind::Fast));
    }
}

#[test]
fn clearing_a_level_keeps_progress() {
    let mut state = quiet_state(3);
    state.enemy_queue.clear();
    state.scores[0].score = 700;
    state.players[0].tank.bullet_level = 2;

    tick(&mut state, &TickInput::default(), DT);
    assert_eq!(state.phase, GamePhase::LevelComplete);

    assert!(state.advance_level().unwrap());
    assert_eq!(state.level.level_id, 2);
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!(state.scores[0].score, 700);
    assert_eq!(state.players[0].tank.bullet_level, 2);
    assert_eq!(state.players[0].tank.pos, state.players[0].spawn);
    assert_eq!(state.enemies_remaining(), 20);
}

#[test]
fn headless_runs_finish_cleanly() {
    for seed in [1u64, 7, 99] {
        let mut state = GameState::campaign(seed, Settings::default(), 1).unwrap();
        let mut pilot = Autopilot::new(seed);
        for _ in 0..(60 * 20) {
            tick(&mut state, &pilot.sample(DT), DT);
            state.drain_events();
            if state.is_over() {
                break;
            }
        }
        assert!(state.time > 0.0);
        let json = Snapshot::capture(&state).to_json().unwrap();
        assert!(json.contains("\"tiles\""));
    }
}
