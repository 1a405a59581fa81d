// Integration tests for the direction search
//
// Scenarios are built on small hand-drawn arenas so every verdict can be
// checked cell by cell.

use bomber_agent::arena::Arena;
use bomber_agent::config::{Config, GameRulesConfig};
use bomber_agent::search::{
    ChoiceOutcome, DirectionInfo, DirectionPreferences, SafetySearch, SAFETY_BLOCKED,
    SAFETY_BURNED, SAFETY_SAFE, SAFETY_UNKNOWN,
};
use bomber_agent::threat::HypotheticalBomb;
use bomber_agent::types::{Direction, GridCoordinates};
use bomber_agent::world::WorldQuery;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn rules() -> GameRulesConfig {
    Config::default_hardcoded().game_rules
}

fn prefs(order: [Direction; 4]) -> DirectionPreferences {
    DirectionPreferences::new(order)
}

#[test]
fn test_escapes_bomb_by_turning_off_its_ray() {
    let mut rules = rules();
    // Two ticks per cell
    rules.character_speed = 16.0;
    let mut arena = Arena::classic(11, 11, 0.0, rules, 1);
    arena.place_bomb(GridCoordinates::new(5, 5), 3, 3, None);
    let id = arena.spawn_character(GridCoordinates::new(5, 6));
    let state = arena.agent_state(id).unwrap();

    let order = prefs([Direction::Down, Direction::Left, Direction::Right, Direction::Up]);
    let search = SafetySearch::new(&arena, &state, &order, None);

    // Straight down stays on the ray and arrives too late
    assert_eq!(
        search.evaluate_direction(GridCoordinates::new(5, 7), Direction::Down, 5, 1).safety,
        SAFETY_BURNED
    );

    let outcome = search.choose_direction(5, SAFETY_SAFE, None);
    assert_eq!(
        outcome,
        ChoiceOutcome::Commit(
            Direction::Down,
            DirectionInfo {
                safety: SAFETY_SAFE,
                steps: 2,
                bad_bonus: 0,
                good_bonus: 0,
            }
        )
    );
}

#[test]
fn test_open_field_commits_first_free_preference() {
    let mut arena = Arena::from_rows(&["#######", "#.....#", "#.....#", "#######"], rules()).unwrap();
    let id = arena.spawn_character(GridCoordinates::new(1, 1));
    let state = arena.agent_state(id).unwrap();

    let order = prefs([Direction::Up, Direction::Left, Direction::Down, Direction::Right]);
    let search = SafetySearch::new(&arena, &state, &order, None);

    assert_eq!(
        search.evaluate_direction(GridCoordinates::new(1, 1), Direction::Up, 10, 0).safety,
        SAFETY_BLOCKED
    );
    match search.choose_direction(10, -1, None) {
        ChoiceOutcome::Commit(direction, info) => {
            assert_eq!(direction, Direction::Down);
            assert_eq!(info.safety, SAFETY_SAFE);
            assert_eq!(info.steps, 1);
        }
        other => panic!("expected a commit, got {:?}", other),
    }
}

#[test]
fn test_excluded_direction_is_skipped() {
    let mut arena = Arena::from_rows(&["#######", "#.....#", "#.....#", "#######"], rules()).unwrap();
    let id = arena.spawn_character(GridCoordinates::new(2, 1));
    let state = arena.agent_state(id).unwrap();

    let order = prefs([Direction::Right, Direction::Down, Direction::Left, Direction::Up]);
    let search = SafetySearch::new(&arena, &state, &order, None);

    match search.choose_direction(10, -1, Some(Direction::Right)) {
        ChoiceOutcome::Commit(direction, _) => assert_eq!(direction, Direction::Down),
        other => panic!("expected a commit, got {:?}", other),
    }
}

#[test]
fn test_holds_rather_than_walking_onto_bad_bonus() {
    let mut arena = Arena::from_rows(&["#####", "#.b.#", "#####"], rules()).unwrap();
    let id = arena.spawn_character(GridCoordinates::new(1, 1));
    let state = arena.agent_state(id).unwrap();
    let order = DirectionPreferences::default();
    let search = SafetySearch::new(&arena, &state, &order, None);

    let info = search.evaluate_direction(GridCoordinates::new(1, 1), Direction::Right, 10, 0);
    assert_eq!(info.safety, SAFETY_SAFE);
    assert_eq!(info.bad_bonus, 1);

    assert_eq!(search.choose_direction(10, -1, None), ChoiceOutcome::HoldPosition);
}

#[test]
fn test_good_bonuses_ahead_are_counted() {
    let mut arena = Arena::from_rows(&["#######", "#..gg.#", "#######"], rules()).unwrap();
    let id = arena.spawn_character(GridCoordinates::new(1, 1));
    let state = arena.agent_state(id).unwrap();
    let order = DirectionPreferences::default();
    let search = SafetySearch::new(&arena, &state, &order, None);

    let info = search.evaluate_direction(GridCoordinates::new(1, 1), Direction::Right, 10, 0);
    assert_eq!(info.safety, SAFETY_SAFE);
    assert_eq!(info.steps, 1);
    assert_eq!(info.good_bonus, 2);
}

#[test]
fn test_unknown_when_lookahead_runs_out() {
    let mut arena = Arena::from_rows(&["#####", "#...#", "#####"], rules()).unwrap();
    arena.place_bomb(GridCoordinates::new(3, 1), 3, 100, None);
    let id = arena.spawn_character(GridCoordinates::new(1, 1));
    let state = arena.agent_state(id).unwrap();
    let order = DirectionPreferences::default();
    let search = SafetySearch::new(&arena, &state, &order, None);

    assert_eq!(
        search.evaluate_direction(GridCoordinates::new(1, 1), Direction::Right, 1, 0).safety,
        SAFETY_UNKNOWN
    );
    assert_eq!(search.choose_direction(1, SAFETY_SAFE, None), ChoiceOutcome::NoAcceptable);
    match search.choose_direction(1, -1, None) {
        ChoiceOutcome::Commit(direction, info) => {
            assert_eq!(direction, Direction::Right);
            assert_eq!(info.safety, SAFETY_UNKNOWN);
        }
        other => panic!("expected a commit, got {:?}", other),
    }
}

#[test]
fn test_walking_into_live_explosion_burns() {
    let mut arena = Arena::from_rows(&["#####", "#...#", "#####"], rules()).unwrap();
    arena.ignite(GridCoordinates::new(2, 1), 40);
    let id = arena.spawn_character(GridCoordinates::new(1, 1));
    let state = arena.agent_state(id).unwrap();
    let order = DirectionPreferences::default();
    let search = SafetySearch::new(&arena, &state, &order, None);

    let info = search.evaluate_direction(GridCoordinates::new(1, 1), Direction::Right, 10, 0);
    assert_eq!(info.safety, SAFETY_BURNED);
    // Far enough into the lookahead the flames are gone by arrival
    let later = search.evaluate_direction(GridCoordinates::new(1, 1), Direction::Right, 10, 4);
    assert_eq!(later.safety, SAFETY_SAFE);
}

#[test]
fn test_collapsed_neighbour_is_blocked() {
    let mut arena = Arena::from_rows(&["######", "#....#", "######"], rules()).unwrap();
    let id = arena.spawn_character(GridCoordinates::new(2, 1));
    arena.set_time_remaining(1);
    arena.tick();
    assert!(arena.is_collidable(GridCoordinates::new(1, 1)));

    let state = arena.agent_state(id).unwrap();
    let order = DirectionPreferences::default();
    let search = SafetySearch::new(&arena, &state, &order, None);
    let from = GridCoordinates::new(2, 1);
    assert_eq!(search.evaluate_direction(from, Direction::Left, 10, 0).safety, SAFETY_BLOCKED);
    assert_eq!(search.evaluate_direction(from, Direction::Right, 10, 0).safety, SAFETY_SAFE);
}

#[test]
fn test_hypothetical_bomb_in_dead_end_has_no_escape() {
    let mut arena = Arena::from_rows(&["#####", "#...#", "#####"], rules()).unwrap();
    let id = arena.spawn_character(GridCoordinates::new(1, 1));
    let state = arena.agent_state(id).unwrap();
    let order = DirectionPreferences::default();

    let hypothetical = HypotheticalBomb {
        origin: GridCoordinates::new(1, 1),
        range: 3,
        fuse: arena.bomb_fuse_ticks(),
    };
    let assumed = SafetySearch::new(&arena, &state, &order, Some(hypothetical));
    assert!(!assumed.threats().is_safe(GridCoordinates::new(1, 1)));
    assert_eq!(assumed.choose_direction(5, SAFETY_SAFE, None), ChoiceOutcome::NoAcceptable);

    // The world itself is untouched by the assumed bomb
    let plain = SafetySearch::new(&arena, &state, &order, None);
    assert!(plain.threats().is_safe(GridCoordinates::new(1, 1)));
    assert!(arena.bombs().is_empty());
}

#[test]
fn test_never_commits_to_a_colliding_direction() {
    let config = Config::default_hardcoded();
    let mut rng = StdRng::seed_from_u64(2024);

    for seed in 0..40 {
        let mut arena = Arena::classic(13, 11, 0.5, config.game_rules.clone(), seed);
        for _ in 0..6 {
            let cell = GridCoordinates::new(rng.random_range(1..12), rng.random_range(1..10));
            arena.place_bomb(cell, rng.random_range(1..4), rng.random_range(1..150), None);
        }

        let spawn = arena.spawn_points()[rng.random_range(0..4)];
        let id = arena.spawn_character(spawn);
        let mut state = arena.agent_state(id).unwrap();
        // Somewhere inside the cell, off centre
        let size = arena.tile_size();
        state.x += rng.random_range(-0.4..0.4) * size;
        state.y += rng.random_range(-0.4..0.4) * size;

        let order = DirectionPreferences::shuffled(&mut rng);
        let excluded = Direction::all()[rng.random_range(0..4)];
        let search = SafetySearch::new(&arena, &state, &order, None);

        for (max_depth, min_safety, skip) in [(10, -1, None), (5, 1, Some(excluded))] {
            if let ChoiceOutcome::Commit(direction, info) =
                search.choose_direction(max_depth, min_safety, skip)
            {
                assert!(!arena.is_colliding(&state, direction, state.max_speed));
                assert_ne!(Some(direction), skip);
                assert!(info.safety >= min_safety);
            }
        }
    }
}
