#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use serpent::simulation::game::{Cell, Direction, GameSim, Rules, Tile, VISION_SIZE};
use serpent::simulation::rng::create_rng;

fn create_test_rules() -> Rules {
    Rules {
        field_width: 21,
        field_height: 21,
        snake_start_length: 10,
        snake_grow_length: 3,
        max_ai_turns: 441,
    }
}

fn create_test_game(rules: Rules) -> GameSim {
    let mut rng = create_rng(1);
    GameSim::new(rules, &mut rng)
}

#[test]
fn test_reset_state() {
    let game = create_test_game(create_test_rules());

    assert_eq!(game.snake_len(), 10);
    assert_eq!(game.head, Cell::new(10, 10));
    assert_eq!(game.heading, Direction::Right);
    assert_eq!(game.target_length, 10);
    assert!(game.alive);
    assert!(!game.is_terminal());
    assert_eq!(game.apples_eaten, 0);
    assert_eq!(game.total_turns, 0);
    assert_eq!(game.turns_since_eating, 0);

    // Tail extends left of the head along the center row
    for i in 0..10 {
        assert_eq!(game.body[i], Cell::new(1 + i as i32, 10));
    }

    // Apple is in bounds and off the snake
    assert!(game.is_in_bounds(game.apple));
    assert!(!game.body.contains(&game.apple));
}

#[test]
fn test_only_reversal_is_illegal() {
    let mut rng = create_rng(2);
    let mut game = GameSim::new(create_test_rules(), &mut rng);
    game.place_apple(Cell::new(0, 0));

    assert!(game.is_legal_move(Direction::Right));
    assert!(game.is_legal_move(Direction::Up));
    assert!(game.is_legal_move(Direction::Down));
    assert!(!game.is_legal_move(Direction::Left));

    game.advance(Direction::Up, &mut rng);
    assert_eq!(game.heading, Direction::Up);
    assert!(game.is_legal_move(Direction::Left));
    assert!(game.is_legal_move(Direction::Right));
    assert!(!game.is_legal_move(Direction::Down));
}

#[test]
fn test_eating_grows_target_and_resets_stall_counter() {
    let mut rng = create_rng(3);
    let mut game = GameSim::new(create_test_rules(), &mut rng);

    game.place_apple(Cell::new(11, 10));
    assert_eq!(game.tile(Cell::new(11, 10)), Tile::Apple);

    game.advance(Direction::Right, &mut rng);

    assert_eq!(game.apples_eaten, 1);
    assert_eq!(game.snake_len(), 11);
    assert_eq!(game.target_length, 13);
    assert_eq!(game.total_turns, 1);
    assert_eq!(game.turns_since_eating, 0);
    assert!(game.alive);
    assert_ne!(game.apple, game.head);
}

#[test]
fn test_body_grows_fifo_toward_target() {
    let mut rng = create_rng(4);
    let mut game = GameSim::new(create_test_rules(), &mut rng);

    // Eat two apples directly ahead: target becomes 10 + 2*3 = 16.
    game.place_apple(Cell::new(11, 10));
    game.advance(Direction::Right, &mut rng);
    game.place_apple(Cell::new(12, 10));
    game.advance(Direction::Right, &mut rng);
    assert_eq!(game.target_length, 16);
    assert_eq!(game.snake_len(), 12);

    // Coast: the body fills up to the target, then the oldest cells vacate.
    game.place_apple(Cell::new(10, 0));
    for _ in 0..4 {
        game.advance(Direction::Right, &mut rng);
    }
    assert_eq!(game.snake_len(), 16);

    game.advance(Direction::Right, &mut rng);
    game.advance(Direction::Right, &mut rng);
    assert_eq!(game.snake_len(), 16);
    assert_eq!(*game.body.front().expect("non-empty body"), Cell::new(3, 10));
    assert!(game.alive);
}

#[test]
fn test_wall_collision_kills() {
    let mut rng = create_rng(5);
    let mut game = GameSim::new(create_test_rules(), &mut rng);
    game.place_apple(Cell::new(0, 0));

    // Head starts at x=10; ten moves reach the last column, one more exits.
    for _ in 0..10 {
        game.advance(Direction::Right, &mut rng);
        assert!(game.alive);
    }
    game.advance(Direction::Right, &mut rng);

    assert!(!game.alive);
    assert!(game.is_terminal());
}

#[test]
fn test_self_collision_kills() {
    let mut rng = create_rng(6);
    let mut game = GameSim::new(create_test_rules(), &mut rng);
    game.place_apple(Cell::new(0, 0));

    // Hook back into the body: up, left, then down onto a body cell.
    game.advance(Direction::Up, &mut rng);
    game.advance(Direction::Left, &mut rng);
    assert!(game.alive);
    game.advance(Direction::Down, &mut rng);

    assert!(!game.alive);
    assert!(game.is_terminal());
}

#[test]
fn test_stall_timeout_ends_episode_without_death() {
    let mut rng = create_rng(7);
    let rules = Rules {
        max_ai_turns: 3,
        ..create_test_rules()
    };
    let mut game = GameSim::new(rules, &mut rng);
    game.place_apple(Cell::new(0, 0));

    for _ in 0..3 {
        assert!(!game.is_terminal());
        game.advance(Direction::Right, &mut rng);
    }

    assert!(game.timed_out());
    assert!(game.is_terminal());
    assert!(game.alive);
}

#[test]
fn test_dead_snake_does_not_move() {
    let mut rng = create_rng(8);
    let mut game = GameSim::new(create_test_rules(), &mut rng);
    game.place_apple(Cell::new(0, 0));
    game.advance(Direction::Up, &mut rng);
    game.advance(Direction::Left, &mut rng);
    game.advance(Direction::Down, &mut rng);
    assert!(!game.alive);

    let head = game.head;
    let turns = game.total_turns;
    game.advance(Direction::Down, &mut rng);
    assert_eq!(game.head, head);
    assert_eq!(game.total_turns, turns);
}

#[test]
fn test_timed_out_snake_does_not_move() {
    let mut rng = create_rng(10);
    let rules = Rules {
        max_ai_turns: 2,
        ..create_test_rules()
    };
    let mut game = GameSim::new(rules, &mut rng);
    game.place_apple(Cell::new(0, 0));
    game.advance(Direction::Right, &mut rng);
    game.advance(Direction::Right, &mut rng);
    assert!(game.timed_out());
    assert!(game.alive);

    let head = game.head;
    let turns = game.total_turns;
    let stalled = game.turns_since_eating;
    game.advance(Direction::Right, &mut rng);
    assert_eq!(game.head, head);
    assert_eq!(game.total_turns, turns);
    assert_eq!(game.turns_since_eating, stalled);
}

#[test]
fn test_vision_apple_proximity_forward() {
    let mut game = create_test_game(create_test_rules());

    game.place_apple(Cell::new(11, 10));
    let vision = game.vision();
    assert_eq!(vision.len(), VISION_SIZE);
    assert_eq!(vision[0], 1.0);

    game.place_apple(Cell::new(12, 10));
    let vision = game.vision();
    assert_eq!(vision[0], (1.0f64 / 2.0).sqrt());
}

#[test]
fn test_vision_apple_proximity_decreases_with_distance() {
    let mut game = create_test_game(create_test_rules());

    game.place_apple(Cell::new(12, 10));
    let near = game.vision()[0];
    game.place_apple(Cell::new(13, 10));
    let far = game.vision()[0];

    assert!(near > far);
    assert!(far > 0.0);
}

#[test]
fn test_vision_wall_proximity_forward() {
    let mut game = create_test_game(create_test_rules());
    game.place_apple(Cell::new(0, 0));

    // Head at x=10 on a 21-wide field: the wall is 11 steps ahead.
    let vision = game.vision();
    assert_eq!(vision[2], (1.0f64 / 11.0).sqrt());
}

#[test]
fn test_vision_ray_order_left_is_third_ray() {
    let mut game = create_test_game(create_test_rules());

    // Heading right, so the left ray points up on screen.
    game.place_apple(Cell::new(10, 8));
    let vision = game.vision();
    assert_eq!(vision[2 * 3], (1.0f64 / 2.0).sqrt());
    assert_eq!(vision[0], 0.0);
}

#[test]
fn test_vision_reports_nearest_snake_segment_only() {
    let mut game = create_test_game(create_test_rules());
    game.place_apple(Cell::new(0, 0));

    // Two body segments on the forward ray at distances 4 and 7; only the
    // nearer one may register.
    game.body.push_back(Cell::new(14, 10));
    game.body.push_back(Cell::new(17, 10));

    let vision = game.vision();
    assert_eq!(vision[1], (1.0f64 / 4.0).sqrt());
}

#[test]
fn test_vision_has_no_ray_straight_behind() {
    let mut rng = create_rng(9);
    let rules = Rules {
        snake_start_length: 2,
        ..create_test_rules()
    };
    let mut game = GameSim::new(rules, &mut rng);

    // Apple directly behind the head: no ray points that way.
    game.place_apple(Cell::new(7, 10));
    let vision = game.vision();
    for ray in 0..7 {
        assert_eq!(vision[ray * 3], 0.0, "ray {ray} saw the apple");
    }
}
