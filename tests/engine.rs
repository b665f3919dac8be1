use std::time::Duration;

use torus_snake::engine::tick_interval;
use torus_snake::{
    CellSizing, ConfigError, Direction, Engine, GameOptions, GameOverReason, Host, Point, Px, Rgb,
    State,
};

const SNAKE: Rgb = Rgb(0, 0xFF, 0);
const FOOD: Rgb = Rgb(0xFF, 0xFF, 0);
const BACKGROUND: Rgb = Rgb(0, 0, 0);

// With the default sizing (margin 300, divisor 45) this comes out to a cell
// size of 10, so a 40x25 board is a 400x250 pixel window.
const DISPLAY: Px = 750;

#[derive(Default)]
struct MockHost {
    display_width: Px,
    fills: Vec<(Point, Px, Rgb)>,
    scheduled: Vec<Duration>,
    cancels: usize,
    game_over_signals: usize,
}

impl MockHost {
    fn new() -> Self {
        MockHost { display_width: DISPLAY, ..Default::default() }
    }

    fn fills_of(&self, color: Rgb) -> Vec<Point> {
        self.fills.iter().filter(|(_, _, c)| *c == color).map(|(p, _, _)| *p).collect()
    }
}

impl Host for MockHost {
    fn display_width(&self) -> Px {
        self.display_width
    }

    fn fill_cell(&mut self, cell: Point, size: Px, color: Rgb) {
        self.fills.push((cell, size, color));
    }

    fn schedule_tick(&mut self, interval: Duration) {
        self.scheduled.push(interval);
    }

    fn cancel_tick(&mut self) {
        self.cancels += 1;
    }

    fn notify_game_over(&mut self) {
        self.game_over_signals += 1;
    }
}

fn pt(x: Px, y: Px) -> Point {
    Point { x, y }
}

fn engine() -> Engine {
    Engine::seeded(CellSizing::default(), 7)
}

fn started() -> (Engine, MockHost) {
    let mut eng = engine();
    let mut host = MockHost::new();
    eng.start(&mut host, GameOptions::default()).unwrap();
    (eng, host)
}

#[test]
fn start_allocates_the_initial_body() {
    let (eng, host) = started();

    assert_eq!(eng.state(), State::Running);
    assert_eq!(eng.length(), Some(4));
    assert_eq!(eng.cell_size(), Some(10));
    assert_eq!(eng.window_size(), Some((400, 250)));
    assert_eq!(eng.direction(), Some(Direction::Right));

    // Center row, head rightmost, one cell apart
    assert_eq!(eng.head(), Some(pt(210, 120)));
    let rendered = host.fills_of(SNAKE);
    assert_eq!(rendered, vec![pt(210, 120), pt(200, 120), pt(190, 120), pt(180, 120)]);

    // Food is rendered and not on the body
    let food = eng.food().unwrap();
    assert_eq!(host.fills_of(FOOD), vec![food]);
    assert!(!rendered.contains(&food));

    // Ticking at the speed-8 interval
    assert_eq!(host.scheduled, vec![Duration::from_millis(44)]);
}

#[test]
fn plain_move_translates_without_growing() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(0, 0));
    host.fills.clear();

    eng.on_tick(&mut host);

    assert_eq!(eng.length(), Some(4));
    assert_eq!(eng.head(), Some(pt(220, 120)));

    // The old tail cell was erased and the new head drawn
    assert_eq!(host.fills_of(BACKGROUND), vec![pt(180, 120)]);
    assert_eq!(host.fills_of(SNAKE), vec![pt(220, 120)]);
    assert_eq!(host.game_over_signals, 0);
}

#[test]
fn eating_food_grows_by_one() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(220, 120));
    host.fills.clear();

    eng.on_tick(&mut host);

    assert_eq!(eng.length(), Some(5));
    assert_eq!(eng.head(), Some(pt(220, 120)));

    // Nothing was erased: the tail stayed put
    assert!(host.fills_of(BACKGROUND).is_empty());

    // A fresh food item landed on a free cell
    let food = eng.food().unwrap();
    assert_ne!(food, pt(220, 120));
    assert_eq!(host.fills_of(FOOD), vec![food]);
    for x in (180..=220).step_by(10) {
        assert_ne!(food, pt(x, 120));
    }
}

#[test]
fn reversal_is_rejected() {
    let (mut eng, _host) = started();

    eng.on_direction(Direction::Left);
    assert_eq!(eng.direction(), Some(Direction::Right));

    // Repeating the current direction is a no-op too
    eng.on_direction(Direction::Right);
    assert_eq!(eng.direction(), Some(Direction::Right));
}

#[test]
fn perpendicular_turns_are_accepted() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(0, 0));

    eng.on_direction(Direction::Up);
    assert_eq!(eng.direction(), Some(Direction::Up));

    eng.on_tick(&mut host);
    assert_eq!(eng.head(), Some(pt(210, 110)));
}

#[test]
fn repeated_requests_are_idempotent_between_ticks() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(0, 0));

    eng.on_direction(Direction::Up);
    eng.on_direction(Direction::Up);

    eng.on_tick(&mut host);
    assert_eq!(eng.head(), Some(pt(210, 110)));
    assert_eq!(eng.direction(), Some(Direction::Up));
}

#[test]
fn movable_latch_allows_one_turn_per_tick() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(0, 0));

    // Up is latched; the follow-up Left within the same tick is dropped
    eng.on_direction(Direction::Up);
    eng.on_direction(Direction::Left);
    assert_eq!(eng.direction(), Some(Direction::Up));

    // The completed tick re-arms the latch
    eng.on_tick(&mut host);
    eng.on_direction(Direction::Left);
    assert_eq!(eng.direction(), Some(Direction::Left));
}

#[test]
fn wrap_around_on_every_edge() {
    let cases = [
        (Direction::Right, pt(390, 120), pt(0, 120)),
        (Direction::Left, pt(0, 120), pt(390, 120)),
        (Direction::Up, pt(180, 0), pt(180, 240)),
        (Direction::Down, pt(180, 240), pt(180, 0)),
    ];

    for &(direction, head, wrapped) in cases.iter() {
        let (mut eng, mut host) = started();
        eng.debug_set_food(pt(50, 50));

        // A short straight body trailing off at a right angle to the step
        let mut segments = vec![head];
        for _ in 0..3 {
            let last = *segments.last().unwrap();
            segments.push(match direction {
                Direction::Left | Direction::Right => pt(last.x, (last.y + 10) % 250),
                Direction::Up | Direction::Down => pt((last.x + 10) % 400, last.y),
            });
        }
        eng.debug_set_snake(&segments, direction);

        eng.on_tick(&mut host);
        assert_eq!(eng.head(), Some(wrapped), "direction {:?}", direction);
        assert_eq!(host.game_over_signals, 0);
    }
}

#[test]
fn straight_run_wraps_after_the_expected_tick_count() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(10, 0));

    // Head starts at column 21 of 40; 19 rightward ticks reach column 0
    let ticks = 40 - 210 / 10;
    for i in 0..ticks {
        assert_eq!(eng.length(), Some(4), "length changed before tick {}", i);
        eng.on_tick(&mut host);
    }

    assert_eq!(eng.head(), Some(pt(0, 120)));
    assert_eq!(eng.length(), Some(4));
}

#[test]
fn tail_cell_is_exempt_from_collision() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(0, 0));

    // A closed square: the next head cell is the tail, about to vacate
    eng.debug_set_snake(
        &[pt(100, 100), pt(110, 100), pt(110, 110), pt(100, 110)],
        Direction::Down,
    );

    eng.on_tick(&mut host);

    assert_eq!(host.game_over_signals, 0);
    assert_eq!(eng.head(), Some(pt(100, 110)));
    assert_eq!(eng.length(), Some(4));
}

#[test]
fn self_collision_ends_the_game() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(0, 0));

    // An S-hook, then a turn back into the body
    eng.debug_set_snake(
        &[pt(100, 100), pt(110, 100), pt(110, 110), pt(100, 110), pt(90, 110)],
        Direction::Left,
    );
    eng.on_direction(Direction::Down);

    host.fills.clear();
    eng.on_tick(&mut host);

    assert_eq!(host.game_over_signals, 1);
    assert_eq!(eng.state(), State::GameOver);

    // No mutation after the terminal tick
    assert_eq!(eng.length(), Some(5));
    assert_eq!(eng.head(), Some(pt(100, 100)));
    assert!(host.fills.is_empty());

    // Further ticks and turns are no-ops
    eng.on_tick(&mut host);
    eng.on_direction(Direction::Right);
    assert_eq!(host.game_over_signals, 1);
    assert_eq!(eng.head(), Some(pt(100, 100)));
    assert_eq!(eng.direction(), Some(Direction::Down));
}

#[test]
fn score_is_speed_times_growth() {
    let (mut eng, mut host) = started();

    // Ten segments coiled so the next step collides
    let segments = [
        pt(100, 100),
        pt(100, 110),
        pt(110, 110),
        pt(120, 110),
        pt(120, 100),
        pt(120, 90),
        pt(110, 90),
        pt(100, 90),
        pt(90, 90),
        pt(80, 90),
    ];
    eng.debug_set_snake(&segments, Direction::Up);
    eng.debug_set_food(pt(0, 0));

    eng.on_tick(&mut host); // head would enter (100, 90)
    assert_eq!(eng.state(), State::GameOver);

    let summary = eng.stop(&mut host).unwrap();
    assert_eq!(summary.score, 8 * (10 - 4));
    assert_eq!(summary.reason, GameOverReason::SelfCollision);
    assert_eq!(summary.to_string(), "You lost! Score: 48");
    assert_eq!(eng.state(), State::Stopped);
}

#[test]
fn stop_without_game_over_yields_no_summary() {
    let (mut eng, mut host) = started();

    assert_eq!(eng.stop(&mut host), None);
    assert_eq!(host.cancels, 1);
    assert_eq!(eng.state(), State::Stopped);
    assert!(!eng.is_started());

    // A fresh start is allowed again
    assert!(eng.start(&mut host, GameOptions::default()).is_ok());
}

#[test]
fn double_start_is_rejected() {
    let (mut eng, mut host) = started();

    let err = eng.start(&mut host, GameOptions::default());
    assert_eq!(err, Err(ConfigError::AlreadyStarted));
    assert_eq!(eng.state(), State::Running);
}

#[test]
fn bad_configuration_is_rejected_cleanly() {
    let mut host = MockHost::new();

    for speed in [0u8, 11] {
        let mut eng = engine();
        let options = GameOptions { speed, ..GameOptions::default() };
        assert_eq!(eng.start(&mut host, options), Err(ConfigError::SpeedOutOfRange(speed)));
        assert_eq!(eng.state(), State::Stopped);
    }

    // Display too narrow for any cell
    let mut eng = engine();
    let mut narrow = MockHost { display_width: 310, ..Default::default() };
    assert_eq!(
        eng.start(&mut narrow, GameOptions::default()),
        Err(ConfigError::ZeroCellSize { display_width: 310 })
    );

    // Board without room for the body
    let mut eng = engine();
    let options = GameOptions { cols: 2, rows: 2, ..GameOptions::default() };
    assert_eq!(
        eng.start(&mut host, options),
        Err(ConfigError::BoardTooSmall { cols: 2, rows: 2 })
    );

    // Board that does not fit the pixel space
    let mut eng = engine();
    let options = GameOptions { cols: 50_000, ..GameOptions::default() };
    assert_eq!(
        eng.start(&mut host, options),
        Err(ConfigError::BoardOverflow { cols: 50_000, rows: 25, cell: 10 })
    );

    // No partial state was left behind by any rejection
    assert!(host.fills.is_empty());
    assert!(host.scheduled.is_empty());
}

#[test]
fn interval_follows_the_quadratic_falloff() {
    assert_eq!(tick_interval(10), Duration::from_millis(40));
    assert_eq!(tick_interval(8), Duration::from_millis(44));
    assert_eq!(tick_interval(1), Duration::from_millis(121));

    for speed in [10u8, 5, 1] {
        let mut eng = engine();
        let mut host = MockHost::new();
        let options = GameOptions { speed, ..GameOptions::default() };
        eng.start(&mut host, options).unwrap();
        assert_eq!(host.scheduled, vec![tick_interval(speed)]);
    }
}

#[test]
fn pause_gates_ticking() {
    let (mut eng, mut host) = started();
    let head = eng.head();

    eng.pause(&mut host, true);
    assert_eq!(eng.state(), State::Paused);
    assert_eq!(host.cancels, 1);

    // Ticks while paused do nothing
    eng.on_tick(&mut host);
    assert_eq!(eng.head(), head);

    // Direction input is still latched while paused
    eng.on_direction(Direction::Up);
    assert_eq!(eng.direction(), Some(Direction::Up));

    eng.pause(&mut host, false);
    assert_eq!(eng.state(), State::Running);
    assert_eq!(host.scheduled.len(), 2);

    // Redundant toggles do not reschedule
    eng.pause(&mut host, false);
    assert_eq!(host.scheduled.len(), 2);
}

#[test]
fn filling_the_board_wins() {
    let mut eng = engine();
    let mut host = MockHost::new();
    let options = GameOptions { cols: 4, rows: 2, ..GameOptions::default() };
    eng.start(&mut host, options).unwrap();

    // Seven of eight cells occupied, food on the last free one
    eng.debug_set_snake(
        &[
            pt(0, 10),
            pt(0, 0),
            pt(10, 0),
            pt(20, 0),
            pt(30, 0),
            pt(30, 10),
            pt(20, 10),
        ],
        Direction::Right,
    );
    eng.debug_set_food(pt(10, 10));

    eng.on_tick(&mut host);

    assert_eq!(eng.state(), State::GameOver);
    assert_eq!(host.game_over_signals, 1);
    assert_eq!(eng.length(), Some(8));

    let summary = eng.stop(&mut host).unwrap();
    assert_eq!(summary.reason, GameOverReason::BoardFull);
    assert_eq!(summary.to_string(), "You won! Score: 32");
}

#[test]
fn resize_rescales_live_coordinates() {
    let (mut eng, mut host) = started();
    let food = eng.food().unwrap();

    // 795 with the default sizing derives a cell size of 11
    host.display_width = 795;
    let new_size = eng.resize(&mut host, true).unwrap();

    assert_eq!(new_size, Some((440, 275)));
    assert_eq!(eng.cell_size(), Some(11));
    assert_eq!(eng.head(), Some(pt(231, 132)));
    assert_eq!(eng.food(), Some(pt(food.x / 10 * 11, food.y / 10 * 11)));

    // And back down again
    host.display_width = DISPLAY;
    eng.resize(&mut host, true).unwrap();
    assert_eq!(eng.head(), Some(pt(210, 120)));
}

#[test]
fn idle_resize_only_recomputes_layout() {
    let mut eng = engine();
    let mut host = MockHost::new();

    // Never configured: nothing to re-lay-out
    assert_eq!(eng.resize(&mut host, false), Ok(None));

    eng.start(&mut host, GameOptions::default()).unwrap();
    eng.stop(&mut host);

    host.display_width = 795;
    assert_eq!(eng.resize(&mut host, false), Ok(Some((440, 275))));
    assert_eq!(eng.cell_size(), Some(11));
}

#[test]
fn redraw_repaints_the_whole_scene() {
    let (mut eng, mut host) = started();
    eng.debug_set_food(pt(0, 0));
    eng.on_tick(&mut host);
    host.fills.clear();

    eng.redraw(&mut host);

    assert_eq!(host.fills_of(SNAKE).len(), 4);
    assert_eq!(host.fills_of(FOOD), vec![eng.food().unwrap()]);
    assert!(host.fills_of(BACKGROUND).is_empty());
}

#[test]
fn operations_are_noops_while_stopped() {
    let mut eng = engine();
    let mut host = MockHost::new();

    eng.on_tick(&mut host);
    eng.on_direction(Direction::Up);
    eng.pause(&mut host, true);
    eng.redraw(&mut host);
    assert_eq!(eng.stop(&mut host), None);

    assert!(host.fills.is_empty());
    assert_eq!(host.cancels, 0);
    assert_eq!(host.game_over_signals, 0);
    assert_eq!(eng.state(), State::Stopped);
}
