use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::{self, CellSizing, Geometry};
use crate::host::{Host, Rgb};
use crate::snake::{Body, Direction, Point, STARTING_LENGTH};
use crate::{ConfigError, Px};

pub const MAX_SPEED: u8 = 10;
pub const DEFAULT_SPEED: u8 = 8;

/// Everything a game is started with. The defaults are the reference
/// configuration: a 40x25 board, green snake, yellow food, black background,
/// speed 8.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameOptions {
    pub cols: u16,
    pub rows: u16,
    pub snake_color: Rgb,
    pub food_color: Rgb,
    pub background: Rgb,
    pub speed: u8,
}

impl Default for GameOptions {
    fn default() -> Self {
        GameOptions {
            cols: 40,
            rows: 25,
            snake_color: Rgb(0, 0xFF, 0),
            food_color: Rgb(0xFF, 0xFF, 0),
            background: Rgb(0, 0, 0),
            speed: DEFAULT_SPEED,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    Stopped,
    Running,
    Paused,
    GameOver,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GameOverReason {
    SelfCollision,
    /// The snake occupies every cell and there is nowhere left to put food.
    BoardFull,
}

/// Returned by `stop` when the game ended in a terminal state.
#[derive(Debug, PartialEq, Eq)]
pub struct GameSummary {
    pub score: u32,
    pub reason: GameOverReason,
}

impl fmt::Display for GameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            GameOverReason::SelfCollision => write!(f, "You lost! Score: {}", self.score),
            GameOverReason::BoardFull => write!(f, "You won! Score: {}", self.score),
        }
    }
}

/// Per-tick interval, quadratic falloff: speed 10 ticks every 40ms, speed 1
/// every 121ms.
pub fn tick_interval(speed: u8) -> Duration {
    let d = (MAX_SPEED - speed) as u64;
    Duration::from_millis(40 + d * d)
}

struct LiveGame {
    options: GameOptions,
    body: Body,
    food: Point,
    direction: Direction,
    movable: bool,
    paused: bool,
    interval: Duration,
    over: Option<GameOverReason>,
}

/// The game-state engine. Owns the body, the food, the direction state
/// machine and the RNG; talks to the outside world only through a `Host`.
/// Single-threaded and host-driven: every operation runs to completion on
/// the shell's event loop, and misuse (a tick while stopped, a pause while
/// idle) is a defensive no-op rather than a panic.
pub struct Engine {
    sizing: CellSizing,
    rng: StdRng,
    // Survives `stop` so an idle window can still be re-laid-out
    geometry: Option<Geometry>,
    game: Option<LiveGame>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_sizing(CellSizing::default())
    }

    pub fn with_sizing(sizing: CellSizing) -> Self {
        Engine { sizing, rng: StdRng::from_entropy(), geometry: None, game: None }
    }

    /// Deterministic food placement, for tests.
    pub fn seeded(sizing: CellSizing, seed: u64) -> Self {
        Engine { sizing, rng: StdRng::seed_from_u64(seed), geometry: None, game: None }
    }

    /// Begin a game: derive the cell size from the host's display width,
    /// allocate and render the starting body, place the first food and start
    /// ticking. Rejects bad configuration without touching any state; a
    /// running game must be stopped first.
    pub fn start(&mut self, host: &mut impl Host, options: GameOptions) -> Result<(), ConfigError> {
        if self.game.is_some() {
            return Err(ConfigError::AlreadyStarted);
        }
        if options.speed < 1 || options.speed > MAX_SPEED {
            return Err(ConfigError::SpeedOutOfRange(options.speed));
        }

        let cell = self.sizing.cell_size(host.display_width())?;
        let geometry = Geometry::new(options.cols, options.rows, cell)?;

        // The starting body plus at least one free cell for food
        if geometry.cell_count() <= STARTING_LENGTH {
            return Err(ConfigError::BoardTooSmall { cols: options.cols, rows: options.rows });
        }

        let body = Body::start(geometry.origin(), cell);
        for seg in body.segments() {
            host.fill_cell(seg, cell, options.snake_color);
        }

        // Cannot fail: the board has a free cell
        let food = sample_food(&mut self.rng, &geometry, &body).unwrap();
        host.fill_cell(food, cell, options.food_color);

        let interval = tick_interval(options.speed);
        self.geometry = Some(geometry);
        self.game = Some(LiveGame {
            options,
            body,
            food,
            direction: Direction::Right,
            movable: true,
            paused: false,
            interval,
            over: None,
        });

        host.schedule_tick(interval);
        Ok(())
    }

    /// Suspend or resume ticking without touching game state. No-op unless
    /// the game is live.
    pub fn pause(&mut self, host: &mut impl Host, pause: bool) {
        let game = match &mut self.game {
            Some(g) if g.over.is_none() => g,
            _ => return,
        };

        if pause && !game.paused {
            game.paused = true;
            host.cancel_tick();
        } else if !pause && game.paused {
            game.paused = false;
            host.schedule_tick(game.interval);
        }
    }

    /// Tear the game down. If it ended in a terminal state, the summary
    /// carries the outcome: `score = speed * (final length - starting
    /// length)`.
    pub fn stop(&mut self, host: &mut impl Host) -> Option<GameSummary> {
        let game = self.game.take()?;
        host.cancel_tick();

        game.over.map(|reason| GameSummary {
            score: game.options.speed as u32 * (game.body.len() - STARTING_LENGTH) as u32,
            reason,
        })
    }

    /// Recompute the cell size from the host's current display metric. With
    /// `active` set, every segment and the food are moved to the new size
    /// using the legacy truncating arithmetic. Returns the new window size,
    /// or `None` if no board has ever been laid out.
    pub fn resize(
        &mut self,
        host: &mut impl Host,
        active: bool,
    ) -> Result<Option<(Px, Px)>, ConfigError> {
        let geometry = match &self.geometry {
            Some(g) => *g,
            None => return Ok(None),
        };

        let old = geometry.cell();
        let cell = self.sizing.cell_size(host.display_width())?;
        let rebuilt = Geometry::new(geometry.cols(), geometry.rows(), cell)?;

        if active {
            if let Some(game) = &mut self.game {
                game.body.rescale(old, cell);
                game.food = Point {
                    x: geometry::rescale(old, cell, game.food.x),
                    y: geometry::rescale(old, cell, game.food.y),
                };
            }
        }

        self.geometry = Some(rebuilt);
        Ok(Some(rebuilt.window_size()))
    }

    /// One simulation step. Runs only while the game is live and not paused.
    pub fn on_tick(&mut self, host: &mut impl Host) {
        let Engine { rng, geometry, game, .. } = self;
        let (geometry, game) = match (geometry.as_ref(), game.as_mut()) {
            (Some(geo), Some(g)) if g.over.is_none() && !g.paused => (geo, g),
            _ => return,
        };

        let cell = geometry.cell();
        let next = game.direction.step(game.body.head(), cell, geometry.window_size());

        // The tail is exempt: it vacates its cell this very tick
        if next != game.body.tail() && game.body.contains(next) {
            game.over = Some(GameOverReason::SelfCollision);
            host.notify_game_over();
            return;
        }

        if next == game.food {
            game.body.grow(next);
            host.fill_cell(next, cell, game.options.snake_color);

            match sample_food(rng, geometry, &game.body) {
                Some(food) => {
                    game.food = food;
                    host.fill_cell(food, cell, game.options.food_color);
                }
                None => {
                    game.over = Some(GameOverReason::BoardFull);
                    host.notify_game_over();
                    return;
                }
            }
        } else {
            let vacated = game.body.slide(next);
            host.fill_cell(vacated, cell, game.options.background);
            host.fill_cell(next, cell, game.options.snake_color);
        }

        // Re-arm the direction latch only once the step is complete
        game.movable = true;
    }

    /// A direction request. Accepted only while the game is live, at most
    /// once per tick, and only perpendicular to the active direction;
    /// anything else is silently dropped.
    pub fn on_direction(&mut self, requested: Direction) {
        let game = match &mut self.game {
            Some(g) if g.over.is_none() => g,
            _ => return,
        };

        if !game.movable || !requested.is_perpendicular(game.direction) {
            return;
        }

        game.direction = requested;
        game.movable = false;
    }

    /// Repaint every segment and the food, for when the host surface has
    /// been invalidated. No-op while stopped.
    pub fn redraw(&self, host: &mut impl Host) {
        if let (Some(geometry), Some(game)) = (&self.geometry, &self.game) {
            let cell = geometry.cell();
            for seg in game.body.segments() {
                host.fill_cell(seg, cell, game.options.snake_color);
            }
            host.fill_cell(game.food, cell, game.options.food_color);
        }
    }

    pub fn state(&self) -> State {
        match &self.game {
            None => State::Stopped,
            Some(g) if g.over.is_some() => State::GameOver,
            Some(g) if g.paused => State::Paused,
            Some(_) => State::Running,
        }
    }

    pub fn is_started(&self) -> bool {
        self.game.is_some()
    }

    pub fn length(&self) -> Option<usize> {
        self.game.as_ref().map(|g| g.body.len())
    }

    pub fn head(&self) -> Option<Point> {
        self.game.as_ref().map(|g| g.body.head())
    }

    pub fn food(&self) -> Option<Point> {
        self.game.as_ref().map(|g| g.food)
    }

    pub fn direction(&self) -> Option<Direction> {
        self.game.as_ref().map(|g| g.direction)
    }

    pub fn speed(&self) -> Option<u8> {
        self.game.as_ref().map(|g| g.options.speed)
    }

    pub fn score(&self) -> Option<u32> {
        self.game
            .as_ref()
            .map(|g| g.options.speed as u32 * (g.body.len() - STARTING_LENGTH) as u32)
    }

    pub fn cell_size(&self) -> Option<Px> {
        self.geometry.as_ref().map(Geometry::cell)
    }

    pub fn window_size(&self) -> Option<(Px, Px)> {
        self.geometry.as_ref().map(Geometry::window_size)
    }

    /// Test hook: force the food position without re-rendering.
    pub fn debug_set_food(&mut self, food: Point) {
        if let Some(game) = &mut self.game {
            game.food = food;
        }
    }

    /// Test hook: replace the body (head first) and the active direction,
    /// keeping the occupancy set consistent.
    pub fn debug_set_snake(&mut self, segments_head_first: &[Point], direction: Direction) {
        if let Some(game) = &mut self.game {
            game.body.replace(segments_head_first);
            game.direction = direction;
            game.movable = true;
        }
    }
}

/// Uniform sample over free cells by rejection, or `None` on a full board
/// (checked up front so the loop always terminates).
fn sample_food(rng: &mut StdRng, geometry: &Geometry, body: &Body) -> Option<Point> {
    if body.len() >= geometry.cell_count() {
        return None;
    }

    let cell = geometry.cell();
    loop {
        let candidate = Point {
            x: rng.gen_range(0..geometry.cols()) * cell,
            y: rng.gen_range(0..geometry.rows()) * cell,
        };
        if !body.contains(candidate) {
            return Some(candidate);
        }
    }
}
