use std::cmp::{max, min};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::Color;

use torus_snake::{CellSizing, Direction, Engine, GameOptions, Host, Point, Px, State};

use crate::term::TermManager;
use crate::{Coords, TermInt};

// The engine divides the reported display width by this, so reporting
// max_cell * DISPLAY_DIVISOR makes it derive exactly max_cell.
const DISPLAY_DIVISOR: Px = 45;

const IDLE_POLL: Duration = Duration::from_millis(100);

const PAUSED_LINES: &[&str] = &["Paused", "", "Esc or any arrow resumes"];

pub struct App {
    shell: Shell,
    engine: Engine,
    options: GameOptions,
}

/// The engine's view of the terminal: the play-area origin, the clamped
/// display metric, the armed tick interval and the pending game-over flag.
struct Shell {
    term: TermManager,
    origin: Coords,
    display_width: Px,
    armed: Option<Duration>,
    game_over: bool,
}

impl App {
    pub fn new() -> Result<Self> {
        let term = TermManager::new()?;
        let engine = Engine::with_sizing(CellSizing { margin: 0, divisor: DISPLAY_DIVISOR });
        let options = GameOptions::default();

        let mut shell = Shell {
            term,
            origin: (1, 1),
            display_width: 0,
            armed: None,
            game_over: false,
        };
        shell.layout(options.cols, options.rows);

        Ok(App { shell, engine, options })
    }

    pub fn run(&mut self) -> Result<()> {
        self.shell.term.setup()?;
        let res = self.main_loop();

        // Leave the terminal usable even when bailing out on an error
        self.shell.term.restore()?;
        res
    }

    fn main_loop(&mut self) -> Result<()> {
        loop {
            if !self.menu()? || !self.play()? {
                return Ok(());
            }
        }
    }

    /// The start screen: digits pick a speed, Enter starts, q quits.
    /// Returns false when the user wants out.
    fn menu(&mut self) -> Result<bool> {
        self.shell.term.clear()?;

        loop {
            let speed_line = format!("Speed: {}   (1-9, or 0 for max)", self.options.speed);
            self.shell.term.show_message(&[
                "S N A K E",
                "",
                &speed_line,
                "",
                "Arrow keys or WASD to steer",
                "Esc pauses, q ends the game",
                "",
                "Enter to start, q to quit",
            ])?;

            let key = self.shell.term.read_key_blocking()?;
            if is_ctrl_c(&key) {
                return Ok(false);
            }

            match key.code {
                KeyCode::Enter => {
                    self.shell.term.hide_message()?;
                    return Ok(true);
                }
                KeyCode::Char('q') => return Ok(false),
                KeyCode::Char(c) if ('0'..='9').contains(&c) => {
                    self.options.speed = if c == '0' { 10 } else { c as u8 - b'0' };
                }
                _ => {}
            }
        }
    }

    /// One full game, from start to the outcome overlay. Returns false when
    /// the user wants out.
    fn play(&mut self) -> Result<bool> {
        self.shell.term.clear()?;
        self.shell.layout(self.options.cols, self.options.rows);
        self.shell.game_over = false;

        if let Err(err) = self.engine.start(&mut self.shell, self.options) {
            let reason = err.to_string();
            self.shell.term.show_message(&["Unable to start the game:", &reason, "", "Press any key"])?;
            let key = self.shell.term.read_key_blocking()?;
            self.shell.term.hide_message()?;
            return Ok(!is_ctrl_c(&key));
        }

        self.shell.draw_chrome(&self.engine)?;
        self.shell.term.flush()?;

        let mut deadline = next_deadline(&self.shell);

        loop {
            let timeout = match self.shell.armed {
                Some(_) => deadline.saturating_duration_since(Instant::now()),
                None => IDLE_POLL,
            };

            match self.shell.term.poll_event(timeout)? {
                Some(Event::Key(key)) => {
                    if is_ctrl_c(&key) {
                        self.engine.stop(&mut self.shell);
                        return Ok(false);
                    }

                    match key.code {
                        KeyCode::Char('q') => {
                            self.engine.stop(&mut self.shell);
                            return Ok(true);
                        }
                        KeyCode::Esc => {
                            if self.engine.state() == State::Paused {
                                self.resume()?;
                                deadline = next_deadline(&self.shell);
                            } else {
                                self.engine.pause(&mut self.shell, true);
                                self.shell.term.show_message(PAUSED_LINES)?;
                            }
                        }
                        other => {
                            if let Some(dir) = direction_key(other) {
                                // An arrow resumes a paused game first
                                if self.engine.state() == State::Paused {
                                    self.resume()?;
                                    deadline = next_deadline(&self.shell);
                                }
                                self.engine.on_direction(dir);
                            }
                        }
                    }
                }
                Some(Event::Resize(width, height)) => {
                    self.handle_resize(width, height)?;
                    deadline = next_deadline(&self.shell);
                }
                _ => {}
            }

            if let Some(interval) = self.shell.armed {
                if Instant::now() >= deadline {
                    self.engine.on_tick(&mut self.shell);
                    deadline += interval;
                    self.shell.draw_status(&self.engine);
                    self.shell.term.flush()?;
                }
            }

            if self.shell.game_over {
                self.shell.game_over = false;
                return self.finish();
            }
        }
    }

    /// Tear the game down and show the outcome.
    fn finish(&mut self) -> Result<bool> {
        let outcome = match self.engine.stop(&mut self.shell) {
            Some(summary) => summary.to_string(),
            None => String::new(),
        };

        self.shell.term.show_message(&[&outcome, "", "Press any key for the menu"])?;
        let key = self.shell.term.read_key_blocking()?;
        self.shell.term.hide_message()?;
        Ok(!is_ctrl_c(&key))
    }

    fn resume(&mut self) -> Result<()> {
        self.shell.term.hide_message()?;
        self.engine.pause(&mut self.shell, false);
        self.engine.redraw(&mut self.shell);
        self.shell.term.flush()
    }

    fn handle_resize(&mut self, width: TermInt, height: TermInt) -> Result<()> {
        let was_paused = self.engine.state() == State::Paused;
        let active = self.engine.is_started();

        self.shell.term.resize(width, height);
        self.shell.layout(self.options.cols, self.options.rows);
        self.shell.term.clear()?;

        match self.engine.resize(&mut self.shell, active) {
            Ok(_) => {
                self.shell.draw_chrome(&self.engine)?;
                self.engine.redraw(&mut self.shell);
                if was_paused {
                    self.shell.term.show_message(PAUSED_LINES)?;
                }
            }
            Err(_) => {
                // The board no longer fits; keep the old geometry, hold the
                // game and wait for a better size or a resume
                self.engine.pause(&mut self.shell, true);
                self.shell.term.show_message(&["Terminal too small", "", "Esc or any arrow resumes"])?;
            }
        }

        self.shell.term.flush()
    }
}

impl Shell {
    /// Fit the board into the terminal: cell size is the largest that fits
    /// both axes (minus border and status rows), and the reported display
    /// width makes the engine derive exactly that size.
    fn layout(&mut self, cols: u16, rows: u16) {
        let (term_w, term_h) = self.term.size();
        let inner_w = term_w.saturating_sub(2);
        let inner_h = term_h.saturating_sub(3);

        let cell = min(
            inner_w.checked_div(cols).unwrap_or(0),
            inner_h.checked_div(rows).unwrap_or(0),
        );
        self.display_width = cell.saturating_mul(DISPLAY_DIVISOR);

        let board_w = cols.saturating_mul(cell);
        let board_h = rows.saturating_mul(cell);
        self.origin = (
            max(1, term_w.saturating_sub(board_w) / 2),
            max(1, term_h.saturating_sub(board_h + 1) / 2),
        );
    }

    fn draw_chrome(&mut self, engine: &Engine) -> Result<()> {
        let (board_w, board_h) = match engine.window_size() {
            Some(size) => size,
            None => return Ok(()),
        };

        self.term.draw_border((self.origin.0 - 1, self.origin.1 - 1), (board_w + 2, board_h + 2));
        self.draw_status(engine);
        self.term.flush()
    }

    fn draw_status(&mut self, engine: &Engine) {
        let (speed, length) = match (engine.speed(), engine.length()) {
            (Some(speed), Some(length)) => (speed, length),
            _ => return,
        };
        let board_h = engine.window_size().map(|(_, h)| h).unwrap_or(0);

        let row = self.origin.1 + board_h + 1;
        let text = format!(" speed {}   length {}   Esc pause   q quit ", speed, length);
        self.term.print_text((self.origin.0.saturating_sub(1), row), &text);
    }
}

impl Host for Shell {
    fn display_width(&self) -> Px {
        self.display_width
    }

    fn fill_cell(&mut self, cell: Point, size: Px, color: torus_snake::Rgb) {
        let pos = (self.origin.0 + cell.x, self.origin.1 + cell.y);
        self.term.fill_block(pos, size, term_color(color));
    }

    fn schedule_tick(&mut self, interval: Duration) {
        self.armed = Some(interval);
    }

    fn cancel_tick(&mut self) {
        self.armed = None;
    }

    fn notify_game_over(&mut self) {
        self.game_over = true;
    }
}

fn next_deadline(shell: &Shell) -> Instant {
    Instant::now() + shell.armed.unwrap_or(IDLE_POLL)
}

fn term_color(color: torus_snake::Rgb) -> Color {
    Color::Rgb { r: color.0, g: color.1, b: color.2 }
}

fn direction_key(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Char('w') | KeyCode::Up => Some(Direction::Up),
        KeyCode::Char('a') | KeyCode::Left => Some(Direction::Left),
        KeyCode::Char('s') | KeyCode::Down => Some(Direction::Down),
        KeyCode::Char('d') | KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
