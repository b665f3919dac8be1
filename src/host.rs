use std::time::Duration;

use crate::snake::Point;
use crate::Px;

/// A color as the engine sees it; the shell maps it to whatever its surface
/// supports.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// The shell side of the engine: a display metric, a single drawing
/// primitive, tick scheduling, and the game-over signal. Erasing a cell is
/// filling it with the configured background color. All calls are
/// synchronous and run on the shell's event loop.
pub trait Host {
    fn display_width(&self) -> Px;

    fn fill_cell(&mut self, cell: Point, size: Px, color: Rgb);

    fn schedule_tick(&mut self, interval: Duration);

    fn cancel_tick(&mut self);

    /// Payload-free "terminate now": the shell is expected to call
    /// `Engine::stop` and present the outcome.
    fn notify_game_over(&mut self);
}
