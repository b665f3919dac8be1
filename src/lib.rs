pub mod engine;
pub mod geometry;
pub mod host;
pub mod snake;

use thiserror::Error;

/// Board coordinates and window sizes are measured in pixels.
pub type Px = u16;

/// Everything that can make a game refuse to start (or a resize refuse to
/// apply). Illegal direction changes and self-collisions are game-play
/// outcomes, not errors, and never show up here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cell size comes out to zero for display width {display_width}")]
    ZeroCellSize { display_width: Px },
    #[error("{cols}x{rows} board is too small for the snake")]
    BoardTooSmall { cols: u16, rows: u16 },
    #[error("{cols}x{rows} board at cell size {cell} overflows the pixel space")]
    BoardOverflow { cols: u16, rows: u16, cell: Px },
    #[error("speed {0} is outside the 1..=10 range")]
    SpeedOutOfRange(u8),
    #[error("a game is already running")]
    AlreadyStarted,
}

pub use engine::{Engine, GameOptions, GameOverReason, GameSummary, State};
pub use geometry::CellSizing;
pub use host::{Host, Rgb};
pub use snake::{Direction, Point};
