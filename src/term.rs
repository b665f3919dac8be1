use crate::{Coords, TermInt};
use std::{io::{stdout, Stdout, Write}, time::Duration};

use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyEvent};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, style, terminal};

pub use crossterm::style::Color;

/// What one terminal cell currently shows. Kept in a local buffer mirroring
/// the screen so overlays can be dismissed by restoring the covered region.
#[derive(Copy, Clone, PartialEq)]
struct Cell {
    ch: char,
    bg: Color,
}

impl Cell {
    fn blank() -> Self {
        Cell { ch: ' ', bg: Color::Reset }
    }
}

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<Cell>,
    current_msg: Option<Message>,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new() -> Result<Self> {
        let (width, height) = terminal::size()?;
        let stdout = stdout();
        let screen = vec![Cell::blank(); width as usize * height as usize];
        Ok(TermManager { width, height, stdout, screen, current_msg: None })
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)?;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking)?;
        terminal::disable_raw_mode()?;
        execute!(self.stdout, LeaveAlternateScreen)?;
        Ok(())
    }

    pub fn size(&self) -> Coords {
        (self.width, self.height)
    }

    /// Adopt a new terminal size. The buffer starts over blank; the caller
    /// clears and repaints.
    pub fn resize(&mut self, width: TermInt, height: TermInt) {
        self.width = width;
        self.height = height;
        self.screen = vec![Cell::blank(); width as usize * height as usize];
        self.current_msg = None;
    }

    pub fn read_key_blocking(&self) -> Result<KeyEvent> {
        loop {
            if let Event::Key(ev) = read()? {
                return Ok(ev);
            }
        }
    }

    /// One event within the given budget, or `None` on timeout.
    pub fn poll_event(&self, timeout: Duration) -> Result<Option<Event>> {
        if poll(timeout)? {
            return Ok(Some(read()?));
        }
        Ok(None)
    }

    pub fn print_at(&mut self, pos: Coords, ch: char) {
        self.put(pos, Cell { ch, bg: Color::Reset });
    }

    pub fn print_text(&mut self, pos: Coords, text: &str) {
        for (i, ch) in text.chars().enumerate() {
            self.print_at((pos.0 + i as TermInt, pos.1), ch);
        }
    }

    /// Fill a size x size block of terminal cells with a background color.
    /// This is the engine's one drawing primitive.
    pub fn fill_block(&mut self, pos: Coords, size: TermInt, color: Color) {
        for dy in 0..size {
            for dx in 0..size {
                self.put((pos.0 + dx, pos.1 + dy), Cell { ch: ' ', bg: color });
            }
        }
    }

    /// A border just outside the given rectangle.
    pub fn draw_border(&mut self, top_left: Coords, size: Coords) {
        let (width, height) = size;
        let end_x = top_left.0 + width - 1;
        let end_y = top_left.1 + height - 1;

        for x in top_left.0..=end_x {
            let ch = if x == top_left.0 || x == end_x { '+' } else { '-' };
            self.print_at((x, top_left.1), ch);
            self.print_at((x, end_y), ch);
        }

        for y in top_left.1 + 1..end_y {
            self.print_at((top_left.0, y), '|');
            self.print_at((end_x, y), '|');
        }
    }

    pub fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.len()).max().unwrap_or(0) + 2) as TermInt;
        let center = (self.width / 2, self.height / 2);
        let top_left = (
            center.0.saturating_sub(msg_width / 2),
            center.1.saturating_sub(msg_height / 2),
        );

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.put_no_save((top_left.0 + x_diff, *y), Cell::blank());
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.char_indices() {
                self.put_no_save((top_left.0 + x_diff as TermInt, y), Cell { ch, bg: Color::Reset });
            }
        }

        self.current_msg = Some(Message { top_left, width: msg_width, height: msg_height });
        self.flush()
    }

    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let top_left = msg.top_left;

        // Restore the covered region from the screen buffer
        for y_diff in 0..msg.height {
            for x_diff in 0..msg.width {
                let (x, y) = (top_left.0 + x_diff, top_left.1 + y_diff);
                if x >= self.width || y >= self.height {
                    continue;
                }
                let cell = self.screen[self.width as usize * y as usize + x as usize];
                self.put_no_save((x, y), cell);
            }
        }

        self.flush()
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    pub fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        self.screen = vec![Cell::blank(); self.width as usize * self.height as usize];
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    ///////////////////////////////////////////////////////////////////////////

    fn put(&mut self, pos: Coords, cell: Cell) {
        // Off-screen writes can happen while a shrink event is still queued
        if pos.0 >= self.width || pos.1 >= self.height {
            return;
        }

        self.queue_cell(pos, cell);
        self.screen[self.width as usize * pos.1 as usize + pos.0 as usize] = cell;
    }

    fn put_no_save(&mut self, pos: Coords, cell: Cell) {
        // For overlays: do not overwrite the buffer we restore from
        if pos.0 >= self.width || pos.1 >= self.height {
            return;
        }

        self.queue_cell(pos, cell);
    }

    fn queue_cell(&mut self, pos: Coords, cell: Cell) {
        queue!(
            self.stdout,
            cursor::MoveTo(pos.0, pos.1),
            style::SetBackgroundColor(cell.bg),
            style::Print(cell.ch),
            style::ResetColor
        )
        .unwrap();
    }
}
