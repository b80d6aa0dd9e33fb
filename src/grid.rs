//! Terminal stand-in for the pad controller: an 8x8 grid drawn with crossterm.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{self, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::error::SinkError;
use crate::sink::{Color, MAX_LEVEL, OutputSink};

pub const GRID_SIZE: i32 = 8;

/// Screen columns per pad, including the gap.
const PAD_WIDTH: u16 = 4;
/// Rows used by the header above the grid.
const HEADER_ROWS: u16 = 2;

/// A grid of pads in the alternate screen, in raw mode while open.
pub struct TerminalGrid {
    out: io::Stdout,
    open: bool,
}

impl TerminalGrid {
    /// Take over the terminal and draw an empty grid.
    pub fn open(title: &str) -> Result<Self, SinkError> {
        terminal::enable_raw_mode()?;
        // From here on, dropping the grid restores the terminal.
        let mut grid = Self {
            out: io::stdout(),
            open: true,
        };
        execute!(grid.out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        grid.draw_frame(title)?;
        Ok(grid)
    }

    fn draw_frame(&mut self, title: &str) -> Result<(), SinkError> {
        queue!(
            self.out,
            MoveTo(0, 0),
            Print(format!("{}  (Esc/q to stop)", title))
        )?;
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                self.queue_pad(x, y, Color::BLACK)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn queue_pad(&mut self, x: i32, y: i32, color: Color) -> Result<(), SinkError> {
        let col = x as u16 * PAD_WIDTH;
        let row = HEADER_ROWS + y as u16;
        let fill = if color.is_off() { "[] " } else { "   " };
        queue!(
            self.out,
            MoveTo(col, row),
            SetBackgroundColor(term_color(color)),
            Print(fill),
            ResetColor
        )?;
        Ok(())
    }
}

fn term_color(color: Color) -> style::Color {
    if color.is_off() {
        return style::Color::Reset;
    }
    let scale = |level: u8| (level as u16 * 255 / MAX_LEVEL as u16) as u8;
    style::Color::Rgb {
        r: scale(color.red),
        g: scale(color.green),
        b: 0,
    }
}

impl OutputSink for TerminalGrid {
    fn set_pad(&mut self, x: i32, y: i32, color: Color) -> Result<(), SinkError> {
        if !self.open {
            return Err(SinkError::Disconnected);
        }
        if !(0..GRID_SIZE).contains(&x) || !(0..GRID_SIZE).contains(&y) {
            log::debug!("pad {},{} is off the grid, ignored", x, y);
            return Ok(());
        }
        self.queue_pad(x, y, color)?;
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        execute!(self.out, Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

impl Drop for TerminalGrid {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Poll the keyboard once for up to `timeout`; true on Esc, `q` or Ctrl-C.
/// Only meaningful while the terminal is in raw mode.
pub fn poll_stop_key(timeout: Duration) -> Result<bool, SinkError> {
    if !event::poll(timeout)? {
        return Ok(false);
    }
    let stop = matches!(
        event::read()?,
        Event::Key(KeyEvent {
            code: KeyCode::Esc | KeyCode::Char('q'),
            kind: KeyEventKind::Press,
            ..
        }) | Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            ..
        })
    );
    Ok(stop)
}
