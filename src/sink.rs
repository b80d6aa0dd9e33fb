//! The output side of playback: something with a grid of coloured pads.

use std::fmt;
use std::io::Write;

use crate::error::SinkError;

/// Highest brightness level of either LED.
pub const MAX_LEVEL: u8 = 3;

/// Two-LED pad colour, red and green brightness each 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
}

impl Color {
    pub const BLACK: Color = Color { red: 0, green: 0 };
    pub const RED: Color = Color { red: 3, green: 0 };
    pub const GREEN: Color = Color { red: 0, green: 3 };
    pub const YELLOW: Color = Color { red: 3, green: 3 };
    pub const AMBER: Color = Color { red: 3, green: 1 };
    pub const FAINT_YELLOW: Color = Color { red: 1, green: 1 };

    /// Levels above [`MAX_LEVEL`] are clamped.
    pub fn new(red: u8, green: u8) -> Self {
        Self {
            red: red.min(MAX_LEVEL),
            green: green.min(MAX_LEVEL),
        }
    }

    pub fn is_off(&self) -> bool {
        self.red == 0 && self.green == 0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Color::BLACK => "black",
            Color::RED => "red",
            Color::GREEN => "green",
            Color::YELLOW => "yellow",
            Color::AMBER => "amber",
            Color::FAINT_YELLOW => "faint yellow",
            Color { red, green } => return write!(f, "r{}g{}", red, green),
        };
        f.write_str(name)
    }
}

/// Maps a classifier category to a pad colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Color>,
    unmatched: Color,
}

impl Palette {
    pub fn new(colors: Vec<Color>, unmatched: Color) -> Self {
        Self { colors, unmatched }
    }

    /// Colour for a category; unmatched and out-of-range categories share one colour.
    pub fn color_for(&self, category: Option<usize>) -> Color {
        category
            .and_then(|i| self.colors.get(i).copied())
            .unwrap_or(self.unmatched)
    }
}

impl Default for Palette {
    /// Every second beat yellow, beats red, half beats green, the rest faint yellow.
    fn default() -> Self {
        Self::new(
            vec![Color::YELLOW, Color::RED, Color::GREEN],
            Color::FAINT_YELLOW,
        )
    }
}

/// A pad device. Implementations own the device exclusively; `close` releases it.
pub trait OutputSink {
    fn set_pad(&mut self, x: i32, y: i32, color: Color) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError>;
}

/// Writes one line per pad change. Used by `--output print` and in tests.
pub struct PrintSink<W: Write> {
    out: W,
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputSink for PrintSink<W> {
    fn set_pad(&mut self, x: i32, y: i32, color: Color) -> Result<(), SinkError> {
        writeln!(self.out, "pad {} {} {}", x, y, color)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}
