//! Chart text parser.
//!
//! Format (one `key: value` pair per line, `#` comments, blank lines ignored):
//! ```text
//! Name: Warmup
//! Tempo: 120
//! TicksPerBeat: 48
//!
//! Notes: 0 0 0, 1 0 48, 2 0 96
//! ```
//! Nothing in a chart is fatal. Bad lines and bad note records are reported as
//! [`Warning`]s (also logged through `log::warn!`) and skipped.

use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::error::ChartError;
use crate::sheet::{Note, Sheet};

pub const KEY_VALUE_SEPARATOR: &str = ": ";
pub const NOTE_SEPARATOR: &str = ", ";

pub const NAME_KEY: &str = "Name";
pub const TEMPO_KEY: &str = "Tempo";
pub const TICKS_PER_BEAT_KEY: &str = "TicksPerBeat";
pub const NOTES_KEY: &str = "Notes";

/// A recoverable problem found while parsing, tagged with where it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub source: String,
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning ({}:{}): {}", self.source, self.line, self.message)
    }
}

/// Best-effort parse result.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub sheet: Sheet,
    pub warnings: Vec<Warning>,
}

/// Reasons a whole line gets skipped.
#[derive(Debug, Error)]
enum LineError {
    #[error("Separator \": \" not found.")]
    MissingSeparator,

    #[error("Unrecognized key: \"{0}\".")]
    UnknownKey(String),

    #[error("Invalid value for {key}: \"{token}\".")]
    InvalidValue { key: &'static str, token: String },
}

struct LineParser<'a> {
    source: &'a str,
    line: usize,
    sheet: Sheet,
    warnings: Vec<Warning>,
}

impl LineParser<'_> {
    fn warn(&mut self, message: String) {
        let warning = Warning {
            source: self.source.to_string(),
            line: self.line,
            message,
        };
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn process_line(&mut self, line: &str) -> Result<(), LineError> {
        let (key, value) = line
            .split_once(KEY_VALUE_SEPARATOR)
            .ok_or(LineError::MissingSeparator)?;

        match key {
            NAME_KEY => self.sheet.name = value.to_string(),
            TEMPO_KEY => {
                self.sheet.tempo = value.trim().parse().map_err(|_| LineError::InvalidValue {
                    key: TEMPO_KEY,
                    token: value.to_string(),
                })?;
            }
            TICKS_PER_BEAT_KEY => {
                self.sheet.ticks_per_beat =
                    value.trim().parse().map_err(|_| LineError::InvalidValue {
                        key: TICKS_PER_BEAT_KEY,
                        token: value.to_string(),
                    })?;
            }
            NOTES_KEY => {
                for record in value.split(NOTE_SEPARATOR) {
                    if let Some(note) = self.parse_note(record) {
                        self.sheet.push_note(note);
                    }
                }
            }
            other => return Err(LineError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Parse one `x y tick` record. Extra fields are ignored with a warning;
    /// missing fields or bad numbers drop the record.
    fn parse_note(&mut self, record: &str) -> Option<Note> {
        let fields: Vec<&str> = record.split_whitespace().collect();
        if fields.len() != 3 {
            self.warn(format!(
                "Note \"{}\" has {} fields, expected 3 (x y tick).",
                record,
                fields.len()
            ));
            if fields.len() < 3 {
                return None;
            }
        }

        let mut values = [0i32; 3];
        for (slot, token) in values.iter_mut().zip(&fields) {
            match token.parse() {
                Ok(v) => *slot = v,
                Err(_) => {
                    self.warn(format!(
                        "Invalid number \"{}\" in note \"{}\"; note skipped.",
                        token, record
                    ));
                    return None;
                }
            }
        }
        let [x, y, tick] = values;
        Some(Note::new(x, y, tick))
    }
}

/// Parse chart text. `source` names the input in warnings (usually the file name).
pub fn parse(input: &str, source: &str) -> Parsed {
    let mut parser = LineParser {
        source,
        line: 0,
        sheet: Sheet::default(),
        warnings: Vec::new(),
    };

    for (idx, line) in input.lines().enumerate() {
        parser.line = idx + 1;

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        if let Err(e) = parser.process_line(line) {
            parser.warn(e.to_string());
        }
    }

    Parsed {
        sheet: parser.sheet,
        warnings: parser.warnings,
    }
}

/// Read and parse a chart file. Only I/O failures are errors.
pub fn load(path: &Path) -> Result<Parsed, ChartError> {
    let input = fs::read_to_string(path).map_err(|source| ChartError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(parse(&input, &name))
}
