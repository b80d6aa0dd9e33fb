pub mod classify;
pub mod error;
pub mod grid;
pub mod parser;
pub mod player;
pub mod scheduler;
pub mod sheet;
pub mod sink;
pub mod synth;
pub mod timeline;
pub mod writer;

pub use classify::{NoteClassifier, classify};
pub use error::*;
pub use parser::{Parsed, Warning, load, parse};
pub use scheduler::{Clock, Playback, StopHandle, StopSignal, SystemClock, stop_channel};
pub use sheet::{Note, Sheet};
pub use sink::{Color, OutputSink, Palette};
pub use timeline::{Event, EventKind, Timeline};
pub use writer::{save, write};

/// Normalize chart text: parse it, then write it back out in canonical form.
/// Warnings from the parse are returned alongside.
pub fn format_chart(input: &str, source: &str) -> (String, Vec<Warning>) {
    let parsed = parse(input, source);
    (write(&parsed.sheet), parsed.warnings)
}
