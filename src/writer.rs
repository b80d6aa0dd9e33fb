//! Chart text writer, the inverse of [`crate::parser::parse`].

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::ChartError;
use crate::parser::{
    KEY_VALUE_SEPARATOR, NAME_KEY, NOTE_SEPARATOR, NOTES_KEY, TEMPO_KEY, TICKS_PER_BEAT_KEY,
};
use crate::sheet::Sheet;

fn write_key_value(out: &mut String, key: &str, value: impl std::fmt::Display) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}{}{}", key, KEY_VALUE_SEPARATOR, value);
}

/// Serialize a sheet. Notes are written in the sheet's current order; the
/// `Notes:` line is left out entirely when there are none.
pub fn write(sheet: &Sheet) -> String {
    let mut out = String::new();
    write_key_value(&mut out, NAME_KEY, &sheet.name);
    write_key_value(&mut out, TEMPO_KEY, sheet.tempo);
    write_key_value(&mut out, TICKS_PER_BEAT_KEY, sheet.ticks_per_beat);

    if !sheet.notes.is_empty() {
        let records: Vec<String> = sheet
            .notes
            .iter()
            .map(|n| format!("{} {} {}", n.x, n.y, n.tick))
            .collect();
        out.push('\n');
        write_key_value(&mut out, NOTES_KEY, records.join(NOTE_SEPARATOR));
    }

    out
}

/// Write a sheet to `path`, replacing any existing file.
pub fn save(sheet: &Sheet, path: &Path) -> Result<(), ChartError> {
    fs::write(path, write(sheet)).map_err(|source| ChartError::Write {
        path: path.to_path_buf(),
        source,
    })
}
