//! Chart model: a sheet of notes placed on the pad grid at musical ticks.

/// Ticks per beat when a chart does not say otherwise.
pub const DEFAULT_TICKS_PER_BEAT: i32 = 48;
/// Tempo (BPM) of a freshly created sheet.
pub const DEFAULT_TEMPO: f64 = 120.0;
/// Placeholder name of a freshly created sheet.
pub const DEFAULT_NAME: &str = "Unnamed";

/// A single pad hit: grid position plus the tick it lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub x: i32,
    pub y: i32,
    pub tick: i32,
}

impl Note {
    pub fn new(x: i32, y: i32, tick: i32) -> Self {
        Self { x, y, tick }
    }

    /// Position in beats (`tick / ticks_per_beat`).
    pub fn beat(&self, ticks_per_beat: i32) -> f64 {
        self.tick as f64 / ticks_per_beat as f64
    }

    /// Offset from the start of the sheet in seconds, tempo in BPM.
    pub fn second(&self, ticks_per_beat: i32, tempo: f64) -> f64 {
        self.beat(ticks_per_beat) * 60.0 / tempo
    }
}

/// A parsed chart: metadata plus notes in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub tempo: f64,
    pub ticks_per_beat: i32,
    pub notes: Vec<Note>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, tempo: f64) -> Self {
        Self {
            name: name.into(),
            tempo,
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            notes: Vec::new(),
        }
    }

    pub fn push_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Stable sort by tick; notes sharing a tick keep their relative order.
    pub fn sort_notes(&mut self) {
        self.notes.sort_by_key(|n| n.tick);
    }

    pub fn beat_of(&self, note: &Note) -> f64 {
        note.beat(self.ticks_per_beat)
    }

    pub fn second_of(&self, note: &Note) -> f64 {
        note.second(self.ticks_per_beat, self.tempo)
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new(DEFAULT_NAME, DEFAULT_TEMPO)
    }
}
