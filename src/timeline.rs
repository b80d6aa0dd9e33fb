//! Builds the ordered, time-stamped event list that playback walks through.

use crate::sheet::{Note, Sheet};

/// What an event carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    Note(Note),
}

/// One scheduled occurrence: at this second (from playback start), do this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub at_second: f64,
    /// Musical position, kept for classification.
    pub beat: f64,
    pub kind: EventKind,
}

/// Immutable list of events in firing order.
#[derive(Debug, Clone)]
pub struct Timeline {
    tempo: f64,
    ticks_per_beat: i32,
    events: Vec<Event>,
}

impl Timeline {
    /// Sort the sheet's notes by tick (stable, in place) and turn each into an event.
    pub fn build(sheet: &mut Sheet) -> Self {
        sheet.sort_notes();
        let events = sheet
            .notes
            .iter()
            .map(|note| Event {
                at_second: sheet.second_of(note),
                beat: sheet.beat_of(note),
                kind: EventKind::Note(*note),
            })
            .collect();

        Self {
            tempo: sheet.tempo,
            ticks_per_beat: sheet.ticks_per_beat,
            events,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn ticks_per_beat(&self) -> i32 {
        self.ticks_per_beat
    }

    /// Second of the last event, or 0 for an empty timeline.
    pub fn duration(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.at_second)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
