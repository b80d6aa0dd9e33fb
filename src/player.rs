//! A playback session: classify each note as it comes due and light its pad.

use crate::classify::NoteClassifier;
use crate::error::SinkError;
use crate::scheduler::{self, Clock, Playback, StopSignal};
use crate::sheet::Sheet;
use crate::sink::{OutputSink, Palette};
use crate::timeline::{EventKind, Timeline};

/// Knobs for one session.
#[derive(Debug, Clone, Default)]
pub struct PlayerConfig {
    /// Replaces the chart's tempo when set.
    pub tempo: Option<f64>,
    pub classifier: NoteClassifier,
    pub palette: Palette,
}

/// Apply config overrides to `sheet` and build its timeline.
pub fn prepare(sheet: &mut Sheet, config: &PlayerConfig) -> Timeline {
    if let Some(tempo) = config.tempo {
        sheet.tempo = tempo;
    }
    if sheet.tempo.is_nan() || sheet.tempo <= 0.0 {
        log::warn!("tempo {} is not positive, note times will be meaningless", sheet.tempo);
    }
    if sheet.ticks_per_beat <= 0 {
        log::warn!("ticks per beat {} is not positive", sheet.ticks_per_beat);
    }
    Timeline::build(sheet)
}

/// Play `timeline` onto `sink`, then close the sink whatever happened.
///
/// A sink failure during playback wins over a failure to close.
pub fn play<S, C>(
    timeline: &Timeline,
    config: &PlayerConfig,
    sink: &mut S,
    clock: &C,
    stop: &StopSignal,
) -> Result<Playback, SinkError>
where
    S: OutputSink + ?Sized,
    C: Clock + ?Sized,
{
    log::info!(
        "playing {} notes over {:.2}s at {} BPM",
        timeline.len(),
        timeline.duration(),
        timeline.tempo()
    );

    let result = scheduler::run(timeline, clock, stop, |event| match event.kind {
        EventKind::Note(note) => {
            let category = config.classifier.classify_beat(event.beat);
            let color = config.palette.color_for(category);
            log::debug!(
                "{:.3}s: pad {},{} beat {} -> {:?} ({})",
                event.at_second,
                note.x,
                note.y,
                event.beat,
                category,
                color
            );
            sink.set_pad(note.x, note.y, color)
        }
    });

    let closed = sink.close();
    match result {
        Ok(playback) => {
            if let Playback::Cancelled { fired } = playback {
                log::info!("playback stopped after {} of {} notes", fired, timeline.len());
            } else {
                log::info!("playback finished");
            }
            closed.map(|()| playback)
        }
        Err(e) => {
            if let Err(close_err) = closed {
                log::error!("closing output after failure: {}", close_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::stop_channel;
    use crate::scheduler::tests::ManualClock;
    use crate::sheet::Note;
    use crate::sink::Color;

    #[derive(Default)]
    struct RecordingSink {
        pads: Vec<(i32, i32, Color)>,
        closed: usize,
        fail_after: Option<usize>,
    }

    impl OutputSink for RecordingSink {
        fn set_pad(&mut self, x: i32, y: i32, color: Color) -> Result<(), SinkError> {
            if self.fail_after == Some(self.pads.len()) {
                return Err(SinkError::Device("unplugged".into()));
            }
            self.pads.push((x, y, color));
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            self.closed += 1;
            Ok(())
        }
    }

    fn sheet() -> Sheet {
        let mut sheet = Sheet::new("t", 120.0);
        sheet.push_note(Note::new(3, 3, 36)); // 0.75 beat
        sheet.push_note(Note::new(0, 0, 96)); // 2 beats
        sheet.push_note(Note::new(1, 1, 48)); // 1 beat
        sheet.push_note(Note::new(2, 2, 24)); // 0.5 beat
        sheet
    }

    #[test]
    fn test_colours_by_category_in_time_order() {
        let mut sheet = sheet();
        let config = PlayerConfig::default();
        let timeline = prepare(&mut sheet, &config);
        let clock = ManualClock::new();
        let (_handle, stop) = stop_channel();
        let mut sink = RecordingSink::default();

        let playback = play(&timeline, &config, &mut sink, &clock, &stop).unwrap();

        assert_eq!(playback, Playback::Completed { fired: 4 });
        assert_eq!(
            sink.pads,
            vec![
                (2, 2, Color::GREEN),
                (3, 3, Color::FAINT_YELLOW),
                (1, 1, Color::RED),
                (0, 0, Color::YELLOW),
            ]
        );
        assert_eq!(sink.closed, 1);
        assert_eq!(clock.now(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_tempo_override() {
        let mut sheet = sheet();
        let config = PlayerConfig {
            tempo: Some(60.0),
            ..PlayerConfig::default()
        };
        let timeline = prepare(&mut sheet, &config);
        assert_eq!(timeline.duration(), 2.0);
        assert_eq!(sheet.tempo, 60.0);
    }

    #[test]
    fn test_sink_error_still_closes() {
        let mut sheet = sheet();
        let config = PlayerConfig::default();
        let timeline = prepare(&mut sheet, &config);
        let clock = ManualClock::new();
        let (_handle, stop) = stop_channel();
        let mut sink = RecordingSink {
            fail_after: Some(1),
            ..RecordingSink::default()
        };

        let err = play(&timeline, &config, &mut sink, &clock, &stop).unwrap_err();
        assert!(matches!(err, SinkError::Device(_)));
        assert_eq!(sink.pads.len(), 1);
        assert_eq!(sink.closed, 1);
    }

    #[test]
    fn test_cancel_closes_sink() {
        let mut sheet = sheet();
        let config = PlayerConfig::default();
        let timeline = prepare(&mut sheet, &config);
        let mut clock = ManualClock::new();
        clock.stop_at = Some(std::time::Duration::from_millis(300));
        let (_handle, stop) = stop_channel();
        let mut sink = RecordingSink::default();

        let playback = play(&timeline, &config, &mut sink, &clock, &stop).unwrap();
        assert_eq!(playback, Playback::Cancelled { fired: 1 });
        assert_eq!(sink.pads, vec![(2, 2, Color::GREEN)]);
        assert_eq!(sink.closed, 1);
    }
}
