//! Realtime playback of a [`Timeline`].
//!
//! One thread walks the events in order. Before each event it recomputes how
//! long to wait from a single origin captured at the start of the run, so a late
//! wakeup delays that event only and never shifts the ones after it. The wait is
//! a `recv_timeout` on the stop channel, which lets [`StopHandle::stop`] wake a
//! blocked wait immediately.

use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::timeline::{Event, Timeline};

/// Source of monotonic time plus an interruptible sleep.
pub trait Clock {
    /// Time since an arbitrary fixed origin. Never goes backwards.
    fn now(&self) -> Duration;

    /// Block for `duration` or until `stop` fires. Returns true if stopped.
    fn sleep(&self, duration: Duration, stop: &StopSignal) -> bool;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration, stop: &StopSignal) -> bool {
        stop.wait(duration)
    }
}

/// Sending half of the stop channel. Cheap to clone and hand to other threads.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    /// Ask the scheduler to stop. Safe to call more than once, or after it finished.
    pub fn stop(&self) {
        let _ = self.tx.send(());
    }
}

/// Receiving half of the stop channel, owned by the playback thread.
#[derive(Debug)]
pub struct StopSignal {
    rx: Receiver<()>,
    stopped: Cell<bool>,
}

/// Create a connected stop handle / signal pair.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = mpsc::channel();
    (
        StopHandle { tx },
        StopSignal {
            rx,
            stopped: Cell::new(false),
        },
    )
}

impl StopSignal {
    /// Non-blocking check. Once a stop has been seen it stays seen.
    pub fn is_stopped(&self) -> bool {
        while let Ok(()) = self.rx.try_recv() {
            self.stopped.set(true);
        }
        self.stopped.get()
    }

    /// Wait up to `duration`; returns true as soon as a stop arrives.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.stopped.get() {
            return true;
        }
        let deadline = Instant::now().checked_add(duration);
        match self.rx.recv_timeout(duration) {
            Ok(()) => {
                self.stopped.set(true);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                // Every handle is gone, nobody can stop us any more.
                let left =
                    deadline.map_or(duration, |d| d.saturating_duration_since(Instant::now()));
                thread::sleep(left);
                false
            }
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Every event fired.
    Completed { fired: usize },
    /// Stopped early; `fired` events had already run.
    Cancelled { fired: usize },
}

impl Playback {
    pub fn fired(&self) -> usize {
        match *self {
            Playback::Completed { fired } | Playback::Cancelled { fired } => fired,
        }
    }
}

/// Play `timeline` against `clock`, calling `on_event` for each event once it is due.
///
/// Events whose time has already passed fire immediately. An error from
/// `on_event` ends the run and is returned as is; nothing is retried.
pub fn run<C, F, E>(
    timeline: &Timeline,
    clock: &C,
    stop: &StopSignal,
    mut on_event: F,
) -> Result<Playback, E>
where
    C: Clock + ?Sized,
    F: FnMut(&Event) -> Result<(), E>,
{
    let t0 = clock.now();
    let mut fired = 0;

    for event in timeline {
        if stop.is_stopped() {
            return Ok(Playback::Cancelled { fired });
        }

        let elapsed = clock.now().saturating_sub(t0).as_secs_f64();
        let remaining = event.at_second - elapsed;
        if remaining > 0.0 {
            // Infinite waits (zero tempo) block until stopped.
            let wait = Duration::try_from_secs_f64(remaining).unwrap_or(Duration::MAX);
            if clock.sleep(wait, stop) {
                return Ok(Playback::Cancelled { fired });
            }
        } else if remaining < 0.0 {
            log::trace!("event at {:.3}s fired {:.3}s late", event.at_second, -remaining);
        }

        on_event(event)?;
        fired += 1;
    }

    Ok(Playback::Completed { fired })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sheet::{Note, Sheet};
    use crate::timeline::EventKind;
    use std::cell::RefCell;

    /// Virtual clock: sleeping just moves time forward. Optionally stops once
    /// virtual time reaches `stop_at`.
    pub(crate) struct ManualClock {
        pub now: Cell<Duration>,
        pub sleeps: RefCell<Vec<Duration>>,
        pub stop_at: Option<Duration>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Cell::new(Duration::ZERO),
                sleeps: RefCell::new(Vec::new()),
                stop_at: None,
            }
        }

        pub fn advance(&self, d: Duration) {
            self.now.set(self.now.get() + d);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            self.now.get()
        }

        fn sleep(&self, duration: Duration, stop: &StopSignal) -> bool {
            self.sleeps.borrow_mut().push(duration);
            if let Some(at) = self.stop_at {
                if self.now.get() + duration >= at {
                    self.now.set(at);
                    return true;
                }
            }
            self.advance(duration);
            stop.is_stopped()
        }
    }

    fn timeline_at(ticks: &[i32]) -> Timeline {
        let mut sheet = Sheet::new("t", 120.0);
        for (i, &tick) in ticks.iter().enumerate() {
            sheet.push_note(Note::new(i as i32, 0, tick));
        }
        Timeline::build(&mut sheet)
    }

    fn x_of(event: &Event) -> i32 {
        match event.kind {
            EventKind::Note(n) => n.x,
        }
    }

    #[test]
    fn test_fires_in_order_at_due_time() {
        let timeline = timeline_at(&[0, 48, 96]);
        let clock = ManualClock::new();
        let (_handle, stop) = stop_channel();
        let mut seen = Vec::new();

        let result: Result<_, ()> = run(&timeline, &clock, &stop, |e| {
            seen.push((x_of(e), clock.now()));
            Ok(())
        });

        assert_eq!(result, Ok(Playback::Completed { fired: 3 }));
        assert_eq!(
            seen,
            vec![
                (0, Duration::ZERO),
                (1, Duration::from_millis(500)),
                (2, Duration::from_millis(1000)),
            ]
        );
    }

    #[test]
    fn test_waits_measured_from_origin() {
        let timeline = timeline_at(&[48, 96]);
        let clock = ManualClock::new();
        let (_handle, stop) = stop_channel();

        // Each action takes 100ms; the next wait shrinks to compensate.
        let result: Result<_, ()> = run(&timeline, &clock, &stop, |_| {
            clock.advance(Duration::from_millis(100));
            Ok(())
        });

        assert_eq!(result.map(|p| p.fired()), Ok(2));
        let sleeps = clock.sleeps.borrow();
        assert_eq!(sleeps.len(), 2);
        assert!((sleeps[0].as_secs_f64() - 0.5).abs() < 1e-9);
        assert!((sleeps[1].as_secs_f64() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_late_events_fire_without_waiting() {
        let timeline = timeline_at(&[0, 24, 48]);
        let clock = ManualClock::new();
        let (_handle, stop) = stop_channel();

        // First action overruns past every later due time.
        let result: Result<_, ()> = run(&timeline, &clock, &stop, |_| {
            clock.advance(Duration::from_secs(2));
            Ok(())
        });

        assert_eq!(result, Ok(Playback::Completed { fired: 3 }));
        assert!(clock.sleeps.borrow().is_empty());
    }

    #[test]
    fn test_cancel_mid_wait() {
        let timeline = timeline_at(&[0, 48, 96, 144]);
        let mut clock = ManualClock::new();
        clock.stop_at = Some(Duration::from_millis(700));
        let (_handle, stop) = stop_channel();
        let mut seen = Vec::new();

        let result: Result<_, ()> = run(&timeline, &clock, &stop, |e| {
            seen.push(x_of(e));
            Ok(())
        });

        assert_eq!(result, Ok(Playback::Cancelled { fired: 2 }));
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_stop_from_action() {
        let timeline = timeline_at(&[0, 48, 96]);
        let clock = ManualClock::new();
        let (handle, stop) = stop_channel();
        let mut seen = Vec::new();

        let result: Result<_, ()> = run(&timeline, &clock, &stop, |e| {
            seen.push(x_of(e));
            handle.stop();
            Ok(())
        });

        assert_eq!(result, Ok(Playback::Cancelled { fired: 1 }));
        assert_eq!(seen, vec![0]);
    }

    #[test]
    fn test_stop_before_run_fires_nothing() {
        let timeline = timeline_at(&[0]);
        let clock = ManualClock::new();
        let (handle, stop) = stop_channel();
        handle.stop();

        let result: Result<_, ()> = run(&timeline, &clock, &stop, |_| Ok(()));
        assert_eq!(result, Ok(Playback::Cancelled { fired: 0 }));
    }

    #[test]
    fn test_action_error_stops_run() {
        let timeline = timeline_at(&[0, 48]);
        let clock = ManualClock::new();
        let (_handle, stop) = stop_channel();
        let mut calls = 0;

        let result = run(&timeline, &clock, &stop, |_| {
            calls += 1;
            Err("device unplugged")
        });

        assert_eq!(result, Err("device unplugged"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_signal_wait_wakes_on_stop() {
        let (handle, stop) = stop_channel();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.stop();
        });
        let start = Instant::now();
        assert!(stop.wait(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(stop.is_stopped());
        waker.join().unwrap();
    }

    #[test]
    fn test_signal_wait_times_out() {
        let (_handle, stop) = stop_channel();
        assert!(!stop.wait(Duration::from_millis(5)));
        assert!(!stop.is_stopped());
    }

    #[test]
    fn test_dropped_handle_still_sleeps() {
        let (handle, stop) = stop_channel();
        drop(handle);
        let start = Instant::now();
        assert!(!stop.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_system_clock_respects_due_times() {
        let timeline = timeline_at(&[0, 4, 8]); // 0, 41.7ms, 83.3ms
        let clock = SystemClock::new();
        let (_handle, stop) = stop_channel();
        let start = clock.now();
        let mut seen = Vec::new();

        let result: Result<_, ()> = run(&timeline, &clock, &stop, |e| {
            seen.push((x_of(e), clock.now() - start));
            Ok(())
        });

        assert_eq!(result.map(|p| p.fired()), Ok(3));
        let xs: Vec<i32> = seen.iter().map(|(x, _)| *x).collect();
        assert_eq!(xs, vec![0, 1, 2]);
        for ((_, at), event) in seen.iter().zip(timeline.events()) {
            assert!(at.as_secs_f64() + 1e-3 >= event.at_second);
        }
    }
}
