use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use padchart::grid::{self, TerminalGrid};
use padchart::player::{self, PlayerConfig};
use padchart::sink::PrintSink;
use padchart::synth::AudioSink;
use padchart::{
    EventKind, NoteClassifier, OutputSink, Parsed, Playback, SinkError, StopHandle, SystemClock,
    Timeline, parser, stop_channel, writer,
};

#[derive(Parser)]
#[command(name = "padchart", about = "Replay note charts on a pad grid")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a chart in real time
    Play {
        /// Path to a chart file
        file: PathBuf,

        /// Override tempo (BPM)
        #[arg(long)]
        tempo: Option<f64>,

        /// Where the pads light up
        #[arg(long, value_enum, default_value = "grid")]
        output: Output,

        /// Beat lengths for note categories, coarsest first
        #[arg(long, value_delimiter = ',')]
        thresholds: Option<Vec<f64>>,
    },

    /// Parse a chart and list its timeline
    Parse {
        /// Path to a chart file
        file: PathBuf,
    },

    /// Rewrite a chart in canonical form
    Fmt {
        /// Path to a chart file
        file: PathBuf,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    /// 8x8 grid in the terminal
    Grid,
    /// A short tone per note
    Audio,
    /// One line per pad change on stdout
    Print,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            file,
            tempo,
            output,
            thresholds,
        } => {
            let mut parsed = load_chart(&file);
            let config = PlayerConfig {
                tempo,
                classifier: thresholds.map(NoteClassifier::new).unwrap_or_default(),
                ..PlayerConfig::default()
            };
            let timeline = player::prepare(&mut parsed.sheet, &config);

            println!(
                "Playing: {} ({} notes, {} BPM)",
                parsed.sheet.name,
                timeline.len(),
                parsed.sheet.tempo
            );

            let result = match output {
                Output::Grid => play_on_grid(&parsed.sheet.name, &timeline, &config),
                Output::Audio => AudioSink::open()
                    .and_then(|mut sink| play_until_enter(&timeline, &config, &mut sink)),
                Output::Print => {
                    let mut sink = PrintSink::new(io::stdout());
                    play_until_enter(&timeline, &config, &mut sink)
                }
            };

            match result {
                Ok(Playback::Completed { fired }) => println!("Done ({} notes)", fired),
                Ok(Playback::Cancelled { fired }) => {
                    println!("Stopped after {} of {} notes", fired, timeline.len())
                }
                Err(e) => {
                    eprintln!("Playback error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Parse { file } => {
            let mut parsed = load_chart(&file);
            print_chart(&mut parsed);
        }
        Command::Fmt { file, output } => {
            let parsed = load_chart(&file);
            match output {
                Some(path) => {
                    if let Err(e) = writer::save(&parsed.sheet, &path) {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
                None => print!("{}", writer::write(&parsed.sheet)),
            }
        }
    }
}

fn load_chart(path: &Path) -> Parsed {
    parser::load(path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

/// Play in the terminal grid; Esc, `q` or Ctrl-C stops.
fn play_on_grid(
    title: &str,
    timeline: &Timeline,
    config: &PlayerConfig,
) -> Result<Playback, SinkError> {
    let mut sink = TerminalGrid::open(title)?;
    let (handle, stop) = stop_channel();

    let keep_running = Arc::new(AtomicBool::new(true));
    let watcher = {
        let keep_running = Arc::clone(&keep_running);
        thread::spawn(move || {
            while keep_running.load(Ordering::SeqCst) {
                match grid::poll_stop_key(Duration::from_millis(50)) {
                    Ok(true) => {
                        handle.stop();
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("keyboard polling failed: {}", e);
                        break;
                    }
                }
            }
        })
    };

    let result = player::play(timeline, config, &mut sink, &SystemClock::new(), &stop);

    keep_running.store(false, Ordering::SeqCst);
    let _ = watcher.join();
    result
}

/// Play on a sink that leaves the terminal alone; Enter stops.
fn play_until_enter(
    timeline: &Timeline,
    config: &PlayerConfig,
    sink: &mut dyn OutputSink,
) -> Result<Playback, SinkError> {
    let (handle, stop) = stop_channel();
    println!("Press Enter to stop.");
    spawn_enter_watcher(handle);
    player::play(timeline, config, sink, &SystemClock::new(), &stop)
}

fn spawn_enter_watcher(handle: StopHandle) {
    // Detached: it stays blocked on stdin if playback ends first.
    thread::spawn(move || {
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_ok() {
            handle.stop();
        }
    });
}

fn print_chart(parsed: &mut Parsed) {
    if !parsed.warnings.is_empty() {
        println!("{} warning(s)", parsed.warnings.len());
    }
    let sheet = &mut parsed.sheet;
    println!("Name: {}", sheet.name);
    println!("Tempo: {} BPM", sheet.tempo);
    println!("Ticks per beat: {}", sheet.ticks_per_beat);
    println!("Notes: {}", sheet.notes.len());
    println!();

    let classifier = NoteClassifier::default();
    let timeline = Timeline::build(sheet);
    for event in &timeline {
        match event.kind {
            EventKind::Note(n) => {
                let category = match classifier.classify_beat(event.beat) {
                    Some(i) => i.to_string(),
                    None => "-".to_string(),
                };
                println!(
                    "  {:>8.3}s  beat {:>7.3}  pad ({}, {})  type {}",
                    event.at_second, event.beat, n.x, n.y, category
                );
            }
        }
    }
}
