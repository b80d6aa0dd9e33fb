use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;

use crate::error::SinkError;
use crate::sink::{Color, OutputSink};

/// Length of the tone played for each lit pad.
const BLIP_SECS: f64 = 0.08;

/// A command sent to the audio thread
enum AudioCommand {
    /// Start a short decaying tone
    Blip { freq: f64 },
    /// Silence the stream
    Stop,
}

/// Pitch for a pad colour: brighter red shifts by fourths, brighter green by
/// semitones, above A3. Unlit pads make no sound.
pub fn color_to_freq(color: Color) -> Option<f64> {
    if color.is_off() {
        return None;
    }
    let semitones = (color.red * 4 + color.green) as f64;
    Some(220.0 * 2.0_f64.powf(semitones / 12.0))
}

/// Plays a blip through the default audio output whenever a pad lights up.
/// Pad position is ignored; only the colour matters.
pub struct AudioSink {
    stream: Option<cpal::Stream>,
    cmd_tx: mpsc::Sender<AudioCommand>,
}

impl AudioSink {
    pub fn open() -> Result<Self, SinkError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| SinkError::Device(format!("failed to get default output config: {}", e)))?;

        let sample_rate = config.sample_rate() as f64;
        let channels = (config.channels() as usize).max(1);
        let blip_samples = (BLIP_SECS * sample_rate) as usize;

        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();

        let mut phase: f64 = 0.0;
        let mut freq: f64 = 0.0;
        let mut samples_remaining: usize = 0;

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    while let Ok(cmd) = cmd_rx.try_recv() {
                        match cmd {
                            AudioCommand::Blip { freq: f } => {
                                freq = f;
                                samples_remaining = blip_samples;
                                phase = 0.0;
                            }
                            AudioCommand::Stop => samples_remaining = 0,
                        }
                    }

                    for frame in data.chunks_mut(channels) {
                        let value = if samples_remaining > 0 {
                            // Linear fade-out over the blip
                            let env = samples_remaining as f64 / blip_samples as f64;
                            let v = (phase * freq * 2.0 * std::f64::consts::PI / sample_rate).sin();
                            phase += 1.0;
                            samples_remaining -= 1;
                            (v * env * 0.3) as f32
                        } else {
                            0.0
                        };
                        for sample in frame.iter_mut() {
                            *sample = value;
                        }
                    }
                },
                move |err| {
                    log::error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| SinkError::Device(format!("failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| SinkError::Device(format!("failed to play stream: {}", e)))?;

        Ok(Self {
            stream: Some(stream),
            cmd_tx,
        })
    }
}

impl OutputSink for AudioSink {
    fn set_pad(&mut self, _x: i32, _y: i32, color: Color) -> Result<(), SinkError> {
        if self.stream.is_none() {
            return Err(SinkError::Disconnected);
        }
        if let Some(freq) = color_to_freq(color) {
            self.cmd_tx
                .send(AudioCommand::Blip { freq })
                .map_err(|_| SinkError::Disconnected)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(stream) = self.stream.take() {
            // Let the last blip ring out before tearing the stream down
            std::thread::sleep(std::time::Duration::from_secs_f64(BLIP_SECS));
            let _ = self.cmd_tx.send(AudioCommand::Stop);
            drop(stream);
        }
        Ok(())
    }
}
