use anyhow::Context;
use crossbeam_channel::Sender;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::AudioCommand;

mod analysis;
mod drum;
mod effect;
mod engine;
mod frame;
mod sample_buffer;
mod synth;
mod voice;

pub use analysis::{analysis_channel, AnalysisTap};
pub use engine::{EngineClock, DEFAULT_BEAT_VOLUME};
pub use sample_buffer::SampleBuffer;
pub use synth::{Adsr, EnvelopeParam, SynthType};

use engine::Engine;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    clock: EngineClock,
    tap: Option<AnalysisTap>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    // a full channel drops the command; the audio thread must never wait on us
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }

    pub fn now(&self) -> f64 {
        self.clock.seconds()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // The UI thread takes the reader once; the engine keeps the writer.
    pub fn take_tap(&mut self) -> Option<AnalysisTap> {
        self.tap.take()
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate: u32 = config.sample_rate().into();
    let channels = config.channels() as usize;
    #[allow(deprecated)]
    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
    tracing::info!(
        device = %device_name,
        sample_rate,
        channels,
        "opened audio output"
    );

    let mut engine = Engine::new(sample_rate);
    let clock = engine.clock();
    let (writer, tap) = analysis_channel();
    engine.set_analysis(writer);

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, engine, channels)?;
            output_stream.play().context("failed to play output stream")?;

            Ok(AudioHandle {
                tx,
                clock,
                tap: Some(tap),
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: crossbeam_channel::Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    // the callback can't log, so errors surface here at the stream level
    let err_fn = |err| tracing::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() { // set up command handling
                engine.handle_cmd(cmd);
            }
            engine.render_interleaved(data, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
