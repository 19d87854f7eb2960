//! Run loops: headless logging, or the terminal UI with live audio.

use std::{
    sync::mpsc::Receiver,
    thread,
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, info};

use netsonify::{
    engine::{
        device::{RecordingDevice, SoundDevice},
        Session,
    },
    packet::Packet,
    synth::{device::RingDevice, ensemble::Ensemble, message::SynthMessage},
    MAX_BLOCK_SIZE,
};

use super::{source, ui::UiApp};

/// Synth messages in flight between the session and the audio thread
const MESSAGE_RING_SIZE: usize = 1024;
/// Mono samples handed to the waveform view
const TAP_RING_SIZE: usize = 8192;
/// Start-time headroom so notes land in blocks not yet rendered
const LOOKAHEAD: f64 = 0.1;

/// Play everything without a terminal UI or audio, logging each packet.
pub fn run_headless(mut session: Session, packets: Receiver<Packet>) -> EyreResult<()> {
    let mut device = RecordingDevice::new();
    let clock = Instant::now();
    let mut open = true;
    session.start();

    loop {
        if open {
            open = source::drain(&packets, &mut session);
        }
        if !open && session.queued() == 0 {
            break;
        }

        let now = clock.elapsed().as_secs_f64();
        if let Some(played) = session.tick(now, &mut device, &mut ()) {
            let notes: Vec<String> = played
                .events
                .iter()
                .map(|e| format!("{}:{}", e.voice, pitch_names(&e.pitches)))
                .collect();
            info!(
                t = %format!("{now:.2}"),
                size = ?played.packet.size,
                protocol = %played.packet.protocol,
                notes = %notes.join(" "),
                "packet"
            );
            device.take();
        }

        thread::sleep(Duration::from_millis(10));
    }

    let graph = session.graph();
    info!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "input exhausted"
    );
    Ok(())
}

/// Terminal UI, with audio unless `audio` is false.
pub fn run(session: Session, packets: Receiver<Packet>, audio: bool) -> EyreResult<()> {
    if !audio {
        return run_ui(session, packets, RecordingDevice::new(), None, None);
    }

    let (device, synth_rx) = RingDevice::channel(MESSAGE_RING_SIZE);
    let (tap_tx, tap_rx) = RingBuffer::new(TAP_RING_SIZE);
    let output = AudioOutput::start(synth_rx, tap_tx)?;

    run_ui(
        session,
        packets,
        device.with_lookahead(LOOKAHEAD),
        Some(tap_rx),
        Some(output.sample_rate),
    )
}

fn run_ui<D: SoundDevice>(
    mut session: Session,
    packets: Receiver<Packet>,
    device: D,
    audio_rx: Option<Consumer<f32>>,
    sample_rate: Option<f32>,
) -> EyreResult<()> {
    session.start();
    let mut app = UiApp::new(session, packets, device, audio_rx, sample_rate);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}

fn pitch_names(pitches: &[netsonify::sequencing::Pitch]) -> String {
    pitches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("+")
}

/// Open output stream. Dropping it stops audio.
struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: f32,
}

impl AudioOutput {
    fn start(synth_rx: Consumer<SynthMessage>, mut tap: Producer<f32>) -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!(sample_rate, channels, "audio output ready");

        let mut ensemble = Ensemble::new(sample_rate, synth_rx);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    ensemble.render_block(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        let s = s.clamp(-1.0, 1.0);
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        // Waveform view is best-effort
                        let _ = tap.push(s);
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| error!(%err, "audio stream error"),
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }
}
