use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tempo_envelope_core::{
    shared, AppConfig, BeatEnvelope, BeatEnvelopeBuilder, BeatModulator, Clock, EasingCurve,
    EngineError, Result, Subscriber,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(fps) = cli.fps {
        config.frame.fps = fps;
    }
    if let Some(frames) = cli.frames {
        config.frame.frames = frames;
    }

    match cli.command {
        Commands::Pulse { bpm, beats, easing } => {
            if let Some(bpm) = bpm {
                config.tempo.bpm = bpm;
            }
            if let Some(beats) = beats {
                config.tempo.beats_per_loop = beats;
            }
            config.validate()?;
            run_pulse(&config, easing.unwrap_or(config.modulator.easing))
        }
        Commands::Crossfade { duration } => {
            if let Some(duration) = duration {
                config.modulator.crossfade_seconds = duration;
            }
            config.validate()?;
            run_crossfade(&config)
        }
    }
}

/// One rendered frame as a consumer would see it.
#[derive(Debug, Serialize)]
struct FrameReport {
    frame: u64,
    seconds: f64,
    phase: f64,
    value: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    weights: Vec<f64>,
}

fn run_pulse(config: &AppConfig, easing: EasingCurve) -> Result<()> {
    let beats = config.tempo.beats_per_loop;
    tracing::info!(bpm = config.tempo.bpm, beats, ?easing, "starting pulse");

    let mut builder = BeatEnvelopeBuilder::new();
    builder.segment(0.0, beats * 0.5, 0.0, 1.0)?.via(easing);
    builder.segment_join(beats, 0.0)?.via(easing);
    let pulse = shared(builder.build(config.tempo.bpm, beats)?);

    let mut clock = Clock::new();
    let subscriber: Subscriber = pulse.clone();
    clock.add([subscriber]);

    let mut out = io::stdout().lock();
    for _ in 0..config.frame.frames {
        let frame = clock.frame_count();
        clock.advance(config.frame.delta_time());
        let pulse = pulse.borrow();
        let report = FrameReport {
            frame,
            seconds: clock.seconds(),
            phase: pulse.phase(),
            value: pulse.sample(0.0),
            weights: Vec::new(),
        };
        writeln!(out, "{}", serde_json::to_string(&report)?)?;
    }
    Ok(())
}

fn run_crossfade(config: &AppConfig) -> Result<()> {
    let tempo = &config.tempo;
    let fade = config.modulator.crossfade_seconds;
    tracing::info!(bpm = tempo.bpm, fade, "starting crossfade");

    if config.modulator.capacity < 2 {
        return Err(EngineError::config(
            "crossfade needs a modulator capacity of at least 2",
        ));
    }
    let mut modulator = BeatModulator::new(config.modulator.capacity)?;
    let slow = BeatEnvelope::sine(tempo.bpm, tempo.beats_per_loop, tempo.beats_per_loop, 1.0)?;
    let fast = BeatEnvelope::sine(tempo.bpm, tempo.beats_per_loop, 1.0, 0.4)?;
    modulator.set(0, Some(slow))?;
    modulator.set(1, Some(fast))?;
    modulator.set_weights_after_transitions([(0, 1.0)])?;
    let easing = config.modulator.easing;
    modulator.push_transition([(0, 0.0), (1, 1.0)], fade, easing)?;
    modulator.push_transition([(0, 1.0), (1, 0.0)], fade, easing)?;
    let modulator = shared(modulator);

    let mut clock = Clock::new();
    let subscriber: Subscriber = modulator.clone();
    clock.add([subscriber]);

    let mut out = io::stdout().lock();
    for _ in 0..config.frame.frames {
        let frame = clock.frame_count();
        clock.advance(config.frame.delta_time());
        let mut modulator = modulator.borrow_mut();
        let value = modulator.sample(0.0);
        let phase = modulator
            .envelope(0)?
            .map(BeatEnvelope::phase)
            .unwrap_or_default();
        let weights = (0..2)
            .map(|index| modulator.weight_mut(index).map(|weight| weight.current()))
            .collect::<Result<Vec<_>>>()?;
        let report = FrameReport {
            frame,
            seconds: clock.seconds(),
            phase,
            value,
            weights,
        };
        writeln!(out, "{}", serde_json::to_string(&report)?)?;
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Tempo-locked envelopes for animated parameters", long_about = None)]
struct Cli {
    /// JSON configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Simulated frames per second.
    #[arg(long, global = true)]
    fps: Option<f64>,
    /// Number of frames to simulate.
    #[arg(long, global = true)]
    frames: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a segment-built pulse, rising for half the loop and falling back.
    Pulse {
        /// Tempo in beats per minute.
        #[arg(long)]
        bpm: Option<f64>,
        /// Loop length in beats.
        #[arg(long)]
        beats: Option<f64>,
        /// Easing applied to both halves of the pulse, e.g. `sineInOut`.
        #[arg(long, value_parser = parse_easing)]
        easing: Option<EasingCurve>,
    },
    /// Crossfade a slow and a fast sine through the modulator's weights.
    Crossfade {
        /// Seconds each crossfade takes.
        #[arg(long)]
        duration: Option<f64>,
    },
}

fn parse_easing(name: &str) -> std::result::Result<EasingCurve, String> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| format!("unknown easing `{name}`"))
}
