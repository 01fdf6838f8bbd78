//! Core library for the tempo envelope engine.
//!
//! Animated parameters are driven in lock-step with a musical tempo. The host
//! ticks a [`Clock`] once per rendered frame; the clock advances every
//! registered [`BeatEnvelope`] and [`BeatModulator`], and the renderer then
//! samples them. Envelopes are either plain closures over the beat phase or
//! compiled from declared segments by a [`BeatEnvelopeBuilder`]. Modulators
//! blend several envelopes through [`Weight`]s whose queued transitions make
//! crossfades between sources.
//!
//! Everything here is single-threaded and frame-driven: no component spawns
//! threads, blocks or performs I/O outside of configuration loading.

pub mod builder;
pub mod clock;
pub mod config;
pub mod dynamics;
pub mod easing;
pub mod envelope;
pub mod error;
pub mod modulator;
pub mod weight;

pub use builder::{BeatEnvelopeBuilder, EnvelopeSegment, Timeline};
pub use clock::{shared, Clock, Subscriber, Tickable};
pub use config::{AppConfig, FrameConfig, ModulatorConfig, TempoConfig};
pub use dynamics::SecondOrderDynamics;
pub use easing::{Easing, EasingCurve, Interpolation, ZeroEasing};
pub use envelope::{interpolation_list, BeatEnvelope, EnvelopeCopy, EnvelopeFn};
pub use error::{EngineError, Result};
pub use modulator::BeatModulator;
pub use weight::{Transition, Weight};
