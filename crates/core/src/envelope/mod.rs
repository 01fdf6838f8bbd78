use std::{f64::consts::TAU, fmt, rc::Rc};

use crate::{EngineError, Result, Tickable};

/// Shape of an envelope: maps a phase in `[0, beats_per_loop)` to a value.
pub type EnvelopeFn = Rc<dyn Fn(f64) -> f64>;

/// Tempo-locked phase counter sampled through an envelope function.
///
/// The phase is measured in beats and advances by `bpm / 60` beats per
/// second of host time. It always stays inside `[0, beats_per_loop)`.
#[derive(Clone)]
pub struct BeatEnvelope {
    bpm: f64,
    beats_per_loop: f64,
    phase: f64,
    envelope: EnvelopeFn,
}

/// Field overrides for [`BeatEnvelope::copy`]. Unset fields are taken from
/// the source envelope.
#[derive(Clone, Default)]
pub struct EnvelopeCopy {
    pub bpm: Option<f64>,
    pub beats_per_loop: Option<f64>,
    pub envelope: Option<EnvelopeFn>,
    /// Carry the source's phase instead of restarting at 0.
    pub keep_phase: bool,
}

impl BeatEnvelope {
    pub fn new<F>(bpm: f64, beats_per_loop: f64, envelope: F) -> Result<Self>
    where
        F: Fn(f64) -> f64 + 'static,
    {
        Self::from_shared(bpm, beats_per_loop, Rc::new(envelope))
    }

    pub fn from_shared(bpm: f64, beats_per_loop: f64, envelope: EnvelopeFn) -> Result<Self> {
        validate_bpm(bpm)?;
        validate_loop(beats_per_loop)?;
        Ok(Self {
            bpm,
            beats_per_loop,
            phase: 0.0,
            envelope,
        })
    }

    /// Sine oscillating around 0.5 with the given `period` in beats.
    pub fn sine(bpm: f64, beats_per_loop: f64, period: f64, amplitude: f64) -> Result<Self> {
        if !(period.is_finite() && period > 0.0) {
            return Err(EngineError::config(format!(
                "sine period must be positive, found {period}"
            )));
        }
        Self::new(bpm, beats_per_loop, move |phase| {
            (phase.rem_euclid(period) * TAU / period).sin() * 0.5 * amplitude + 0.5
        })
    }

    /// Piecewise linear interpolation between `(phase, value)` control points.
    /// Phases outside the covered range evaluate to 0.
    pub fn control_points(
        bpm: f64,
        beats_per_loop: f64,
        points: impl IntoIterator<Item = (f64, f64)>,
    ) -> Result<Self> {
        let mut points: Vec<(f64, f64)> = points.into_iter().collect();
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(EngineError::config("control points must be finite"));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        if points.windows(2).any(|pair| pair[0].0 == pair[1].0) {
            return Err(EngineError::config(
                "control points must be unique in phase",
            ));
        }
        Self::new(bpm, beats_per_loop, move |phase| {
            lerp_control_points(&points, phase)
        })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn beats_per_loop(&self) -> f64 {
        self.beats_per_loop
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn envelope(&self) -> &EnvelopeFn {
        &self.envelope
    }

    /// Moves the playhead, wrapped into the loop. A non-finite phase is
    /// rejected and the playhead stays where it was.
    pub fn set_phase(&mut self, phase: f64) -> Result<()> {
        validate_phase(phase)?;
        self.phase = wrap_phase(phase, self.beats_per_loop);
        Ok(())
    }

    /// Changes the tempo. The accumulated phase is kept.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        validate_bpm(bpm)?;
        self.bpm = bpm;
        Ok(())
    }

    /// Changes the loop length and re-wraps the accumulated phase into it.
    pub fn set_beats_per_loop(&mut self, beats_per_loop: f64) -> Result<()> {
        validate_loop(beats_per_loop)?;
        self.beats_per_loop = beats_per_loop;
        self.phase = wrap_phase(self.phase, beats_per_loop);
        Ok(())
    }

    /// Samples the envelope at the current phase shifted by `phase_offset`
    /// beats. Negative offsets look into the past.
    pub fn sample(&self, phase_offset: f64) -> f64 {
        (self.envelope)(wrap_phase(self.phase + phase_offset, self.beats_per_loop))
    }

    /// `size` samples at evenly spaced offsets across `[phase_start, phase_end]`,
    /// both bounds included.
    pub fn sample_list(&self, phase_start: f64, phase_end: f64, size: usize) -> Vec<f64> {
        interpolation_list(phase_start, phase_end, size)
            .into_iter()
            .map(|offset| self.sample(offset))
            .collect()
    }

    /// Like [`BeatEnvelope::sample_list`], handing `(sample, offset, index)`
    /// to `block` instead of collecting.
    pub fn for_each_sample<F>(&self, phase_start: f64, phase_end: f64, size: usize, mut block: F)
    where
        F: FnMut(f64, f64, usize),
    {
        for (index, offset) in interpolation_list(phase_start, phase_end, size)
            .into_iter()
            .enumerate()
        {
            block(self.sample(offset), offset, index);
        }
    }

    /// Derives an independent envelope. The phase restarts at 0 unless
    /// `keep_phase` is set, in which case it is re-wrapped into the new loop.
    pub fn copy(&self, overrides: EnvelopeCopy) -> Result<Self> {
        let mut copy = Self::from_shared(
            overrides.bpm.unwrap_or(self.bpm),
            overrides.beats_per_loop.unwrap_or(self.beats_per_loop),
            overrides.envelope.unwrap_or_else(|| self.envelope.clone()),
        )?;
        if overrides.keep_phase {
            copy.set_phase(self.phase)?;
        }
        Ok(copy)
    }
}

impl Tickable for BeatEnvelope {
    fn tick(&mut self, _seconds: f64, delta_time: f64, _frame_count: u64) {
        let advance = delta_time * self.bpm / 60.0;
        if advance.is_finite() {
            self.phase = wrap_phase(self.phase + advance, self.beats_per_loop);
        }
    }
}

impl fmt::Debug for BeatEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeatEnvelope")
            .field("bpm", &self.bpm)
            .field("beats_per_loop", &self.beats_per_loop)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

/// `size` evenly spaced values across `[start, end]`, both bounds included.
/// A single value is `start`.
pub fn interpolation_list(start: f64, end: f64, size: usize) -> Vec<f64> {
    match size {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (size - 1) as f64;
            (0..size)
                .map(|index| {
                    if index == size - 1 {
                        end
                    } else {
                        start + step * index as f64
                    }
                })
                .collect()
        }
    }
}

/// Euclidean modulo into `[0, len)`. `rem_euclid` can round up to exactly
/// `len` for tiny negative inputs, which is folded back to 0.
pub(crate) fn wrap_phase(phase: f64, len: f64) -> f64 {
    let wrapped = phase.rem_euclid(len);
    if wrapped >= len {
        0.0
    } else {
        wrapped
    }
}

fn lerp_control_points(points: &[(f64, f64)], x: f64) -> f64 {
    let upper = points.partition_point(|(px, _)| *px <= x);
    if upper == 0 || upper == points.len() {
        return 0.0;
    }
    let (x0, y0) = points[upper - 1];
    let (x1, y1) = points[upper];
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}

pub(crate) fn validate_phase(phase: f64) -> Result<()> {
    if phase.is_finite() {
        Ok(())
    } else {
        Err(EngineError::config(format!(
            "phase must be finite, found {phase}"
        )))
    }
}

fn validate_bpm(bpm: f64) -> Result<()> {
    if bpm.is_finite() {
        Ok(())
    } else {
        Err(EngineError::config(format!(
            "bpm must be finite, found {bpm}"
        )))
    }
}

fn validate_loop(beats_per_loop: f64) -> Result<()> {
    if beats_per_loop.is_finite() && beats_per_loop > 0.0 {
        Ok(())
    } else {
        Err(EngineError::config(format!(
            "beats_per_loop must be positive, found {beats_per_loop}"
        )))
    }
}
