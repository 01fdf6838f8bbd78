use std::{fmt, rc::Rc};

use crate::{BeatEnvelope, Easing, EasingCurve, EngineError, Interpolation, Result, ZeroEasing};

/// One piece of a timeline: eases from `from_x` to `to_x` over the half-open
/// phase interval `[from_t, to_t)`.
#[derive(Clone)]
pub struct EnvelopeSegment {
    pub from_t: f64,
    pub to_t: f64,
    pub from_x: f64,
    pub to_x: f64,
    easing: Rc<dyn Easing>,
}

impl EnvelopeSegment {
    fn new(from_t: f64, to_t: f64, from_x: f64, to_x: f64) -> Self {
        Self {
            from_t,
            to_t,
            from_x,
            to_x,
            easing: Rc::new(EasingCurve::Linear),
        }
    }

    fn filler(from_t: f64, to_t: f64) -> Self {
        Self {
            easing: Rc::new(ZeroEasing),
            ..Self::new(from_t, to_t, 0.0, 0.0)
        }
    }

    /// Replaces the default linear easing.
    pub fn via<E: Easing + 'static>(&mut self, easing: E) -> &mut Self {
        self.easing = Rc::new(easing);
        self
    }

    /// Eases with a normalised interpolation function `[0, 1] -> [0, 1]`.
    pub fn via_fn<F: Fn(f64) -> f64 + 'static>(&mut self, interpolation: F) -> &mut Self {
        self.via(Interpolation(interpolation))
    }

    pub fn delta_t(&self) -> f64 {
        self.to_t - self.from_t
    }

    pub fn delta_x(&self) -> f64 {
        self.to_x - self.from_x
    }

    pub fn contains(&self, phase: f64) -> bool {
        self.from_t <= phase && phase < self.to_t
    }

    /// Half-open intervals sharing only an endpoint do not overlap.
    pub fn overlaps(&self, other: &EnvelopeSegment) -> bool {
        !(self.to_t <= other.from_t || other.to_t <= self.from_t)
    }

    pub fn evaluate(&self, phase: f64) -> f64 {
        self.easing.ease(
            phase - self.from_t,
            self.from_x,
            self.delta_x(),
            self.delta_t(),
        )
    }
}

impl fmt::Debug for EnvelopeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeSegment")
            .field("from_t", &self.from_t)
            .field("to_t", &self.to_t)
            .field("from_x", &self.from_x)
            .field("to_x", &self.to_x)
            .finish_non_exhaustive()
    }
}

/// Sorted, gapless sequence of segments produced by
/// [`BeatEnvelopeBuilder::timeline`]. Immutable and cheap to clone.
#[derive(Debug, Clone)]
pub struct Timeline {
    segments: Rc<[EnvelopeSegment]>,
}

impl Timeline {
    pub fn segments(&self) -> &[EnvelopeSegment] {
        &self.segments
    }

    /// Evaluates the first segment containing `phase`, or 0 if none does.
    pub fn evaluate(&self, phase: f64) -> f64 {
        self.segments
            .iter()
            .find(|segment| segment.contains(phase))
            .map(|segment| segment.evaluate(phase))
            .unwrap_or(0.0)
    }
}

/// Collects non-overlapping segments and compiles them into a
/// [`BeatEnvelope`].
///
/// ```
/// use tempo_envelope_core::{BeatEnvelopeBuilder, EasingCurve};
///
/// let mut builder = BeatEnvelopeBuilder::new();
/// builder.segment(0.0, 1.0, 0.0, 1.0)?;
/// builder.segment_join(2.0, 0.0)?.via(EasingCurve::QuadOut);
/// let envelope = builder.build(120.0, 2.0)?;
/// assert_eq!(envelope.sample(0.5), 0.5);
/// # Ok::<(), tempo_envelope_core::EngineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct BeatEnvelopeBuilder {
    segments: Vec<EnvelopeSegment>,
    last_t: f64,
    last_x: f64,
}

impl BeatEnvelopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a linear segment over `[from_t, to_t)`. Rejected declarations
    /// leave the builder untouched.
    pub fn segment(
        &mut self,
        from_t: f64,
        to_t: f64,
        from_x: f64,
        to_x: f64,
    ) -> Result<&mut EnvelopeSegment> {
        if !(from_t.is_finite() && to_t.is_finite()) {
            return Err(EngineError::segment(from_t, to_t, "bounds must be finite"));
        }
        if from_t >= to_t {
            return Err(EngineError::segment(
                from_t,
                to_t,
                "time has to progress forward, from_t must be less than to_t",
            ));
        }
        let segment = EnvelopeSegment::new(from_t, to_t, from_x, to_x);
        if let Some(other) = self.segments.iter().find(|other| other.overlaps(&segment)) {
            return Err(EngineError::segment(
                from_t,
                to_t,
                format!("overlaps [{}, {})", other.from_t, other.to_t),
            ));
        }

        self.last_t = to_t;
        self.last_x = to_x;
        self.segments.push(segment);
        let index = self.segments.len() - 1;
        Ok(&mut self.segments[index])
    }

    /// Declares a segment starting where the previous declaration ended.
    pub fn segment_join(&mut self, to_t: f64, to_x: f64) -> Result<&mut EnvelopeSegment> {
        self.segment(self.last_t, to_t, self.last_x, to_x)
    }

    pub fn last_t(&self) -> f64 {
        self.last_t
    }

    pub fn last_x(&self) -> f64 {
        self.last_x
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sorts the declared segments and fills every coverage gap, starting at
    /// phase 0, with a zero segment.
    pub fn timeline(&self) -> Timeline {
        let mut declared = self.segments.clone();
        declared.sort_by(|a, b| a.from_t.total_cmp(&b.from_t));

        let mut segments = Vec::with_capacity(declared.len() * 2);
        let mut cursor = 0.0;
        for segment in declared {
            if cursor < segment.from_t {
                segments.push(EnvelopeSegment::filler(cursor, segment.from_t));
            }
            cursor = segment.to_t;
            segments.push(segment);
        }

        tracing::debug!(
            declared = self.segments.len(),
            fillers = segments.len() - self.segments.len(),
            "timeline built"
        );
        Timeline {
            segments: segments.into(),
        }
    }

    pub fn build(&self, bpm: f64, beats_per_loop: f64) -> Result<BeatEnvelope> {
        let timeline = self.timeline();
        BeatEnvelope::new(bpm, beats_per_loop, move |phase| timeline.evaluate(phase))
    }
}

impl BeatEnvelope {
    /// Builds a new envelope with this envelope's tempo and loop length from
    /// the segments `block` declares.
    pub fn build_by_segments<F>(&self, block: F) -> Result<BeatEnvelope>
    where
        F: FnOnce(&mut BeatEnvelopeBuilder) -> Result<()>,
    {
        let mut builder = BeatEnvelopeBuilder::new();
        block(&mut builder)?;
        builder.build(self.bpm(), self.beats_per_loop())
    }
}
