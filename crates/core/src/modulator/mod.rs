use crate::{
    envelope::validate_phase, BeatEnvelope, Easing, EasingCurve, EngineError, Result, Tickable,
    Weight,
};

/// Number of slots a [`BeatModulator::default`] provides.
pub const DEFAULT_CAPACITY: usize = 4;

#[derive(Debug, Clone, Default)]
struct Slot {
    envelope: Option<BeatEnvelope>,
    weight: Weight,
}

/// Weighted sum over a fixed number of envelope slots.
///
/// Each slot pairs an optional [`BeatEnvelope`] with a [`Weight`]. Crossfades
/// between sources are expressed as weight transitions; the sum is recomputed
/// on every sample call.
#[derive(Debug, Clone)]
pub struct BeatModulator {
    slots: Vec<Slot>,
}

impl Default for BeatModulator {
    fn default() -> Self {
        Self {
            slots: vec![Slot::default(); DEFAULT_CAPACITY],
        }
    }
}

impl BeatModulator {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::config("modulator capacity must be positive"));
        }
        Ok(Self {
            slots: vec![Slot::default(); capacity],
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Assigns or clears a slot. The slot's weight restarts at 0 so a new
    /// source never inherits the previous one's level.
    pub fn set(&mut self, index: usize, envelope: Option<BeatEnvelope>) -> Result<()> {
        let slot = self.slot_mut(index)?;
        tracing::debug!(
            index,
            present = envelope.is_some(),
            "modulator slot assigned"
        );
        slot.envelope = envelope;
        slot.weight.reset();
        Ok(())
    }

    pub fn envelope(&self, index: usize) -> Result<Option<&BeatEnvelope>> {
        Ok(self.slot(index)?.envelope.as_ref())
    }

    pub fn envelope_mut(&mut self, index: usize) -> Result<Option<&mut BeatEnvelope>> {
        Ok(self.slot_mut(index)?.envelope.as_mut())
    }

    pub fn weight_mut(&mut self, index: usize) -> Result<&mut Weight> {
        Ok(&mut self.slot_mut(index)?.weight)
    }

    /// Puts every present envelope at `target`'s phase (or 0) plus
    /// `phase_offset`. `target` does not need to belong to this modulator.
    /// A non-finite resulting phase is rejected before any envelope moves.
    pub fn sync_all(&mut self, target: Option<&BeatEnvelope>, phase_offset: f64) -> Result<()> {
        let phase = target.map(BeatEnvelope::phase).unwrap_or(0.0) + phase_offset;
        validate_phase(phase)?;
        for slot in &mut self.slots {
            if let Some(envelope) = &mut slot.envelope {
                envelope.set_phase(phase)?;
            }
        }
        Ok(())
    }

    /// Weighted sum of every slot's samples across `[phase_start, phase_end]`.
    /// Empty slots contribute nothing.
    pub fn sample_list(&mut self, phase_start: f64, phase_end: f64, size: usize) -> Vec<f64> {
        let mut sum = vec![0.0; size];
        for slot in &mut self.slots {
            let weight = slot.weight.value();
            let Some(envelope) = &slot.envelope else {
                continue;
            };
            let samples = envelope.sample_list(phase_start, phase_end, size);
            for (acc, sample) in sum.iter_mut().zip(samples) {
                *acc += sample * weight;
            }
        }
        sum
    }

    /// Weighted sum at the current phase shifted by `phase_offset`.
    pub fn sample(&mut self, phase_offset: f64) -> f64 {
        self.slots
            .iter_mut()
            .map(|slot| {
                let weight = slot.weight.value();
                slot.envelope
                    .as_ref()
                    .map(|envelope| envelope.sample(phase_offset) * weight)
                    .unwrap_or(0.0)
            })
            .sum()
    }

    /// Queues a transition towards each `(slot, value)` target over
    /// `duration` seconds. All indices are checked before anything is queued.
    pub fn push_transition<I, E>(&mut self, targets: I, duration: f64, easing: E) -> Result<()>
    where
        I: IntoIterator<Item = (usize, f64)>,
        E: Easing + Clone + 'static,
    {
        let targets: Vec<(usize, f64)> = targets.into_iter().collect();
        for &(index, _) in &targets {
            self.slot(index)?;
        }
        if duration.is_nan() || duration < 0.0 {
            return Err(EngineError::config(format!(
                "transition duration must be non-negative, found {duration}"
            )));
        }
        for (index, value) in targets {
            self.slots[index]
                .weight
                .push_transition(value, duration, easing.clone())?;
        }
        Ok(())
    }

    /// Element `i` of `values` targets slot `i`. Surplus values are ignored
    /// and slots without a value keep their queue untouched.
    pub fn push_transition_list<E>(
        &mut self,
        values: &[f64],
        duration: f64,
        easing: E,
    ) -> Result<()>
    where
        E: Easing + Clone + 'static,
    {
        let targets = values.iter().copied().take(self.capacity()).enumerate();
        self.push_transition(targets, duration, easing)
    }

    /// Sets the targeted weights once every pending transition has finished.
    pub fn set_weights_after_transitions<I>(&mut self, targets: I) -> Result<()>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        self.push_transition(targets, 0.0, EasingCurve::Linear)
    }

    /// Freezes every weight at its present value.
    pub fn cancel_all_transitions(&mut self) {
        for slot in &mut self.slots {
            slot.weight.cancel_transitions();
        }
    }

    fn slot(&self, index: usize) -> Result<&Slot> {
        let capacity = self.slots.len();
        self.slots
            .get(index)
            .ok_or(EngineError::IndexOutOfRange { index, capacity })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Slot> {
        let capacity = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, capacity })
    }
}

impl Tickable for BeatModulator {
    fn tick(&mut self, seconds: f64, delta_time: f64, frame_count: u64) {
        for slot in &mut self.slots {
            if let Some(envelope) = slot.envelope.as_mut() {
                envelope.tick(seconds, delta_time, frame_count);
            }
            slot.weight.tick(delta_time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn constant(value: f64) -> BeatEnvelope {
        BeatEnvelope::new(120.0, 4.0, move |_| value).unwrap()
    }

    fn ramp() -> BeatEnvelope {
        BeatEnvelope::new(120.0, 4.0, |phase| phase).unwrap()
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            BeatModulator::new(0),
            Err(EngineError::InvalidConfiguration(_))
        ));
        assert_eq!(BeatModulator::default().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn out_of_range_slots_fail_fast() {
        let mut modulator = BeatModulator::new(2).unwrap();
        let err = modulator.set(2, Some(constant(1.0))).unwrap_err();
        assert!(matches!(
            err,
            EngineError::IndexOutOfRange {
                index: 2,
                capacity: 2
            }
        ));
        assert!(modulator.envelope(5).is_err());
    }

    #[test]
    fn equal_halves_sum_to_one() {
        let mut modulator = BeatModulator::default();
        modulator.set(0, Some(constant(1.0))).unwrap();
        modulator.set(1, Some(constant(1.0))).unwrap();
        modulator
            .set_weights_after_transitions([(0, 0.5), (1, 0.5)])
            .unwrap();

        let samples = modulator.sample_list(0.0, 1.0, 8);
        assert_eq!(samples.len(), 8);
        assert!(samples.iter().all(|s| (s - 1.0).abs() < EPS));
    }

    #[test]
    fn empty_slots_contribute_nothing() {
        let mut modulator = BeatModulator::new(3).unwrap();
        modulator.set(1, Some(constant(2.0))).unwrap();
        modulator
            .set_weights_after_transitions([(0, 1.0), (1, 0.25), (2, 1.0)])
            .unwrap();

        assert_eq!(modulator.sample_list(0.0, 1.0, 3), vec![0.5, 0.5, 0.5]);
        assert_eq!(modulator.sample(0.0), 0.5);
    }

    #[test]
    fn set_resets_the_slot_weight() {
        let mut modulator = BeatModulator::default();
        modulator.set(0, Some(constant(1.0))).unwrap();
        modulator.set_weights_after_transitions([(0, 1.0)]).unwrap();
        assert_eq!(modulator.sample(0.0), 1.0);

        modulator.set(0, Some(constant(3.0))).unwrap();
        assert_eq!(modulator.sample(0.0), 0.0);
        assert_eq!(modulator.weight_mut(0).unwrap().value(), 0.0);
    }

    #[test]
    fn crossfade_moves_weight_between_sources() {
        let mut modulator = BeatModulator::default();
        modulator.set(0, Some(constant(1.0))).unwrap();
        modulator.set(1, Some(constant(3.0))).unwrap();
        modulator.set_weights_after_transitions([(0, 1.0)]).unwrap();
        modulator
            .push_transition([(0, 0.0), (1, 1.0)], 2.0, EasingCurve::Linear)
            .unwrap();

        assert!((modulator.sample(0.0) - 1.0).abs() < EPS);
        modulator.tick(0.0, 1.0, 0);
        assert!((modulator.sample(0.0) - 2.0).abs() < EPS);
        modulator.tick(1.0, 1.0, 1);
        assert!((modulator.sample(0.0) - 3.0).abs() < EPS);
    }

    #[test]
    fn push_transition_is_all_or_nothing() {
        let mut modulator = BeatModulator::new(2).unwrap();
        let err = modulator
            .push_transition([(0, 1.0), (7, 1.0)], 1.0, EasingCurve::Linear)
            .unwrap_err();
        assert!(matches!(err, EngineError::IndexOutOfRange { index: 7, .. }));
        assert!(!modulator.weight_mut(0).unwrap().has_transitions());
    }

    #[test]
    fn list_targets_are_truncated_to_capacity() {
        let mut modulator = BeatModulator::new(2).unwrap();
        modulator
            .push_transition_list(&[0.2, 0.4, 0.6], 0.0, EasingCurve::Linear)
            .unwrap();
        assert_eq!(modulator.weight_mut(0).unwrap().value(), 0.2);
        assert_eq!(modulator.weight_mut(1).unwrap().value(), 0.4);

        modulator
            .push_transition_list(&[0.9], 0.0, EasingCurve::Linear)
            .unwrap();
        assert!(!modulator.weight_mut(1).unwrap().has_transitions());
    }

    #[test]
    fn tick_advances_envelopes_and_weights() {
        let mut modulator = BeatModulator::default();
        modulator.set(2, Some(ramp())).unwrap();
        modulator
            .push_transition([(2, 1.0)], 1.0, EasingCurve::Linear)
            .unwrap();

        modulator.tick(0.5, 0.5, 0);
        assert_eq!(modulator.envelope(2).unwrap().unwrap().phase(), 1.0);
        assert!((modulator.weight_mut(2).unwrap().value() - 0.5).abs() < EPS);
    }

    #[test]
    fn sync_all_aligns_present_envelopes() {
        let mut modulator = BeatModulator::default();
        modulator.set(0, Some(ramp())).unwrap();
        modulator.set(3, Some(ramp())).unwrap();
        modulator.tick(0.0, 0.3, 0);

        let mut leader = ramp();
        leader.set_phase(1.5).unwrap();
        modulator.sync_all(Some(&leader), 0.25).unwrap();
        assert_eq!(modulator.envelope(0).unwrap().unwrap().phase(), 1.75);
        assert_eq!(modulator.envelope(3).unwrap().unwrap().phase(), 1.75);

        modulator.sync_all(None, 0.0).unwrap();
        assert_eq!(modulator.envelope(0).unwrap().unwrap().phase(), 0.0);
        assert!(modulator.envelope(1).unwrap().is_none());
    }

    #[test]
    fn sync_all_rejects_a_non_finite_phase() {
        let mut modulator = BeatModulator::default();
        modulator.set(0, Some(ramp())).unwrap();
        modulator.set(1, Some(ramp())).unwrap();
        modulator.tick(0.0, 0.3, 0);

        let err = modulator.sync_all(None, f64::NAN).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
        assert!(modulator.sync_all(None, f64::INFINITY).is_err());
        for index in 0..2 {
            let phase = modulator.envelope(index).unwrap().unwrap().phase();
            assert!((phase - 0.6).abs() < EPS);
        }
    }

    #[test]
    fn cancel_freezes_all_weights() {
        let mut modulator = BeatModulator::new(2).unwrap();
        modulator
            .push_transition([(0, 1.0), (1, 2.0)], 4.0, EasingCurve::Linear)
            .unwrap();
        modulator.tick(0.0, 2.0, 0);
        modulator.cancel_all_transitions();
        modulator.tick(0.0, 10.0, 1);

        assert!((modulator.weight_mut(0).unwrap().value() - 0.5).abs() < EPS);
        assert!((modulator.weight_mut(1).unwrap().value() - 1.0).abs() < EPS);
    }
}
