use std::{collections::VecDeque, fmt, rc::Rc};

use crate::{Easing, EngineError, Result};

/// A queued change of a [`Weight`] from `start` to `end` over `duration`
/// seconds.
#[derive(Clone)]
pub struct Transition {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub easing: Rc<dyn Easing>,
}

impl Transition {
    pub fn delta(&self) -> f64 {
        self.end - self.start
    }

    fn evaluate(&self, elapsed: f64) -> f64 {
        self.easing
            .ease(elapsed, self.start, self.delta(), self.duration)
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

/// Scalar that moves through a FIFO queue of eased transitions.
///
/// Time only passes through [`Weight::tick`]; [`Weight::value`] drains the
/// transitions that have run out and evaluates the one in progress.
#[derive(Debug, Clone, Default)]
pub struct Weight {
    value: f64,
    queue: VecDeque<Transition>,
    /// Time since the oldest queued transition started.
    elapsed: f64,
}

impl Weight {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// Queues a transition to `end`, starting where the previous queued
    /// transition ends (or at the current value when nothing is queued), so
    /// the weight never jumps.
    pub fn push_transition<E>(&mut self, end: f64, duration: f64, easing: E) -> Result<()>
    where
        E: Easing + 'static,
    {
        let start = self.queue.back().map(|last| last.end).unwrap_or(self.value);
        self.push_transition_from(start, end, duration, easing)
    }

    /// Queues a transition with an explicit start value.
    pub fn push_transition_from<E>(
        &mut self,
        start: f64,
        end: f64,
        duration: f64,
        easing: E,
    ) -> Result<()>
    where
        E: Easing + 'static,
    {
        if duration.is_nan() || duration < 0.0 {
            return Err(EngineError::config(format!(
                "transition duration must be non-negative, found {duration}"
            )));
        }
        tracing::trace!(start, end, duration, "weight transition queued");
        self.queue.push_back(Transition {
            start,
            end,
            duration,
            easing: Rc::new(easing),
        });
        Ok(())
    }

    /// Advances time. The clock only runs while transitions are queued.
    /// Negative deltas rewind at most to the start of the head transition,
    /// and non-finite ones are ignored.
    pub fn tick(&mut self, delta_time: f64) {
        if self.queue.is_empty() {
            self.elapsed = 0.0;
        } else if delta_time.is_finite() {
            self.elapsed = (self.elapsed + delta_time).max(0.0);
        }
    }

    /// Evaluates the weight now, dropping every transition that has run out.
    /// Overshoot past a finished transition carries into the next one.
    pub fn value(&mut self) -> f64 {
        while let Some(head) = self.queue.front() {
            if self.elapsed <= head.duration && head.duration > 0.0 {
                break;
            }
            self.value = head.end;
            self.elapsed -= head.duration;
            self.queue.pop_front();
        }
        if let Some(head) = self.queue.front() {
            self.value = head.evaluate(self.elapsed);
        }
        self.value
    }

    /// The last evaluated value, without draining anything.
    pub fn current(&self) -> f64 {
        self.value
    }

    /// Freezes the weight at its present value and drops all transitions.
    pub fn cancel_transitions(&mut self) {
        self.value = self.value();
        self.queue.clear();
        self.elapsed = 0.0;
    }

    /// Drops all transitions and sets the weight back to 0.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.elapsed = 0.0;
        self.value = 0.0;
    }

    pub fn has_transitions(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of transitions still queued, including the one in progress.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
