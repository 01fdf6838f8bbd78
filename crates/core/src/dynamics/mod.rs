use std::f64::consts::PI;

use crate::{EngineError, Result};

/// Second order system that follows a moving target.
///
/// `frequency` sets how fast the response oscillates (Hz) without changing
/// its shape, `damping` how quickly it settles (0 never settles, below 1
/// overshoots, 1 and above approaches without overshoot) and `response` how
/// it reacts at first (0 eases in, above 0 reacts sharply, below 0
/// anticipates).
///
/// The integration coefficients are derived from the parameters. Setters only
/// store the new value; call [`SecondOrderDynamics::recompute`] once after a
/// batch of changes.
#[derive(Debug, Clone)]
pub struct SecondOrderDynamics {
    frequency: f64,
    damping: f64,
    response: f64,
    k1: f64,
    k2: f64,
    k3: f64,
    previous_target: f64,
    y: f64,
    previous_y: f64,
    velocity: f64,
}

impl SecondOrderDynamics {
    pub fn new(frequency: f64, damping: f64, response: f64, initial: f64) -> Result<Self> {
        let mut dynamics = Self {
            frequency,
            damping,
            response,
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            previous_target: initial,
            y: initial,
            previous_y: initial,
            velocity: 0.0,
        };
        dynamics.recompute()?;
        Ok(dynamics)
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn response(&self) -> f64 {
        self.response
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    pub fn set_damping(&mut self, damping: f64) {
        self.damping = damping;
    }

    pub fn set_response(&mut self, response: f64) {
        self.response = response;
    }

    /// Re-derives the integration coefficients from the current parameters.
    /// On error the previous coefficients stay in effect.
    pub fn recompute(&mut self) -> Result<()> {
        let f = self.frequency;
        if !(f.is_finite() && f > 0.0) {
            return Err(EngineError::config(format!(
                "dynamics frequency must be positive, found {f}"
            )));
        }
        if !(self.damping.is_finite() && self.response.is_finite()) {
            return Err(EngineError::config(
                "dynamics damping and response must be finite",
            ));
        }
        self.k1 = self.damping / (PI * f);
        self.k2 = 1.0 / (2.0 * PI * f).powi(2);
        self.k3 = self.response * self.damping / (2.0 * PI * f);
        Ok(())
    }

    /// Current output.
    pub fn value(&self) -> f64 {
        self.y
    }

    /// Output before the last update.
    pub fn previous(&self) -> f64 {
        self.previous_y
    }

    /// Advances by `dt` seconds towards `target`, estimating the target's
    /// velocity from its previous value.
    pub fn update(&mut self, dt: f64, target: f64) -> f64 {
        if dt <= 0.0 || !dt.is_finite() {
            return self.y;
        }
        let target_velocity = (target - self.previous_target) / dt;
        self.update_with_velocity(dt, target, target_velocity)
    }

    /// Advances by `dt` seconds towards `target` moving at `target_velocity`.
    pub fn update_with_velocity(&mut self, dt: f64, target: f64, target_velocity: f64) -> f64 {
        if dt <= 0.0 || !dt.is_finite() {
            return self.y;
        }
        self.previous_target = target;
        self.previous_y = self.y;
        self.y += dt * self.velocity;
        self.velocity +=
            dt * (target + self.k3 * target_velocity - self.y - self.k1 * self.velocity) / self.k2;
        self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(dynamics: &mut SecondOrderDynamics, target: f64, frames: usize) -> f64 {
        let mut peak = f64::MIN;
        for _ in 0..frames {
            peak = peak.max(dynamics.update(1.0 / 240.0, target));
        }
        peak
    }

    #[test]
    fn rejects_non_positive_frequency() {
        assert!(SecondOrderDynamics::new(0.0, 1.0, 0.0, 0.0).is_err());
        let mut dynamics = SecondOrderDynamics::new(2.0, 1.0, 0.0, 0.0).unwrap();
        dynamics.set_frequency(-1.0);
        assert!(dynamics.recompute().is_err());
    }

    #[test]
    fn converges_on_a_step() {
        let mut dynamics = SecondOrderDynamics::new(2.0, 1.0, 0.0, 0.0).unwrap();
        let peak = settle(&mut dynamics, 1.0, 2400);
        assert!((dynamics.value() - 1.0).abs() < 1e-3);
        assert!(
            peak <= 1.0 + 1e-3,
            "critically damped response overshot to {peak}"
        );
    }

    #[test]
    fn underdamped_response_overshoots() {
        let mut dynamics = SecondOrderDynamics::new(2.0, 0.3, 0.0, 0.0).unwrap();
        let peak = settle(&mut dynamics, 1.0, 2400);
        assert!(peak > 1.1);
    }

    #[test]
    fn setters_take_effect_after_recompute() {
        let mut slow = SecondOrderDynamics::new(0.5, 1.0, 0.0, 0.0).unwrap();
        let mut fast = slow.clone();
        fast.set_frequency(4.0);
        fast.set_damping(1.0);
        fast.recompute().unwrap();

        settle(&mut slow, 1.0, 60);
        settle(&mut fast, 1.0, 60);
        assert!(fast.value() > slow.value());
    }

    #[test]
    fn zero_time_steps_are_ignored() {
        let mut dynamics = SecondOrderDynamics::new(2.0, 1.0, 0.0, 0.25).unwrap();
        assert_eq!(dynamics.update(0.0, 10.0), 0.25);
        assert_eq!(dynamics.previous(), 0.25);
    }
}
