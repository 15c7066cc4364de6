//! Trapezoidal membership functions.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// A trapezoid with breakpoints `a1 <= a2 <= a3 <= a4`.
///
/// Membership ramps up on `(a1, a2)`, is 1 on `[a2, a3]`, ramps down on
/// `(a3, a4)` and is 0 everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct Trapezoid {
    a1: f64,
    a2: f64,
    a3: f64,
    a4: f64,
}

impl Trapezoid {
    /// Build a trapezoid, rejecting unordered or non-finite breakpoints.
    pub fn new(a1: f64, a2: f64, a3: f64, a4: f64) -> Result<Self, ScoringError> {
        let finite = [a1, a2, a3, a4].iter().all(|a| a.is_finite());
        if !finite || !(a1 <= a2 && a2 <= a3 && a3 <= a4) {
            return Err(ScoringError::InvalidTrapezoid { a1, a2, a3, a4 });
        }
        Ok(Self { a1, a2, a3, a4 })
    }

    pub fn a1(&self) -> f64 {
        self.a1
    }

    pub fn a2(&self) -> f64 {
        self.a2
    }

    pub fn a3(&self) -> f64 {
        self.a3
    }

    pub fn a4(&self) -> f64 {
        self.a4
    }

    /// Membership degree of `x`, always within `[0, 1]`.
    ///
    /// The ramp ratios are only computed inside their open intervals, so a
    /// degenerate side (`a1 == a2` or `a3 == a4`) never divides by zero.
    pub fn mu(&self, x: f64) -> f64 {
        if self.a1 < x && x < self.a2 {
            return (x - self.a1) / (self.a2 - self.a1);
        }
        if self.a2 <= x && x <= self.a3 {
            return 1.0;
        }
        if self.a3 < x && x < self.a4 {
            return (self.a4 - x) / (self.a4 - self.a3);
        }
        0.0
    }

    /// Width of the support measured from `max(a1, 0)` to `a4`.
    ///
    /// This is the per-term factor of the potential score reduction; negative
    /// `a1` is clamped to zero.
    pub fn upper_support_width(&self) -> f64 {
        self.a4 - self.a1.max(0.0)
    }

    /// Whether `x` lies strictly inside the support, i.e. `mu(x) > 0`.
    pub fn covers(&self, x: f64) -> bool {
        self.mu(x) > 0.0
    }
}

impl TryFrom<[f64; 4]> for Trapezoid {
    type Error = ScoringError;

    fn try_from([a1, a2, a3, a4]: [f64; 4]) -> Result<Self, Self::Error> {
        Trapezoid::new(a1, a2, a3, a4)
    }
}

impl From<Trapezoid> for [f64; 4] {
    fn from(t: Trapezoid) -> Self {
        [t.a1, t.a2, t.a3, t.a4]
    }
}
