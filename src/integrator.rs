//! Generic adaptive ODE integration.
//!
//! A 6-stage embedded Cash-Karp 4(5) pair with proportional step
//! control. The solver is a black box to the physics code: callers
//! hand it a derivative callback, a conformal-time interval, a state
//! slice, a relative tolerance and a minimum step, and get the advanced
//! state back. Workspace is owned by the integrator instance and sized
//! once, so one instance serves one integration stretch.

use crate::error::{PrimordialError, PrimordialResult};

/// System of ordinary differential equations dy/dtau = f(tau, y).
pub trait OdeSystem {
    /// Evaluate the right-hand side into `dy`.
    ///
    /// `y` and `dy` have the length the caller integrates with; systems
    /// supporting several state layouts dispatch on that length.
    fn rhs(&self, tau: f64, y: &[f64], dy: &mut [f64]);
}

// ============================================================================
// Cash-Karp Coefficients
// ============================================================================

const STAGES: usize = 6;

/// Stage time fractions c_i.
const C: [f64; STAGES] = [0.0, 0.2, 0.3, 0.6, 1.0, 0.875];

/// Stage coupling a_ij (lower triangle, row i uses a[i-1][..i]).
const A: [[f64; 5]; 5] = [
    [0.2, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [0.3, -0.9, 1.2, 0.0, 0.0],
    [-11.0 / 54.0, 2.5, -70.0 / 27.0, 35.0 / 27.0, 0.0],
    [
        1631.0 / 55296.0,
        175.0 / 512.0,
        575.0 / 13824.0,
        44275.0 / 110592.0,
        253.0 / 4096.0,
    ],
];

/// 5th-order solution weights b_i.
const B5: [f64; STAGES] = [
    37.0 / 378.0,
    0.0,
    250.0 / 621.0,
    125.0 / 594.0,
    0.0,
    512.0 / 1771.0,
];

/// Error weights b_i - b*_i (difference to the embedded 4th order).
const B_ERR: [f64; STAGES] = [
    37.0 / 378.0 - 2825.0 / 27648.0,
    0.0,
    250.0 / 621.0 - 18575.0 / 48384.0,
    125.0 / 594.0 - 13525.0 / 55296.0,
    -277.0 / 14336.0,
    512.0 / 1771.0 - 0.25,
];

/// Step growth exponent on accepted steps: err^(-1/5).
const GROW_EXPONENT: f64 = -0.2;
/// Step shrink exponent on rejected steps: err^(-1/4).
const SHRINK_EXPONENT: f64 = -0.25;
/// Safety factor applied to every step-size update.
const SAFETY: f64 = 0.9;
/// Largest growth factor per accepted step.
const MAX_GROW: f64 = 5.0;
/// Smallest shrink factor per rejected step.
const MIN_SHRINK: f64 = 0.1;
/// Floor added to the error scale so zero components stay harmless.
const TINY: f64 = 1.0e-30;

// ============================================================================
// Adaptive Integrator
// ============================================================================

/// Adaptive embedded Runge-Kutta integrator over a caller-sized state.
pub struct AdaptiveIntegrator {
    /// Relative tolerance on every component.
    rtol: f64,
    /// Smallest step magnitude before the fatal underflow channel.
    min_step: f64,
    // Pre-allocated workspace, sized at construction
    k: Vec<Vec<f64>>,
    y_try: Vec<f64>,
    y_err: Vec<f64>,
    dy0: Vec<f64>,
    scale: Vec<f64>,
}

impl AdaptiveIntegrator {
    /// Create an integrator for state vectors of dimension `dim`.
    pub fn new(dim: usize, rtol: f64, min_step: f64) -> Self {
        Self {
            rtol,
            min_step,
            k: vec![vec![0.0; dim]; STAGES],
            y_try: vec![0.0; dim],
            y_err: vec![0.0; dim],
            dy0: vec![0.0; dim],
            scale: vec![0.0; dim],
        }
    }

    /// Advance `y` from `tau_start` to `tau_end`, adapting the internal
    /// step to hold the local error below the relative tolerance.
    ///
    /// Fails only through the step-underflow channel; the derivative
    /// callback itself is infallible (potential validity is checked by
    /// the caller before every stretch).
    pub fn integrate<S: OdeSystem>(
        &mut self,
        sys: &S,
        tau_start: f64,
        tau_end: f64,
        y: &mut [f64],
    ) -> PrimordialResult<()> {
        debug_assert_eq!(y.len(), self.y_try.len());
        if tau_end == tau_start {
            return Ok(());
        }

        let mut tau = tau_start;
        let mut h = tau_end - tau_start;

        while (tau_end - tau) * h.signum() > 0.0 {
            // Never overshoot the interval end.
            if (tau + h - tau_end) * h.signum() > 0.0 {
                h = tau_end - tau;
            }

            sys.rhs(tau, y, &mut self.dy0);
            for i in 0..y.len() {
                self.scale[i] = y[i].abs() + (h * self.dy0[i]).abs() + TINY;
            }

            loop {
                let err = self.try_step(sys, tau, y, h);

                if err <= 1.0 {
                    tau += h;
                    y.copy_from_slice(&self.y_try);

                    let grow = if err > 0.0 {
                        (SAFETY * err.powf(GROW_EXPONENT)).min(MAX_GROW)
                    } else {
                        MAX_GROW
                    };
                    h *= grow;
                    break;
                }

                h *= (SAFETY * err.powf(SHRINK_EXPONENT)).max(MIN_SHRINK);
                if h.abs() < self.min_step {
                    return Err(PrimordialError::StepUnderflow { tau, step: h });
                }
            }
        }

        Ok(())
    }

    /// One trial Cash-Karp step of size `h`; fills `y_try`/`y_err` and
    /// returns the error normalized to the tolerance (accept if <= 1).
    fn try_step<S: OdeSystem>(&mut self, sys: &S, tau: f64, y: &[f64], h: f64) -> f64 {
        let n = y.len();

        self.k[0][..n].copy_from_slice(&self.dy0[..n]);

        for stage in 1..STAGES {
            for i in 0..n {
                let mut acc = 0.0;
                for (prev, a) in A[stage - 1][..stage].iter().enumerate() {
                    acc += a * self.k[prev][i];
                }
                self.y_try[i] = y[i] + h * acc;
            }
            sys.rhs(tau + C[stage] * h, &self.y_try, &mut self.k[stage][..n]);
        }

        let mut err_max: f64 = 0.0;
        for i in 0..n {
            let mut acc5 = 0.0;
            let mut acc_err = 0.0;
            for stage in 0..STAGES {
                acc5 += B5[stage] * self.k[stage][i];
                acc_err += B_ERR[stage] * self.k[stage][i];
            }
            self.y_try[i] = y[i] + h * acc5;
            self.y_err[i] = h * acc_err;
            err_max = err_max.max((self.y_err[i] / self.scale[i]).abs());
        }

        err_max / self.rtol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decay {
        rate: f64,
    }

    impl OdeSystem for Decay {
        fn rhs(&self, _tau: f64, y: &[f64], dy: &mut [f64]) {
            dy[0] = -self.rate * y[0];
        }
    }

    struct Oscillator {
        omega: f64,
    }

    impl OdeSystem for Oscillator {
        fn rhs(&self, _tau: f64, y: &[f64], dy: &mut [f64]) {
            dy[0] = y[1];
            dy[1] = -self.omega * self.omega * y[0];
        }
    }

    #[test]
    fn test_exponential_decay() {
        let sys = Decay { rate: 1.0 };
        let mut integ = AdaptiveIntegrator::new(1, 1e-8, 1e-16);
        let mut y = [1.0];
        integ.integrate(&sys, 0.0, 3.0, &mut y).unwrap();
        assert!(
            (y[0] - (-3.0f64).exp()).abs() < 1e-6,
            "got {} want {}",
            y[0],
            (-3.0f64).exp()
        );
    }

    #[test]
    fn test_harmonic_oscillator_energy() {
        // Energy 0.5*(y'^2 + w^2 y^2) must be conserved over many periods.
        let sys = Oscillator { omega: 2.0 };
        let mut integ = AdaptiveIntegrator::new(2, 1e-9, 1e-16);
        let mut y = [1.0, 0.0];
        let e0 = 0.5 * (y[1] * y[1] + 4.0 * y[0] * y[0]);
        integ
            .integrate(&sys, 0.0, 10.0 * std::f64::consts::PI, &mut y)
            .unwrap();
        let e1 = 0.5 * (y[1] * y[1] + 4.0 * y[0] * y[0]);
        assert!((e1 - e0).abs() / e0 < 1e-5, "energy drifted: {e0} -> {e1}");
    }

    #[test]
    fn test_oscillator_phase() {
        let sys = Oscillator { omega: 1.0 };
        let mut integ = AdaptiveIntegrator::new(2, 1e-10, 1e-16);
        let mut y = [1.0, 0.0];
        integ
            .integrate(&sys, 0.0, std::f64::consts::PI, &mut y)
            .unwrap();
        // cos(pi) = -1, sin(pi) = 0.
        assert!((y[0] + 1.0).abs() < 1e-7);
        assert!(y[1].abs() < 1e-7);
    }

    #[test]
    fn test_zero_interval_is_noop() {
        let sys = Decay { rate: 5.0 };
        let mut integ = AdaptiveIntegrator::new(1, 1e-6, 1e-12);
        let mut y = [2.5];
        integ.integrate(&sys, 1.0, 1.0, &mut y).unwrap();
        assert_eq!(y[0], 2.5);
    }

    #[test]
    fn test_backward_integration() {
        let sys = Decay { rate: 1.0 };
        let mut integ = AdaptiveIntegrator::new(1, 1e-8, 1e-16);
        let mut y = [1.0];
        integ.integrate(&sys, 0.0, -1.0, &mut y).unwrap();
        assert!((y[0] - 1.0f64.exp()).abs() < 1e-6);
    }
}
