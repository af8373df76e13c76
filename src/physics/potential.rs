//! Inflaton potential V(phi) and slow-roll diagnostics.
//!
//! The potential is a degree-4 Taylor expansion about the pivot field
//! value. Everything downstream assumes V > 0 and dV/dphi < 0 over the
//! explored field range: the field rolls toward larger phi and the
//! Hubble rate stays real. Violations are fatal configuration errors,
//! not recoverable numerics.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::FRIEDMANN_COEFF;
use crate::error::{PrimordialError, PrimordialResult};

/// Potential value and its first two field derivatives at one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PotentialValues {
    /// V(phi).
    pub v: f64,
    /// dV/dphi.
    pub dv: f64,
    /// d2V/dphi2.
    pub ddv: f64,
}

/// Degree-4 polynomial potential about a pivot field value.
///
/// V(phi) = V0 + V1 x + V2 x^2/2 + V3 x^3/6 + V4 x^4/24, x = phi - phi_pivot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolynomialPotential {
    /// Field value the expansion is taken about.
    pub phi_pivot: f64,
    /// Taylor coefficients [V0, V1, V2, V3, V4].
    pub coeffs: [f64; 5],
}

impl PolynomialPotential {
    /// Create a potential from the pivot field value and coefficients.
    pub fn new(phi_pivot: f64, coeffs: [f64; 5]) -> Self {
        Self { phi_pivot, coeffs }
    }

    /// Evaluate V, dV, d2V at a field value. Pure arithmetic.
    #[inline]
    pub fn evaluate(&self, phi: f64) -> PotentialValues {
        let x = phi - self.phi_pivot;
        let [v0, v1, v2, v3, v4] = self.coeffs;

        PotentialValues {
            v: v0 + x * (v1 + x * (v2 / 2.0 + x * (v3 / 6.0 + x * v4 / 24.0))),
            dv: v1 + x * (v2 + x * (v3 / 2.0 + x * v4 / 6.0)),
            ddv: v2 + x * (v3 + x * v4 / 2.0),
        }
    }

    /// Validate the physical region at a field value: V strictly
    /// positive, dV/dphi strictly negative.
    pub fn check(&self, phi: f64) -> PrimordialResult<PotentialValues> {
        let pv = self.evaluate(phi);

        if pv.v <= 0.0 {
            return Err(PrimordialError::NegativePotential { phi, v: pv.v });
        }
        if pv.dv >= 0.0 {
            return Err(PrimordialError::PositiveSlope { phi, dv: pv.dv });
        }

        Ok(pv)
    }

    /// First slow-roll parameter epsilon = (1/16pi) (dV/V)^2.
    #[inline]
    pub fn epsilon(&self, phi: f64) -> f64 {
        let pv = self.evaluate(phi);
        (pv.dv / pv.v).powi(2) / (16.0 * PI)
    }

    /// Second slow-roll parameter eta = (1/8pi) (d2V/V).
    #[inline]
    pub fn eta(&self, phi: f64) -> f64 {
        let pv = self.evaluate(phi);
        pv.ddv / pv.v / (8.0 * PI)
    }

    /// Slow-roll attractor velocity dphi/dt = -dV / (3 sqrt(8 pi V / 3)).
    ///
    /// Seeds the attractor search; the converged value is obtained by
    /// evolving the background, not from this estimate.
    #[inline]
    pub fn slow_roll_velocity(&self, phi: f64) -> f64 {
        let pv = self.evaluate(phi);
        -pv.dv / (3.0 * (FRIEDMANN_COEFF * pv.v).sqrt())
    }

    /// Closed-form slow-roll predictions at a field value, to first
    /// order in epsilon and eta. Used as a cross-check on the
    /// numerically derived spectrum.
    pub fn slow_roll_prediction(&self, phi: f64) -> SlowRollPrediction {
        let pv = self.evaluate(phi);
        let ratio = pv.dv / pv.v;

        SlowRollPrediction {
            a_s: 128.0 * PI / 3.0 * pv.v.powi(3) / (pv.dv * pv.dv),
            n_s: 1.0 - 6.0 / (16.0 * PI) * ratio * ratio + 2.0 / (8.0 * PI) * (pv.ddv / pv.v),
            n_t: -2.0 / (16.0 * PI) * ratio * ratio,
            r: ratio * ratio / PI,
        }
    }
}

/// First-order slow-roll estimates of the spectrum phenomenology.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SlowRollPrediction {
    /// Scalar amplitude 128 pi / 3 * V^3 / V'^2.
    pub a_s: f64,
    /// Scalar tilt 1 - 6 eps + 2 eta.
    pub n_s: f64,
    /// Tensor tilt -2 eps.
    pub n_t: f64,
    /// Tensor-to-scalar ratio (V'/V)^2 / pi = 16 eps.
    pub r: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quartic() -> PolynomialPotential {
        PolynomialPotential::new(2.0, [1.0e-12, -2.0e-13, 3.0e-14, -1.0e-14, 5.0e-15])
    }

    #[test]
    fn test_evaluate_at_pivot_returns_coeffs() {
        let pot = quartic();
        let pv = pot.evaluate(2.0);
        assert_eq!(pv.v, 1.0e-12);
        assert_eq!(pv.dv, -2.0e-13);
        assert_eq!(pv.ddv, 3.0e-14);
    }

    #[test]
    fn test_evaluate_taylor_terms() {
        // V0=0 except V4: V = x^4/24, dV = x^3/6, ddV = x^2/2.
        let pot = PolynomialPotential::new(0.0, [0.0, 0.0, 0.0, 0.0, 1.0]);
        let pv = pot.evaluate(2.0);
        assert!((pv.v - 16.0 / 24.0).abs() < 1e-15);
        assert!((pv.dv - 8.0 / 6.0).abs() < 1e-15);
        assert!((pv.ddv - 2.0).abs() < 1e-15);
    }

    #[test]
    fn test_check_rejects_negative_potential() {
        let pot = PolynomialPotential::new(0.0, [-1.0, -1.0, 0.0, 0.0, 0.0]);
        match pot.check(0.0) {
            Err(PrimordialError::NegativePotential { .. }) => {}
            other => panic!("expected NegativePotential, got {other:?}"),
        }
    }

    #[test]
    fn test_check_rejects_positive_slope() {
        let pot = PolynomialPotential::new(0.0, [1.0, 1.0, 0.0, 0.0, 0.0]);
        match pot.check(0.0) {
            Err(PrimordialError::PositiveSlope { .. }) => {}
            other => panic!("expected PositiveSlope, got {other:?}"),
        }
    }

    #[test]
    fn test_epsilon_matches_definition() {
        let pot = quartic();
        let pv = pot.evaluate(2.0);
        let expected = (pv.dv / pv.v).powi(2) / (16.0 * PI);
        assert!((pot.epsilon(2.0) - expected).abs() < 1e-18);
    }

    #[test]
    fn test_slow_roll_velocity_positive_for_negative_slope() {
        // dV < 0 must give dphi/dt > 0: the field rolls toward larger phi.
        let pot = quartic();
        assert!(pot.slow_roll_velocity(2.0) > 0.0);
    }

    #[test]
    fn test_slow_roll_consistency_r_equals_16_eps() {
        let pot = quartic();
        let pred = pot.slow_roll_prediction(2.0);
        assert!((pred.r - 16.0 * pot.epsilon(2.0)).abs() / pred.r < 1e-12);
        assert!((pred.n_t - (-pred.r / 8.0)).abs() < 1e-12);
    }
}
