//! Phase-space derivatives of the inflaton background and its
//! perturbation mode functions.
//!
//! Conformal-time equations of motion:
//! - da/dtau   = a * aH
//! - dphi/dtau = dphi (the momentum slot)
//! - d(dphi)/dtau = -2 aH dphi - a^2 dV
//!
//! with aH = sqrt((8 pi / 3)(dphi^2 / 2 + a^2 V)). When perturbation
//! slots are present, the curvature and tensor mode functions obey the
//! two independent oscillator equations
//! - d2(ksi)/dtau2 = -(k^2 - z''/z) ksi
//! - d2(ah)/dtau2  = -(k^2 - a''/a) ah
//!
//! each split into first-order real/imaginary pairs.

use std::f64::consts::PI;

use crate::constants::FRIEDMANN_COEFF;
use crate::integrator::OdeSystem;
use crate::physics::potential::PolynomialPotential;
use crate::state::{
    BG_SIZE, IDX_A, IDX_AH_IM, IDX_AH_RE, IDX_DAH_IM, IDX_DAH_RE, IDX_DKSI_IM, IDX_DKSI_RE,
    IDX_DPHI, IDX_KSI_IM, IDX_KSI_RE, IDX_PHI,
};

/// Comoving Hubble rate aH = a'/a from the raw background slots.
#[inline]
pub fn comoving_hubble(a: f64, dphi: f64, v: f64) -> f64 {
    (FRIEDMANN_COEFF * (0.5 * dphi * dphi + a * a * v)).sqrt()
}

/// Derivative callback for background or full integration.
///
/// Dispatches on the state-slice length: [`BG_SIZE`] slots evolve the
/// background only, the full length adds both mode functions for the
/// wavenumber `k`.
pub struct InflatonDerivs<'a> {
    potential: &'a PolynomialPotential,
    k: f64,
}

impl<'a> InflatonDerivs<'a> {
    /// Background-only derivatives (the wavenumber is unused).
    pub fn background(potential: &'a PolynomialPotential) -> Self {
        Self { potential, k: 0.0 }
    }

    /// Full derivatives for one wavenumber.
    pub fn for_mode(potential: &'a PolynomialPotential, k: f64) -> Self {
        Self { potential, k }
    }

    /// aH for the background slots of `y`.
    #[inline]
    pub fn rate(&self, y: &[f64]) -> f64 {
        comoving_hubble(y[IDX_A], y[IDX_DPHI], self.potential.evaluate(y[IDX_PHI]).v)
    }
}

impl OdeSystem for InflatonDerivs<'_> {
    fn rhs(&self, _tau: f64, y: &[f64], dy: &mut [f64]) {
        let pv = self.potential.evaluate(y[IDX_PHI]);

        let a = y[IDX_A];
        let dphi = y[IDX_DPHI];
        let a2v = a * a * pv.v;
        let a2dv = a * a * pv.dv;
        let ah = (FRIEDMANN_COEFF * (0.5 * dphi * dphi + a2v)).sqrt();

        dy[IDX_A] = a * ah;
        dy[IDX_PHI] = dphi;
        dy[IDX_DPHI] = -2.0 * ah * dphi - a2dv;

        if y.len() == BG_SIZE {
            return;
        }

        // Effective masses of the two oscillators.
        let a2ddv = a * a * pv.ddv;
        let zpp_over_z = 2.0 * ah * ah
            - a2ddv
            - 4.0 * PI * (7.0 * dphi * dphi + 4.0 * dphi / ah * a2dv)
            + 32.0 * PI * PI * dphi.powi(4) / (ah * ah);
        let app_over_a = 2.0 * ah * ah - 4.0 * PI * dphi * dphi;

        let k2 = self.k * self.k;

        // Curvature mode function.
        dy[IDX_KSI_RE] = y[IDX_DKSI_RE];
        dy[IDX_KSI_IM] = y[IDX_DKSI_IM];
        dy[IDX_DKSI_RE] = -(k2 - zpp_over_z) * y[IDX_KSI_RE];
        dy[IDX_DKSI_IM] = -(k2 - zpp_over_z) * y[IDX_KSI_IM];

        // Tensor mode function.
        dy[IDX_AH_RE] = y[IDX_DAH_RE];
        dy[IDX_AH_IM] = y[IDX_DAH_IM];
        dy[IDX_DAH_RE] = -(k2 - app_over_a) * y[IDX_AH_RE];
        dy[IDX_DAH_IM] = -(k2 - app_over_a) * y[IDX_AH_IM];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldState, FULL_SIZE};

    fn flat_potential() -> PolynomialPotential {
        PolynomialPotential::new(0.0, [1.0e-12, -1.0e-14, 0.0, 0.0, 0.0])
    }

    #[test]
    fn test_background_rates() {
        let pot = flat_potential();
        let derivs = InflatonDerivs::background(&pot);

        let y = [1.0, 0.0, 0.0];
        let mut dy = [0.0; BG_SIZE];
        derivs.rhs(0.0, &y, &mut dy);

        // At zero velocity: aH = sqrt(8 pi V / 3), da = a*aH,
        // dphi' = -a^2 dV > 0.
        let ah = (FRIEDMANN_COEFF * 1.0e-12).sqrt();
        assert!((dy[IDX_A] - ah).abs() / ah < 1e-12);
        assert_eq!(dy[IDX_PHI], 0.0);
        assert!((dy[IDX_DPHI] - 1.0e-14).abs() < 1e-26);
    }

    #[test]
    fn test_effective_masses_at_zero_velocity() {
        // With dphi = 0 and ddV = 0, both z''/z and a''/a reduce to
        // 2 (aH)^2, so ksi'' = -(k^2 - 2 aH^2) ksi.
        let pot = flat_potential();
        let k = 1.0e-3;
        let derivs = InflatonDerivs::for_mode(&pot, k);

        let mut state = FieldState::from_background(1.0, 0.0, 0.0);
        state.init_bunch_davies(k);
        let mut dy = [0.0; FULL_SIZE];
        derivs.rhs(0.0, &state.y, &mut dy);

        let ah2 = FRIEDMANN_COEFF * 1.0e-12;
        let expected = -(k * k - 2.0 * ah2) * state.y[IDX_KSI_RE];
        assert!((dy[IDX_DKSI_RE] - expected).abs() / expected.abs() < 1e-12);
        let expected_t = -(k * k - 2.0 * ah2) * state.y[IDX_AH_RE];
        assert!((dy[IDX_DAH_RE] - expected_t).abs() / expected_t.abs() < 1e-12);
    }

    #[test]
    fn test_deep_subhorizon_oscillator_limit() {
        // For k >> aH the mode equations approach ksi'' = -k^2 ksi.
        let pot = flat_potential();
        let k = 1.0;
        let derivs = InflatonDerivs::for_mode(&pot, k);

        let mut state = FieldState::from_background(1.0, 0.0, 0.0);
        state.init_bunch_davies(k);
        let mut dy = [0.0; FULL_SIZE];
        derivs.rhs(0.0, &state.y, &mut dy);

        let ratio = dy[IDX_DKSI_RE] / (-k * k * state.y[IDX_KSI_RE]);
        assert!((ratio - 1.0).abs() < 1e-10, "ratio {ratio}");
    }

    #[test]
    fn test_bg_slice_leaves_mode_slots_untouched() {
        let pot = flat_potential();
        let derivs = InflatonDerivs::background(&pot);
        let y = [1.0, 0.0, 1.0e-8];
        let mut dy = [f64::NAN; BG_SIZE];
        derivs.rhs(0.0, &y, &mut dy);
        assert!(dy.iter().all(|d| d.is_finite()));
    }
}
