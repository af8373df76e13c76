//! Per-wavenumber mode-function integration.
//!
//! Starting from the Bunch-Davies vacuum deep inside the horizon, the
//! coupled scalar and tensor mode functions are integrated forward
//! together with the background until the mode is well outside the
//! horizon AND the curvature spectrum has stopped evolving per e-fold.

use std::f64::consts::PI;

use crate::config::PrecisionConfig;
use crate::constants::{CURVATURE_NORM, TENSOR_NORM};
use crate::error::{PrimordialError, PrimordialResult};
use crate::integrator::{AdaptiveIntegrator, OdeSystem};
use crate::physics::dynamics::InflatonDerivs;
use crate::physics::potential::PolynomialPotential;
use crate::state::{FieldState, FULL_SIZE, IDX_A, IDX_DKSI_RE, IDX_KSI_RE};
use crate::types::ModeKind;

/// Super-horizon power extracted from one mode integration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModePower {
    /// Dimensionless curvature spectrum P_R(k).
    pub curvature: f64,
    /// Dimensionless tensor spectrum P_T(k).
    pub tensor: f64,
}

/// Step size from the local oscillation frequency:
/// dtau = factor * 2 pi / max(sqrt(|ksi''/ksi|), k).
#[inline]
fn oscillation_step(precision: &PrecisionConfig, y: &[f64], dy: &[f64], k: f64) -> f64 {
    let freq = (dy[IDX_DKSI_RE] / y[IDX_KSI_RE]).abs().sqrt().max(k);
    precision.pt_stepsize * 2.0 * PI / freq
}

/// Integrate the scalar and tensor mode functions for one wavenumber.
///
/// `state` must carry a background already advanced to slightly before
/// horizon crossing (k/aH near `ratio_min`); its perturbation slots are
/// overwritten with the Bunch-Davies vacuum here. The state is
/// destructively advanced in place.
///
/// Termination requires both conditions: k/aH below `ratio_max`
/// (horizon crossed by the configured margin) and |d ln P_R / dN|
/// below `tol_curvature` (spectrum frozen). Non-positive output power
/// is fatal.
pub fn integrate_mode(
    potential: &PolynomialPotential,
    precision: &PrecisionConfig,
    k: f64,
    state: &mut FieldState,
) -> PrimordialResult<ModePower> {
    let derivs = InflatonDerivs::for_mode(potential, k);
    let mut integrator =
        AdaptiveIntegrator::new(FULL_SIZE, precision.tol_integration, precision.min_step);
    let mut dy = [0.0; FULL_SIZE];

    state.init_bunch_davies(k);

    let mut curvature_new = 1.0e10;
    let mut tau_end = 0.0;

    derivs.rhs(tau_end, &state.y, &mut dy);
    let mut dtau = oscillation_step(precision, &state.y, &dy, k);

    loop {
        let tau_start = tau_end;
        tau_end = tau_start + dtau;

        integrator.integrate(&derivs, tau_start, tau_end, &mut state.y)?;

        derivs.rhs(tau_end, &state.y, &mut dy);
        dtau = oscillation_step(precision, &state.y, &dy, k);

        let ah = dy[IDX_A] / state.y[IDX_A];

        let curvature_old = curvature_new;
        let z = state.a() * state.dphi() / ah;
        curvature_new = k * k * k * CURVATURE_NORM * state.ksi_norm_sq() / (z * z);

        // Fractional change per e-fold: dN = aH dtau.
        let dlnp_dn = (curvature_new - curvature_old) / dtau / ah / curvature_new;

        if k / ah < precision.ratio_max && dlnp_dn.abs() <= precision.tol_curvature {
            break;
        }
    }

    if curvature_new <= 0.0 {
        return Err(PrimordialError::NonPositiveSpectrum {
            mode: ModeKind::Scalar,
            k,
            value: curvature_new,
        });
    }

    let a = state.a();
    let tensor = TENSOR_NORM * k * k * k * state.ah_norm_sq() / (a * a);
    if tensor <= 0.0 {
        return Err(PrimordialError::NonPositiveSpectrum {
            mode: ModeKind::Tensor,
            k,
            value: tensor,
        });
    }

    Ok(ModePower {
        curvature: curvature_new,
        tensor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::background::find_attractor;

    #[test]
    fn test_mode_power_positive_and_tensor_suppressed() {
        // Gentle slow roll: both spectra positive, tensors suppressed
        // by r = 16 epsilon << 1.
        let pot = PolynomialPotential::new(0.0, [1.0e-12, -2.0e-13, 0.0, 0.0, 0.0]);
        let precision = PrecisionConfig::default();
        let k = 0.05;

        let att = find_attractor(&pot, &precision, 0.0, 1e-3).unwrap();
        // Place the mode deep inside the horizon: k/aH = ratio_min.
        let a = k / (precision.ratio_min * att.hubble);
        let mut state = FieldState::from_background(a, 0.0, a * att.dphidt);

        let power = integrate_mode(&pot, &precision, k, &mut state).unwrap();
        assert!(power.curvature > 0.0);
        assert!(power.tensor > 0.0);
        assert!(
            power.tensor < power.curvature,
            "slow roll must suppress tensors: P_T={:e} P_R={:e}",
            power.tensor,
            power.curvature
        );
    }

    #[test]
    fn test_mode_ends_outside_horizon() {
        let pot = PolynomialPotential::new(0.0, [1.0e-12, -2.0e-13, 0.0, 0.0, 0.0]);
        let precision = PrecisionConfig::default();
        let k = 0.05;

        let att = find_attractor(&pot, &precision, 0.0, 1e-3).unwrap();
        let a = k / (precision.ratio_min * att.hubble);
        let mut state = FieldState::from_background(a, 0.0, a * att.dphidt);

        integrate_mode(&pot, &precision, k, &mut state).unwrap();

        let derivs = InflatonDerivs::for_mode(&pot, k);
        let ah = derivs.rate(&state.y);
        assert!(k / ah < precision.ratio_max);
    }
}
