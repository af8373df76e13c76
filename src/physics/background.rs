//! Background evolution, slow-roll attractor search, and
//! horizon-crossing tracking.
//!
//! All three routines share the same machinery: the background subset
//! of the phase-space vector, the adaptive step
//! dtau = factor * min(1/aH, |dphi / ddphi|) recomputed from the
//! current derivatives every step, and the external adaptive stepper
//! for the step itself. They differ only in the loop condition.

use std::f64::consts::PI;

use log::debug;

use crate::config::PrecisionConfig;
use crate::error::{PrimordialError, PrimordialResult};
use crate::integrator::{AdaptiveIntegrator, OdeSystem};
use crate::physics::dynamics::InflatonDerivs;
use crate::physics::potential::PolynomialPotential;
use crate::state::{FieldState, BG_SIZE, IDX_A, IDX_DPHI, IDX_PHI};
use crate::types::Convergence;

/// Converged slow-roll attractor at one field value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attractor {
    /// Hubble rate H there.
    pub hubble: f64,
    /// Proper field velocity dphi/dt there.
    pub dphidt: f64,
}

/// Adaptive background step from the current derivatives.
#[inline]
fn background_step(precision: &PrecisionConfig, y: &[f64], dy: &[f64]) -> f64 {
    let ah = dy[IDX_A] / y[IDX_A];
    precision.bg_stepsize * (1.0 / ah).min((y[IDX_DPHI] / dy[IDX_DPHI]).abs())
}

/// Advance the background until the field reaches `phi_stop`.
///
/// The target is assumed reachable by forward integration: the
/// potential-sign invariant gives dphi/dtau a definite positive sign.
/// Stops one step short of overshooting, then lands on `phi_stop`
/// exactly with a linear correction. Fatal on a potential-check
/// violation or when the slow-roll parameter crosses unity.
pub fn evolve_to_phi(
    potential: &PolynomialPotential,
    precision: &PrecisionConfig,
    state: &mut FieldState,
    phi_stop: f64,
) -> PrimordialResult<()> {
    let derivs = InflatonDerivs::background(potential);
    let mut integrator =
        AdaptiveIntegrator::new(BG_SIZE, precision.tol_integration, precision.min_step);
    let mut dy = [0.0; BG_SIZE];

    let mut epsilon = potential.epsilon(state.phi());
    let mut tau_end = 0.0;

    derivs.rhs(tau_end, &state.y[..BG_SIZE], &mut dy);
    let mut dtau = background_step(precision, &state.y, &dy);

    while state.phi() <= phi_stop - state.dphi() * dtau {
        potential.check(state.phi())?;

        let tau_start = tau_end;
        derivs.rhs(tau_start, &state.y[..BG_SIZE], &mut dy);
        dtau = background_step(precision, &state.y, &dy);
        tau_end = tau_start + dtau;

        integrator.integrate(&derivs, tau_start, tau_end, &mut state.y[..BG_SIZE])?;

        let epsilon_old = epsilon;
        epsilon = potential.epsilon(state.phi());
        if epsilon > 1.0 && epsilon_old <= 1.0 {
            return Err(PrimordialError::InflationEnded { phi: state.phi() });
        }
    }

    // One more step would overshoot: land on phi_stop exactly by
    // linear extrapolation along the current derivatives.
    derivs.rhs(tau_end, &state.y[..BG_SIZE], &mut dy);
    let dtau_land = (phi_stop - state.phi()) / dy[IDX_PHI];
    for i in 0..BG_SIZE {
        state.y[i] += dy[i] * dtau_land;
    }

    Ok(())
}

/// Advance the background forward in time until the comoving Hubble
/// rate aH reaches `ah_stop`.
///
/// Same stepping machinery as [`evolve_to_phi`], but the loop condition
/// is on aH rather than on the field value, and there is no landing
/// correction.
pub fn evolve_to_rate(
    potential: &PolynomialPotential,
    precision: &PrecisionConfig,
    state: &mut FieldState,
    ah_stop: f64,
) -> PrimordialResult<()> {
    let derivs = InflatonDerivs::background(potential);
    let mut integrator =
        AdaptiveIntegrator::new(BG_SIZE, precision.tol_integration, precision.min_step);
    let mut dy = [0.0; BG_SIZE];

    let mut tau_end = 0.0;
    derivs.rhs(tau_end, &state.y[..BG_SIZE], &mut dy);

    while dy[IDX_A] / state.a() < ah_stop {
        potential.check(state.phi())?;

        let tau_start = tau_end;
        derivs.rhs(tau_start, &state.y[..BG_SIZE], &mut dy);
        let dtau = background_step(precision, &state.y, &dy);
        tau_end = tau_start + dtau;

        integrator.integrate(&derivs, tau_start, tau_end, &mut state.y[..BG_SIZE])?;

        derivs.rhs(tau_end, &state.y[..BG_SIZE], &mut dy);
    }

    Ok(())
}

/// Find the slow-roll attractor velocity at `phi_0` to the given
/// relative precision.
///
/// Start from the analytic slow-roll velocity at a trial point before
/// `phi_0`, then iterate: push the trial point further back by a fixed
/// analytic step informed by dV/V, evolve the background forward to
/// `phi_0`, and read off the arrival velocity. Successive arrival
/// velocities converge onto the attractor independently of the unknown
/// initial conditions far in the past.
pub fn find_attractor(
    potential: &PolynomialPotential,
    precision: &PrecisionConfig,
    phi_0: f64,
    target: f64,
) -> PrimordialResult<Attractor> {
    let pv0 = potential.check(phi_0)?;

    let mut dphidt_new = potential.slow_roll_velocity(phi_0);
    let mut dphidt_old = dphidt_new / (target + 2.0);
    let mut phi = phi_0;
    let mut iterations = 0u32;

    let outcome = loop {
        if (dphidt_new / dphidt_old - 1.0).abs() < target {
            break Convergence::Converged(dphidt_new);
        }

        iterations += 1;
        if iterations >= precision.attractor_max_iter {
            break Convergence::IterationsExceeded {
                limit: precision.attractor_max_iter,
            };
        }

        dphidt_old = dphidt_new;

        // Fixed analytic backward jump; dV < 0 moves the trial point
        // to smaller phi, i.e. earlier in the roll.
        phi += pv0.dv / pv0.v / (16.0 * PI);
        potential.check(phi)?;

        let mut state = FieldState::from_background(1.0, phi, potential.slow_roll_velocity(phi));
        evolve_to_phi(potential, precision, &mut state, phi_0)?;

        dphidt_new = state.dphi() / state.a();
    };

    match outcome {
        Convergence::Converged(dphidt) => {
            let hubble = ((8.0 * PI / 3.0) * (0.5 * dphidt * dphidt + pv0.v)).sqrt();
            debug!("attractor at phi={phi_0:e}: H={hubble:e}, dphidt={dphidt:e} ({iterations} iterations)");
            Ok(Attractor { hubble, dphidt })
        }
        Convergence::IterationsExceeded { limit } => Err(PrimordialError::AttractorNotFound {
            phi: phi_0,
            precision: target,
            iterations: limit,
        }),
    }
}
