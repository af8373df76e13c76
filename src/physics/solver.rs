//! Spectrum assembly: drives the attractor search, the backward
//! shooting for the initial field value, and the per-wavenumber mode
//! integration over the whole k-grid.

use std::f64::consts::PI;

use log::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::PrecisionConfig;
use crate::error::{PrimordialError, PrimordialResult};
use crate::grid::KGrid;
use crate::physics::background::{evolve_to_phi, evolve_to_rate, find_attractor};
use crate::physics::dynamics::InflatonDerivs;
use crate::physics::modes::{integrate_mode, ModePower};
use crate::physics::potential::PolynomialPotential;
use crate::state::FieldState;

/// Log-spectrum tables produced by one inflation run.
#[derive(Clone, Debug)]
pub struct InflationSpectra {
    /// ln P_R(k) per grid node.
    pub lnpk_scalar: Vec<f64>,
    /// ln P_T(k) per grid node.
    pub lnpk_tensor: Vec<f64>,
}

/// One-shot solver tying a potential, numerical controls, and a k-grid
/// together.
pub struct InflationSolver<'a> {
    potential: &'a PolynomialPotential,
    precision: &'a PrecisionConfig,
    grid: &'a KGrid,
    k_pivot: f64,
}

impl<'a> InflationSolver<'a> {
    /// Create a solver. The pivot field value is the potential's
    /// expansion point.
    pub fn new(
        potential: &'a PolynomialPotential,
        precision: &'a PrecisionConfig,
        grid: &'a KGrid,
        k_pivot: f64,
    ) -> Self {
        Self {
            potential,
            precision,
            grid,
            k_pivot,
        }
    }

    /// Run the full computation: pivot attractor, forward reachability,
    /// backward shooting, then the per-k loop.
    pub fn solve(&self) -> PrimordialResult<InflationSpectra> {
        let phi_pivot = self.potential.phi_pivot;
        self.potential.check(phi_pivot)?;

        // Attractor at the pivot fixes the pivot-scale normalization
        // a_pivot = k_pivot / H_pivot.
        let pivot = find_attractor(
            self.potential,
            self.precision,
            phi_pivot,
            self.precision.attractor_precision_pivot,
        )?;
        let a_pivot = self.k_pivot / pivot.hubble;
        info!(
            "pivot attractor: H={:e}, dphi/dt={:e}",
            pivot.hubble, pivot.dphidt
        );

        // Project the pivot state forward to the largest required
        // rate: proves the potential sustains inflation long enough
        // for every mode to freeze out (fatal otherwise).
        let mut probe = FieldState::from_background(a_pivot, phi_pivot, a_pivot * pivot.dphidt);
        evolve_to_rate(
            self.potential,
            self.precision,
            &mut probe,
            self.grid.k_last() / self.precision.ratio_max,
        )?;

        let initial = self.shoot_before_pivot(a_pivot, pivot.hubble, pivot.dphidt)?;
        self.spectra(&initial)
    }

    /// Backward shooting search: walk the trial field value back until
    /// its attractor state, rescaled to the pivot normalization, puts
    /// the smallest wavenumber safely outside the starting horizon.
    fn shoot_before_pivot(
        &self,
        a_pivot: f64,
        h_pivot: f64,
        dphidt_pivot: f64,
    ) -> PrimordialResult<FieldState> {
        let phi_pivot = self.potential.phi_pivot;
        let ah_ini = self.grid.k_first() / self.precision.ratio_min;

        let mut a_try = a_pivot;
        let mut h_try = h_pivot;
        let mut phi_try = phi_pivot;
        let mut dphidt_try = dphidt_pivot;
        let mut counter = 0u32;

        while a_try * h_try >= ah_ini {
            counter += 1;
            if counter >= self.precision.phi_ini_max_iter {
                return Err(PrimordialError::InsufficientEfolds {
                    iterations: counter,
                });
            }

            // Analytic slow-roll jump, scaled by how far aH still is
            // from the target (dV < 0 moves phi_try backward).
            let pv = self.potential.evaluate(phi_try);
            phi_try +=
                self.precision.jump_initial * (a_try * h_try / ah_ini).ln() * pv.dv / pv.v
                    / (8.0 * PI);

            let att = find_attractor(
                self.potential,
                self.precision,
                phi_try,
                self.precision.attractor_precision_initial,
            )?;
            h_try = att.hubble;
            dphidt_try = att.dphidt;

            // Evolve the trial state to the pivot field value; the
            // growth factor ties the trial scale factor to a_pivot.
            let mut state = FieldState::from_background(1.0, phi_try, dphidt_try);
            evolve_to_phi(self.potential, self.precision, &mut state, phi_pivot)?;
            a_try = a_pivot / state.a();

            debug!(
                "shooting iteration {counter}: phi={phi_try:e}, aH={:e} (target {ah_ini:e})",
                a_try * h_try
            );
        }

        Ok(FieldState::from_background(
            a_try,
            phi_try,
            a_try * dphidt_try,
        ))
    }

    /// Per-k loop: from the common initial state, advance to slightly
    /// before horizon crossing and integrate the mode functions.
    fn spectra(&self, initial: &FieldState) -> PrimordialResult<InflationSpectra> {
        self.potential.check(initial.phi())?;

        let derivs = InflatonDerivs::background(self.potential);
        let ah = derivs.rate(&initial.y);
        let ah_required = self.grid.k_first() / self.precision.ratio_min;
        if ah >= ah_required {
            return Err(PrimordialError::InitialStateTooLate { ah, ah_required });
        }

        info!(
            "integrating {} modes over k in [{:e}, {:e}]",
            self.grid.len(),
            self.grid.k_first(),
            self.grid.k_last()
        );

        let compute_one = |k: f64| -> PrimordialResult<ModePower> {
            let mut state = initial.clone();
            evolve_to_rate(
                self.potential,
                self.precision,
                &mut state,
                k / self.precision.ratio_min,
            )?;
            integrate_mode(self.potential, self.precision, k, &mut state)
        };

        let ks = self.grid.k_values();

        #[cfg(feature = "parallel")]
        let powers: Vec<PrimordialResult<ModePower>> =
            ks.par_iter().map(|&k| compute_one(k)).collect();

        #[cfg(not(feature = "parallel"))]
        let powers: Vec<PrimordialResult<ModePower>> =
            ks.iter().map(|&k| compute_one(k)).collect();

        let mut lnpk_scalar = Vec::with_capacity(ks.len());
        let mut lnpk_tensor = Vec::with_capacity(ks.len());
        for (k, power) in ks.iter().zip(powers) {
            let power = power?;
            debug!(
                "k={k:e}: P_R={:e}, P_T={:e}",
                power.curvature, power.tensor
            );
            lnpk_scalar.push(power.curvature.ln());
            lnpk_tensor.push(power.tensor.ln());
        }

        Ok(InflationSpectra {
            lnpk_scalar,
            lnpk_tensor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_efolds_is_fatal() {
        // A one-iteration cap cannot move the start far enough back.
        let pot = PolynomialPotential::new(0.0, [1.0e-12, -2.0e-13, 0.0, 0.0, 0.0]);
        let precision = PrecisionConfig::default().with_phi_ini_max_iter(1);
        let grid = KGrid::new(1.0e-3, 0.1, 5.0).unwrap();
        let solver = InflationSolver::new(&pot, &precision, &grid, 0.05);

        match solver.solve() {
            Err(PrimordialError::InsufficientEfolds { .. }) => {}
            other => panic!("expected InsufficientEfolds, got {other:?}"),
        }
    }
}
