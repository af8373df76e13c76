//! Configuration for a primordial spectrum computation.
//!
//! All inputs are immutable once the computation starts: the spectrum
//! model (analytic or simulated inflation), the pivot scale, the
//! requested k-range and sampling density, and the numerical-control
//! parameters of the inflaton solver.

use serde::{Deserialize, Serialize};

use crate::analytic::AnalyticParams;
use crate::constants::*;
use crate::error::{PrimordialError, PrimordialResult};
use crate::physics::potential::PolynomialPotential;
use crate::types::IcKind;

// ============================================================================
// Spectrum Model
// ============================================================================

/// How the primordial spectrum is obtained.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SpectrumModel {
    /// Closed-form parametric spectrum (amplitudes, tilts, runnings,
    /// cross-correlations).
    Analytic(AnalyticParams),
    /// First-principles simulation of inflaton perturbations in a
    /// polynomial potential.
    InflationPotential(PolynomialPotential),
}

// ============================================================================
// Numerical Controls
// ============================================================================

/// Numerical-control parameters of the inflaton simulation.
///
/// Defaults are conservative; every knob has a `with_*` builder.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PrecisionConfig {
    /// Background step-size factor (fraction of the local timescale).
    pub bg_stepsize: f64,
    /// Mode-integration step-size factor (fraction of the oscillation
    /// period).
    pub pt_stepsize: f64,
    /// Relative tolerance of the adaptive ODE stepper.
    pub tol_integration: f64,
    /// Attractor relative precision at the pivot.
    pub attractor_precision_pivot: f64,
    /// Attractor relative precision during the initial-field search.
    pub attractor_precision_initial: f64,
    /// Iteration cap of the attractor fixed-point loop.
    pub attractor_max_iter: u32,
    /// Iteration cap of the backward initial-field search.
    pub phi_ini_max_iter: u32,
    /// Sub-horizon ratio k/aH at which mode integration starts.
    pub ratio_min: f64,
    /// Super-horizon ratio k/aH below which a mode counts as frozen.
    pub ratio_max: f64,
    /// Tolerance on |d ln P_R / dN| for freeze-out detection.
    pub tol_curvature: f64,
    /// Scaling of the analytic jump in the backward field search.
    pub jump_initial: f64,
    /// Smallest allowed integration step.
    pub min_step: f64,
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            bg_stepsize: DEFAULT_BG_STEPSIZE,
            pt_stepsize: DEFAULT_PT_STEPSIZE,
            tol_integration: DEFAULT_TOL_INTEGRATION,
            attractor_precision_pivot: DEFAULT_ATTRACTOR_PRECISION_PIVOT,
            attractor_precision_initial: DEFAULT_ATTRACTOR_PRECISION_INITIAL,
            attractor_max_iter: DEFAULT_ATTRACTOR_MAX_ITER,
            phi_ini_max_iter: DEFAULT_PHI_INI_MAX_ITER,
            ratio_min: DEFAULT_RATIO_MIN,
            ratio_max: DEFAULT_RATIO_MAX,
            tol_curvature: DEFAULT_TOL_CURVATURE,
            jump_initial: DEFAULT_JUMP_INITIAL,
            min_step: DEFAULT_MIN_STEP,
        }
    }
}

impl PrecisionConfig {
    /// Default numerical controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the background step-size factor.
    pub fn with_bg_stepsize(mut self, factor: f64) -> Self {
        self.bg_stepsize = factor;
        self
    }

    /// Set the mode-integration step-size factor.
    pub fn with_pt_stepsize(mut self, factor: f64) -> Self {
        self.pt_stepsize = factor;
        self
    }

    /// Set the ODE stepper relative tolerance.
    pub fn with_tol_integration(mut self, tol: f64) -> Self {
        self.tol_integration = tol;
        self
    }

    /// Set both attractor precisions (pivot and initial-search).
    pub fn with_attractor_precision(mut self, pivot: f64, initial: f64) -> Self {
        self.attractor_precision_pivot = pivot;
        self.attractor_precision_initial = initial;
        self
    }

    /// Set the attractor iteration cap.
    pub fn with_attractor_max_iter(mut self, cap: u32) -> Self {
        self.attractor_max_iter = cap;
        self
    }

    /// Set the initial-field-search iteration cap.
    pub fn with_phi_ini_max_iter(mut self, cap: u32) -> Self {
        self.phi_ini_max_iter = cap;
        self
    }

    /// Set the horizon-crossing ratio bounds.
    pub fn with_ratio_bounds(mut self, ratio_min: f64, ratio_max: f64) -> Self {
        self.ratio_min = ratio_min;
        self.ratio_max = ratio_max;
        self
    }

    /// Set the curvature freeze-out tolerance.
    pub fn with_tol_curvature(mut self, tol: f64) -> Self {
        self.tol_curvature = tol;
        self
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> PrimordialResult<()> {
        if self.bg_stepsize <= 0.0 || self.pt_stepsize <= 0.0 {
            return Err(PrimordialError::InvalidConfig(
                "step-size factors must be positive".into(),
            ));
        }
        if self.tol_integration <= 0.0 {
            return Err(PrimordialError::InvalidConfig(
                "integration tolerance must be positive".into(),
            ));
        }
        if self.ratio_min <= 1.0 {
            return Err(PrimordialError::InvalidConfig(
                "ratio_min must exceed 1: modes start sub-horizon".into(),
            ));
        }
        if self.ratio_max >= 1.0 || self.ratio_max <= 0.0 {
            return Err(PrimordialError::InvalidConfig(
                "ratio_max must lie in (0, 1): modes finish super-horizon".into(),
            ));
        }
        if self.attractor_max_iter == 0 || self.phi_ini_max_iter == 0 {
            return Err(PrimordialError::InvalidConfig(
                "iteration caps must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Immutable input of one primordial spectrum computation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrimordialConfig {
    /// Spectrum model.
    pub model: SpectrumModel,
    /// Pivot wavenumber (1/Mpc).
    pub k_pivot: f64,
    /// Smallest requested wavenumber (1/Mpc).
    pub k_min: f64,
    /// Largest requested wavenumber (1/Mpc).
    pub k_max: f64,
    /// Sampling density of the spectrum table per decade of k.
    pub k_per_decade: f64,
    /// Requested scalar initial-condition kinds, in table order.
    pub scalar_ics: Vec<IcKind>,
    /// Whether tensor modes are requested.
    pub has_tensors: bool,
    /// Numerical controls of the inflaton simulation.
    pub precision: PrecisionConfig,
}

impl PrimordialConfig {
    /// Analytic spectrum over the given k-range.
    pub fn analytic(params: AnalyticParams) -> Self {
        Self {
            model: SpectrumModel::Analytic(params),
            k_pivot: DEFAULT_K_PIVOT,
            k_min: 1.0e-5,
            k_max: 1.0,
            k_per_decade: DEFAULT_K_PER_DECADE,
            scalar_ics: vec![IcKind::Adiabatic],
            has_tensors: false,
            precision: PrecisionConfig::default(),
        }
    }

    /// Simulated inflation in a polynomial potential. Scalar adiabatic
    /// and tensor modes are implied by this model.
    pub fn inflation(potential: PolynomialPotential) -> Self {
        Self {
            model: SpectrumModel::InflationPotential(potential),
            k_pivot: DEFAULT_K_PIVOT,
            k_min: 1.0e-5,
            k_max: 1.0,
            k_per_decade: DEFAULT_K_PER_DECADE,
            scalar_ics: vec![IcKind::Adiabatic],
            has_tensors: true,
            precision: PrecisionConfig::default(),
        }
    }

    /// Set the pivot wavenumber.
    pub fn with_k_pivot(mut self, k_pivot: f64) -> Self {
        self.k_pivot = k_pivot;
        self
    }

    /// Set the requested k-range.
    pub fn with_k_range(mut self, k_min: f64, k_max: f64) -> Self {
        self.k_min = k_min;
        self.k_max = k_max;
        self
    }

    /// Set the table sampling density per decade of k.
    pub fn with_k_per_decade(mut self, density: f64) -> Self {
        self.k_per_decade = density;
        self
    }

    /// Set the requested scalar initial-condition kinds.
    pub fn with_scalar_ics(mut self, ics: Vec<IcKind>) -> Self {
        self.scalar_ics = ics;
        self
    }

    /// Enable or disable tensor modes.
    pub fn with_tensors(mut self, on: bool) -> Self {
        self.has_tensors = on;
        self
    }

    /// Replace the numerical controls.
    pub fn with_precision(mut self, precision: PrecisionConfig) -> Self {
        self.precision = precision;
        self
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> PrimordialResult<()> {
        if self.k_min <= 0.0 || self.k_max <= 0.0 {
            return Err(PrimordialError::InvalidConfig(
                "k range bounds must be positive".into(),
            ));
        }
        if self.k_max <= self.k_min {
            return Err(PrimordialError::InvalidConfig(format!(
                "inconsistent k range: k_min={:e}, k_max={:e}",
                self.k_min, self.k_max
            )));
        }
        if self.k_pivot <= 0.0 {
            return Err(PrimordialError::InvalidConfig(
                "k_pivot must be positive".into(),
            ));
        }
        if self.k_per_decade <= MIN_K_PER_DECADE {
            return Err(PrimordialError::InvalidConfig(format!(
                "k_per_decade={:e} is too sparse a sampling of the spectrum",
                self.k_per_decade
            )));
        }
        if self.scalar_ics.is_empty() {
            return Err(PrimordialError::InvalidConfig(
                "at least one scalar initial-condition kind is required".into(),
            ));
        }
        self.precision.validate()?;

        if let SpectrumModel::InflationPotential(_) = self.model {
            if self.scalar_ics != [IcKind::Adiabatic] {
                return Err(PrimordialError::InvalidConfig(
                    "the inflation model produces adiabatic scalar modes only".into(),
                ));
            }
            if !self.has_tensors {
                return Err(PrimordialError::InvalidConfig(
                    "the inflation model requires tensor modes".into(),
                ));
            }
        }
        Ok(())
    }
}
