//! Primordial power spectrum of cosmological perturbations.
//!
//! Computes the initial-condition input of a Boltzmann/CMB pipeline in
//! two modes:
//!
//! - **Analytic**: closed-form parametric spectra (amplitudes, tilts,
//!   runnings, cross-correlations between initial-condition kinds).
//! - **Inflation**: first-principles simulation of a single-field
//!   inflaton in a polynomial potential V(phi): slow-roll attractor
//!   search, background e-folding evolution, and per-wavenumber
//!   integration of the curvature and tensor mode functions from the
//!   Bunch-Davies vacuum to super-horizon freeze-out.
//!
//! Either way the result is a table of ln P(k) over a log-spaced
//! k-grid, served through cubic-spline interpolation, plus (for
//! simulated spectra) the derived phenomenology A_s, n_s, alpha_s, r,
//! n_t, alpha_t.
//!
//! # Example
//!
//! ```rust,ignore
//! use primordial_spectrum::{PolynomialPotential, Primordial, PrimordialConfig};
//!
//! // Flat slow-roll potential tuned to n_s ~ 0.96.
//! let potential = PolynomialPotential::new(0.0, [5.2e-12, -3.0e-12, 0.0, 0.0, 0.0]);
//! let config = PrimordialConfig::inflation(potential)
//!     .with_k_range(1.0e-4, 1.0)
//!     .with_k_pivot(0.05);
//!
//! let pm = Primordial::compute(config)?;
//! let p_r = pm.scalar_power(0.05)?;
//! let derived = pm.derived().unwrap();
//! println!("A_s = {:e}, n_s = {}", derived.a_s, derived.n_s);
//! ```
//!
//! # Parallelism
//!
//! The per-wavenumber mode integrations are independent given the
//! shared initial state; the `parallel` feature fans them out across a
//! rayon pool, one private state copy per task.

// Core modules
pub mod config;
pub mod constants;
pub mod error;
pub mod grid;
pub mod state;
pub mod types;

// Numerics
pub mod integrator;
pub mod spline;

// Inflaton simulation
pub mod physics;

// Spectrum models and lookup
pub mod analytic;
pub mod spectrum;

// Comprehensive test suite
#[cfg(test)]
pub mod tests;

// Re-exports for convenience
pub use analytic::{AnalyticCoeffs, AnalyticParams, CorrelationEntry, IsocurvatureEntry};
pub use config::{PrecisionConfig, PrimordialConfig, SpectrumModel};
pub use error::{PrimordialError, PrimordialResult};
pub use grid::KGrid;
pub use integrator::{AdaptiveIntegrator, OdeSystem};
pub use physics::{
    find_attractor, integrate_mode, Attractor, InflationSolver, InflationSpectra, ModePower,
    PolynomialPotential, SlowRollPrediction,
};
pub use spectrum::{DerivedParams, Primordial};
pub use state::FieldState;
pub use types::{pair_count, pair_index, Convergence, IcKind, ModeKind, SpectrumFormat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
