//! Inflaton physics: potential, phase-space derivatives, background
//! evolution, per-wavenumber mode integration, and the full spectrum
//! solver.

pub mod background;
pub mod dynamics;
pub mod modes;
pub mod potential;
pub mod solver;

pub use background::{evolve_to_phi, evolve_to_rate, find_attractor, Attractor};
pub use dynamics::InflatonDerivs;
pub use modes::{integrate_mode, ModePower};
pub use potential::{PolynomialPotential, PotentialValues, SlowRollPrediction};
pub use solver::{InflationSolver, InflationSpectra};
