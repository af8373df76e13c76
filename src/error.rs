//! Fatal-error channel for the primordial spectrum computation.
//!
//! There is no recoverable tier: every invariant violation aborts the
//! whole spectrum computation and unwinds through the callers without
//! partial results.

use std::fmt;

use crate::types::ModeKind;

/// Errors that abort a primordial spectrum computation.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimordialError {
    /// Potential became non-positive at a visited field value.
    NegativePotential { phi: f64, v: f64 },
    /// Potential slope became non-negative at a visited field value.
    /// The whole solver assumes dV/dphi < 0 (field rolling toward
    /// larger phi).
    PositiveSlope { phi: f64, dv: f64 },
    /// The slow-roll parameter epsilon crossed unity during the
    /// observable e-folds: inflation is disrupted before the modes of
    /// interest freeze out.
    InflationEnded { phi: f64 },
    /// The attractor fixed-point iteration did not converge.
    AttractorNotFound {
        phi: f64,
        precision: f64,
        iterations: u32,
    },
    /// The backward shooting search could not place enough e-folds
    /// before the pivot scale.
    InsufficientEfolds { iterations: u32 },
    /// The prepared initial state is already inside the horizon of the
    /// smallest requested wavenumber.
    InitialStateTooLate { ah: f64, ah_required: f64 },
    /// Mode integration produced a non-positive power spectrum value.
    NonPositiveSpectrum { mode: ModeKind, k: f64, value: f64 },
    /// The adaptive stepper underflowed the minimum allowed step.
    StepUnderflow { tau: f64, step: f64 },
    /// A wavenumber query fell outside the tabulated range and no
    /// analytic fallback exists.
    KOutOfRange { k: f64, k_min: f64, k_max: f64 },
    /// Inconsistent configuration input.
    InvalidConfig(String),
}

impl fmt::Display for PrimordialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimordialError::NegativePotential { phi, v } => {
                write!(f, "potential becomes non-positive (V={v:e}) at phi={phi:e} before the end of observable inflation")
            }
            PrimordialError::PositiveSlope { phi, dv } => {
                write!(f, "potential slope dV/dphi={dv:e} at phi={phi:e} is non-negative; the solver requires dV/dphi < 0")
            }
            PrimordialError::InflationEnded { phi } => {
                write!(f, "slow-roll parameter crossed from epsilon<1 to epsilon>1 at phi={phi:e}: inflation disrupted during the observable e-folds")
            }
            PrimordialError::AttractorNotFound {
                phi,
                precision,
                iterations,
            } => {
                write!(f, "no attractor solution found near phi={phi:e} after {iterations} iterations: potential too steep in this region, or precision {precision:e} unreachable")
            }
            PrimordialError::InsufficientEfolds { iterations } => {
                write!(f, "could not find an initial field value after {iterations} iterations: the potential does not allow enough inflationary e-folds before the pivot scale")
            }
            PrimordialError::InitialStateTooLate { ah, ah_required } => {
                write!(f, "initial state has aH={ah:e}, already above the required {ah_required:e} for the smallest wavenumber")
            }
            PrimordialError::NonPositiveSpectrum { mode, k, value } => {
                write!(f, "non-positive {mode} spectrum ({value:e}) at k={k:e}: mode integration or setup failure")
            }
            PrimordialError::StepUnderflow { tau, step } => {
                write!(f, "integration step {step:e} underflowed the minimum allowed variation at tau={tau:e}")
            }
            PrimordialError::KOutOfRange { k, k_min, k_max } => {
                write!(f, "k={k:e} out of tabulated range [{k_min:e}, {k_max:e}]")
            }
            PrimordialError::InvalidConfig(msg) => {
                write!(f, "invalid configuration: {msg}")
            }
        }
    }
}

impl std::error::Error for PrimordialError {}

/// Result type alias for all spectrum operations.
pub type PrimordialResult<T> = Result<T, PrimordialError>;
