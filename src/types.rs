//! Core enumerations and index arithmetic shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Perturbation Modes
// ============================================================================

/// Perturbation mode the spectrum refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    /// Scalar (curvature) perturbations.
    Scalar,
    /// Tensor (gravitational wave) perturbations.
    Tensor,
}

impl ModeKind {
    /// All modes, in table order.
    pub const ALL: [ModeKind; 2] = [ModeKind::Scalar, ModeKind::Tensor];
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::Scalar => write!(f, "scalar"),
            ModeKind::Tensor => write!(f, "tensor"),
        }
    }
}

// ============================================================================
// Initial-Condition Kinds
// ============================================================================

/// Initial-condition type of a scalar perturbation.
///
/// The adiabatic mode is always first; isocurvature kinds follow in
/// this fixed order wherever a table is indexed by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IcKind {
    /// Adiabatic.
    Adiabatic,
    /// Baryon isocurvature.
    BaryonIso,
    /// Cold dark matter isocurvature.
    CdmIso,
    /// Neutrino density isocurvature.
    NeutrinoDensityIso,
    /// Neutrino velocity isocurvature.
    NeutrinoVelocityIso,
}

impl IcKind {
    /// Short conventional label.
    pub fn label(&self) -> &'static str {
        match self {
            IcKind::Adiabatic => "ad",
            IcKind::BaryonIso => "bi",
            IcKind::CdmIso => "cdi",
            IcKind::NeutrinoDensityIso => "nid",
            IcKind::NeutrinoVelocityIso => "niv",
        }
    }
}

impl fmt::Display for IcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Query Format
// ============================================================================

/// Whether a spectrum query takes/returns linear or logarithmic values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpectrumFormat {
    /// Input k, output P(k).
    Linear,
    /// Input ln k, output ln P(k) on the diagonal; cross-correlation
    /// angles off-diagonal.
    Logarithmic,
}

// ============================================================================
// Iteration Outcome
// ============================================================================

/// Outcome of a capped convergence loop.
///
/// Loops retry internally against their own iteration cap but never
/// recover from cap exhaustion; callers convert `IterationsExceeded`
/// into the fatal error channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Convergence<T> {
    /// The loop converged to a value.
    Converged(T),
    /// The iteration cap was reached without convergence.
    IterationsExceeded { limit: u32 },
}

// ============================================================================
// Symmetric Pair Indexing
// ============================================================================

/// Linear offset of the pair (i, j) in a packed upper-triangular
/// symmetric matrix of dimension n.
///
/// Invariant: `i <= j < n`. Pairs are laid out row by row:
/// (0,0), (0,1), ..., (0,n-1), (1,1), ..., (n-1,n-1).
#[inline]
pub fn pair_index(i: usize, j: usize, n: usize) -> usize {
    debug_assert!(i <= j && j < n, "pair_index requires i <= j < n");
    i * n - (i * i - i) / 2 + (j - i)
}

/// Number of unordered pairs (with repetition) of n initial conditions.
#[inline]
pub fn pair_count(n: usize) -> usize {
    n * (n + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_index_dense_coverage() {
        // Every (i, j) with i <= j maps to a distinct offset in [0, pair_count).
        for n in 1..6 {
            let mut seen = vec![false; pair_count(n)];
            for i in 0..n {
                for j in i..n {
                    let idx = pair_index(i, j, n);
                    assert!(idx < pair_count(n));
                    assert!(!seen[idx], "collision at ({i},{j}) for n={n}");
                    seen[idx] = true;
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn test_pair_index_diagonal_first_row() {
        assert_eq!(pair_index(0, 0, 5), 0);
        assert_eq!(pair_index(0, 4, 5), 4);
        assert_eq!(pair_index(1, 1, 5), 5);
        assert_eq!(pair_index(4, 4, 5), 14);
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(1), 1);
        assert_eq!(pair_count(2), 3);
        assert_eq!(pair_count(5), 15);
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(ModeKind::Scalar.to_string(), "scalar");
        assert_eq!(IcKind::CdmIso.to_string(), "cdi");
    }
}
