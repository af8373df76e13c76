//! Closed-form parametric primordial spectra.
//!
//! Each diagonal entry (one initial-condition kind with itself) is
//! P(k) = A exp((n-1) ln(k/k_pivot) + alpha/2 ln^2(k/k_pivot)); each
//! off-diagonal entry carries the correlation of a kind pair. Setup is
//! table-driven: a kind maps to its (amplitude, tilt, running) triple
//! and an unordered kind pair to its (correlation, tilt, running)
//! triple.

use serde::{Deserialize, Serialize};

use crate::error::{PrimordialError, PrimordialResult};
use crate::types::{pair_count, pair_index, IcKind};

// ============================================================================
// Input Parameters
// ============================================================================

/// Amplitude/tilt/running of one isocurvature kind, relative to the
/// adiabatic amplitude: the kind's amplitude is A_s * fraction^2.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IsocurvatureEntry {
    /// Entropy-to-curvature fraction f; contributes f^2 in power.
    pub fraction: f64,
    /// Spectral tilt of the kind.
    pub tilt: f64,
    /// Running of the tilt.
    pub running: f64,
}

/// Correlation of an unordered pair of initial-condition kinds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CorrelationEntry {
    /// Cross-correlation coefficient in [-1, 1]; 0 means uncorrelated.
    pub correlation: f64,
    /// Extra tilt of the cross term on top of the mean of the
    /// diagonal tilts.
    pub tilt: f64,
    /// Extra running of the cross term.
    pub running: f64,
}

/// Full parameter set of the analytic spectrum model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticParams {
    /// Adiabatic scalar amplitude at the pivot.
    pub a_s: f64,
    /// Adiabatic scalar tilt.
    pub n_s: f64,
    /// Adiabatic scalar running.
    pub alpha_s: f64,
    /// Tensor-to-scalar ratio at the pivot.
    pub r: f64,
    /// Tensor tilt (conventional definition, 0 when scale-invariant).
    pub n_t: f64,
    /// Tensor running.
    pub alpha_t: f64,
    /// Isocurvature entries by kind.
    isocurvature: Vec<(IcKind, IsocurvatureEntry)>,
    /// Correlation entries by unordered kind pair.
    correlations: Vec<(IcKind, IcKind, CorrelationEntry)>,
}

impl AnalyticParams {
    /// Purely adiabatic scalar spectrum.
    pub fn new(a_s: f64, n_s: f64) -> Self {
        Self {
            a_s,
            n_s,
            alpha_s: 0.0,
            r: 0.0,
            n_t: 0.0,
            alpha_t: 0.0,
            isocurvature: Vec::new(),
            correlations: Vec::new(),
        }
    }

    /// Set the scalar running.
    pub fn with_running(mut self, alpha_s: f64) -> Self {
        self.alpha_s = alpha_s;
        self
    }

    /// Set the tensor sector.
    pub fn with_tensor(mut self, r: f64, n_t: f64, alpha_t: f64) -> Self {
        self.r = r;
        self.n_t = n_t;
        self.alpha_t = alpha_t;
        self
    }

    /// Add (or replace) an isocurvature kind.
    pub fn with_isocurvature(
        mut self,
        kind: IcKind,
        fraction: f64,
        tilt: f64,
        running: f64,
    ) -> Self {
        self.isocurvature.retain(|(k, _)| *k != kind);
        self.isocurvature.push((
            kind,
            IsocurvatureEntry {
                fraction,
                tilt,
                running,
            },
        ));
        self
    }

    /// Add (or replace) a cross-correlation between two kinds.
    pub fn with_correlation(
        mut self,
        kind_a: IcKind,
        kind_b: IcKind,
        correlation: f64,
        tilt: f64,
        running: f64,
    ) -> Self {
        self.correlations
            .retain(|(a, b, _)| !same_pair(*a, *b, kind_a, kind_b));
        self.correlations.push((
            kind_a,
            kind_b,
            CorrelationEntry {
                correlation,
                tilt,
                running,
            },
        ));
        self
    }

    /// Diagonal triple of one kind.
    fn diagonal(&self, kind: IcKind) -> PrimordialResult<(f64, f64, f64)> {
        if kind == IcKind::Adiabatic {
            return Ok((self.a_s, self.n_s, self.alpha_s));
        }
        self.isocurvature
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, e)| (self.a_s * e.fraction * e.fraction, e.tilt, e.running))
            .ok_or_else(|| {
                PrimordialError::InvalidConfig(format!(
                    "no amplitude configured for initial condition '{kind}'"
                ))
            })
    }

    /// Correlation triple of an unordered pair, zero when unset.
    fn correlation(&self, kind_a: IcKind, kind_b: IcKind) -> CorrelationEntry {
        self.correlations
            .iter()
            .find(|(a, b, _)| same_pair(*a, *b, kind_a, kind_b))
            .map(|(_, _, e)| *e)
            .unwrap_or(CorrelationEntry {
                correlation: 0.0,
                tilt: 0.0,
                running: 0.0,
            })
    }
}

fn same_pair(a: IcKind, b: IcKind, x: IcKind, y: IcKind) -> bool {
    (a == x && b == y) || (a == y && b == x)
}

// ============================================================================
// Condensed Coefficients
// ============================================================================

/// Condensed per-pair coefficients of one mode, ready for fast
/// closed-form evaluation.
#[derive(Clone, Debug)]
pub struct AnalyticCoeffs {
    /// Number of initial-condition kinds.
    pub n_ic: usize,
    /// Packed upper-triangular amplitude per pair.
    pub amplitude: Vec<f64>,
    /// Packed tilt per pair (the (tilt - 1) convention of the
    /// evaluation formula, tensors included).
    pub tilt: Vec<f64>,
    /// Packed running per pair.
    pub running: Vec<f64>,
    /// Whether a pair carries any power at all.
    pub is_non_zero: Vec<bool>,
}

impl AnalyticCoeffs {
    /// Condense the scalar sector for the requested kinds, in order.
    pub fn scalar(params: &AnalyticParams, ics: &[IcKind]) -> PrimordialResult<Self> {
        let n = ics.len();
        let size = pair_count(n);
        let mut coeffs = Self {
            n_ic: n,
            amplitude: vec![0.0; size],
            tilt: vec![0.0; size],
            running: vec![0.0; size],
            is_non_zero: vec![false; size],
        };

        // Diagonal entries first; cross terms reference them.
        for (i, &kind) in ics.iter().enumerate() {
            let (amplitude, tilt, running) = params.diagonal(kind)?;
            if amplitude <= 0.0 {
                return Err(PrimordialError::InvalidConfig(format!(
                    "non-positive amplitude {amplitude:e} for initial condition '{kind}'"
                )));
            }
            let idx = pair_index(i, i, n);
            coeffs.amplitude[idx] = amplitude;
            coeffs.tilt[idx] = tilt;
            coeffs.running[idx] = running;
            coeffs.is_non_zero[idx] = true;
        }

        for (i, &kind_a) in ics.iter().enumerate() {
            for (j, &kind_b) in ics.iter().enumerate().skip(i + 1) {
                let entry = params.correlation(kind_a, kind_b);
                if !(-1.0..=1.0).contains(&entry.correlation) {
                    return Err(PrimordialError::InvalidConfig(format!(
                        "cross-correlation {:e} of '{kind_a}' x '{kind_b}' outside [-1, 1]",
                        entry.correlation
                    )));
                }

                let idx = pair_index(i, j, n);
                if entry.correlation == 0.0 {
                    continue;
                }

                let ii = pair_index(i, i, n);
                let jj = pair_index(j, j, n);
                coeffs.amplitude[idx] =
                    (coeffs.amplitude[ii] * coeffs.amplitude[jj]).sqrt() * entry.correlation;
                coeffs.tilt[idx] = 0.5 * (coeffs.tilt[ii] + coeffs.tilt[jj]) + entry.tilt;
                coeffs.running[idx] =
                    0.5 * (coeffs.running[ii] + coeffs.running[jj]) + entry.running;
                coeffs.is_non_zero[idx] = true;
            }
        }

        Ok(coeffs)
    }

    /// Condense the tensor sector (a single kind). The stored tilt is
    /// n_t + 1 so evaluation can share the (tilt - 1) convention of
    /// the scalar sector.
    pub fn tensor(params: &AnalyticParams) -> PrimordialResult<Self> {
        let amplitude = params.a_s * params.r;
        if amplitude <= 0.0 {
            return Err(PrimordialError::InvalidConfig(format!(
                "non-positive tensor amplitude A_s*r = {amplitude:e}"
            )));
        }
        Ok(Self {
            n_ic: 1,
            amplitude: vec![amplitude],
            tilt: vec![params.n_t + 1.0],
            running: vec![params.alpha_t],
            is_non_zero: vec![true],
        })
    }

    /// Closed-form spectrum of one pair at wavenumber k.
    pub fn evaluate(&self, pair: usize, k: f64, k_pivot: f64) -> f64 {
        if !self.is_non_zero[pair] {
            return 0.0;
        }
        let lnk_ratio = (k / k_pivot).ln();
        self.amplitude[pair]
            * ((self.tilt[pair] - 1.0) * lnk_ratio
                + 0.5 * self.running[pair] * lnk_ratio * lnk_ratio)
                .exp()
    }
}
