//! The primordial spectrum context: configuration, k-grid, tabulated
//! log-spectra, spline coefficients, and derived phenomenology.
//!
//! [`Primordial::compute`] builds the whole table once (closed-form
//! evaluation in the analytic model, inflaton simulation otherwise);
//! [`Primordial::spectrum_at_k`] then serves interpolated queries at
//! any wavenumber. There is no process-wide state: everything lives in
//! this context object.

use log::info;
use serde::{Deserialize, Serialize};

use crate::analytic::AnalyticCoeffs;
use crate::config::{PrimordialConfig, SpectrumModel};
use crate::constants::finite_diff_dlnk;
use crate::error::{PrimordialError, PrimordialResult};
use crate::grid::KGrid;
use crate::physics::solver::InflationSolver;
use crate::spline::{spline_interpolate, spline_second_derivs};
use crate::types::{pair_count, pair_index, ModeKind, SpectrumFormat};

// ============================================================================
// Derived Phenomenology
// ============================================================================

/// Phenomenological numbers read off a simulated spectrum around the
/// pivot by two-sided finite differencing in log-k.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DerivedParams {
    /// Scalar amplitude at the pivot.
    pub a_s: f64,
    /// Scalar tilt.
    pub n_s: f64,
    /// Scalar running.
    pub alpha_s: f64,
    /// Tensor-to-scalar ratio at the pivot.
    pub r: f64,
    /// Tensor tilt.
    pub n_t: f64,
    /// Tensor running.
    pub alpha_t: f64,
}

// ============================================================================
// Per-Mode Table
// ============================================================================

/// Tabulated log-spectrum of one perturbation mode.
///
/// Columns are packed symmetric pairs of initial conditions: the
/// diagonal stores ln P(k); off-diagonal columns store the
/// cross-correlation angle cos Delta = P_12 / sqrt(P_11 P_22), which
/// stays finite and bounded even when the cross spectrum is negative.
#[derive(Clone, Debug)]
struct ModeTable {
    n_ic: usize,
    is_non_zero: Vec<bool>,
    /// Table values per pair column, one entry per grid node.
    lnpk: Vec<Vec<f64>>,
    /// Spline second derivatives per pair column.
    ddlnpk: Vec<Vec<f64>>,
    /// Closed-form coefficients for out-of-range queries (analytic
    /// model only).
    analytic: Option<AnalyticCoeffs>,
}

impl ModeTable {
    /// Number of pair columns.
    fn pair_size(&self) -> usize {
        self.lnpk.len()
    }

    /// Tabulate an analytic mode over the grid.
    fn from_analytic(grid: &KGrid, k_pivot: f64, coeffs: AnalyticCoeffs) -> Self {
        let n = coeffs.n_ic;
        let size = pair_count(n);
        let mut lnpk = vec![vec![0.0; grid.len()]; size];

        for i in 0..n {
            for j in i..n {
                let idx = pair_index(i, j, n);
                if !coeffs.is_non_zero[idx] {
                    continue;
                }
                for ik in 0..grid.len() {
                    let k = grid.k_at(ik);
                    let pk = coeffs.evaluate(idx, k, k_pivot);
                    lnpk[idx][ik] = if i == j {
                        pk.ln()
                    } else {
                        let p1 = coeffs.evaluate(pair_index(i, i, n), k, k_pivot);
                        let p2 = coeffs.evaluate(pair_index(j, j, n), k, k_pivot);
                        pk / (p1 * p2).sqrt()
                    };
                }
            }
        }

        let ddlnpk = lnpk
            .iter()
            .map(|col| spline_second_derivs(grid.lnk(), col))
            .collect();

        Self {
            n_ic: n,
            is_non_zero: coeffs.is_non_zero.clone(),
            lnpk,
            ddlnpk,
            analytic: Some(coeffs),
        }
    }

    /// Wrap a simulated single-ic log-spectrum.
    fn from_simulated(grid: &KGrid, lnpk: Vec<f64>) -> Self {
        let ddlnpk = vec![spline_second_derivs(grid.lnk(), &lnpk)];
        Self {
            n_ic: 1,
            is_non_zero: vec![true],
            lnpk: vec![lnpk],
            ddlnpk,
            analytic: None,
        }
    }
}

// ============================================================================
// Primordial Context
// ============================================================================

/// Computed primordial spectra, ready for interpolated lookup.
pub struct Primordial {
    config: PrimordialConfig,
    grid: KGrid,
    scalar: ModeTable,
    tensor: Option<ModeTable>,
    derived: Option<DerivedParams>,
}

impl Primordial {
    /// Build the spectrum tables for the given configuration.
    pub fn compute(config: PrimordialConfig) -> PrimordialResult<Self> {
        config.validate()?;
        let grid = KGrid::new(config.k_min, config.k_max, config.k_per_decade)?;

        let (scalar, tensor) = match &config.model {
            SpectrumModel::Analytic(params) => {
                info!("computing primordial spectra (analytic spectrum)");
                let scalar = ModeTable::from_analytic(
                    &grid,
                    config.k_pivot,
                    AnalyticCoeffs::scalar(params, &config.scalar_ics)?,
                );
                let tensor = if config.has_tensors {
                    Some(ModeTable::from_analytic(
                        &grid,
                        config.k_pivot,
                        AnalyticCoeffs::tensor(params)?,
                    ))
                } else {
                    None
                };
                (scalar, tensor)
            }
            SpectrumModel::InflationPotential(potential) => {
                info!("computing primordial spectra (simulating inflation)");
                let solver =
                    InflationSolver::new(potential, &config.precision, &grid, config.k_pivot);
                let spectra = solver.solve()?;
                (
                    ModeTable::from_simulated(&grid, spectra.lnpk_scalar),
                    Some(ModeTable::from_simulated(&grid, spectra.lnpk_tensor)),
                )
            }
        };

        let mut this = Self {
            config,
            grid,
            scalar,
            tensor,
            derived: None,
        };

        if matches!(this.config.model, SpectrumModel::InflationPotential(_)) {
            let derived = this.derive_params()?;
            info!(
                " -> A_s={:e}  n_s={}  alpha_s={}",
                derived.a_s, derived.n_s, derived.alpha_s
            );
            info!(
                " -> r={:e}  n_t={}  alpha_t={}",
                derived.r, derived.n_t, derived.alpha_t
            );
            this.derived = Some(derived);
        }

        Ok(this)
    }

    /// The configuration the tables were built from.
    pub fn config(&self) -> &PrimordialConfig {
        &self.config
    }

    /// The wavenumber grid of the tables.
    pub fn k_grid(&self) -> &KGrid {
        &self.grid
    }

    /// Derived phenomenology (simulated spectra only).
    pub fn derived(&self) -> Option<&DerivedParams> {
        self.derived.as_ref()
    }

    /// Spectrum of every initial-condition pair at one wavenumber.
    ///
    /// Linear format takes k and returns P(k) per pair; logarithmic
    /// format takes ln k and returns ln P(k) on the diagonal and
    /// cross-correlation angles off-diagonal. Inside the tabulated
    /// range the answer comes from the spline; outside it the analytic
    /// model evaluates in closed form, and the simulated model fails
    /// with a range error.
    pub fn spectrum_at_k(
        &self,
        mode: ModeKind,
        format: SpectrumFormat,
        input: f64,
    ) -> PrimordialResult<Vec<f64>> {
        let table = self.table(mode)?;

        let lnk = match format {
            SpectrumFormat::Linear => {
                if input <= 0.0 {
                    return Err(PrimordialError::InvalidConfig(format!(
                        "non-positive wavenumber k={input:e}"
                    )));
                }
                input.ln()
            }
            SpectrumFormat::Logarithmic => input,
        };

        if self.grid.contains_lnk(lnk) {
            self.interpolate(table, format, lnk)
        } else {
            self.evaluate_outside(table, format, lnk)
        }
    }

    /// Adiabatic scalar power P_R(k).
    pub fn scalar_power(&self, k: f64) -> PrimordialResult<f64> {
        Ok(self.spectrum_at_k(ModeKind::Scalar, SpectrumFormat::Linear, k)?[0])
    }

    /// Tensor power P_T(k).
    pub fn tensor_power(&self, k: f64) -> PrimordialResult<f64> {
        Ok(self.spectrum_at_k(ModeKind::Tensor, SpectrumFormat::Linear, k)?[0])
    }

    fn table(&self, mode: ModeKind) -> PrimordialResult<&ModeTable> {
        match mode {
            ModeKind::Scalar => Ok(&self.scalar),
            ModeKind::Tensor => self.tensor.as_ref().ok_or_else(|| {
                PrimordialError::InvalidConfig("tensor spectrum was not computed".into())
            }),
        }
    }

    /// Spline lookup inside the tabulated range.
    fn interpolate(
        &self,
        table: &ModeTable,
        format: SpectrumFormat,
        lnk: f64,
    ) -> PrimordialResult<Vec<f64>> {
        let mut out = vec![0.0; table.pair_size()];
        for (pair, value) in out.iter_mut().enumerate() {
            *value = spline_interpolate(
                self.grid.lnk(),
                &table.lnpk[pair],
                &table.ddlnpk[pair],
                lnk,
            );
        }

        if format == SpectrumFormat::Linear {
            let n = table.n_ic;
            for i in 0..n {
                let ii = pair_index(i, i, n);
                out[ii] = out[ii].exp();
            }
            for i in 0..n {
                for j in i + 1..n {
                    let idx = pair_index(i, j, n);
                    if table.is_non_zero[idx] {
                        let ii = pair_index(i, i, n);
                        let jj = pair_index(j, j, n);
                        out[idx] *= (out[ii] * out[jj]).sqrt();
                    } else {
                        out[idx] = 0.0;
                    }
                }
            }
        }

        Ok(out)
    }

    /// Closed-form evaluation outside the tabulated range (analytic
    /// model only).
    fn evaluate_outside(
        &self,
        table: &ModeTable,
        format: SpectrumFormat,
        lnk: f64,
    ) -> PrimordialResult<Vec<f64>> {
        let coeffs = table
            .analytic
            .as_ref()
            .ok_or_else(|| PrimordialError::KOutOfRange {
                k: lnk.exp(),
                k_min: self.grid.k_first(),
                k_max: self.grid.k_last(),
            })?;

        let k = lnk.exp();
        let n = table.n_ic;
        let mut out = vec![0.0; table.pair_size()];
        for i in 0..n {
            for j in i..n {
                let idx = pair_index(i, j, n);
                out[idx] = coeffs.evaluate(idx, k, self.config.k_pivot);
            }
        }

        if format == SpectrumFormat::Logarithmic {
            // Cross angles first: they need the linear diagonal values.
            for i in 0..n {
                for j in i + 1..n {
                    let idx = pair_index(i, j, n);
                    if table.is_non_zero[idx] {
                        let p1 = out[pair_index(i, i, n)];
                        let p2 = out[pair_index(j, j, n)];
                        out[idx] /= (p1 * p2).sqrt();
                    }
                }
            }
            for i in 0..n {
                let ii = pair_index(i, i, n);
                out[ii] = out[ii].ln();
            }
        }

        Ok(out)
    }

    /// Two-sided finite differences of the tabulated log-spectra
    /// around the pivot.
    fn derive_params(&self) -> PrimordialResult<DerivedParams> {
        let dlnk = finite_diff_dlnk(self.config.k_per_decade);
        let lnk_pivot = self.config.k_pivot.ln();

        let at = |mode: ModeKind, lnk: f64| -> PrimordialResult<f64> {
            Ok(self.spectrum_at_k(mode, SpectrumFormat::Logarithmic, lnk)?[0])
        };

        let s0 = at(ModeKind::Scalar, lnk_pivot)?;
        let sp = at(ModeKind::Scalar, lnk_pivot + dlnk)?;
        let sm = at(ModeKind::Scalar, lnk_pivot - dlnk)?;

        let a_s = s0.exp();
        let n_s = (sp - sm) / (2.0 * dlnk) + 1.0;
        let alpha_s = (sp - 2.0 * s0 + sm) / (dlnk * dlnk);

        let t0 = at(ModeKind::Tensor, lnk_pivot)?;
        let tp = at(ModeKind::Tensor, lnk_pivot + dlnk)?;
        let tm = at(ModeKind::Tensor, lnk_pivot - dlnk)?;

        Ok(DerivedParams {
            a_s,
            n_s,
            alpha_s,
            r: t0.exp() / a_s,
            n_t: (tp - tm) / (2.0 * dlnk),
            alpha_t: (tp - 2.0 * t0 + tm) / (dlnk * dlnk),
        })
    }
}
