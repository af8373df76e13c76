//! Log-spaced wavenumber grid of the spectrum table.
//!
//! Built once before any solving, immutable afterwards. Node i sits at
//! ln k = ln k_min + i * ln(10)/k_per_decade; the node count is chosen
//! so the last node reaches or passes k_max.

use serde::{Deserialize, Serialize};

use crate::error::{PrimordialError, PrimordialResult};

/// Ordered, strictly increasing list of log-wavenumbers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KGrid {
    lnk: Vec<f64>,
}

impl KGrid {
    /// Build the grid covering [k_min, k_max] at the given sampling
    /// density per decade.
    pub fn new(k_min: f64, k_max: f64, k_per_decade: f64) -> PrimordialResult<Self> {
        if k_min <= 0.0 || k_max <= k_min {
            return Err(PrimordialError::InvalidConfig(format!(
                "inconsistent k grid bounds: k_min={k_min:e}, k_max={k_max:e}"
            )));
        }
        if k_per_decade <= 0.0 {
            return Err(PrimordialError::InvalidConfig(
                "k_per_decade must be positive".into(),
            ));
        }

        let step = std::f64::consts::LN_10 / k_per_decade;
        let size = ((k_max / k_min).ln() / std::f64::consts::LN_10 * k_per_decade) as usize + 2;
        let lnk_min = k_min.ln();

        let lnk = (0..size).map(|i| lnk_min + i as f64 * step).collect();
        Ok(Self { lnk })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.lnk.len()
    }

    /// True when the grid has no nodes (never produced by [`KGrid::new`]).
    pub fn is_empty(&self) -> bool {
        self.lnk.is_empty()
    }

    /// All log-wavenumbers.
    pub fn lnk(&self) -> &[f64] {
        &self.lnk
    }

    /// Log-wavenumber of node i.
    #[inline]
    pub fn lnk_at(&self, i: usize) -> f64 {
        self.lnk[i]
    }

    /// Wavenumber of node i.
    #[inline]
    pub fn k_at(&self, i: usize) -> f64 {
        self.lnk[i].exp()
    }

    /// First (smallest) wavenumber.
    pub fn k_first(&self) -> f64 {
        self.lnk[0].exp()
    }

    /// Last (largest) wavenumber.
    pub fn k_last(&self) -> f64 {
        self.lnk[self.lnk.len() - 1].exp()
    }

    /// Whether ln k falls inside the tabulated range (ends inclusive).
    pub fn contains_lnk(&self, lnk: f64) -> bool {
        lnk >= self.lnk[0] && lnk <= self.lnk[self.lnk.len() - 1]
    }

    /// Wavenumbers of all nodes, in grid order.
    pub fn k_values(&self) -> Vec<f64> {
        self.lnk.iter().map(|l| l.exp()).collect()
    }
}
