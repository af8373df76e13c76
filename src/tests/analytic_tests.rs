//! Analytic-mode spectra: table round-trips, out-of-range fallback,
//! and cross-correlation bookkeeping.

use crate::analytic::{AnalyticCoeffs, AnalyticParams};
use crate::config::PrimordialConfig;
use crate::error::PrimordialError;
use crate::spectrum::Primordial;
use crate::types::{pair_index, IcKind, ModeKind, SpectrumFormat};

fn base_params() -> AnalyticParams {
    AnalyticParams::new(2.1e-9, 0.96).with_running(-0.003)
}

fn correlated_params() -> AnalyticParams {
    AnalyticParams::new(2.1e-9, 0.96)
        .with_isocurvature(IcKind::CdmIso, 0.4, 1.1, 0.0)
        .with_correlation(IcKind::Adiabatic, IcKind::CdmIso, 0.6, 0.0, 0.0)
}

#[test]
fn test_round_trip_at_table_nodes() {
    // Spline interpolation must reproduce the tabulated values exactly
    // at the nodes.
    let config = PrimordialConfig::analytic(base_params()).with_k_range(1.0e-4, 1.0);
    let pm = Primordial::compute(config).unwrap();

    let coeffs = AnalyticCoeffs::scalar(&base_params(), &[IcKind::Adiabatic]).unwrap();
    for i in 0..pm.k_grid().len() {
        let lnk = pm.k_grid().lnk_at(i);
        let from_table = pm
            .spectrum_at_k(ModeKind::Scalar, SpectrumFormat::Logarithmic, lnk)
            .unwrap()[0];
        let direct = coeffs.evaluate(0, lnk.exp(), 0.05).ln();
        assert!(
            (from_table - direct).abs() < 1e-10,
            "node {i}: {from_table} vs {direct}"
        );
    }
}

#[test]
fn test_out_of_range_falls_back_to_closed_form() {
    let config = PrimordialConfig::analytic(base_params()).with_k_range(1.0e-4, 1.0);
    let pm = Primordial::compute(config).unwrap();

    let coeffs = AnalyticCoeffs::scalar(&base_params(), &[IcKind::Adiabatic]).unwrap();
    for k in [1.0e-6, 50.0] {
        let queried = pm.scalar_power(k).unwrap();
        let direct = coeffs.evaluate(0, k, 0.05);
        assert!(
            (queried / direct - 1.0).abs() < 1e-12,
            "k={k:e}: {queried:e} vs {direct:e}"
        );
    }
}

#[test]
fn test_out_of_range_log_query_matches_closed_form() {
    let config = PrimordialConfig::analytic(base_params()).with_k_range(1.0e-4, 1.0);
    let pm = Primordial::compute(config).unwrap();

    let coeffs = AnalyticCoeffs::scalar(&base_params(), &[IcKind::Adiabatic]).unwrap();
    let k: f64 = 20.0;
    let lnpk = pm
        .spectrum_at_k(ModeKind::Scalar, SpectrumFormat::Logarithmic, k.ln())
        .unwrap()[0];
    assert!((lnpk - coeffs.evaluate(0, k, 0.05).ln()).abs() < 1e-12);
}

#[test]
fn test_correlated_pair_linear_reconstruction() {
    // The table stores cos Delta off-diagonal; a linear query must
    // reconstruct P_12 = cos Delta * sqrt(P_11 P_22).
    let config = PrimordialConfig::analytic(correlated_params())
        .with_k_range(1.0e-4, 1.0)
        .with_scalar_ics(vec![IcKind::Adiabatic, IcKind::CdmIso]);
    let pm = Primordial::compute(config).unwrap();

    let ics = [IcKind::Adiabatic, IcKind::CdmIso];
    let coeffs = AnalyticCoeffs::scalar(&correlated_params(), &ics).unwrap();

    let k = 0.02;
    let out = pm
        .spectrum_at_k(ModeKind::Scalar, SpectrumFormat::Linear, k)
        .unwrap();
    let cross = pair_index(0, 1, 2);
    let direct = coeffs.evaluate(cross, k, 0.05);
    assert!(
        (out[cross] / direct - 1.0).abs() < 1e-6,
        "cross spectrum {:e} vs {direct:e}",
        out[cross]
    );
}

#[test]
fn test_correlation_angle_bounded() {
    let config = PrimordialConfig::analytic(correlated_params())
        .with_k_range(1.0e-4, 1.0)
        .with_scalar_ics(vec![IcKind::Adiabatic, IcKind::CdmIso]);
    let pm = Primordial::compute(config).unwrap();

    let cross = pair_index(0, 1, 2);
    for i in 0..pm.k_grid().len() {
        let out = pm
            .spectrum_at_k(
                ModeKind::Scalar,
                SpectrumFormat::Logarithmic,
                pm.k_grid().lnk_at(i),
            )
            .unwrap();
        assert!(
            out[cross].abs() <= 1.0 + 1e-12,
            "cos Delta out of bounds at node {i}: {}",
            out[cross]
        );
    }
}

#[test]
fn test_uncorrelated_pair_reads_zero() {
    let params = AnalyticParams::new(2.1e-9, 0.96).with_isocurvature(IcKind::BaryonIso, 0.2, 1.0, 0.0);
    let config = PrimordialConfig::analytic(params)
        .with_k_range(1.0e-4, 1.0)
        .with_scalar_ics(vec![IcKind::Adiabatic, IcKind::BaryonIso]);
    let pm = Primordial::compute(config).unwrap();

    let out = pm
        .spectrum_at_k(ModeKind::Scalar, SpectrumFormat::Linear, 0.01)
        .unwrap();
    assert_eq!(out[pair_index(0, 1, 2)], 0.0);
}

#[test]
fn test_tensor_table_follows_consistency_inputs() {
    let params = AnalyticParams::new(2.0e-9, 0.96).with_tensor(0.08, -0.01, 0.0);
    let config = PrimordialConfig::analytic(params)
        .with_k_range(1.0e-4, 1.0)
        .with_tensors(true);
    let pm = Primordial::compute(config).unwrap();

    let p_t = pm.tensor_power(0.05).unwrap();
    assert!((p_t / (2.0e-9 * 0.08) - 1.0).abs() < 1e-6);
}

#[test]
fn test_boundary_nodes_queryable() {
    let config = PrimordialConfig::analytic(base_params()).with_k_range(1.0e-4, 1.0);
    let pm = Primordial::compute(config).unwrap();

    let first = pm.k_grid().lnk_at(0);
    let last = pm.k_grid().lnk_at(pm.k_grid().len() - 1);
    assert!(pm
        .spectrum_at_k(ModeKind::Scalar, SpectrumFormat::Logarithmic, first)
        .is_ok());
    assert!(pm
        .spectrum_at_k(ModeKind::Scalar, SpectrumFormat::Logarithmic, last)
        .is_ok());
}

#[test]
fn test_missing_iso_entry_rejected_at_compute() {
    let config = PrimordialConfig::analytic(AnalyticParams::new(2.1e-9, 0.96))
        .with_scalar_ics(vec![IcKind::Adiabatic, IcKind::NeutrinoDensityIso]);
    match Primordial::compute(config) {
        Err(PrimordialError::InvalidConfig(msg)) => assert!(msg.contains("nid")),
        other => panic!("expected InvalidConfig, got {:?}", other.err()),
    }
}
