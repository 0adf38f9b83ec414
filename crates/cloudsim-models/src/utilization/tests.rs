//! Tests for utilization models.

use approx::assert_abs_diff_eq;

use crate::utilization::utilization_model::UtilizationModel;
use crate::utilization::utilization_models::constant::ConstantUtilizationModel;
use crate::utilization::utilization_models::full::UtilizationModelFull;
use crate::utilization::utilization_models::stochastic::StochasticUtilizationModel;
use crate::utilization::utilization_models::trace::{TraceError, TraceUtilizationModel};

#[test]
fn test_full_and_constant_models() {
    let full = UtilizationModelFull::new();
    assert_eq!(full.get_utilization(0.), 1.);
    assert_eq!(full.get_utilization(1e6), 1.);

    let constant = ConstantUtilizationModel::new(0.3);
    assert_eq!(constant.get_utilization(0.), 0.3);
    assert_eq!(constant.get_utilization(42.), 0.3);
    assert_eq!(ConstantUtilizationModel::new(1.5).get_utilization(0.), 1.);
    assert!(full.is_constant_after(0.));
    assert!(constant.is_constant_after(0.));
}

#[test]
fn test_constant_model_nan_is_zero() {
    let model = ConstantUtilizationModel::new(f64::NAN);
    assert_eq!(model.get_utilization(0.), 0.);
    assert_eq!(model.get_utilization(100.), 0.);
}

#[test]
fn test_stochastic_model_is_idempotent() {
    let model = StochasticUtilizationModel::new(7);
    let first = model.get_utilization(10.);
    assert!((0. ..=1.).contains(&first));
    for _ in 0..5 {
        assert_eq!(model.get_utilization(10.), first);
    }
}

#[test]
fn test_stochastic_model_depends_on_seed_only() {
    let a = StochasticUtilizationModel::new(7);
    let b = StochasticUtilizationModel::new(7);
    let times = [0., 1., 2.5, 10.];
    let values_a: Vec<f64> = times.iter().map(|&t| a.get_utilization(t)).collect();
    let values_b: Vec<f64> = times.iter().map(|&t| b.get_utilization(t)).collect();
    assert_eq!(values_a, values_b);
    assert!(!a.is_constant_after(1e9));

    // a clone keeps the values generated so far
    let c = dyn_clone::clone_box(&a as &dyn UtilizationModel);
    assert_eq!(c.get_utilization(2.5), values_a[2]);
}

#[test]
fn test_trace_model_interpolation() {
    let model = TraceUtilizationModel::new(vec![0.2, 0.6, 1.0], 300.).unwrap();
    assert_abs_diff_eq!(model.get_utilization(0.), 0.2);
    assert_abs_diff_eq!(model.get_utilization(150.), 0.4);
    assert_abs_diff_eq!(model.get_utilization(300.), 0.6);
    assert_abs_diff_eq!(model.get_utilization(450.), 0.8);
    assert_abs_diff_eq!(model.get_utilization(600.), 1.0);
    // the last sample is kept after the end of the trace
    assert_abs_diff_eq!(model.get_utilization(10_000.), 1.0);
    assert!(!model.is_constant_after(599.));
    assert!(model.is_constant_after(600.));
}

#[test]
fn test_trace_model_rejects_non_finite_samples() {
    match TraceUtilizationModel::new(vec![0.5, f64::NAN, 0.2], 60.) {
        Err(TraceError::InvalidSample { index, value }) => {
            assert_eq!(index, 1);
            assert!(value.is_nan());
        }
        _ => panic!("invalid sample error expected"),
    }
    assert!(matches!(
        TraceUtilizationModel::new(vec![f64::INFINITY], 60.),
        Err(TraceError::InvalidSample { index: 0, .. })
    ));
}

#[test]
fn test_trace_model_parsing() {
    let model = TraceUtilizationModel::parse("10\n\n50\n 100 \n", 60.).unwrap();
    assert_eq!(model.len(), 3);
    assert_abs_diff_eq!(model.get_utilization(0.), 0.1);
    assert_abs_diff_eq!(model.get_utilization(30.), 0.3);
    assert_abs_diff_eq!(model.get_utilization(120.), 1.0);

    match TraceUtilizationModel::parse("10\nabc\n", 60.) {
        Err(TraceError::Parse { line, value }) => {
            assert_eq!(line, 2);
            assert_eq!(value, "abc");
        }
        _ => panic!("parse error expected"),
    }
    assert!(matches!(TraceUtilizationModel::parse("", 60.), Err(TraceError::Empty)));
    assert!(matches!(TraceUtilizationModel::parse("50\nnan\n", 60.), Err(TraceError::Parse { line: 2, .. })));
    assert!(matches!(TraceUtilizationModel::parse("inf\n", 60.), Err(TraceError::Parse { line: 1, .. })));
    assert!(matches!(
        TraceUtilizationModel::new(vec![0.5], 0.),
        Err(TraceError::InvalidInterval(_))
    ));
}

#[test]
fn test_trace_model_from_missing_file() {
    assert!(matches!(
        TraceUtilizationModel::from_file("no-such-trace-file", 300.),
        Err(TraceError::Io(_))
    ));
}
