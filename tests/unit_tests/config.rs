use adfem::config::RunConfig;
use adfem::element::FeDegree;
use adfem::solver::{PreconditionerKind, SolverKind};
use nalgebra::Vector2;
use std::fs;
use std::path::PathBuf;

#[test]
fn default_run_config() {
    let config = RunConfig::default();
    assert_eq!(config.degree, FeDegree::Linear);
    assert_eq!(config.initial_refinements, 2);
    assert_eq!(config.num_cycles, 3);
    assert_eq!(config.coefficients.diffusion, 1.0);
    assert_eq!(config.coefficients.advection, 1.0);
    assert_eq!(config.coefficients.direction, Vector2::new(1.0, 0.0));
    assert_eq!(config.forcing, 1.0);
    assert_eq!(config.boundary_value, 0.0);
    assert_eq!(config.dirichlet_tags, vec![0]);
    assert!(!config.colorize_boundary);
    assert_eq!(config.num_quadrature_points(), 2);
    assert!(!config.parallel_assembly);
    assert!(!config.warm_start);
    assert_eq!(config.output_dir, None);
}

#[test]
fn empty_json_gives_defaults() {
    assert_eq!(RunConfig::from_json_str("{}").unwrap(), RunConfig::default());
}

#[test]
fn partial_json_overrides_given_fields() {
    let json = r#"{
        "degree": 2,
        "num_cycles": 5,
        "coefficients": { "diffusion": 0.1, "advection": 2.0, "direction": [0.0, 1.0] },
        "solver": { "kind": "ConjugateGradient" },
        "output_dir": "out"
    }"#;
    let config = RunConfig::from_json_str(json).unwrap();
    assert_eq!(config.degree, FeDegree::Quadratic);
    assert_eq!(config.num_cycles, 5);
    assert_eq!(config.initial_refinements, 2);
    assert_eq!(config.coefficients.diffusion, 0.1);
    assert_eq!(config.coefficients.direction, Vector2::new(0.0, 1.0));
    assert_eq!(config.solver.kind, SolverKind::ConjugateGradient);
    assert_eq!(config.solver.preconditioner, PreconditionerKind::Jacobi);
    assert_eq!(config.solver.tolerance, 1e-12);
    assert_eq!(config.num_quadrature_points(), 3);
    assert_eq!(config.output_dir, Some(PathBuf::from("out")));
}

#[test]
fn explicit_quadrature_overrides_degree_default() {
    let config = RunConfig::from_json_str(r#"{ "quadrature_points": 4 }"#).unwrap();
    assert_eq!(config.num_quadrature_points(), 4);
}

#[test]
fn unsupported_degree_is_rejected() {
    assert!(RunConfig::from_json_str(r#"{ "degree": 3 }"#).is_err());
    assert!(RunConfig::from_json_str(r#"{ "degree": 0 }"#).is_err());
    assert!(RunConfig::from_json_str(r#"{ "solver": { "kind": "Gmres" } }"#).is_err());
}

#[test]
fn zero_quadrature_points_are_rejected() {
    let error = RunConfig::from_json_str(r#"{ "quadrature_points": 0 }"#).unwrap_err();
    assert!(format!("{:?}", error).contains("quadrature_points must be at least 1"));
    assert!(RunConfig::from_json_str(r#"{ "quadrature_points": 1 }"#).is_ok());
}

#[test]
fn config_file_round_trip() {
    let dir = PathBuf::from("data/unit_tests/config");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("run.json");

    let config = RunConfig {
        degree: FeDegree::Quadratic,
        dirichlet_tags: vec![0, 2],
        colorize_boundary: true,
        warm_start: true,
        ..RunConfig::default()
    };
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    assert_eq!(RunConfig::from_json_file(&path).unwrap(), config);
}

#[test]
fn missing_config_file_is_an_error() {
    let error = RunConfig::from_json_file("data/unit_tests/config/does_not_exist.json").unwrap_err();
    assert!(format!("{}", error).contains("Failed to open configuration file"));
}
