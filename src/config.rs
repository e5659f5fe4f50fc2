//! Run configuration of the refinement loop.
use crate::coefficients::ConstantCoefficients;
use crate::element::FeDegree;
use crate::mesh::BoundaryTag;
use crate::solver::SolverConfig;
use eyre::{ensure, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Every tunable of a run. Fields omitted from a configuration file take their default values,
/// which describe a linear element run on the unit square with 2 initial refinements and 3 cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub degree: FeDegree,
    pub initial_refinements: usize,
    pub num_cycles: usize,
    pub coefficients: ConstantCoefficients,
    /// Constant forcing `f`.
    pub forcing: f64,
    /// Constant Dirichlet value prescribed on the tagged boundary.
    pub boundary_value: f64,
    pub dirichlet_tags: Vec<BoundaryTag>,
    /// Tag each side of the unit square separately instead of tagging the whole boundary `0`.
    pub colorize_boundary: bool,
    /// Gauss points per direction. Defaults to `degree + 1`.
    pub quadrature_points: Option<usize>,
    pub solver: SolverConfig,
    pub parallel_assembly: bool,
    /// Use the solution of the previous cycle, transferred to the refined mesh, as initial guess.
    pub warm_start: bool,
    /// Directory for VTK output and the run summary. Nothing is written if unset.
    pub output_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            degree: FeDegree::Linear,
            initial_refinements: 2,
            num_cycles: 3,
            coefficients: ConstantCoefficients::default(),
            forcing: 1.0,
            boundary_value: 0.0,
            dirichlet_tags: vec![0],
            colorize_boundary: false,
            quadrature_points: None,
            solver: SolverConfig::default(),
            parallel_assembly: false,
            warm_start: false,
            output_dir: None,
        }
    }
}

impl RunConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path).wrap_err_with(|| format!("Failed to open configuration file {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .wrap_err_with(|| format!("Failed to parse configuration file {}", path.display()))?;
        config
            .validate()
            .wrap_err_with(|| format!("Invalid configuration file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> eyre::Result<Self> {
        let config: Self = serde_json::from_str(json).wrap_err("Failed to parse configuration")?;
        config.validate().wrap_err("Invalid configuration")?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be used by a run.
    pub fn validate(&self) -> eyre::Result<()> {
        ensure!(
            self.quadrature_points != Some(0),
            "quadrature_points must be at least 1"
        );
        Ok(())
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.quadrature_points
            .unwrap_or_else(|| self.degree.degree() + 1)
    }
}
