//! The refinement loop: repeated cycles of refine, discretize, assemble, constrain and solve.
use crate::assembly::global::{zero_system, CsrAssembler};
use crate::assembly::local::AdvectionDiffusionAssemblerBuilder;
use crate::boundary::apply_boundary_values;
use crate::coefficients::{CoefficientModel, Constant, ConstantCoefficients, ScalarFunction};
use crate::config::RunConfig;
use crate::io::vtk::write_solution_vtk;
use crate::mesh::procedural::create_reference_domain;
use crate::mesh::QuadMesh2d;
use crate::quadrature::quadrilateral_gauss;
use crate::solver::solve_system;
use crate::space::QuadSpace;
use crate::transfer::transfer_to_refined;
use adfem_sparse::SolveError;
use eyre::WrapErr;
use log::{debug, info, warn};
use nalgebra::DVector;
use serde::Serialize;
use std::fmt;
use std::fs;

/// Result of a single cycle of the refinement loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    pub cycle: usize,
    pub num_active_cells: usize,
    pub num_dofs: usize,
    pub pattern_nnz: usize,
    pub num_constrained_dofs: usize,
    pub iterations: usize,
    pub residual_norm: f64,
    #[serde(skip)]
    pub solution: DVector<f64>,
}

/// Failure of a cycle of the refinement loop.
#[derive(Debug)]
pub enum CycleError {
    /// The solver did not reach the tolerance. The error holds the iteration count and the last
    /// residual norm, so the caller can decide whether to retry with other solver settings.
    Convergence { cycle: usize, error: SolveError<f64> },
    /// Writing the output of the cycle failed.
    Output { cycle: usize, error: eyre::Report },
}

impl CycleError {
    pub fn cycle(&self) -> usize {
        match self {
            Self::Convergence { cycle, .. } | Self::Output { cycle, .. } => *cycle,
        }
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Convergence { cycle, error } => write!(f, "Cycle {}: solver did not converge: {}", cycle, error),
            Self::Output { cycle, error } => write!(f, "Cycle {}: failed to write output: {:#}", cycle, error),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Convergence { error, .. } => Some(error),
            Self::Output { error, .. } => Some(error.as_ref()),
        }
    }
}

/// Drives a fixed number of refinement cycles.
///
/// The loop owns the mesh, which persists across cycles and is refined uniformly at the start
/// of every cycle after the first. All other data is rebuilt each cycle.
pub struct RefinementLoop<C = ConstantCoefficients, F = Constant, G = Constant> {
    config: RunConfig,
    coefficients: C,
    forcing: F,
    boundary_function: G,
    mesh: Option<QuadMesh2d>,
}

impl RefinementLoop {
    /// A loop with the constant coefficients, forcing and boundary value of the configuration.
    pub fn new(config: RunConfig) -> Self {
        Self {
            coefficients: config.coefficients,
            forcing: Constant(config.forcing),
            boundary_function: Constant(config.boundary_value),
            config,
            mesh: None,
        }
    }
}

impl<C, F, G> RefinementLoop<C, F, G> {
    pub fn with_coefficients<C2>(self, coefficients: C2) -> RefinementLoop<C2, F, G> {
        RefinementLoop {
            config: self.config,
            coefficients,
            forcing: self.forcing,
            boundary_function: self.boundary_function,
            mesh: self.mesh,
        }
    }

    pub fn with_forcing<F2>(self, forcing: F2) -> RefinementLoop<C, F2, G> {
        RefinementLoop {
            config: self.config,
            coefficients: self.coefficients,
            forcing,
            boundary_function: self.boundary_function,
            mesh: self.mesh,
        }
    }

    pub fn with_boundary_function<G2>(self, boundary_function: G2) -> RefinementLoop<C, F, G2> {
        RefinementLoop {
            config: self.config,
            coefficients: self.coefficients,
            forcing: self.forcing,
            boundary_function,
            mesh: self.mesh,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The current mesh, or `None` before the first cycle.
    pub fn mesh(&self) -> Option<&QuadMesh2d> {
        self.mesh.as_ref()
    }
}

impl<C, F, G> RefinementLoop<C, F, G>
where
    C: CoefficientModel + Sync,
    F: ScalarFunction + Sync,
    G: ScalarFunction,
{
    /// Runs all configured cycles and returns their summaries.
    pub fn run(&mut self) -> Result<Vec<CycleSummary>, CycleError> {
        self.run_with_observer(|_, _| {})
    }

    /// Runs all configured cycles, calling `observer` with the space and summary of each cycle.
    pub fn run_with_observer(
        &mut self,
        mut observer: impl FnMut(&QuadSpace, &CycleSummary),
    ) -> Result<Vec<CycleSummary>, CycleError> {
        if let Some(dir) = &self.config.output_dir {
            fs::create_dir_all(dir)
                .wrap_err_with(|| format!("Failed to create output directory {}", dir.display()))
                .map_err(|error| CycleError::Output { cycle: 0, error })?;
        }

        let mut summaries = Vec::with_capacity(self.config.num_cycles);
        let mut previous: Option<(QuadSpace, DVector<f64>)> = None;
        for cycle in 0..self.config.num_cycles {
            self.refine_for_cycle(cycle);
            let (space, summary) = self.run_cycle(cycle, previous.as_ref())?;
            info!(
                "Cycle {}: {} active cells, {} DOFs, {} solver iterations",
                cycle, summary.num_active_cells, summary.num_dofs, summary.iterations
            );
            observer(&space, &summary);
            previous = Some((space, summary.solution.clone()));
            summaries.push(summary);
        }
        Ok(summaries)
    }

    fn refine_for_cycle(&mut self, cycle: usize) {
        if cycle > 0 {
            if let Some(mesh) = self.mesh.as_mut() {
                mesh.refine_uniformly(1);
                return;
            }
        }
        let mut mesh = create_reference_domain(self.config.colorize_boundary);
        mesh.refine_uniformly(self.config.initial_refinements);
        self.mesh = Some(mesh);
    }

    fn run_cycle(
        &self,
        cycle: usize,
        previous: Option<&(QuadSpace, DVector<f64>)>,
    ) -> Result<(QuadSpace, CycleSummary), CycleError> {
        let config = &self.config;
        let mesh = self
            .mesh
            .as_ref()
            .expect("Mesh is created before the first cycle runs");

        let space = QuadSpace::new(mesh, config.degree);
        debug!("Cycle {}: distributed {} DOFs", cycle, space.num_dofs());

        let csr_assembler = CsrAssembler::default();
        let pattern = csr_assembler.assemble_pattern(&space);
        let pattern_nnz = pattern.nnz();
        debug!("Cycle {}: sparsity pattern has {} entries", cycle, pattern_nnz);

        let rule = quadrilateral_gauss(config.num_quadrature_points());
        let element_assembler = AdvectionDiffusionAssemblerBuilder::new()
            .with_space(&space)
            .with_coefficients(&self.coefficients)
            .with_forcing(&self.forcing)
            .with_quadrature(&rule)
            .build();
        let (mut matrix, mut rhs) = zero_system(pattern);
        if config.parallel_assembly {
            csr_assembler.par_assemble_system_into(&mut matrix, &mut rhs, &element_assembler);
        } else {
            csr_assembler.assemble_system_into(&mut matrix, &mut rhs, &element_assembler);
        }

        let boundary_values = space.boundary_values(mesh, &config.dirichlet_tags, &self.boundary_function);
        debug!("Cycle {}: constraining {} boundary DOFs", cycle, boundary_values.len());
        apply_boundary_values(&mut matrix, &mut rhs, &boundary_values);

        let mut solution = match previous {
            Some((previous_space, previous_solution)) if config.warm_start => {
                transfer_to_refined(previous_space, previous_solution, &space)
            }
            _ => DVector::zeros(space.num_dofs()),
        };
        let output = match solve_system(&matrix, &rhs, &mut solution, &config.solver) {
            Ok(output) => output,
            Err(error) => {
                warn!("Cycle {}: {}", cycle, error);
                return Err(CycleError::Convergence { cycle, error });
            }
        };

        if let Some(dir) = &config.output_dir {
            let path = dir.join(format!("solution-{:02}.vtk", cycle));
            debug!("Cycle {}: writing solution to {}", cycle, path.display());
            write_solution_vtk(&space, &solution, &path).map_err(|error| CycleError::Output { cycle, error })?;
        }

        let summary = CycleSummary {
            cycle,
            num_active_cells: mesh.num_active_cells(),
            num_dofs: space.num_dofs(),
            pattern_nnz,
            num_constrained_dofs: boundary_values.len(),
            iterations: output.num_iterations,
            residual_norm: output.residual_norm,
            solution,
        };
        Ok((space, summary))
    }
}
