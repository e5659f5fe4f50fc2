//! Configuration of the iterative solver for the assembled system.
use adfem_sparse::bicgstab::{BiCgStab, BiCgStabWorkspace};
use adfem_sparse::cg::{CgWorkspace, ConjugateGradient};
use adfem_sparse::{
    DiagonalOperator, IdentityOperator, LinearOperator, RelativeResidualCriterion, SolveError, SolverOutput,
};
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    /// Preconditioned conjugate gradient. Assumes a symmetric positive definite system.
    ConjugateGradient,
    /// Right-preconditioned BiCGSTAB, which also handles the non-symmetric advection term.
    BiCgStab,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreconditionerKind {
    Identity,
    /// Inverse of the matrix diagonal.
    Jacobi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub kind: SolverKind,
    pub preconditioner: PreconditionerKind,
    /// Relative residual tolerance `||r|| <= tol * ||b||`.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::BiCgStab,
            preconditioner: PreconditionerKind::Jacobi,
            tolerance: 1e-12,
            max_iterations: 1000,
        }
    }
}

/// Solves `A x = b` with the configured method, starting from the current contents of `x`.
///
/// On failure the error carries the number of iterations performed and the last residual norm.
pub fn solve_system(
    matrix: &CsrMatrix<f64>,
    rhs: &DVector<f64>,
    x: &mut DVector<f64>,
    config: &SolverConfig,
) -> Result<SolverOutput<f64>, SolveError<f64>> {
    assert_eq!(matrix.nrows(), rhs.len(), "Right-hand side dimension mismatch");
    assert_eq!(x.len(), rhs.len(), "Solution dimension mismatch");

    match config.preconditioner {
        PreconditionerKind::Identity => solve_with_preconditioner(matrix, IdentityOperator, rhs, x, config),
        PreconditionerKind::Jacobi => {
            let jacobi = DiagonalOperator::jacobi(matrix);
            solve_with_preconditioner(matrix, jacobi, rhs, x, config)
        }
    }
}

fn solve_with_preconditioner(
    matrix: &CsrMatrix<f64>,
    preconditioner: impl LinearOperator<f64>,
    rhs: &DVector<f64>,
    x: &mut DVector<f64>,
    config: &SolverConfig,
) -> Result<SolverOutput<f64>, SolveError<f64>> {
    let criterion = RelativeResidualCriterion::new(config.tolerance);
    debug!(
        "Solving system with {} unknowns using {:?} and {:?} preconditioner",
        rhs.len(),
        config.kind,
        config.preconditioner
    );
    match config.kind {
        SolverKind::ConjugateGradient => {
            let mut workspace = CgWorkspace::<f64>::default();
            let mut solver = ConjugateGradient::with_workspace(&mut workspace)
                .with_operator(matrix)
                .with_preconditioner(preconditioner)
                .with_stopping_criterion(criterion)
                .with_max_iter(config.max_iterations);
            solver.solve_with_guess(rhs, x)
        }
        SolverKind::BiCgStab => {
            let mut workspace = BiCgStabWorkspace::<f64>::default();
            let mut solver = BiCgStab::with_workspace(&mut workspace)
                .with_operator(matrix)
                .with_preconditioner(preconditioner)
                .with_stopping_criterion(criterion)
                .with_max_iter(config.max_iterations);
            solver.solve_with_guess(rhs, x)
        }
    }
}
