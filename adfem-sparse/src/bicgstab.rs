//! Preconditioned BiCGSTAB for general (non-symmetric) systems.
//!
//! The implementation uses right preconditioning, so the residual seen by the stopping
//! criterion is the residual of the original, unpreconditioned system.
use crate::krylov::{apply_operator, OwnedOrMutRef, SolveError, SolveErrorKind, SolverOutput, StoppingCriterion};
use crate::{IdentityOperator, LinearOperator};
use nalgebra::{DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use num::Zero;

#[derive(Debug, Clone)]
pub struct BiCgStabWorkspace<T: Scalar> {
    r: DVector<T>,
    r_hat: DVector<T>,
    p: DVector<T>,
    p_hat: DVector<T>,
    v: DVector<T>,
    s: DVector<T>,
    s_hat: DVector<T>,
    t: DVector<T>,
}

struct Buffers<'a, T: Scalar> {
    r: &'a mut DVector<T>,
    r_hat: &'a mut DVector<T>,
    p: &'a mut DVector<T>,
    p_hat: &'a mut DVector<T>,
    v: &'a mut DVector<T>,
    s: &'a mut DVector<T>,
    s_hat: &'a mut DVector<T>,
    t: &'a mut DVector<T>,
}

impl<T: Scalar + Zero> Default for BiCgStabWorkspace<T> {
    fn default() -> Self {
        Self {
            r: DVector::zeros(0),
            r_hat: DVector::zeros(0),
            p: DVector::zeros(0),
            p_hat: DVector::zeros(0),
            v: DVector::zeros(0),
            s: DVector::zeros(0),
            s_hat: DVector::zeros(0),
            t: DVector::zeros(0),
        }
    }
}

impl<T: Scalar + Zero> BiCgStabWorkspace<T> {
    fn prepare_buffers(&mut self, dim: usize) -> Buffers<'_, T> {
        for buffer in [
            &mut self.r,
            &mut self.r_hat,
            &mut self.p,
            &mut self.p_hat,
            &mut self.v,
            &mut self.s,
            &mut self.s_hat,
            &mut self.t,
        ] {
            buffer.resize_vertically_mut(dim, T::zero());
            buffer.fill(T::zero());
        }
        Buffers {
            r: &mut self.r,
            r_hat: &mut self.r_hat,
            p: &mut self.p,
            p_hat: &mut self.p_hat,
            v: &mut self.v,
            s: &mut self.s,
            s_hat: &mut self.s_hat,
            t: &mut self.t,
        }
    }
}

/// Preconditioned BiCGSTAB solver, configured with the same builder-style API as
/// [`ConjugateGradient`](crate::cg::ConjugateGradient).
#[derive(Debug)]
pub struct BiCgStab<'a, T, A, P, Criterion>
where
    T: Scalar,
{
    workspace: OwnedOrMutRef<'a, BiCgStabWorkspace<T>>,
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
}

impl<'a, T: Scalar + Zero> BiCgStab<'a, T, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self {
            workspace: OwnedOrMutRef::Owned(BiCgStabWorkspace::default()),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<'a, T: Scalar> BiCgStab<'a, T, (), IdentityOperator, ()> {
    pub fn with_workspace(workspace: &'a mut BiCgStabWorkspace<T>) -> Self {
        Self {
            workspace: OwnedOrMutRef::MutRef(workspace),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<'a, T: Scalar, P, Criterion> BiCgStab<'a, T, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> BiCgStab<'a, T, A, P, Criterion> {
        BiCgStab {
            workspace: self.workspace,
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<'a, T: Scalar, A, P, Criterion> BiCgStab<'a, T, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> BiCgStab<'a, T, A, P2, Criterion> {
        BiCgStab {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

impl<'a, T: Scalar, A, P> BiCgStab<'a, T, A, P, ()> {
    pub fn with_stopping_criterion<Criterion>(self, stopping_criterion: Criterion) -> BiCgStab<'a, T, A, P, Criterion> {
        BiCgStab {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<'a, T, A, P, Criterion> BiCgStab<'a, T, A, P, Criterion>
where
    T: RealField,
    A: LinearOperator<T>,
    P: LinearOperator<T>,
    Criterion: StoppingCriterion<T>,
{
    pub fn solve_with_guess<'b>(
        &mut self,
        b: impl Into<DVectorView<'b, T>>,
        x: impl Into<DVectorViewMut<'b, T>>,
    ) -> Result<SolverOutput<T>, SolveError<T>> {
        self.solve_with_guess_(b.into(), x.into())
    }

    fn solve_with_guess_(&mut self, b: DVectorView<T>, mut x: DVectorViewMut<T>) -> Result<SolverOutput<T>, SolveError<T>> {
        use SolveErrorKind::*;
        assert_eq!(b.len(), x.len());

        let mut output = SolverOutput::initial();

        let Buffers {
            r,
            r_hat,
            p,
            p_hat,
            v,
            s,
            s_hat,
            t,
        } = self.workspace.prepare_buffers(x.len());

        self.stopping_criterion
            .reset(&self.operator, (&x).into(), (&b).into());

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(output);
        }

        // r = b - Ax
        if let Err(err) = apply_operator(&mut *r, &self.operator, &x) {
            return Err(SolveError::new(output, OperatorError(err)));
        }
        r.axpy(T::one(), &b, -T::one());
        r_hat.copy_from(&*r);

        let mut rho_prev = T::one();
        let mut alpha = T::one();
        let mut omega = T::one();

        loop {
            output.residual_norm = r.norm();
            let convergence = self.stopping_criterion.has_converged(
                &self.operator,
                (&x).into(),
                (&b).into(),
                b_norm.clone(),
                output.num_iterations,
                (&*r).into(),
            );
            match convergence {
                Ok(true) => break,
                Ok(false) => {}
                Err(error_kind) => return Err(SolveError::new(output, error_kind)),
            }

            if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    return Err(SolveError::new(output, MaxIterationsReached { max_iter }));
                }
            }

            let rho = r_hat.dot(&*r);
            if rho == T::zero() || omega == T::zero() {
                return Err(SolveError::new(output, Breakdown));
            }

            if output.num_iterations == 0 {
                p.copy_from(&*r);
            } else {
                // p <- r + beta * (p - omega * v)
                let beta = (rho.clone() / rho_prev) * (alpha.clone() / omega.clone());
                p.axpy(-omega.clone(), &*v, T::one());
                p.axpy(T::one(), &*r, beta);
            }

            // p_hat = P p, v = A p_hat
            if let Err(err) = apply_operator(&mut *p_hat, &self.preconditioner, &*p) {
                return Err(SolveError::new(output, PreconditionerError(err)));
            }
            if let Err(err) = apply_operator(&mut *v, &self.operator, &*p_hat) {
                return Err(SolveError::new(output, OperatorError(err)));
            }

            let r_hat_v = r_hat.dot(&*v);
            if r_hat_v == T::zero() {
                return Err(SolveError::new(output, Breakdown));
            }
            alpha = rho.clone() / r_hat_v;

            // s = r - alpha * v
            s.copy_from(&*r);
            s.axpy(-alpha.clone(), &*v, T::one());

            let half_step_converged = self.stopping_criterion.has_converged(
                &self.operator,
                (&x).into(),
                (&b).into(),
                b_norm.clone(),
                output.num_iterations,
                (&*s).into(),
            );
            match half_step_converged {
                Ok(true) => {
                    x.axpy(alpha.clone(), &*p_hat, T::one());
                    r.copy_from(&*s);
                    output.num_iterations += 1;
                    output.residual_norm = r.norm();
                    break;
                }
                Ok(false) => {}
                Err(error_kind) => return Err(SolveError::new(output, error_kind)),
            }

            // s_hat = P s, t = A s_hat
            if let Err(err) = apply_operator(&mut *s_hat, &self.preconditioner, &*s) {
                return Err(SolveError::new(output, PreconditionerError(err)));
            }
            if let Err(err) = apply_operator(&mut *t, &self.operator, &*s_hat) {
                return Err(SolveError::new(output, OperatorError(err)));
            }

            let t_t = t.dot(&*t);
            if t_t == T::zero() {
                return Err(SolveError::new(output, Breakdown));
            }
            omega = t.dot(&*s) / t_t;

            // x <- x + alpha * p_hat + omega * s_hat
            x.axpy(alpha.clone(), &*p_hat, T::one());
            x.axpy(omega.clone(), &*s_hat, T::one());

            // r <- s - omega * t
            r.copy_from(&*s);
            r.axpy(-omega.clone(), &*t, T::one());

            output.num_iterations += 1;
            rho_prev = rho;
        }

        Ok(output)
    }
}
