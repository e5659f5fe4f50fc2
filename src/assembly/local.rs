use crate::assembly::values::ElementValues;
use crate::coefficients::{CoefficientModel, ScalarFunction};
use crate::quadrature::QuadraturePair2d;
use crate::space::QuadSpace;
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut};
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// Describes how element-local node indices map to global indices.
pub trait ElementConnectivityAssembler {
    fn num_elements(&self) -> usize;

    fn num_nodes(&self) -> usize;

    fn element_node_count(&self, element_index: usize) -> usize;

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize);
}

/// Computes the element matrix and vector of a linear system.
pub trait ElementSystemAssembler: ElementConnectivityAssembler {
    /// Assembles the element contribution into zero-initialized output buffers of
    /// dimension equal to the element node count.
    fn assemble_element_system_into(
        &self,
        element_index: usize,
        matrix: DMatrixViewMut<f64>,
        vector: DVectorViewMut<f64>,
    );

    fn as_connectivity_assembler(&self) -> &dyn ElementConnectivityAssembler;
}

/// The dense element matrix and vector of a single element, together with its global nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalContribution {
    pub element_index: usize,
    pub global_nodes: Vec<usize>,
    pub matrix: DMatrix<f64>,
    pub vector: DVector<f64>,
}

impl LocalContribution {
    pub fn compute(assembler: &(impl ElementSystemAssembler + ?Sized), element_index: usize) -> Self {
        let n = assembler.element_node_count(element_index);
        let mut global_nodes = vec![usize::MAX; n];
        assembler.populate_element_nodes(&mut global_nodes, element_index);
        let mut matrix = DMatrix::zeros(n, n);
        let mut vector = DVector::zeros(n);
        assembler.assemble_element_system_into(element_index, (&mut matrix).into(), (&mut vector).into());
        Self {
            element_index,
            global_nodes,
            matrix,
            vector,
        }
    }
}

/// Accumulates the advection-diffusion element matrix and source vector for the element
/// whose values are stored in `values`.
///
/// For basis functions `i` (test) and `j` (trial) the matrix entry is the quadrature sum of
///
/// ```text
/// D(x) (grad phi_i . grad phi_j) - A(x) (grad phi_i . b(x)) phi_j + D(x) s_i s_j
/// ```
///
/// scaled by the integration weight, where `D` is the diffusion coefficient, `A` the advection
/// coefficient, `b` the advection direction and `s_i` the stabilization scalar. The vector entry
/// is the quadrature sum of `phi_i f(x)`.
pub fn assemble_element_advection_diffusion(
    mut matrix: DMatrixViewMut<f64>,
    mut vector: DVectorViewMut<f64>,
    values: &ElementValues,
    coefficients: &impl CoefficientModel,
    forcing: &impl ScalarFunction,
) {
    let n = values.num_basis_functions();
    assert_eq!(matrix.nrows(), n, "Element matrix dimension mismatch");
    assert_eq!(matrix.ncols(), n, "Element matrix dimension mismatch");
    assert_eq!(vector.len(), n, "Element vector dimension mismatch");

    for q in 0..values.num_quadrature_points() {
        let x = values.point(q);
        let c = coefficients.evaluate(x);
        let f = forcing.evaluate(x);
        let jxw = values.jxw(q);
        let phi = values.values(q);
        let grad = values.gradients(q);

        for i in 0..n {
            let advection_i = c.advection * grad[i].dot(&c.direction);
            let stabilization_i = c.diffusion * values.stabilization(i, q);
            for j in 0..n {
                let a_ij = c.diffusion * grad[i].dot(&grad[j]) - advection_i * phi[j]
                    + stabilization_i * values.stabilization(j, q);
                matrix[(i, j)] += a_ij * jxw;
            }
            vector[i] += phi[i] * f * jxw;
        }
    }
}

pub struct AdvectionDiffusionAssemblerBuilder<Space, Coefficients, Forcing, Rule> {
    space: Space,
    coefficients: Coefficients,
    forcing: Forcing,
    rule: Rule,
}

impl AdvectionDiffusionAssemblerBuilder<(), (), (), ()> {
    pub fn new() -> Self {
        Self {
            space: (),
            coefficients: (),
            forcing: (),
            rule: (),
        }
    }
}

impl<C, F, R> AdvectionDiffusionAssemblerBuilder<(), C, F, R> {
    pub fn with_space(self, space: &QuadSpace) -> AdvectionDiffusionAssemblerBuilder<&QuadSpace, C, F, R> {
        AdvectionDiffusionAssemblerBuilder {
            space,
            coefficients: self.coefficients,
            forcing: self.forcing,
            rule: self.rule,
        }
    }
}

impl<S, F, R> AdvectionDiffusionAssemblerBuilder<S, (), F, R> {
    pub fn with_coefficients<C>(self, coefficients: &C) -> AdvectionDiffusionAssemblerBuilder<S, &C, F, R> {
        AdvectionDiffusionAssemblerBuilder {
            space: self.space,
            coefficients,
            forcing: self.forcing,
            rule: self.rule,
        }
    }
}

impl<S, C, R> AdvectionDiffusionAssemblerBuilder<S, C, (), R> {
    pub fn with_forcing<F>(self, forcing: &F) -> AdvectionDiffusionAssemblerBuilder<S, C, &F, R> {
        AdvectionDiffusionAssemblerBuilder {
            space: self.space,
            coefficients: self.coefficients,
            forcing,
            rule: self.rule,
        }
    }
}

impl<S, C, F> AdvectionDiffusionAssemblerBuilder<S, C, F, ()> {
    pub fn with_quadrature(
        self,
        rule: &QuadraturePair2d,
    ) -> AdvectionDiffusionAssemblerBuilder<S, C, F, &QuadraturePair2d> {
        AdvectionDiffusionAssemblerBuilder {
            space: self.space,
            coefficients: self.coefficients,
            forcing: self.forcing,
            rule,
        }
    }
}

impl<'a, C, F> AdvectionDiffusionAssemblerBuilder<&'a QuadSpace, &'a C, &'a F, &'a QuadraturePair2d> {
    pub fn build(self) -> AdvectionDiffusionAssembler<'a, C, F> {
        AdvectionDiffusionAssembler {
            space: self.space,
            coefficients: self.coefficients,
            forcing: self.forcing,
            rule: self.rule,
            workspace: ThreadLocal::new(),
        }
    }
}

/// Element assembler for the stationary advection-diffusion operator on a [`QuadSpace`].
///
/// Each thread lazily creates its own [`ElementValues`] buffer, so the assembler can be shared
/// between threads when the coefficients and the forcing are `Sync`.
pub struct AdvectionDiffusionAssembler<'a, C, F> {
    space: &'a QuadSpace,
    coefficients: &'a C,
    forcing: &'a F,
    rule: &'a QuadraturePair2d,
    workspace: ThreadLocal<RefCell<ElementValues>>,
}

impl<'a, C, F> ElementConnectivityAssembler for AdvectionDiffusionAssembler<'a, C, F> {
    fn num_elements(&self) -> usize {
        self.space.num_elements()
    }

    fn num_nodes(&self) -> usize {
        self.space.num_nodes()
    }

    fn element_node_count(&self, element_index: usize) -> usize {
        self.space.element_node_count(element_index)
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        self.space.populate_element_nodes(output, element_index)
    }
}

impl<'a, C, F> ElementSystemAssembler for AdvectionDiffusionAssembler<'a, C, F>
where
    C: CoefficientModel,
    F: ScalarFunction,
{
    fn assemble_element_system_into(
        &self,
        element_index: usize,
        matrix: DMatrixViewMut<f64>,
        vector: DVectorViewMut<f64>,
    ) {
        let values = self
            .workspace
            .get_or(|| RefCell::new(ElementValues::new(self.space.degree(), self.rule)));
        let values = &mut *values.borrow_mut();
        values.reinit(self.space.element(element_index));
        assemble_element_advection_diffusion(matrix, vector, values, self.coefficients, self.forcing);
    }

    fn as_connectivity_assembler(&self) -> &dyn ElementConnectivityAssembler {
        self
    }
}
