use crate::element::{FeDegree, Quad4d2Element};
use crate::quadrature::Quadrature2d;
use nalgebra::{Point2, Vector2};

/// Basis function values, physical gradients and integration weights of a single element
/// at the points of a fixed quadrature rule.
///
/// Reference basis values and gradients are tabulated once on construction, so that
/// [`reinit`](Self::reinit) only needs to evaluate the geometric map.
#[derive(Debug, Clone)]
pub struct ElementValues {
    degree: FeDegree,
    weights: Vec<f64>,
    // Tables with `nodes_per_cell` entries per quadrature point
    reference_values: Vec<f64>,
    reference_gradients: Vec<Vector2<f64>>,
    gradients: Vec<Vector2<f64>>,
    reference_points: Vec<Point2<f64>>,
    points: Vec<Point2<f64>>,
    jxw: Vec<f64>,
}

impl ElementValues {
    pub fn new(degree: FeDegree, rule: impl Quadrature2d) -> Self {
        let n = degree.nodes_per_cell();
        let num_points = rule.num_points();
        let mut reference_values = vec![0.0; n * num_points];
        let mut reference_gradients = vec![Vector2::zeros(); n * num_points];
        for (q, xi) in rule.points().iter().enumerate() {
            degree.populate_basis(&mut reference_values[n * q..n * (q + 1)], xi);
            degree.populate_basis_gradients(&mut reference_gradients[n * q..n * (q + 1)], xi);
        }

        Self {
            degree,
            weights: rule.weights().to_vec(),
            reference_values,
            gradients: reference_gradients.clone(),
            reference_gradients,
            reference_points: rule.points().to_vec(),
            points: vec![Point2::origin(); num_points],
            jxw: vec![0.0; num_points],
        }
    }

    /// Recomputes physical quantities for the given element.
    ///
    /// # Panics
    ///
    /// Panics if the element map is degenerate at a quadrature point.
    pub fn reinit(&mut self, element: &Quad4d2Element<f64>) {
        let n = self.num_basis_functions();
        for (q, xi) in self.reference_points.iter().enumerate() {
            let j = element.reference_jacobian(xi);
            let det_j = j.determinant();
            let j_inv_t = j
                .try_inverse()
                .filter(|_| det_j != 0.0)
                .expect("Element has a degenerate (non-invertible) Jacobian")
                .transpose();

            self.points[q] = element.map_reference_coords(xi);
            self.jxw[q] = det_j.abs() * self.weights[q];
            for (gradient, reference_gradient) in self.gradients[n * q..n * (q + 1)]
                .iter_mut()
                .zip(&self.reference_gradients[n * q..n * (q + 1)])
            {
                *gradient = j_inv_t * reference_gradient;
            }
        }
    }

    pub fn degree(&self) -> FeDegree {
        self.degree
    }

    pub fn num_basis_functions(&self) -> usize {
        self.degree.nodes_per_cell()
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.weights.len()
    }

    /// Value of basis function `i` at quadrature point `q`.
    pub fn value(&self, i: usize, q: usize) -> f64 {
        self.reference_values[self.num_basis_functions() * q + i]
    }

    /// Values of all basis functions at quadrature point `q`.
    pub fn values(&self, q: usize) -> &[f64] {
        let n = self.num_basis_functions();
        &self.reference_values[n * q..n * (q + 1)]
    }

    /// Physical gradient of basis function `i` at quadrature point `q`.
    pub fn gradient(&self, i: usize, q: usize) -> &Vector2<f64> {
        &self.gradients[self.num_basis_functions() * q + i]
    }

    /// Physical gradients of all basis functions at quadrature point `q`.
    pub fn gradients(&self, q: usize) -> &[Vector2<f64>] {
        let n = self.num_basis_functions();
        &self.gradients[n * q..n * (q + 1)]
    }

    /// The stabilization scalar of basis function `i` at quadrature point `q`: the
    /// x-component of its physical gradient.
    pub fn stabilization(&self, i: usize, q: usize) -> f64 {
        self.gradient(i, q).x
    }

    /// Physical location of quadrature point `q`.
    pub fn point(&self, q: usize) -> &Point2<f64> {
        &self.points[q]
    }

    /// Integration weight of quadrature point `q`, scaled by the Jacobian determinant.
    pub fn jxw(&self, q: usize) -> f64 {
        self.jxw[q]
    }
}
