//! Quadrature rules expressed with `nalgebra` points.
use nalgebra::Point2;

/// Weights and points of a quadrature rule on the reference quadrilateral `[-1, 1]^2`.
pub type QuadraturePair2d = (Vec<f64>, Vec<Point2<f64>>);

/// A quadrature rule consisting of weights and points.
pub trait Quadrature2d {
    fn weights(&self) -> &[f64];
    fn points(&self) -> &[Point2<f64>];

    fn num_points(&self) -> usize {
        self.weights().len()
    }

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate<F>(&self, f: F) -> f64
    where
        F: Fn(&Point2<f64>) -> f64,
    {
        self.weights()
            .iter()
            .zip(self.points())
            .map(|(w, p)| w * f(p))
            .sum()
    }
}

impl Quadrature2d for QuadraturePair2d {
    fn weights(&self) -> &[f64] {
        &self.0
    }

    fn points(&self) -> &[Point2<f64>] {
        &self.1
    }
}

impl<X: Quadrature2d> Quadrature2d for &X {
    fn weights(&self) -> &[f64] {
        X::weights(self)
    }

    fn points(&self) -> &[Point2<f64>] {
        X::points(self)
    }
}

/// Tensor-product Gauss rule with `num_points_per_dim` points in each direction.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> QuadraturePair2d {
    let (weights, points) = adfem_quadrature::tensor::quadrilateral_gauss(num_points_per_dim);
    let points = points.into_iter().map(Point2::from).collect();
    (weights, points)
}
