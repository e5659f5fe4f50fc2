//! Quadrature rules for the reference domains used by `adfem`.
//!
//! The reference interval is `[-1, 1]` and the reference quadrilateral is `[-1, 1]^2`.
//! Rules are returned as pairs of weights and points, so that they can be consumed without
//! depending on any particular linear algebra library.

pub mod tensor;
pub mod univariate;

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A two-dimensional point.
pub type Point2 = Point<2>;

/// A D-dimensional rule.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .map(|(w, x)| *w * f(x))
        .sum()
}
