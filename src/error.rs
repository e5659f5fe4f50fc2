//! Estimation of discretization errors against known solutions.
use crate::assembly::values::ElementValues;
use crate::coefficients::ScalarFunction;
use crate::quadrature::QuadraturePair2d;
use crate::space::QuadSpace;
use nalgebra::{DVector, Point2, Vector2};

fn accumulate_over_cells(
    space: &QuadSpace,
    u_h: &DVector<f64>,
    rule: &QuadraturePair2d,
    mut integrand: impl FnMut(&ElementValues, usize, &[f64]) -> f64,
) -> f64 {
    assert_eq!(u_h.len(), space.num_dofs(), "Solution does not match the space");
    let mut values = ElementValues::new(space.degree(), rule);
    let mut u_element = Vec::new();
    let mut result = 0.0;
    for cell_index in 0..space.num_cells() {
        values.reinit(space.element(cell_index));
        u_element.clear();
        u_element.extend(space.cell_dofs(cell_index).iter().map(|&dof| u_h[dof]));
        for q in 0..values.num_quadrature_points() {
            result += integrand(&values, q, &u_element) * values.jxw(q);
        }
    }
    result
}

/// Estimate the squared $L^2$ error $\norm{u_h - u}^2_{L^2}$ on the given finite element space
/// with the given solution weights and quadrature rule.
#[allow(non_snake_case)]
pub fn estimate_L2_error_squared(
    space: &QuadSpace,
    u_h: &DVector<f64>,
    u: &impl ScalarFunction,
    rule: &QuadraturePair2d,
) -> f64 {
    accumulate_over_cells(space, u_h, rule, |values, q, u_element| {
        let u_h_q: f64 = values
            .values(q)
            .iter()
            .zip(u_element)
            .map(|(phi, u_i)| phi * u_i)
            .sum();
        let e = u_h_q - u.evaluate(values.point(q));
        e * e
    })
}

/// Estimate the $L^2$ error $\norm{u_h - u}_{L^2}$ on the given finite element space
/// with the given solution weights and quadrature rule.
#[allow(non_snake_case)]
pub fn estimate_L2_error(space: &QuadSpace, u_h: &DVector<f64>, u: &impl ScalarFunction, rule: &QuadraturePair2d) -> f64 {
    estimate_L2_error_squared(space, u_h, u, rule).sqrt()
}

/// Estimate the squared $H^1$ *seminorm* error $\norm{\nabla u_h - \nabla u}^2_{L^2}$.
#[allow(non_snake_case)]
pub fn estimate_H1_seminorm_error_squared(
    space: &QuadSpace,
    u_h: &DVector<f64>,
    u_grad: impl Fn(&Point2<f64>) -> Vector2<f64>,
    rule: &QuadraturePair2d,
) -> f64 {
    accumulate_over_cells(space, u_h, rule, |values, q, u_element| {
        let u_h_grad = values
            .gradients(q)
            .iter()
            .zip(u_element)
            .fold(Vector2::zeros(), |acc, (grad_phi, u_i)| acc + grad_phi * *u_i);
        (u_h_grad - u_grad(values.point(q))).norm_squared()
    })
}

/// Estimate the $H^1$ *seminorm* error $\norm{\nabla u_h - \nabla u}_{L^2}$.
#[allow(non_snake_case)]
pub fn estimate_H1_seminorm_error(
    space: &QuadSpace,
    u_h: &DVector<f64>,
    u_grad: impl Fn(&Point2<f64>) -> Vector2<f64>,
    rule: &QuadraturePair2d,
) -> f64 {
    estimate_H1_seminorm_error_squared(space, u_h, u_grad, rule).sqrt()
}
