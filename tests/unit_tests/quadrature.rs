use adfem::quadrature::{quadrilateral_gauss, Quadrature2d};
use matrixcompare::assert_scalar_eq;
use nalgebra::Point2;

#[test]
fn gauss_rules_integrate_reference_area() {
    for n in 1..=5 {
        let rule = quadrilateral_gauss(n);
        assert_eq!(rule.num_points(), n * n);
        assert_scalar_eq!(rule.integrate(|_| 1.0), 4.0, comp = abs, tol = 1e-13);
    }
}

#[test]
fn gauss_rules_are_exact_for_tensor_polynomials() {
    // An n-point Gauss rule is exact for degree 2n - 1 in each variable
    for n in 1..=4 {
        let rule = quadrilateral_gauss(n);
        let p = 2 * n as i32 - 1;
        let monomial = |x: &Point2<f64>| x.x.powi(p - 1) * x.y.powi(p - 1) + x.x.powi(p);
        let exact_1d = |k: i32| if k % 2 == 0 { 2.0 / (k + 1) as f64 } else { 0.0 };
        let expected = exact_1d(p - 1) * exact_1d(p - 1) + exact_1d(p) * 2.0;
        assert_scalar_eq!((&rule).integrate(monomial), expected, comp = abs, tol = 1e-13);
    }
}
