use adfem_quadrature::integrate;
use adfem_quadrature::tensor::quadrilateral_gauss;

use matrixcompare::assert_scalar_eq;

#[test]
fn quadrilateral_gauss_integrates_tensor_monomials() {
    let monomial_integral_1d = |alpha: i32| (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0);

    for n in 1..=5 {
        let rule = quadrilateral_gauss(n);
        assert_eq!(rule.0.len(), n * n);
        assert_eq!(rule.1.len(), n * n);

        let max_degree = 2 * n as i32 - 1;
        for alpha in 0..=max_degree {
            for beta in 0..=max_degree {
                let expected = monomial_integral_1d(alpha) * monomial_integral_1d(beta);
                let estimated = integrate(&rule, |&[x, y]| x.powi(alpha) * y.powi(beta));
                assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-13);
            }
        }
    }
}

#[test]
fn quadrilateral_gauss_weights_sum_to_area() {
    let (weights, _) = quadrilateral_gauss(3);
    let area: f64 = weights.iter().sum();
    assert_scalar_eq!(area, 4.0, comp = abs, tol = 1e-14);
}
