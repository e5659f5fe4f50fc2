use adfem::coefficients::Constant;
use adfem::element::FeDegree;
use adfem::error::{estimate_H1_seminorm_error, estimate_L2_error, estimate_L2_error_squared};
use adfem::mesh::procedural::create_unit_square_uniform_quad_mesh_2d;
use adfem::quadrature::quadrilateral_gauss;
use adfem::space::QuadSpace;
use matrixcompare::assert_scalar_eq;
use nalgebra::{DVector, Point2, Vector2};

#[test]
fn interpolant_of_space_member_has_zero_error() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(3);
    let rule = quadrilateral_gauss(4);
    let f = |x: &Point2<f64>| x.x * x.x * x.y - 3.0 * x.y + 1.0;
    let f_grad = |x: &Point2<f64>| Vector2::new(2.0 * x.x * x.y, x.x * x.x - 3.0);

    let space = QuadSpace::new(&mesh, FeDegree::Quadratic);
    let u_h = DVector::from_vec(space.interpolate(&f));
    assert!(estimate_L2_error(&space, &u_h, &f, &rule) < 1e-13);
    assert!(estimate_H1_seminorm_error(&space, &u_h, f_grad, &rule) < 1e-12);
}

#[test]
fn errors_of_zero_solution() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(2);
    let rule = quadrilateral_gauss(3);
    for degree in [FeDegree::Linear, FeDegree::Quadratic] {
        let space = QuadSpace::new(&mesh, degree);
        let zero = DVector::zeros(space.num_dofs());

        assert_scalar_eq!(
            estimate_L2_error_squared(&space, &zero, &Constant(2.0), &rule),
            4.0,
            comp = abs,
            tol = 1e-13
        );
        // |grad (x + 2y)|^2 = 5 over the unit square
        let h1 = estimate_H1_seminorm_error(&space, &zero, |_: &Point2<f64>| Vector2::new(1.0, 2.0), &rule);
        assert_scalar_eq!(h1, 5.0f64.sqrt(), comp = abs, tol = 1e-13);
    }
}

#[test]
fn interpolation_error_decreases_with_refinement() {
    let u = |x: &Point2<f64>| (3.0 * x.x).sin() * x.y.exp();
    let rule = quadrilateral_gauss(5);
    let errors: Vec<_> = [4, 8, 16]
        .into_iter()
        .map(|n| {
            let space = QuadSpace::new(&create_unit_square_uniform_quad_mesh_2d(n), FeDegree::Linear);
            let u_h = DVector::from_vec(space.interpolate(&u));
            estimate_L2_error(&space, &u_h, &u, &rule)
        })
        .collect();
    // Second order convergence for the bilinear interpolant
    for factor in util::reduction_factors(&errors) {
        assert!(factor < 0.3);
    }
}
