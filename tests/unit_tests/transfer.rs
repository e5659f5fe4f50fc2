use adfem::element::FeDegree;
use adfem::mesh::procedural::{create_reference_domain, create_unit_square_uniform_quad_mesh_2d};
use adfem::mesh::refinement::refine_uniformly;
use adfem::space::QuadSpace;
use adfem::transfer::transfer_to_refined;
use nalgebra::{DVector, Point2};
use util::max_abs_diff;

fn check_exact_transfer(degree: FeDegree, f: impl Fn(&Point2<f64>) -> f64) {
    let coarse_mesh = create_unit_square_uniform_quad_mesh_2d(3);
    let fine_mesh = refine_uniformly(&coarse_mesh);
    let coarse = QuadSpace::new(&coarse_mesh, degree);
    let fine = QuadSpace::new(&fine_mesh, degree);

    let coarse_values = DVector::from_vec(coarse.interpolate(&f));
    let transferred = transfer_to_refined(&coarse, &coarse_values, &fine);
    let expected = DVector::from_vec(fine.interpolate(&f));
    assert!(max_abs_diff(&transferred, &expected) < 1e-13);
}

#[test]
fn transfer_reproduces_bilinear_functions() {
    check_exact_transfer(FeDegree::Linear, |x| 1.0 + 2.0 * x.x - 3.0 * x.y + 4.0 * x.x * x.y);
}

#[test]
fn transfer_reproduces_biquadratic_functions() {
    check_exact_transfer(FeDegree::Quadratic, |x| {
        x.x * x.x * x.y * x.y - 2.0 * x.x * x.y * x.y + x.y * x.y + 0.5 * x.x - 1.0
    });
}

#[test]
fn transfer_of_linear_interpolant_is_linear_interpolant() {
    // A non-polynomial function is transferred as its coarse interpolant
    let coarse_mesh = create_reference_domain(false);
    let fine_mesh = refine_uniformly(&coarse_mesh);
    let coarse = QuadSpace::new(&coarse_mesh, FeDegree::Linear);
    let fine = QuadSpace::new(&fine_mesh, FeDegree::Linear);
    let coarse_values = DVector::from_vec(vec![0.0, 1.0, 1.0, 4.0]);
    let transferred = transfer_to_refined(&coarse, &coarse_values, &fine);

    for (value, x) in transferred.iter().zip(fine.support_points()) {
        let bilinear = x.x + x.y + 2.0 * x.x * x.y;
        assert!((value - bilinear).abs() < 1e-14);
    }
}

#[test]
#[should_panic(expected = "New space must be built on the uniform refinement of the old mesh")]
fn transfer_between_unrelated_spaces_panics() {
    let coarse = QuadSpace::new(&create_unit_square_uniform_quad_mesh_2d(2), FeDegree::Linear);
    let other = QuadSpace::new(&create_unit_square_uniform_quad_mesh_2d(3), FeDegree::Linear);
    transfer_to_refined(&coarse, &DVector::zeros(coarse.num_dofs()), &other);
}
