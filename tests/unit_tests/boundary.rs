use adfem::assembly::global::CsrAssembler;
use adfem::assembly::local::AdvectionDiffusionAssemblerBuilder;
use adfem::boundary::{apply_boundary_values, diagonal_entry};
use adfem::coefficients::{Constant, ConstantCoefficients};
use adfem::element::FeDegree;
use adfem::mesh::procedural::create_unit_square_uniform_quad_mesh_2d;
use adfem::quadrature::quadrilateral_gauss;
use adfem::space::QuadSpace;
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector, Point2};
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeMap;
use util::max_abs_diff;

fn dense_csr(matrix: &DMatrix<f64>) -> CsrMatrix<f64> {
    let n = matrix.nrows();
    let offsets = (0..=n).map(|i| i * n).collect();
    let indices = (0..n).flat_map(|_| 0..n).collect();
    let values = (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| matrix[(i, j)])
        .collect();
    CsrMatrix::try_from_csr_data(n, n, offsets, indices, values).unwrap()
}

fn assembled_system(degree: FeDegree) -> (QuadSpace, CsrMatrix<f64>, DVector<f64>, BTreeMap<usize, f64>) {
    let mesh = create_unit_square_uniform_quad_mesh_2d(3);
    let space = QuadSpace::new(&mesh, degree);
    let rule = quadrilateral_gauss(3);
    let coefficients = ConstantCoefficients::default();
    let forcing = |x: &Point2<f64>| 1.0 + x.x;
    let assembler = AdvectionDiffusionAssemblerBuilder::new()
        .with_space(&space)
        .with_coefficients(&coefficients)
        .with_forcing(&forcing)
        .with_quadrature(&rule)
        .build();
    let csr_assembler = CsrAssembler::default();
    let pattern = csr_assembler.assemble_pattern(&space);
    let (matrix, rhs) = csr_assembler.assemble_system(pattern, &assembler);
    let boundary_values = space.boundary_values(&mesh, &[0], &|x: &Point2<f64>| x.x - 2.0 * x.y);
    (space, matrix, rhs, boundary_values)
}

#[test]
fn small_system_elimination() {
    #[rustfmt::skip]
    let a = DMatrix::from_row_slice(3, 3, &[
        0.0, 1.0, 0.0,
        1.0, 4.0, 2.0,
        0.0, 3.0, -5.0,
    ]);
    let mut matrix = dense_csr(&a);
    let mut rhs = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
    let boundary_values: BTreeMap<_, _> = [(0, 2.0), (2, -1.0)].into_iter().collect();

    apply_boundary_values(&mut matrix, &mut rhs, &boundary_values);

    // Zero diagonals are replaced by the first nonzero diagonal magnitude, negative ones are flipped
    #[rustfmt::skip]
    let expected_matrix = DMatrix::from_row_slice(3, 3, &[
        4.0, 0.0, 0.0,
        0.0, 4.0, 0.0,
        0.0, 0.0, 5.0,
    ]);
    let expected_rhs = DVector::from_column_slice(&[8.0, 2.0 - 1.0 * 2.0 - 2.0 * (-1.0), -5.0]);
    assert_matrix_eq!(DMatrix::from(&matrix), expected_matrix);
    assert_eq!(rhs, expected_rhs);
}

#[test]
fn all_zero_diagonal_uses_unit_scale() {
    let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
    let mut matrix = dense_csr(&a);
    let mut rhs = DVector::from_column_slice(&[0.0, 0.0]);
    let boundary_values: BTreeMap<_, _> = [(0, 3.0)].into_iter().collect();
    apply_boundary_values(&mut matrix, &mut rhs, &boundary_values);
    assert_eq!(diagonal_entry(&matrix, 0), Some(1.0));
    assert_eq!(rhs, DVector::from_column_slice(&[3.0, -3.0]));
}

#[test]
fn diagonal_entry_outside_pattern() {
    let matrix = CsrMatrix::try_from_csr_data(2, 2, vec![0, 1, 2], vec![1, 0], vec![5.0, 6.0]).unwrap();
    assert_eq!(diagonal_entry(&matrix, 0), None);
    assert_eq!(diagonal_entry(&matrix, 1), None);
}

#[test]
#[should_panic(expected = "Constrained DOF 4 out of bounds")]
fn out_of_bounds_constraint_panics() {
    let mut matrix = dense_csr(&DMatrix::identity(3, 3));
    let mut rhs = DVector::<f64>::zeros(3);
    let boundary_values: BTreeMap<_, _> = [(4, 1.0)].into_iter().collect();
    apply_boundary_values(&mut matrix, &mut rhs, &boundary_values);
}

#[test]
fn eliminated_system_reproduces_boundary_values() {
    for degree in [FeDegree::Linear, FeDegree::Quadratic] {
        let (space, original_matrix, original_rhs, boundary_values) = assembled_system(degree);
        let mut matrix = original_matrix.clone();
        let mut rhs = original_rhs.clone();
        apply_boundary_values(&mut matrix, &mut rhs, &boundary_values);

        let x = DMatrix::from(&matrix).lu().solve(&rhs).unwrap();
        for (&dof, &g) in &boundary_values {
            assert!((x[dof] - g).abs() < 1e-12);
        }

        // The unconstrained equations of the original system are satisfied
        let residual = &original_rhs - DMatrix::from(&original_matrix) * &x;
        for i in (0..space.num_dofs()).filter(|i| !boundary_values.contains_key(i)) {
            assert!(residual[i].abs() < 1e-10);
        }

        // Rows and columns of constrained DOFs only keep their diagonal
        for &dof in boundary_values.keys() {
            let row = matrix.row(dof);
            for (&col, &value) in row.col_indices().iter().zip(row.values()) {
                assert!(col == dof || value == 0.0);
                let transposed = matrix.get_entry(col, dof).unwrap().into_value();
                assert!(col == dof || transposed == 0.0);
            }
            assert!(diagonal_entry(&matrix, dof).unwrap() > 0.0);
        }
    }
}

#[test]
fn elimination_is_idempotent() {
    let (_, mut matrix, mut rhs, boundary_values) = assembled_system(FeDegree::Quadratic);
    apply_boundary_values(&mut matrix, &mut rhs, &boundary_values);
    let once = matrix.clone();
    let once_rhs = rhs.clone();

    apply_boundary_values(&mut matrix, &mut rhs, &boundary_values);
    assert_eq!(matrix, once);
    assert_eq!(max_abs_diff(&rhs, &once_rhs), 0.0);
}

#[test]
fn empty_constraints_leave_system_unchanged() {
    let (_, original, original_rhs, _) = assembled_system(FeDegree::Linear);
    let mut matrix = original.clone();
    let mut rhs = original_rhs.clone();
    apply_boundary_values(&mut matrix, &mut rhs, &BTreeMap::new());
    assert_eq!(matrix, original);
    assert_eq!(rhs, original_rhs);
}
