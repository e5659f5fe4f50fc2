//! Enforcement of prescribed (Dirichlet) values on an assembled linear system.
use nalgebra::DVectorViewMut;
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeMap;

/// Modifies `matrix` and `rhs` in place so that the solution takes the prescribed values at the
/// constrained DOFs.
///
/// For each constrained DOF `i` with value `g_i`:
///
/// - the off-diagonal entries of row `i` and column `i` are set to zero,
/// - the diagonal `d_i` keeps its magnitude, or is set to a representative scale of the matrix if it
///   is zero,
/// - `rhs_i` is set to `d_i g_i`,
/// - every unconstrained row `j` has `a_ji g_i` subtracted from `rhs_j` before `a_ji` is zeroed.
///
/// Applying the function again with the same values leaves the system unchanged.
///
/// The sparsity pattern of `matrix` must be structurally symmetric, which is the case for patterns
/// built from element connectivity.
///
/// # Panics
///
/// Panics if a constrained DOF is out of bounds or its diagonal entry is not in the pattern.
pub fn apply_boundary_values<'a>(
    matrix: &mut CsrMatrix<f64>,
    rhs: impl Into<DVectorViewMut<'a, f64>>,
    boundary_values: &BTreeMap<usize, f64>,
) {
    let mut rhs = rhs.into();
    let n = matrix.nrows();
    assert_eq!(matrix.ncols(), n, "Matrix must be square");
    assert_eq!(rhs.len(), n, "Right-hand side dimension mismatch");

    // Determine an appropriately scaled element to put on zero diagonals
    // (Simply setting 1 would ignore the scaling of the entries of the matrix, leading
    // to potentially poor condition numbers)
    let scale = (0..n)
        .filter_map(|i| diagonal_entry(matrix, i))
        .map(f64::abs)
        .find(|&x| x != 0.0)
        .unwrap_or(1.0);

    let mut constrained = vec![false; n];
    let mut rows_to_visit = vec![false; n];
    for &dof in boundary_values.keys() {
        assert!(dof < n, "Constrained DOF {} out of bounds", dof);
        constrained[dof] = true;
        // If we need to zero out (i, j), then we also need to zero out (j, i),
        // so we need to visit row j later
        for &j in matrix.row(dof).col_indices() {
            rows_to_visit[j] = true;
        }
    }

    // Eliminate constrained columns from unconstrained rows
    for row_index in (0..n).filter(|&j| rows_to_visit[j] && !constrained[j]) {
        let mut row = matrix.row_mut(row_index);
        let (cols, values) = row.cols_and_values_mut();
        for (&col, value) in cols.iter().zip(values) {
            if let Some(&g) = boundary_values.get(&col) {
                rhs[row_index] -= *value * g;
                *value = 0.0;
            }
        }
    }

    for (&dof, &g) in boundary_values {
        let mut row = matrix.row_mut(dof);
        let (cols, values) = row.cols_and_values_mut();
        let mut diagonal = None;
        for (&col, value) in cols.iter().zip(values) {
            if col == dof {
                let d = if *value != 0.0 { value.abs() } else { scale };
                *value = d;
                diagonal = Some(d);
            } else {
                *value = 0.0;
            }
        }
        let d = diagonal.expect("Constrained DOF must have a diagonal entry in the sparsity pattern");
        rhs[dof] = d * g;
    }
}

/// Returns the diagonal entry of row `i`, or `None` if it is not part of the pattern.
pub fn diagonal_entry(matrix: &CsrMatrix<f64>, i: usize) -> Option<f64> {
    let row = matrix.row(i);
    row.col_indices()
        .binary_search(&i)
        .ok()
        .map(|local_idx| row.values()[local_idx])
}
