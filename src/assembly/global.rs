use crate::assembly::local::{ElementConnectivityAssembler, ElementSystemAssembler, LocalContribution};
use nalgebra::{DMatrix, DVector, DVectorViewMut, Dyn, Matrix, U1};
use nalgebra::base::storage::Storage;
use nalgebra_sparse::csr::CsrRowMut;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use std::cell::RefCell;
use std::collections::BTreeSet;

/// An assembler for CSR matrices.
#[derive(Debug, Clone)]
pub struct CsrAssembler {
    // All members are buffers that help prevent unnecessary allocations
    // when assembling multiple matrices with the same assembler
    workspace: RefCell<CsrAssemblerWorkspace>,
}

impl Default for CsrAssembler {
    fn default() -> Self {
        Self {
            workspace: RefCell::new(CsrAssemblerWorkspace::default()),
        }
    }
}

#[derive(Debug, Clone)]
struct CsrAssemblerWorkspace {
    connectivity_permutation: Vec<usize>,
    element_global_nodes: Vec<usize>,
    element_matrix: DMatrix<f64>,
    element_vector: DVector<f64>,
}

impl Default for CsrAssemblerWorkspace {
    fn default() -> Self {
        Self {
            connectivity_permutation: Vec::new(),
            element_global_nodes: Vec::new(),
            element_matrix: DMatrix::zeros(0, 0),
            element_vector: DVector::zeros(0),
        }
    }
}

impl CsrAssembler {
    /// Builds the sparsity pattern containing every pair of global nodes that share an element.
    ///
    /// The pattern is structurally symmetric and has all diagonal entries of nodes that belong
    /// to at least one element.
    pub fn assemble_pattern(&self, element_assembler: &dyn ElementConnectivityAssembler) -> SparsityPattern {
        // Here we optimize for memory usage rather than performance: by collecting into a
        // BTreeSet we store each matrix entry exactly once.
        let mut matrix_entries = BTreeSet::new();
        let mut element_global_nodes = Vec::new();
        for i in 0..element_assembler.num_elements() {
            let element_node_count = element_assembler.element_node_count(i);
            element_global_nodes.resize(element_node_count, usize::MAX);
            element_assembler.populate_element_nodes(&mut element_global_nodes, i);

            for &node_i in &element_global_nodes {
                for &node_j in &element_global_nodes {
                    matrix_entries.insert((node_i, node_j));
                }
            }
        }

        let num_rows = element_assembler.num_nodes();
        let mut offsets = Vec::with_capacity(num_rows + 1);
        let mut column_indices = Vec::with_capacity(matrix_entries.len());

        offsets.push(0);
        for (i, j) in matrix_entries {
            assert!(i < num_rows && j < num_rows, "Element node index out of bounds");
            while i + 1 > offsets.len() {
                // This condition indicates that we have reached a new row. We need to run this
                // in a while loop to correctly handle consecutive empty rows
                offsets.push(column_indices.len());
            }
            column_indices.push(j);
        }

        // Make sure we fill out the remaining offsets if the last rows are empty
        while offsets.len() < (num_rows + 1) {
            offsets.push(column_indices.len());
        }

        SparsityPattern::try_from_offsets_and_indices(num_rows, num_rows, offsets, column_indices)
            .expect("Offsets and indices are sorted and in bounds by construction")
    }

    /// Assembles a CSR matrix with the given pattern and the right-hand side vector.
    pub fn assemble_system(
        &self,
        pattern: SparsityPattern,
        element_assembler: &dyn ElementSystemAssembler,
    ) -> (CsrMatrix<f64>, DVector<f64>) {
        let (mut matrix, mut rhs) = zero_system(pattern);
        self.assemble_system_into(&mut matrix, &mut rhs, element_assembler);
        (matrix, rhs)
    }

    /// Adds all element contributions to `csr` and `rhs`, visiting elements in order.
    ///
    /// # Panics
    ///
    /// Panics if an element writes to an entry outside the sparsity pattern of `csr`, or if the
    /// dimensions of `csr` or `rhs` do not match the number of nodes.
    pub fn assemble_system_into<'a>(
        &self,
        csr: &mut CsrMatrix<f64>,
        rhs: impl Into<DVectorViewMut<'a, f64>>,
        element_assembler: &dyn ElementSystemAssembler,
    ) {
        let mut rhs = rhs.into();
        check_system_dimensions(csr, rhs.len(), element_assembler.as_connectivity_assembler());

        // Reuse previously allocated buffers
        let ws = &mut *self.workspace.borrow_mut();

        for i in 0..element_assembler.num_elements() {
            let element_node_count = element_assembler.element_node_count(i);

            ws.element_global_nodes.resize(element_node_count, 0);
            ws.element_matrix
                .resize_mut(element_node_count, element_node_count, 0.0);
            ws.element_matrix.fill(0.0);
            ws.element_vector
                .resize_vertically_mut(element_node_count, 0.0);
            ws.element_vector.fill(0.0);

            element_assembler.assemble_element_system_into(
                i,
                (&mut ws.element_matrix).into(),
                (&mut ws.element_vector).into(),
            );
            element_assembler.populate_element_nodes(&mut ws.element_global_nodes, i);

            scatter_element_system(
                csr,
                &mut rhs,
                &ws.element_global_nodes,
                &mut ws.connectivity_permutation,
                &ws.element_matrix,
                &ws.element_vector,
            );
        }
    }

    /// Computes element contributions in parallel and adds them to `csr` and `rhs` in element
    /// order, producing bit-identical results to [`assemble_system_into`](Self::assemble_system_into).
    pub fn par_assemble_system_into<'a>(
        &self,
        csr: &mut CsrMatrix<f64>,
        rhs: impl Into<DVectorViewMut<'a, f64>>,
        element_assembler: &(dyn Sync + ElementSystemAssembler),
    ) {
        let mut rhs = rhs.into();
        check_system_dimensions(csr, rhs.len(), element_assembler.as_connectivity_assembler());

        let contributions: Vec<LocalContribution> = (0..element_assembler.num_elements())
            .into_par_iter()
            .with_min_len(50)
            .map(|element_index| LocalContribution::compute(element_assembler, element_index))
            .collect();

        let ws = &mut *self.workspace.borrow_mut();
        for contribution in &contributions {
            scatter_element_system(
                csr,
                &mut rhs,
                &contribution.global_nodes,
                &mut ws.connectivity_permutation,
                &contribution.matrix,
                &contribution.vector,
            );
        }
    }
}

/// Creates a zero matrix with the given pattern and a zero vector of matching dimension.
pub fn zero_system(pattern: SparsityPattern) -> (CsrMatrix<f64>, DVector<f64>) {
    let n = pattern.major_dim();
    let values = vec![0.0; pattern.nnz()];
    let matrix = CsrMatrix::try_from_pattern_and_values(pattern, values)
        .expect("Value count matches the pattern by construction");
    (matrix, DVector::zeros(n))
}

fn check_system_dimensions(csr: &CsrMatrix<f64>, rhs_len: usize, assembler: &dyn ElementConnectivityAssembler) {
    let n = assembler.num_nodes();
    assert_eq!(csr.nrows(), n, "Matrix row count must match the number of nodes");
    assert_eq!(csr.ncols(), n, "Matrix column count must match the number of nodes");
    assert_eq!(rhs_len, n, "Right-hand side length must match the number of nodes");
}

fn scatter_element_system(
    csr: &mut CsrMatrix<f64>,
    rhs: &mut DVectorViewMut<f64>,
    element_global_nodes: &[usize],
    connectivity_permutation: &mut Vec<usize>,
    element_matrix: &DMatrix<f64>,
    element_vector: &DVector<f64>,
) {
    let n = element_global_nodes.len();
    assert_eq!(element_matrix.nrows(), n, "Local and global DOF counts differ");
    assert_eq!(element_vector.len(), n, "Local and global DOF counts differ");

    connectivity_permutation.clear();
    connectivity_permutation.extend(0..n);
    connectivity_permutation.sort_unstable_by_key(|i| element_global_nodes[*i]);

    for (local_node_idx, &global_node_idx) in element_global_nodes.iter().enumerate() {
        let mut csr_row = csr.row_mut(global_node_idx);
        let a_row = element_matrix.row(local_node_idx);
        add_element_row_to_csr_row(&mut csr_row, element_global_nodes, connectivity_permutation, &a_row);
        rhs[global_node_idx] += element_vector[local_node_idx];
    }
}

/// Add a row of a local element matrix to the provided row of a CSR matrix.
///
/// `node_connectivity`: The global indices of nodes.
/// `sorted_permutation`: The local indices of nodes in the element, ordered such that the
///    corresponding global indices are sorted.
/// `local_row`: The local row of the element matrix that should be added to the CSR matrix.
fn add_element_row_to_csr_row<S>(
    row: &mut CsrRowMut<f64>,
    node_connectivity: &[usize],
    sorted_permutation: &[usize],
    local_row: &Matrix<f64, U1, Dyn, S>,
) where
    S: Storage<f64, U1, Dyn>,
{
    assert_eq!(node_connectivity.len(), sorted_permutation.len());
    assert_eq!(node_connectivity.len(), local_row.ncols());

    let (column_indices, values) = row.cols_and_values_mut();

    let mut csr_col_idx_iter = column_indices.iter().copied().enumerate();

    for &node_local_idx in sorted_permutation {
        let global_col_index = node_connectivity[node_local_idx];

        // TODO: If the CSR matrix has a large number of entries in each row,
        // an exponential search may be faster than a linear search as we do here
        let (local_csr_col_idx, _) = csr_col_idx_iter
            .find(|(_, csr_col_idx)| *csr_col_idx == global_col_index)
            .expect("Could not find column index associated with node in CSR row");
        values[local_csr_col_idx] += local_row[node_local_idx];
    }
}
