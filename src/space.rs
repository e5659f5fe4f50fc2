//! Continuous Lagrange finite element spaces on quadrilateral meshes.
use crate::assembly::local::ElementConnectivityAssembler;
use crate::coefficients::ScalarFunction;
use crate::connectivity::Connectivity;
use crate::element::{FeDegree, Quad4d2Element};
use crate::mesh::{BoundaryTag, QuadMesh2d};
use nalgebra::Point2;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Degree-of-freedom numbering of a continuous Lagrange basis on a [`QuadMesh2d`].
///
/// DOFs are numbered as follows: one DOF per mesh vertex, with the same index as the vertex;
/// for degree 2, one DOF per unique edge in the order edges are first encountered when visiting
/// cells and faces in order, followed by one DOF per cell interior.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadSpace {
    degree: FeDegree,
    elements: Vec<Quad4d2Element<f64>>,
    // Local-to-global map, `nodes_per_cell` entries per cell
    cell_dofs: Vec<usize>,
    support_points: Vec<Point2<f64>>,
}

impl QuadSpace {
    pub fn new(mesh: &QuadMesh2d, degree: FeDegree) -> Self {
        let nodes_per_cell = degree.nodes_per_cell();
        let elements: Vec<_> = mesh.cell_elements().collect();
        let mut cell_dofs = Vec::with_capacity(nodes_per_cell * mesh.num_active_cells());
        let mut support_points = mesh.vertices().to_vec();

        match degree {
            FeDegree::Linear => {
                for conn in mesh.connectivity() {
                    cell_dofs.extend_from_slice(conn.vertex_indices());
                }
            }
            FeDegree::Quadratic => {
                let reference_nodes = degree.reference_nodes::<f64>();
                let mut edge_dofs = FxHashMap::default();
                for (conn, element) in mesh.connectivity().iter().zip(&elements) {
                    cell_dofs.extend_from_slice(conn.vertex_indices());
                    for face in 0..conn.num_faces() {
                        let edge = conn
                            .get_face_connectivity(face)
                            .expect("Quadrilaterals have four faces");
                        let dof = *edge_dofs.entry(edge.sorted()).or_insert_with(|| {
                            support_points.push(element.map_reference_coords(&reference_nodes[4 + face]));
                            support_points.len() - 1
                        });
                        cell_dofs.push(dof);
                    }
                    // Interior DOFs are appended after all edge DOFs, patched up below
                    cell_dofs.push(usize::MAX);
                }
                for (cell_index, element) in elements.iter().enumerate() {
                    support_points.push(element.map_reference_coords(&reference_nodes[8]));
                    cell_dofs[nodes_per_cell * cell_index + 8] = support_points.len() - 1;
                }
            }
        }

        Self {
            degree,
            elements,
            cell_dofs,
            support_points,
        }
    }

    pub fn degree(&self) -> FeDegree {
        self.degree
    }

    pub fn num_cells(&self) -> usize {
        self.elements.len()
    }

    pub fn num_dofs(&self) -> usize {
        self.support_points.len()
    }

    /// Global DOF indices of the given cell in local node order.
    pub fn cell_dofs(&self, cell_index: usize) -> &[usize] {
        let n = self.degree.nodes_per_cell();
        &self.cell_dofs[n * cell_index..n * (cell_index + 1)]
    }

    pub fn element(&self, cell_index: usize) -> &Quad4d2Element<f64> {
        &self.elements[cell_index]
    }

    /// Physical location of the node associated with each DOF.
    pub fn support_points(&self) -> &[Point2<f64>] {
        &self.support_points
    }

    /// Evaluates a function at every support point.
    pub fn interpolate(&self, f: &impl ScalarFunction) -> Vec<f64> {
        self.support_points.iter().map(|x| f.evaluate(x)).collect()
    }

    /// Prescribed values `g(x)` for all DOFs on boundary edges with a tag in `tags`.
    ///
    /// The mesh must be the one the space was constructed from.
    pub fn boundary_values(
        &self,
        mesh: &QuadMesh2d,
        tags: &[BoundaryTag],
        g: &impl ScalarFunction,
    ) -> BTreeMap<usize, f64> {
        assert_eq!(
            mesh.num_active_cells(),
            self.num_cells(),
            "Mesh does not match the space"
        );
        let mut values = BTreeMap::new();
        for cell_index in 0..self.num_cells() {
            let dofs = self.cell_dofs(cell_index);
            for face in 0..4 {
                let is_constrained = mesh
                    .boundary_tag(cell_index, face)
                    .map_or(false, |tag| tags.contains(&tag));
                if is_constrained {
                    for &local in self.degree.face_nodes(face) {
                        let dof = dofs[local];
                        values
                            .entry(dof)
                            .or_insert_with(|| g.evaluate(&self.support_points[dof]));
                    }
                }
            }
        }
        values
    }
}

impl ElementConnectivityAssembler for QuadSpace {
    fn num_elements(&self) -> usize {
        self.num_cells()
    }

    fn num_nodes(&self) -> usize {
        self.num_dofs()
    }

    fn element_node_count(&self, _element_index: usize) -> usize {
        self.degree.nodes_per_cell()
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(self.cell_dofs(element_index));
    }
}
