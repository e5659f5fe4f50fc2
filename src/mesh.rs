use crate::connectivity::{Connectivity, Quad4d2Connectivity, Segment2d2Connectivity};
use crate::element::Quad4d2Element;
use nalgebra::Point2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod procedural;
pub mod refinement;

/// Tag attached to a boundary edge, used to select Dirichlet boundaries.
pub type BoundaryTag = u32;

/// Index-based conforming quadrilateral mesh in two dimensions with tagged boundary edges.
///
/// Boundary edges are identified by their sorted vertex pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadMesh2d {
    vertices: Vec<Point2<f64>>,
    connectivity: Vec<Quad4d2Connectivity>,
    boundary_tags: BTreeMap<[usize; 2], BoundaryTag>,
}

impl QuadMesh2d {
    /// Construct a mesh from vertices and connectivity, tagging every boundary edge with tag `0`.
    ///
    /// # Panics
    ///
    /// Panics if the connectivity references vertices out of bounds.
    pub fn from_vertices_and_connectivity(vertices: Vec<Point2<f64>>, connectivity: Vec<Quad4d2Connectivity>) -> Self {
        let boundary_tags = find_boundary_edges(&connectivity)
            .into_iter()
            .map(|edge| (edge, 0))
            .collect();
        Self::from_parts(vertices, connectivity, boundary_tags)
    }

    /// Construct a mesh with an explicit boundary tag map.
    ///
    /// # Panics
    ///
    /// Panics if the connectivity or the tagged edges reference vertices out of bounds.
    pub fn from_parts(
        vertices: Vec<Point2<f64>>,
        connectivity: Vec<Quad4d2Connectivity>,
        boundary_tags: BTreeMap<[usize; 2], BoundaryTag>,
    ) -> Self {
        let num_vertices = vertices.len();
        let in_bounds = |idx: &usize| *idx < num_vertices;
        assert!(
            connectivity
                .iter()
                .all(|conn| conn.vertex_indices().iter().all(in_bounds)),
            "Connectivity references vertices out of bounds"
        );
        assert!(
            boundary_tags.keys().all(|edge| edge.iter().all(in_bounds)),
            "Boundary tags reference vertices out of bounds"
        );
        Self {
            vertices,
            connectivity,
            boundary_tags,
        }
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Quad4d2Connectivity] {
        &self.connectivity
    }

    /// Number of cells. Every cell of the mesh is active since refinement replaces parents.
    pub fn num_active_cells(&self) -> usize {
        self.connectivity.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the geometric element of the given cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell index is out of bounds.
    pub fn cell_element(&self, cell_index: usize) -> Quad4d2Element<f64> {
        self.connectivity[cell_index]
            .element(&self.vertices)
            .expect("Connectivity is validated on construction")
    }

    /// Enumerates the geometric elements of all cells in cell order.
    pub fn cell_elements(&self) -> impl Iterator<Item = Quad4d2Element<f64>> + '_ {
        (0..self.num_active_cells()).map(move |i| self.cell_element(i))
    }

    /// The boundary tag of face `face` of cell `cell_index`, or `None` for interior faces.
    pub fn boundary_tag(&self, cell_index: usize, face: usize) -> Option<BoundaryTag> {
        let edge = self.connectivity[cell_index].get_face_connectivity(face)?;
        self.boundary_tags.get(&edge.sorted()).copied()
    }

    /// Tagged boundary edges in ascending order of their sorted vertex pairs.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (Segment2d2Connectivity, BoundaryTag)> + '_ {
        self.boundary_tags
            .iter()
            .map(|(&edge, &tag)| (Segment2d2Connectivity(edge), tag))
    }

    pub fn boundary_tags(&self) -> &BTreeMap<[usize; 2], BoundaryTag> {
        &self.boundary_tags
    }

    /// Re-tags every boundary edge according to `tag_fn`, evaluated at the edge endpoints.
    pub fn retag_boundary(&mut self, mut tag_fn: impl FnMut(&Point2<f64>, &Point2<f64>) -> BoundaryTag) {
        let vertices = &self.vertices;
        for (&[a, b], tag) in self.boundary_tags.iter_mut() {
            *tag = tag_fn(&vertices[a], &vertices[b]);
        }
    }
}

/// Finds edges that belong to exactly one cell, as sorted vertex pairs.
pub fn find_boundary_edges(connectivity: &[Quad4d2Connectivity]) -> Vec<[usize; 2]> {
    let mut edge_counts = FxHashMap::default();
    for conn in connectivity {
        for face in 0..conn.num_faces() {
            if let Some(edge) = conn.get_face_connectivity(face) {
                *edge_counts.entry(edge.sorted()).or_insert(0usize) += 1;
            }
        }
    }
    let mut boundary_edges: Vec<_> = edge_counts
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .map(|(edge, _)| edge)
        .collect();
    boundary_edges.sort_unstable();
    boundary_edges
}
