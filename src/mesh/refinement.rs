//! Uniform refinement of quadrilateral meshes.
//!
//! Every cell is split into four children through its edge midpoints and its center. Child
//! `4 p + k` of parent `p` occupies the reference quadrant `k`, numbered counter-clockwise from
//! the quadrant containing the parent's vertex `0`. Existing vertices keep their indices and new
//! vertices are appended in the order they are first encountered.
use crate::connectivity::Quad4d2Connectivity;
use crate::mesh::QuadMesh2d;
use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Globally consistent description of a vertex in the refined mesh.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum VertexLabel {
    Vertex(usize),
    EdgeMidpoint([usize; 2]),
    CellCenter(usize),
}

impl VertexLabel {
    fn edge_midpoint(a: usize, b: usize) -> Self {
        Self::EdgeMidpoint(if a <= b { [a, b] } else { [b, a] })
    }

    fn construct_vertex(&self, mesh: &QuadMesh2d) -> Point2<f64> {
        let vertices = mesh.vertices();
        match *self {
            Self::Vertex(idx) => vertices[idx],
            Self::EdgeMidpoint([a, b]) => Point2::from((vertices[a].coords + vertices[b].coords) / 2.0),
            Self::CellCenter(cell) => {
                let sum = mesh.connectivity()[cell]
                    .iter()
                    .fold(Vector2::zeros(), |acc, &v| acc + vertices[v].coords);
                Point2::from(sum / 4.0)
            }
        }
    }
}

/// Reference-coordinate offsets of the four children within their parent.
///
/// The point `xi` in the reference square of child `k` corresponds to
/// `CHILD_OFFSETS[k] + xi / 2` in the reference square of the parent.
pub const CHILD_OFFSETS: [[f64; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];

/// Maps reference coordinates of child `k` to reference coordinates of its parent.
pub fn child_to_parent_reference_coords(child_local_index: usize, xi: &Point2<f64>) -> Point2<f64> {
    let [ox, oy] = CHILD_OFFSETS[child_local_index];
    Point2::new(ox + 0.5 * xi.x, oy + 0.5 * xi.y)
}

/// Vertex labels of the four children of a cell, in child order.
fn populate_child_labels(cell_index: usize, conn: &Quad4d2Connectivity, labels: &mut Vec<[VertexLabel; 4]>) {
    use VertexLabel::*;
    let [v0, v1, v2, v3] = conn.0;
    let m01 = VertexLabel::edge_midpoint(v0, v1);
    let m12 = VertexLabel::edge_midpoint(v1, v2);
    let m23 = VertexLabel::edge_midpoint(v2, v3);
    let m30 = VertexLabel::edge_midpoint(v3, v0);
    let c = CellCenter(cell_index);
    labels.push([Vertex(v0), m01, c, m30]);
    labels.push([m01, Vertex(v1), m12, c]);
    labels.push([c, m12, Vertex(v2), m23]);
    labels.push([m30, c, m23, Vertex(v3)]);
}

/// Apply one round of uniform mesh refinement.
pub fn refine_uniformly(mesh: &QuadMesh2d) -> QuadMesh2d {
    let mut label_to_idx_map: FxHashMap<VertexLabel, usize> = FxHashMap::default();
    let mut new_labels = Vec::new();

    let mut new_connectivity = Vec::with_capacity(4 * mesh.num_active_cells());
    let mut child_labels = Vec::new();
    for (cell_index, conn) in mesh.connectivity().iter().enumerate() {
        child_labels.clear();
        populate_child_labels(cell_index, conn, &mut child_labels);
        for labels in &child_labels {
            let mut indices = [0; 4];
            for (index, label) in indices.iter_mut().zip(labels) {
                *index = match *label {
                    VertexLabel::Vertex(v) => v,
                    label => *label_to_idx_map.entry(label).or_insert_with(|| {
                        new_labels.push(label);
                        mesh.num_vertices() + new_labels.len() - 1
                    }),
                };
            }
            new_connectivity.push(Quad4d2Connectivity(indices));
        }
    }

    let mut new_vertices = mesh.vertices().to_vec();
    new_vertices.extend(new_labels.iter().map(|label| label.construct_vertex(mesh)));

    let mut new_boundary_tags = BTreeMap::new();
    for (edge, tag) in mesh.boundary_edges() {
        let [a, b] = edge.0;
        if let Some(&m) = label_to_idx_map.get(&VertexLabel::edge_midpoint(a, b)) {
            new_boundary_tags.insert(sorted_pair(a, m), tag);
            new_boundary_tags.insert(sorted_pair(m, b), tag);
        }
    }

    QuadMesh2d::from_parts(new_vertices, new_connectivity, new_boundary_tags)
}

/// Repeatedly applies uniform mesh refinement to the given mesh.
pub fn refine_uniformly_repeat(mesh: &QuadMesh2d, repeat_times: usize) -> QuadMesh2d {
    let mut mesh = mesh.clone();
    for _ in 0..repeat_times {
        mesh = refine_uniformly(&mesh);
    }
    mesh
}

fn sorted_pair(a: usize, b: usize) -> [usize; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

impl QuadMesh2d {
    /// Refines every cell `levels` times.
    pub fn refine_uniformly(&mut self, levels: usize) {
        for _ in 0..levels {
            *self = refine_uniformly(self);
        }
    }
}
