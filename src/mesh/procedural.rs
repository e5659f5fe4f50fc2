//! Basic procedural mesh generation routines.
use crate::connectivity::Quad4d2Connectivity;
use crate::mesh::{BoundaryTag, QuadMesh2d};
use nalgebra::{Point2, Vector2};

/// Creates the unit square `[0, 1]^2` as a single cell.
///
/// Without colorization, every boundary edge has tag `0`. With colorization, the edges on
/// `x = 0`, `x = 1`, `y = 0` and `y = 1` get tags `0`, `1`, `2` and `3`, respectively.
pub fn create_reference_domain(colorize: bool) -> QuadMesh2d {
    let mut mesh = create_unit_square_uniform_quad_mesh_2d(1);
    if colorize {
        colorize_unit_square_boundary(&mut mesh);
    }
    mesh
}

pub fn create_unit_square_uniform_quad_mesh_2d(cells_per_dim: usize) -> QuadMesh2d {
    create_rectangular_uniform_quad_mesh_2d(1.0, 1, 1, cells_per_dim, &Vector2::zeros())
}

/// Generates an axis-aligned rectangular uniform mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
///
/// All boundary edges are tagged with `0`.
pub fn create_rectangular_uniform_quad_mesh_2d(
    unit_length: f64,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    bottom_left: &Vector2<f64>,
) -> QuadMesh2d {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        QuadMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new())
    } else {
        let mut vertices = Vec::new();
        let mut cells = Vec::new();

        let cell_size = unit_length / cells_per_unit as f64;
        let num_cells_x = units_x * cells_per_unit;
        let num_cells_y = units_y * cells_per_unit;
        let num_vertices_x = num_cells_x + 1;
        let num_vertices_y = num_cells_y + 1;

        let to_global_vertex_index = |i, j| num_vertices_x * j + i;

        for j in 0..num_vertices_y {
            for i in 0..num_vertices_x {
                let v = bottom_left + Vector2::new(i as f64, j as f64) * cell_size;
                vertices.push(Point2::from(v));
            }
        }

        for j in 0..num_cells_y {
            for i in 0..num_cells_x {
                let quad = Quad4d2Connectivity([
                    to_global_vertex_index(i, j),
                    to_global_vertex_index(i + 1, j),
                    to_global_vertex_index(i + 1, j + 1),
                    to_global_vertex_index(i, j + 1),
                ]);
                cells.push(quad);
            }
        }

        QuadMesh2d::from_vertices_and_connectivity(vertices, cells)
    }
}

/// Tags the boundary edges of a mesh of the unit square by the side they lie on:
/// `0` for `x = 0`, `1` for `x = 1`, `2` for `y = 0` and `3` for `y = 1`.
pub fn colorize_unit_square_boundary(mesh: &mut QuadMesh2d) {
    const EPS: f64 = 1e-12;
    let on = |a: f64, b: f64, value: f64| (a - value).abs() < EPS && (b - value).abs() < EPS;
    mesh.retag_boundary(|a, b| -> BoundaryTag {
        if on(a.x, b.x, 0.0) {
            0
        } else if on(a.x, b.x, 1.0) {
            1
        } else if on(a.y, b.y, 0.0) {
            2
        } else if on(a.y, b.y, 1.0) {
            3
        } else {
            0
        }
    });
}
