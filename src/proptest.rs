use crate::element::Quad4d2Element;
use crate::mesh::procedural::{create_rectangular_uniform_quad_mesh_2d, create_reference_domain};
use crate::mesh::QuadMesh2d;
use ::proptest::prelude::*;
use nalgebra::{Point2, Vector2};
use std::cmp::max;

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Pick a reasonably small range to pick coordinates from,
    // otherwise we can easily get floating point numbers that are
    // so ridiculously large as to break anything we might want to do with them
    let range = -10.0..10.0;
    [range.clone(), range.clone()].prop_map(|[x, y]| Point2::new(x, y))
}

/// Convex, counter-clockwise quadrilaterals obtained by perturbing, scaling and translating the
/// unit square.
pub fn convex_quad_element_strategy() -> impl Strategy<Value = Quad4d2Element<f64>> {
    // Perturbing each corner by at most 0.2 in each coordinate keeps every corner convex
    let perturbation = [-0.2..0.2, -0.2..0.2];
    let corners = [
        perturbation.clone(),
        perturbation.clone(),
        perturbation.clone(),
        perturbation,
    ];
    (corners, 0.1..10.0, point2()).prop_map(|(perturbations, scale, origin)| {
        let unit_square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let mut vertices = [Point2::origin(); 4];
        for ((vertex, [x, y]), [dx, dy]) in vertices.iter_mut().zip(unit_square).zip(perturbations) {
            *vertex = origin + scale * Vector2::new(x + dx, y + dy);
        }
        Quad4d2Element::from_vertices(vertices)
    })
}

impl Arbitrary for Quad4d2Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        convex_quad_element_strategy().boxed()
    }
}

// Returns a strategy in which each value is a triplet (cells_per_unit, units_x, units_y)
// such that cells_per_unit^2 * units_x * units_y <= max_cells
fn rectangular_uniform_mesh_cell_distribution_strategy(
    max_cells: usize,
) -> impl Strategy<Value = (usize, usize, usize)> {
    let max_cells_per_unit = f64::floor(f64::sqrt(max_cells as f64)) as usize;
    (1..=max(1, max_cells_per_unit))
        .prop_flat_map(move |cells_per_unit| (Just(cells_per_unit), 0..=max_cells / (cells_per_unit * cells_per_unit)))
        .prop_flat_map(move |(cells_per_unit, units_x)| {
            let units_y_strategy = 0..=max_cells / (cells_per_unit * cells_per_unit * max(1, units_x));
            (Just(cells_per_unit), Just(units_x), units_y_strategy)
        })
}

pub fn rectangular_uniform_mesh_strategy(unit_length: f64, max_cells: usize) -> impl Strategy<Value = QuadMesh2d> {
    rectangular_uniform_mesh_cell_distribution_strategy(max_cells).prop_map(
        move |(cells_per_unit, units_x, units_y)| {
            create_rectangular_uniform_quad_mesh_2d(
                unit_length,
                units_x,
                units_y,
                cells_per_unit,
                &Vector2::new(0.0, 0.0),
            )
        },
    )
}

/// The reference domain refined uniformly between `0` and `max_levels` times, with or without
/// colorized boundary tags.
pub fn refined_reference_domain_strategy(max_levels: usize) -> impl Strategy<Value = QuadMesh2d> {
    (0..=max_levels, any::<bool>()).prop_map(|(levels, colorize)| {
        let mut mesh = create_reference_domain(colorize);
        mesh.refine_uniformly(levels);
        mesh
    })
}
