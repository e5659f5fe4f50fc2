use adfem::connectivity::{Connectivity, Quad4d2Connectivity};
use adfem::element::Quad4d2Element;
use adfem::mesh::procedural::{
    colorize_unit_square_boundary, create_rectangular_uniform_quad_mesh_2d, create_reference_domain,
    create_unit_square_uniform_quad_mesh_2d,
};
use adfem::mesh::refinement::{child_to_parent_reference_coords, refine_uniformly, refine_uniformly_repeat};
use adfem::mesh::{find_boundary_edges, QuadMesh2d};
use adfem::proptest::{convex_quad_element_strategy, refined_reference_domain_strategy};
use nalgebra::{Point2, Vector2};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn count_tags(mesh: &QuadMesh2d) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for (_, tag) in mesh.boundary_edges() {
        *counts.entry(tag).or_insert(0) += 1;
    }
    counts
}

#[test]
fn reference_domain_is_unit_square() {
    let mesh = create_reference_domain(false);
    assert_eq!(mesh.num_active_cells(), 1);
    assert_eq!(
        mesh.vertices(),
        &[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0)
        ]
    );
    assert_eq!(mesh.connectivity(), &[Quad4d2Connectivity([0, 1, 3, 2])]);
    assert_eq!(mesh.boundary_tags().len(), 4);
    assert!(mesh.boundary_edges().all(|(_, tag)| tag == 0));
}

#[test]
fn colorized_reference_domain_tags() {
    let mesh = create_reference_domain(true);
    // Face k of the single cell connects vertex k and k + 1
    assert_eq!(mesh.boundary_tag(0, 0), Some(2));
    assert_eq!(mesh.boundary_tag(0, 1), Some(1));
    assert_eq!(mesh.boundary_tag(0, 2), Some(3));
    assert_eq!(mesh.boundary_tag(0, 3), Some(0));
    assert_eq!(mesh.boundary_tag(0, 4), None);
}

#[test]
fn rectangular_uniform_mesh_layout() {
    let mesh = create_rectangular_uniform_quad_mesh_2d(2.0, 2, 1, 2, &Vector2::new(-1.0, 3.0));
    assert_eq!(mesh.num_active_cells(), 8);
    assert_eq!(mesh.num_vertices(), 15);
    assert_eq!(mesh.vertices()[0], Point2::new(-1.0, 3.0));
    assert_eq!(mesh.vertices()[14], Point2::new(3.0, 5.0));
    assert_eq!(mesh.connectivity()[0], Quad4d2Connectivity([0, 1, 6, 5]));
    assert_eq!(mesh.boundary_tags().len(), 12);

    for element in mesh.cell_elements() {
        let jacobian = element.reference_jacobian(&Point2::origin());
        assert!(jacobian.determinant() > 0.0);
    }
}

#[test]
fn empty_rectangular_mesh() {
    let mesh = create_rectangular_uniform_quad_mesh_2d(1.0, 0, 1, 1, &Vector2::zeros());
    assert_eq!(mesh.num_active_cells(), 0);
    assert_eq!(mesh.num_vertices(), 0);
    assert!(mesh.boundary_tags().is_empty());
}

#[test]
fn find_boundary_edges_of_two_cells() {
    let connectivity = vec![Quad4d2Connectivity([0, 1, 4, 3]), Quad4d2Connectivity([1, 2, 5, 4])];
    let edges = find_boundary_edges(&connectivity);
    assert_eq!(edges, vec![[0, 1], [0, 3], [1, 2], [2, 5], [3, 4], [4, 5]]);
}

#[test]
#[should_panic(expected = "Connectivity references vertices out of bounds")]
fn mesh_with_out_of_bounds_connectivity_panics() {
    let vertices = vec![Point2::origin(); 3];
    QuadMesh2d::from_vertices_and_connectivity(vertices, vec![Quad4d2Connectivity([0, 1, 2, 3])]);
}

#[test]
fn refinement_counts() {
    let reference = create_reference_domain(true);
    for levels in 0..5 {
        let mesh = refine_uniformly_repeat(&reference, levels);
        let n = 1 << levels;
        assert_eq!(mesh.num_active_cells(), n * n);
        assert_eq!(mesh.num_vertices(), (n + 1) * (n + 1));
        assert_eq!(mesh.boundary_tags().len(), 4 * n);
        let expected_counts: BTreeMap<_, _> = (0..4).map(|tag| (tag, n)).collect();
        assert_eq!(count_tags(&mesh), expected_counts);
    }
}

#[test]
fn refinement_matches_uniform_mesh_geometry() {
    // Refining the single-cell unit square twice gives the same set of vertices as a 4x4 grid
    let refined = refine_uniformly_repeat(&create_reference_domain(false), 2);
    let grid = create_unit_square_uniform_quad_mesh_2d(4);
    let key = |p: &Point2<f64>| ((p.x * 4.0).round() as i64, (p.y * 4.0).round() as i64);
    let mut refined_keys: Vec<_> = refined.vertices().iter().map(key).collect();
    let mut grid_keys: Vec<_> = grid.vertices().iter().map(key).collect();
    refined_keys.sort_unstable();
    grid_keys.sort_unstable();
    assert_eq!(refined_keys, grid_keys);

    let area: f64 = refined
        .cell_elements()
        .map(|element| 4.0 * element.reference_jacobian(&Point2::origin()).determinant())
        .sum();
    assert!((area - 1.0).abs() < 1e-14);
}

#[test]
fn refinement_preserves_existing_vertices_and_child_order() {
    let parent = create_unit_square_uniform_quad_mesh_2d(3);
    let child = refine_uniformly(&parent);

    assert_eq!(&child.vertices()[..parent.num_vertices()], parent.vertices());
    for (p, parent_conn) in parent.connectivity().iter().enumerate() {
        for k in 0..4 {
            assert_eq!(child.connectivity()[4 * p + k][k], parent_conn[k]);
        }
    }
}

#[test]
fn in_place_refinement_agrees_with_free_function() {
    let mesh = create_reference_domain(true);
    let mut in_place = mesh.clone();
    in_place.refine_uniformly(3);
    assert_eq!(in_place, refine_uniformly_repeat(&mesh, 3));
}

#[test]
fn refinement_keeps_custom_tags() {
    let mut mesh = create_unit_square_uniform_quad_mesh_2d(2);
    colorize_unit_square_boundary(&mut mesh);
    let refined = refine_uniformly(&mesh);
    for (edge, tag) in refined.boundary_edges() {
        let [a, b] = edge.0;
        let (pa, pb) = (refined.vertices()[a], refined.vertices()[b]);
        let expected = if pa.x == 0.0 && pb.x == 0.0 {
            0
        } else if pa.x == 1.0 && pb.x == 1.0 {
            1
        } else if pa.y == 0.0 && pb.y == 0.0 {
            2
        } else {
            3
        };
        assert_eq!(tag, expected);
    }
}

proptest! {
    #[test]
    fn children_are_restrictions_of_parent_map(
        element in convex_quad_element_strategy(),
        xi in [-1.0..=1.0, -1.0..=1.0]
    ) {
        let xi = Point2::new(xi[0], xi[1]);
        let mesh = QuadMesh2d::from_vertices_and_connectivity(
            element.vertices().to_vec(),
            vec![Quad4d2Connectivity([0, 1, 2, 3])],
        );
        let refined = refine_uniformly(&mesh);
        for k in 0..4 {
            let child: Quad4d2Element<f64> = refined.cell_element(k);
            let x_child = child.map_reference_coords(&xi);
            let x_parent = element.map_reference_coords(&child_to_parent_reference_coords(k, &xi));
            prop_assert!((x_child - x_parent).norm() <= 1e-9 * (1.0 + element.diameter()));
        }
    }

    #[test]
    fn refined_meshes_are_conforming(mesh in refined_reference_domain_strategy(3)) {
        let boundary = find_boundary_edges(mesh.connectivity());
        let tagged: Vec<_> = mesh.boundary_tags().keys().copied().collect();
        prop_assert_eq!(boundary, tagged);

        // Every interior edge is shared by exactly two cells with opposite orientation
        let mut oriented = BTreeMap::new();
        for conn in mesh.connectivity() {
            for face in 0..conn.num_faces() {
                let edge = conn.get_face_connectivity(face).unwrap();
                *oriented.entry(edge.0).or_insert(0) += 1;
            }
        }
        prop_assert!(oriented.values().all(|&count| count == 1));
    }
}
