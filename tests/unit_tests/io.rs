use adfem::element::FeDegree;
use adfem::io::vtk::{build_solution_dataset, write_solution_vtk};
use adfem::mesh::procedural::create_unit_square_uniform_quad_mesh_2d;
use adfem::space::QuadSpace;
use nalgebra::DVector;
use std::fs;
use vtkio::model::{CellType, DataSet, Piece, VertexNumbers};

fn inline_piece_counts(dataset: &DataSet) -> (usize, usize, usize) {
    match dataset {
        DataSet::UnstructuredGrid { pieces, .. } => {
            assert_eq!(pieces.len(), 1);
            match &pieces[0] {
                Piece::Inline(piece) => {
                    assert!(piece.cells.types.iter().all(|t| *t == CellType::Quad));
                    let num_vertex_numbers = match &piece.cells.cell_verts {
                        VertexNumbers::Legacy { vertices, .. } => vertices.len(),
                        _ => panic!("Expected legacy vertex numbers"),
                    };
                    (piece.points.len() / 3, piece.cells.types.len(), num_vertex_numbers)
                }
                _ => panic!("Expected inline piece"),
            }
        }
        _ => panic!("Expected unstructured grid"),
    }
}

#[test]
fn linear_dataset_has_one_cell_per_mesh_cell() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(3);
    let space = QuadSpace::new(&mesh, FeDegree::Linear);
    let solution = DVector::zeros(space.num_dofs());
    let dataset = build_solution_dataset(&space, &solution).unwrap();
    assert_eq!(inline_piece_counts(&dataset), (16, 9, 45));
}

#[test]
fn quadratic_dataset_splits_cells() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(3);
    let space = QuadSpace::new(&mesh, FeDegree::Quadratic);
    let solution = DVector::zeros(space.num_dofs());
    let dataset = build_solution_dataset(&space, &solution).unwrap();
    assert_eq!(inline_piece_counts(&dataset), (49, 36, 180));
}

#[test]
fn dataset_rejects_mismatched_solution() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(2);
    let space = QuadSpace::new(&mesh, FeDegree::Linear);
    let solution = DVector::zeros(space.num_dofs() + 1);
    assert!(build_solution_dataset(&space, &solution).is_err());
}

#[test]
fn write_vtk_file() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(4);
    let space = QuadSpace::new(&mesh, FeDegree::Quadratic);
    let solution = DVector::from_vec(space.interpolate(&|x: &nalgebra::Point2<f64>| x.x * x.y));

    let dir = "data/unit_tests/io";
    fs::create_dir_all(dir).unwrap();
    let path = format!("{}/quadratic_solution.vtk", dir);
    write_solution_vtk(&space, &solution, &path).unwrap();

    let contents = fs::read(&path).unwrap();
    assert!(contents.starts_with(b"# vtk DataFile Version"));
}
