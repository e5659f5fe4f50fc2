//! Export of discrete solutions to legacy VTK unstructured grids.
use crate::element::FeDegree;
use crate::space::QuadSpace;
use eyre::eyre;
use nalgebra::DVector;
use std::path::Path;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataSet, Piece, UnstructuredGridPiece, Version,
    VertexNumbers, Vtk,
};

/// Local node indices of the four linear sub-quadrilaterals of a Quad9 cell.
const QUAD9_SUBCELLS: [[usize; 4]; 4] = [[0, 4, 8, 7], [4, 1, 5, 8], [8, 5, 2, 6], [7, 8, 6, 3]];

/// Builds an unstructured grid whose points are the DOF support points of the space and whose
/// cells are bilinear quadrilaterals. The solution is attached as the point scalar `solution`.
pub fn build_solution_dataset(space: &QuadSpace, solution: &DVector<f64>) -> eyre::Result<DataSet> {
    if solution.len() != space.num_dofs() {
        return Err(eyre!(
            "Solution has {} entries, but the space has {} DOFs",
            solution.len(),
            space.num_dofs()
        ));
    }

    let mut points = Vec::with_capacity(3 * space.num_dofs());
    for x in space.support_points() {
        points.extend_from_slice(&[x.x, x.y, 0.0]);
    }

    // Vertices is laid out as follows: N, i_1, i_2, ... i_N,
    // so for quads this becomes 4 followed by the four indices making up the quad
    let mut vertices = Vec::new();
    let mut num_cells = 0;
    let mut push_quad = |indices: [usize; 4]| -> eyre::Result<()> {
        vertices.push(4);
        for idx in indices {
            vertices.push(u32::try_from(idx)?);
        }
        num_cells += 1;
        Ok(())
    };
    for cell_index in 0..space.num_cells() {
        let dofs = space.cell_dofs(cell_index);
        match space.degree() {
            FeDegree::Linear => push_quad([dofs[0], dofs[1], dofs[2], dofs[3]])?,
            FeDegree::Quadratic => {
                for sub in &QUAD9_SUBCELLS {
                    push_quad(sub.map(|local| dofs[local]))?;
                }
            }
        }
    }

    let piece = UnstructuredGridPiece {
        points: points.into(),
        cells: Cells {
            cell_verts: VertexNumbers::Legacy { num_cells, vertices },
            types: vec![CellType::Quad; num_cells as usize],
        },
        data: Attributes {
            point: vec![Attribute::scalars("solution", 1).with_data(solution.as_slice().to_vec())],
            cell: Vec::new(),
        },
    };

    Ok(DataSet::UnstructuredGrid {
        meta: None,
        pieces: vec![Piece::Inline(Box::new(piece))],
    })
}

/// Writes the solution to a legacy VTK file at `path`.
pub fn write_solution_vtk(space: &QuadSpace, solution: &DVector<f64>, path: impl AsRef<Path>) -> eyre::Result<()> {
    let filepath = path.as_ref();
    // If we don't have a title then just make the filepath the title
    let title = filepath
        .file_stem()
        .map(|os_str| os_str.to_string_lossy().to_string())
        .unwrap_or_else(|| "untitled".to_string());
    let dataset = build_solution_dataset(space, solution)?;
    Vtk {
        version: Version { major: 4, minor: 1 },
        title,
        byte_order: ByteOrder::BigEndian,
        data: dataset,
        file_path: None,
    }
    .export(filepath)
    .map_err(|err| eyre!("Failed to write VTK file {}: {}", filepath.display(), err))
}
