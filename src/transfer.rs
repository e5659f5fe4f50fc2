//! Transfer of discrete solutions from a mesh to its uniform refinement.
use crate::mesh::refinement::child_to_parent_reference_coords;
use crate::space::QuadSpace;
use nalgebra::DVector;

/// Interpolates `old_solution` on `old_space` onto `new_space`, which must be built on the
/// uniform refinement of the mesh of `old_space` with the same degree.
///
/// Each DOF of a child cell is evaluated from the parent's basis at the DOF's reference
/// coordinates in the parent, so the transfer is exact because the spaces are nested.
///
/// # Panics
///
/// Panics if the spaces are not related by exactly one uniform refinement.
pub fn transfer_to_refined(old_space: &QuadSpace, old_solution: &DVector<f64>, new_space: &QuadSpace) -> DVector<f64> {
    assert_eq!(old_solution.len(), old_space.num_dofs(), "Solution does not match the old space");
    assert_eq!(
        new_space.num_cells(),
        4 * old_space.num_cells(),
        "New space must be built on the uniform refinement of the old mesh"
    );
    assert_eq!(new_space.degree(), old_space.degree(), "Spaces must have the same degree");

    let degree = old_space.degree();
    let reference_nodes = degree.reference_nodes::<f64>();
    let mut phi = vec![0.0; degree.nodes_per_cell()];
    let mut new_solution = DVector::zeros(new_space.num_dofs());

    for child in 0..new_space.num_cells() {
        let (parent, child_local_index) = (child / 4, child % 4);
        let parent_dofs = old_space.cell_dofs(parent);
        for (xi_child, &dof) in reference_nodes.iter().zip(new_space.cell_dofs(child)) {
            let xi_parent = child_to_parent_reference_coords(child_local_index, xi_child);
            degree.populate_basis(&mut phi, &xi_parent);
            new_solution[dof] = phi
                .iter()
                .zip(parent_dofs)
                .map(|(phi_i, &parent_dof)| phi_i * old_solution[parent_dof])
                .sum();
        }
    }
    new_solution
}
