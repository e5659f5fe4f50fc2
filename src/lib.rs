//! Stationary advection-diffusion on quadrilateral meshes with continuous Lagrange finite elements.
//!
//! A [`RefinementLoop`](driver::RefinementLoop) repeatedly refines a [`QuadMesh2d`](mesh::QuadMesh2d)
//! uniformly, distributes degrees of freedom with a [`QuadSpace`](space::QuadSpace), assembles
//! the global sparse system, imposes Dirichlet values and solves the system with a preconditioned
//! Krylov method from `adfem-sparse`.
pub mod assembly;
pub mod boundary;
pub mod coefficients;
pub mod config;
pub mod connectivity;
pub mod driver;
pub mod element;
pub mod error;
pub mod io;
pub mod mesh;
pub mod quadrature;
pub mod solver;
pub mod space;
pub mod transfer;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate vtkio;

pub use adfem_sparse as sparse;
