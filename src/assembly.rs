//! Assembly of the global linear system from element contributions.
//!
//! The pipeline is split into three layers:
//!
//! - [`values`]: evaluation of basis functions and geometric quantities at quadrature points
//!   of a single element,
//! - [`local`]: element assemblers that compute dense element matrices and vectors,
//! - [`global`]: construction of the sparsity pattern and scattering of element contributions
//!   into a CSR matrix and a dense right-hand side.
pub mod global;
pub mod local;
pub mod values;
