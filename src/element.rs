//! Quadrilateral geometry and Lagrange bases on the reference square `[-1, 1]^2`.
use itertools::Itertools;
use nalgebra::{distance, Matrix2, Matrix2x4, Point2, RealField, Scalar, Vector2};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// A bilinear quadrilateral in two dimensions.
///
/// The geometry is always described by the four corner vertices, regardless of the polynomial
/// degree of the basis used on the element.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quad4d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 4],
}

impl<T> Quad4d2Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 4]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 4] {
        &self.vertices
    }
}

impl<T> Quad4d2Element<T>
where
    T: RealField,
{
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn reference() -> Self {
        Self::from_vertices([
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ])
    }

    #[allow(non_snake_case)]
    fn vertex_matrix(&self) -> Matrix2x4<T> {
        Matrix2x4::from_fn(|i, j| self.vertices[j][i].clone())
    }

    /// Maps reference coordinates to physical coordinates with the bilinear map.
    #[allow(non_snake_case)]
    pub fn map_reference_coords(&self, xi: &Point2<T>) -> Point2<T> {
        let X = self.vertex_matrix();
        let mut phi = [T::zero(), T::zero(), T::zero(), T::zero()];
        FeDegree::Linear.populate_basis(&mut phi, xi);
        let phi = nalgebra::Vector4::from_column_slice(&phi);
        Point2::from(X * phi)
    }

    /// The Jacobian `dx/dxi` of the bilinear map.
    #[allow(non_snake_case)]
    pub fn reference_jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        let X = self.vertex_matrix();
        let mut gradients = [Vector2::zeros(), Vector2::zeros(), Vector2::zeros(), Vector2::zeros()];
        FeDegree::Linear.populate_basis_gradients(&mut gradients, xi);
        let G = Matrix2x4::from_columns(&gradients);
        X * G.transpose()
    }

    pub fn diameter(&self) -> T {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(T::zero(), |a, b| a.max(b))
    }
}

/// Polynomial degree of the continuous Lagrange basis on quadrilaterals.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum FeDegree {
    /// Bilinear basis with 4 nodes at the corners.
    Linear,
    /// Biquadratic basis with 9 nodes: corners, edge midpoints (edge `k` connects corner `k` and
    /// `k + 1`) and the center.
    Quadratic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedDegree(pub usize);

impl fmt::Display for UnsupportedDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported polynomial degree {} (supported: 1, 2)", self.0)
    }
}

impl std::error::Error for UnsupportedDegree {}

impl TryFrom<usize> for FeDegree {
    type Error = UnsupportedDegree;

    fn try_from(degree: usize) -> Result<Self, Self::Error> {
        match degree {
            1 => Ok(Self::Linear),
            2 => Ok(Self::Quadratic),
            _ => Err(UnsupportedDegree(degree)),
        }
    }
}

impl From<FeDegree> for usize {
    fn from(degree: FeDegree) -> Self {
        degree.degree()
    }
}

/// Reference coordinates (alpha, beta) of the nine Quad9 nodes, in local node order.
const QUAD9_NODES: [(i8, i8); 9] = [
    (-1, -1),
    (1, -1),
    (1, 1),
    (-1, 1),
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, 0),
];

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_1d<T>(alpha: T, xi: T) -> T
where
    T: RealField,
{
    let alpha2 = alpha.clone() * alpha.clone();
    let a = (3.0 / 2.0) * alpha2.clone() - 1.0;
    let b = alpha / 2.0;
    let c = 1.0 - alpha2;
    a * xi.clone() * xi.clone() + b * xi + c
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_grad_1d<T>(alpha: T, xi: T) -> T
where
    T: RealField,
{
    let alpha2 = alpha.clone() * alpha.clone();
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    2.0 * a * xi + b
}

impl FeDegree {
    pub fn degree(&self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Quadratic => 2,
        }
    }

    /// Number of basis functions (nodes) per cell.
    pub fn nodes_per_cell(&self) -> usize {
        match self {
            Self::Linear => 4,
            Self::Quadratic => 9,
        }
    }

    /// Local indices of the nodes that lie on the given face (0..4) of the reference square.
    pub fn face_nodes(&self, face: usize) -> &'static [usize] {
        assert!(face < 4, "Quadrilaterals have exactly four faces");
        const LINEAR: [[usize; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];
        const QUADRATIC: [[usize; 3]; 4] = [[0, 1, 4], [1, 2, 5], [2, 3, 6], [3, 0, 7]];
        match self {
            Self::Linear => &LINEAR[face],
            Self::Quadratic => &QUADRATIC[face],
        }
    }

    /// Reference coordinates of the local nodes.
    pub fn reference_nodes<T: RealField>(&self) -> Vec<Point2<T>> {
        let to_t = |v: i8| T::from_f64(v as f64).expect("Literal must fit in T");
        QUAD9_NODES[..self.nodes_per_cell()]
            .iter()
            .map(|&(alpha, beta)| Point2::new(to_t(alpha), to_t(beta)))
            .collect()
    }

    /// Evaluates all basis functions at the reference point `xi`.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` is not the number of nodes per cell.
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn populate_basis<T: RealField>(&self, values: &mut [T], xi: &Point2<T>) {
        assert_eq!(values.len(), self.nodes_per_cell(), "Basis buffer has wrong length");
        match self {
            Self::Linear => {
                // N_{alpha, beta}([alpha, beta]) = 1 with alpha, beta = 1 or -1
                let phi = |alpha: T, beta: T|
                    (1.0 + alpha * xi[0].clone()) * (1.0 + beta * xi[1].clone()) / 4.0;
                values[0] = phi(-1.0, -1.0);
                values[1] = phi( 1.0, -1.0);
                values[2] = phi( 1.0,  1.0);
                values[3] = phi(-1.0,  1.0);
            }
            Self::Quadratic => {
                for (value, &(alpha, beta)) in values.iter_mut().zip(&QUAD9_NODES) {
                    let alpha = T::from_f64(alpha as f64).unwrap();
                    let beta = T::from_f64(beta as f64).unwrap();
                    *value = quad9_phi_1d(alpha, xi[0].clone()) * quad9_phi_1d(beta, xi[1].clone());
                }
            }
        }
    }

    /// Evaluates the reference gradients of all basis functions at `xi`.
    ///
    /// # Panics
    ///
    /// Panics if `gradients.len()` is not the number of nodes per cell.
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn populate_basis_gradients<T: RealField>(&self, gradients: &mut [Vector2<T>], xi: &Point2<T>) {
        assert_eq!(gradients.len(), self.nodes_per_cell(), "Gradient buffer has wrong length");
        match self {
            Self::Linear => {
                let phi_grad = |alpha: T, beta: T|
                    Vector2::new(
                        alpha.clone() * (1.0 + beta.clone() * xi[1].clone()) / 4.0,
                        beta * (1.0 + alpha * xi[0].clone()) / 4.0,
                    );
                gradients[0] = phi_grad(-1.0, -1.0);
                gradients[1] = phi_grad( 1.0, -1.0);
                gradients[2] = phi_grad( 1.0,  1.0);
                gradients[3] = phi_grad(-1.0,  1.0);
            }
            Self::Quadratic => {
                for (gradient, &(alpha, beta)) in gradients.iter_mut().zip(&QUAD9_NODES) {
                    let alpha = T::from_f64(alpha as f64).unwrap();
                    let beta = T::from_f64(beta as f64).unwrap();
                    let (x, y) = (xi[0].clone(), xi[1].clone());
                    *gradient = Vector2::new(
                        quad9_phi_grad_1d(alpha.clone(), x.clone()) * quad9_phi_1d(beta.clone(), y.clone()),
                        quad9_phi_1d(alpha, x) * quad9_phi_grad_1d(beta, y),
                    );
                }
            }
        }
    }
}
