//! Spatial coefficients and scalar data of the advection-diffusion problem.
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Coefficients of the bilinear form evaluated at a single point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoefficientValues {
    pub diffusion: f64,
    pub advection: f64,
    pub direction: Vector2<f64>,
}

/// Evaluates the diffusion coefficient, advection coefficient and advection direction at a point.
///
/// Implementations must be total over the domain and free of side effects.
pub trait CoefficientModel {
    fn evaluate(&self, x: &Point2<f64>) -> CoefficientValues;
}

impl<F> CoefficientModel for F
where
    F: Fn(&Point2<f64>) -> CoefficientValues,
{
    fn evaluate(&self, x: &Point2<f64>) -> CoefficientValues {
        self(x)
    }
}

/// Spatially constant coefficients.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantCoefficients {
    pub diffusion: f64,
    pub advection: f64,
    pub direction: Vector2<f64>,
}

impl Default for ConstantCoefficients {
    fn default() -> Self {
        Self {
            diffusion: 1.0,
            advection: 1.0,
            direction: Vector2::new(1.0, 0.0),
        }
    }
}

impl CoefficientModel for ConstantCoefficients {
    fn evaluate(&self, _x: &Point2<f64>) -> CoefficientValues {
        CoefficientValues {
            diffusion: self.diffusion,
            advection: self.advection,
            direction: self.direction,
        }
    }
}

/// A scalar function of position, used for forcing terms, boundary data and exact solutions.
pub trait ScalarFunction {
    fn evaluate(&self, x: &Point2<f64>) -> f64;
}

impl<F> ScalarFunction for F
where
    F: Fn(&Point2<f64>) -> f64,
{
    fn evaluate(&self, x: &Point2<f64>) -> f64 {
        self(x)
    }
}

/// A function with the same value everywhere.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant(pub f64);

impl ScalarFunction for Constant {
    fn evaluate(&self, _x: &Point2<f64>) -> f64 {
        self.0
    }
}
