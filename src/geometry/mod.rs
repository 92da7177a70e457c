// Geometry module: shared numeric primitives for the prediction core

// ======================== MODULE DECLARATIONS ========================
pub mod orientation;
pub mod quadratic;

// Test modules
mod _tests_orientation;

// ======================== RE-EXPORTS ========================
pub use orientation::{
    axis_angle_matrix,            // fn(axis: &Vector3<f64>, angle: f64) -> Matrix3<f64> - rotation about an arbitrary axis
    reciprocal_axis_directions,   // fn(ub: &Matrix3<f64>) -> [Vector3<f64>; 3] - unit-normalized columns of UB
    validate_setting_matrix,      // fn(ub: &Matrix3<f64>) -> Result<()> - rejects singular orientation matrices
};
pub use quadratic::{solve_quadratic, Roots};
