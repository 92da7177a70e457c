use anyhow::Error;
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

use crate::config::SETTING_MATRIX_TOLERANCE;

/// Check that an orientation (UB) matrix describes a usable reciprocal
/// basis, i.e. that its columns are linearly independent.
pub fn validate_setting_matrix(ub: &Matrix3<f64>) -> Result<(), Error> {
    if ub.determinant().abs() < SETTING_MATRIX_TOLERANCE {
        return Err(Error::msg(
            "Determinant too small. Orientation matrix columns are either too small or linearly dependent.",
        ));
    }
    Ok(())
}

/// The unit directions of the three reciprocal-lattice axes, taken from the
/// columns of the orientation matrix.
pub fn reciprocal_axis_directions(ub: &Matrix3<f64>) -> [Vector3<f64>; 3] {
    [
        ub.column(0).normalize(),
        ub.column(1).normalize(),
        ub.column(2).normalize(),
    ]
}

/// Rotation matrix for a right-handed rotation of `angle` radians about
/// `axis`. The axis need not be normalized.
pub fn axis_angle_matrix(axis: &Vector3<f64>, angle: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle).into_inner()
}
