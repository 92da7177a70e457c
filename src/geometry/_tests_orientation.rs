#[cfg(test)]
mod _tests_orientation {
    use super::super::orientation::{
        axis_angle_matrix, reciprocal_axis_directions, validate_setting_matrix,
    };
    use nalgebra::{Matrix3, Vector3};
    use std::f64::consts::PI;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_validate_rejects_singular() {
        let singular = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.5, 1.0, 1.5);
        assert!(validate_setting_matrix(&singular).is_err());
        assert!(validate_setting_matrix(&Matrix3::zeros()).is_err());
    }

    #[test]
    fn test_validate_accepts_scaled_identity() {
        let ub = Matrix3::identity() * 0.1;
        assert!(validate_setting_matrix(&ub).is_ok());
    }

    #[test]
    fn test_axis_directions_are_unit() {
        let ub = Matrix3::new(0.2, 0.0, 0.01, 0.0, 0.15, 0.0, 0.0, 0.02, 0.4);
        for dir in reciprocal_axis_directions(&ub) {
            assert!((dir.norm() - 1.0).abs() < TOL);
        }
    }

    #[test]
    fn test_axis_angle_quarter_turn() {
        let r = axis_angle_matrix(&Vector3::new(0.0, 0.0, 2.0), PI / 2.0);
        let rotated = r * Vector3::new(1.0, 0.0, 0.0);
        assert!((rotated - Vector3::new(0.0, 1.0, 0.0)).norm() < TOL);
    }

    #[test]
    fn test_axis_angle_preserves_axis() {
        let axis = Vector3::new(1.0, 1.0, 0.5);
        let r = axis_angle_matrix(&axis, 0.7);
        assert!((r * axis - axis).norm() < TOL);
        assert!((r.determinant() - 1.0).abs() < TOL);
    }
}
