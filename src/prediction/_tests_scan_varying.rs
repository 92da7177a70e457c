#[cfg(test)]
mod _tests_scan_varying {
    use super::super::_tests_fixtures::{
        InterpolatingRayPredictor, PlaneDetector, RotationRayPredictor, ShellIndexSource,
    };
    use super::super::scan::Scan;
    use super::super::scan_static::ScanStaticPredictor;
    use super::super::scan_varying::ScanVaryingPredictor;
    use super::super::table::flags;
    use nalgebra::{Matrix3, Vector3};
    use std::collections::HashMap;

    const DMIN: f64 = 2.0;
    const MARGIN: i32 = 1;
    const PIXEL: f64 = 0.1;

    fn ub() -> Matrix3<f64> {
        Matrix3::identity() * 0.1
    }

    fn s0() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, 1.0)
    }

    fn axis() -> Vector3<f64> {
        Vector3::new(1.0, 0.0, 0.0)
    }

    fn varying_driver(
        frames: i32,
        dphi: f64,
    ) -> ScanVaryingPredictor<PlaneDetector, InterpolatingRayPredictor> {
        let scan = Scan::new((0, frames), (0.0, dphi)).unwrap();
        ScanVaryingPredictor::new(
            s0(),
            axis(),
            PlaneDetector::single(100.0, 100.0, PIXEL),
            scan.clone(),
            DMIN,
            MARGIN,
            InterpolatingRayPredictor::new(s0(), scan),
        )
    }

    #[test]
    fn test_for_ub_rows_are_consistent() {
        let driver = varying_driver(10, 1.0_f64.to_radians());
        let matrices = vec![ub(); 11];
        let table = driver.for_ub(&matrices).unwrap();

        assert!(table.is_consistent());
        assert!(!table.is_empty());
        let (begin, end) = driver.scan().oscillation_range();
        for i in 0..table.len() {
            assert_eq!(table.flags[i], flags::PREDICTED);
            assert!((table.s1[i].norm() - s0().norm()).abs() < 1e-9);

            let angle = table.xyz_mm[i].z;
            assert!(angle >= begin - 1e-9 && angle <= end + 1e-9);
            let frame = table.xyz_px[i].z;
            assert!(frame >= -1e-9 && frame <= 10.0 + 1e-9);
            assert!((driver.scan().angle_from_array_index(frame) - angle).abs() < 1e-9);
        }
    }

    #[test]
    fn test_for_ub_requires_boundary_matrices() {
        let driver = varying_driver(10, 1.0_f64.to_radians());
        assert!(driver.for_ub(&vec![ub(); 10]).is_err());
        assert!(driver.for_ub(&vec![ub(); 12]).is_err());
    }

    #[test]
    fn test_single_image_frame_range() {
        let driver = varying_driver(10, 1.0_f64.to_radians());
        assert!(driver.for_ub_on_single_image(10, &ub(), &ub()).is_err());
        assert!(driver.for_ub_on_single_image(-1, &ub(), &ub()).is_err());
        assert!(driver.for_ub_on_single_image(3, &ub(), &ub()).is_ok());
    }

    #[test]
    fn test_single_image_matches_full_scan() {
        let driver = varying_driver(3, 1.0_f64.to_radians());
        let matrices = vec![ub(); 4];
        let full = driver.for_ub(&matrices).unwrap();
        let mut rebuilt = 0;
        for frame in 0..3 {
            rebuilt += driver
                .for_ub_on_single_image(frame, &ub(), &ub())
                .unwrap()
                .len();
        }
        assert_eq!(full.len(), rebuilt);
    }

    #[test]
    fn test_agrees_with_scan_static_on_tiny_step() {
        // A constant orientation over one thin frame: the scan-varying
        // interpolation must reproduce the static solution closely
        let dphi = 1.0_f64.to_radians();
        let scan = Scan::new((0, 1), (0.0, dphi)).unwrap();

        let varying = varying_driver(1, dphi);
        let varying_table = varying.for_ub(&[ub(), ub()]).unwrap();
        assert!(!varying_table.is_empty());

        let static_driver = ScanStaticPredictor::new(
            PlaneDetector::single(100.0, 100.0, PIXEL),
            scan,
            RotationRayPredictor::new(s0(), axis()),
        );
        let mut indices = ShellIndexSource::new(&ub(), DMIN);
        let static_table = static_driver.for_ub(&mut indices, &ub());

        let mut by_key = HashMap::new();
        for i in 0..static_table.len() {
            let h = static_table.hkl[i];
            by_key.insert((h.x, h.y, h.z, static_table.entering[i]), i);
        }
        for i in 0..varying_table.len() {
            let h = varying_table.hkl[i];
            let j = *by_key
                .get(&(h.x, h.y, h.z, varying_table.entering[i]))
                .expect("scan-varying row missing from the static prediction");
            assert_eq!(varying_table.panel[i], static_table.panel[j]);
            assert!((varying_table.s1[i] - static_table.s1[j]).norm() < 1e-4);
            assert!((varying_table.xyz_mm[i].x - static_table.xyz_mm[j].x).abs() < 0.05);
            assert!((varying_table.xyz_mm[i].y - static_table.xyz_mm[j].y).abs() < 0.05);
            assert!((varying_table.xyz_mm[i].z - static_table.xyz_mm[j].z).abs() < dphi);
        }
    }
}
