#[cfg(test)]
mod _tests_scan_static {
    use super::super::_tests_fixtures::{PlaneDetector, RotationRayPredictor, ShellIndexSource};
    use super::super::scan::Scan;
    use super::super::scan_static::ScanStaticPredictor;
    use super::super::table::flags;
    use nalgebra::{Matrix3, Vector3};

    const DMIN: f64 = 2.0;
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

    fn predictor(frames: i32) -> ScanStaticPredictor<PlaneDetector, RotationRayPredictor> {
        let scan = Scan::new((0, frames), (0.0, 1.0_f64.to_radians())).unwrap();
        ScanStaticPredictor::new(
            PlaneDetector::single(100.0, 100.0, PIXEL),
            scan,
            RotationRayPredictor::new(s0(), axis()),
        )
    }

    #[test]
    fn test_for_ub_rows_are_consistent() {
        let driver = predictor(90);
        let mut indices = ShellIndexSource::new(&ub(), DMIN);
        let table = driver.for_ub(&mut indices, &ub());

        assert!(table.is_consistent());
        assert!(!table.is_empty());
        let (begin, end) = driver.scan().oscillation_range();
        for i in 0..table.len() {
            assert_eq!(table.flags[i], flags::PREDICTED);
            assert_eq!(table.panel[i], 0);

            // Elastic scattering at the recorded angle
            assert!((table.s1[i].norm() - s0().norm()).abs() < 1e-9);
            let d = (table.s1[i] - s0()).norm();
            let expected = (ub() * table.hkl[i].map(|v| v as f64)).norm();
            assert!((d - expected).abs() < 1e-9);

            // Angle inside the scan, frame consistent with the angle
            let angle = table.xyz_mm[i].z;
            assert!(angle >= begin - 1e-12 && angle <= end + 1e-12);
            let frame = table.xyz_px[i].z;
            assert!((driver.scan().angle_from_array_index(frame) - angle).abs() < 1e-9);

            // Pixel coordinates are millimetres over the pixel size
            assert!((table.xyz_px[i].x - table.xyz_mm[i].x / PIXEL).abs() < 1e-9);
            assert!((table.xyz_px[i].y - table.xyz_mm[i].y / PIXEL).abs() < 1e-9);
        }
    }

    #[test]
    fn test_for_hkl_agrees_with_for_ub() {
        let driver = predictor(90);
        let mut indices = ShellIndexSource::new(&ub(), DMIN);
        let reference = driver.for_ub(&mut indices, &ub());

        let requested = driver
            .for_hkl(&reference.hkl, &reference.entering, &reference.panel, &ub())
            .unwrap();
        assert_eq!(requested.len(), reference.len());
        for i in 0..reference.len() {
            assert_eq!(requested.hkl[i], reference.hkl[i]);
            assert_eq!(requested.entering[i], reference.entering[i]);
            assert_eq!(requested.panel[i], reference.panel[i]);
            assert_eq!(requested.flags[i], flags::PREDICTED);
            assert!((requested.s1[i] - reference.s1[i]).norm() < 1e-9);
            assert!((requested.xyz_mm[i] - reference.xyz_mm[i]).norm() < 1e-9);
            assert!((requested.xyz_px[i] - reference.xyz_px[i]).norm() < 1e-9);
        }
    }

    #[test]
    fn test_for_hkl_wrong_panel_gives_zero_row() {
        let scan = Scan::new((0, 90), (0.0, 1.0_f64.to_radians())).unwrap();
        let driver = ScanStaticPredictor::new(
            PlaneDetector::split(100.0, 100.0, PIXEL),
            scan,
            RotationRayPredictor::new(s0(), axis()),
        );
        let mut indices = ShellIndexSource::new(&ub(), DMIN);
        let reference = driver.for_ub(&mut indices, &ub());
        assert!(!reference.is_empty());

        // Request every reflection on the wrong half of the detector
        let wrong: Vec<usize> = reference.panel.iter().map(|&p| 1 - p).collect();
        let requested = driver
            .for_hkl(&reference.hkl, &reference.entering, &wrong, &ub())
            .unwrap();
        assert_eq!(requested.len(), reference.len());
        for i in 0..requested.len() {
            assert_eq!(requested.flags[i], 0);
            assert_eq!(requested.xyz_mm[i].x, 0.0);
            assert_eq!(requested.xyz_mm[i].y, 0.0);
            // The ray itself is still reported
            assert!(requested.s1[i].norm() > 0.0);
        }
    }

    #[test]
    fn test_for_hkl_rejects_mismatched_lengths() {
        let driver = predictor(90);
        let h = [Vector3::new(1, 0, 0)];
        assert!(driver.for_hkl(&h, &[true, false], &[0], &ub()).is_err());
    }

    #[test]
    fn test_for_hkl_rejects_zero_oscillation() {
        let scan = Scan::new((0, 1), (0.0, 0.0)).unwrap();
        let driver = ScanStaticPredictor::new(
            PlaneDetector::single(100.0, 100.0, PIXEL),
            scan,
            RotationRayPredictor::new(s0(), axis()),
        );
        let h = [Vector3::new(1, 0, 0)];
        assert!(driver.for_hkl(&h, &[true], &[0], &ub()).is_err());
    }

    #[test]
    fn test_for_reflection_table_updates_in_place() {
        let driver = predictor(90);
        let mut indices = ShellIndexSource::new(&ub(), DMIN);
        let mut table = driver.for_ub(&mut indices, &ub());
        let expected_mm = table.xyz_mm.clone();

        // Damage the calculated columns and decorate the flags
        const OTHER: u32 = 1 << 5;
        for i in 0..table.len() {
            table.xyz_mm[i] = Vector3::zeros();
            table.xyz_px[i] = Vector3::zeros();
            table.flags[i] = flags::PREDICTED | OTHER;
        }

        driver.for_reflection_table(&mut table, &ub()).unwrap();
        for i in 0..table.len() {
            assert!((table.xyz_mm[i] - expected_mm[i]).norm() < 1e-9);
            // Unrelated bits survive, PREDICTED is re-derived
            assert_eq!(table.flags[i], flags::PREDICTED | OTHER);
        }
    }

    #[test]
    fn test_multi_turn_scan_duplicates_rows() {
        let single_turn = {
            let driver = predictor(360);
            let mut indices = ShellIndexSource::new(&ub(), DMIN);
            driver.for_ub(&mut indices, &ub())
        };
        let double_turn = {
            let driver = predictor(720);
            let mut indices = ShellIndexSource::new(&ub(), DMIN);
            driver.for_ub(&mut indices, &ub())
        };
        assert!(!single_turn.is_empty());
        assert_eq!(double_turn.len(), 2 * single_turn.len());
    }
}
