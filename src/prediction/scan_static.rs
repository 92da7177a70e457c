use anyhow::Error;
use nalgebra::{Matrix3, Vector3};

use crate::interfaces::{IndexSource, MillerIndex};
use crate::prediction::ray::{Detector, RayPredictor};
use crate::prediction::scan::Scan;
use crate::prediction::table::{flags, ReflectionTable};

/// Reflection prediction for a scan with a single, fixed orientation.
///
/// The ray predictor must be primed with the beam and rotation axis over a
/// full turn; the driver filters rays against the scan's oscillation range,
/// intersects them with the detector and books one row per visit of the
/// diffraction angle.
pub struct ScanStaticPredictor<D, R> {
    detector: D,
    scan: Scan,
    predict_rays: R,
}

impl<D: Detector, R: RayPredictor> ScanStaticPredictor<D, R> {
    pub fn new(detector: D, scan: Scan, predict_rays: R) -> Self {
        ScanStaticPredictor {
            detector,
            scan,
            predict_rays,
        }
    }

    pub fn scan(&self) -> &Scan {
        &self.scan
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Predict every index produced by `indices` for one orientation.
    ///
    /// Rays outside the oscillation range and rays missing the detector are
    /// dropped silently.
    pub fn for_ub<I: IndexSource>(&self, indices: &mut I, ub: &Matrix3<f64>) -> ReflectionTable {
        let mut table = ReflectionTable::new();
        while let Some(h) = indices.next_index() {
            self.append_for_index(&mut table, ub, h);
        }
        table
    }

    /// Predict one row per requested `(hkl, entering, panel)` triple, all
    /// with the same orientation.
    pub fn for_hkl(
        &self,
        h: &[MillerIndex],
        entering: &[bool],
        panel: &[usize],
        ub: &Matrix3<f64>,
    ) -> Result<ReflectionTable, Error> {
        let ubs = vec![*ub; h.len()];
        self.for_hkl_with_individual_ub(h, entering, panel, &ubs)
    }

    /// Predict one row per requested `(hkl, entering, panel)` triple, each
    /// with its own orientation. The output has exactly one row per input;
    /// requests that cannot be satisfied carry zeroed coordinates and an
    /// unset [`flags::PREDICTED`] bit.
    pub fn for_hkl_with_individual_ub(
        &self,
        h: &[MillerIndex],
        entering: &[bool],
        panel: &[usize],
        ub: &[Matrix3<f64>],
    ) -> Result<ReflectionTable, Error> {
        if ub.len() != h.len() || entering.len() != h.len() || panel.len() != h.len() {
            return Err(Error::msg("Prediction request columns differ in length."));
        }
        if self.scan.oscillation().1 <= 0.0 {
            return Err(Error::msg("Oscillation width must be positive."));
        }
        let mut table = ReflectionTable::new();
        for i in 0..h.len() {
            self.append_for_index_constrained(&mut table, &ub[i], h[i], entering[i], panel[i]);
        }
        debug_assert!(table.len() == h.len() && table.is_consistent());
        Ok(table)
    }

    /// Re-predict the reflections already listed in `table`, updating the
    /// calculated columns in place. The `PREDICTED` flag is cleared and
    /// re-set only where the intersection succeeded.
    pub fn for_reflection_table(
        &self,
        table: &mut ReflectionTable,
        ub: &Matrix3<f64>,
    ) -> Result<(), Error> {
        let ubs = vec![*ub; table.len()];
        self.for_reflection_table_with_individual_ub(table, &ubs)
    }

    pub fn for_reflection_table_with_individual_ub(
        &self,
        table: &mut ReflectionTable,
        ub: &[Matrix3<f64>],
    ) -> Result<(), Error> {
        if ub.len() != table.len() {
            return Err(Error::msg("One orientation matrix is required per table row."));
        }
        let new = self.for_hkl_with_individual_ub(&table.hkl, &table.entering, &table.panel, ub)?;
        table.hkl = new.hkl;
        table.entering = new.entering;
        table.panel = new.panel;
        table.s1 = new.s1;
        table.xyz_mm = new.xyz_mm;
        table.xyz_px = new.xyz_px;
        for (old, fresh) in table.flags.iter_mut().zip(new.flags) {
            *old = (*old & !flags::PREDICTED) | fresh;
        }
        Ok(())
    }

    fn append_for_index(&self, table: &mut ReflectionTable, ub: &Matrix3<f64>, h: MillerIndex) {
        for ray in self.predict_rays.predict(h, ub) {
            if !self.scan.is_angle_valid(ray.angle) {
                continue;
            }
            let Some((panel, mm)) = self.detector.ray_intersection(&ray.s1) else {
                continue;
            };
            let px = self.detector.millimeter_to_pixel(panel, mm);
            for (angle, frame) in self.scan.array_indices_with_angle(ray.angle) {
                table.push_row(
                    h,
                    ray.entering,
                    ray.s1,
                    panel,
                    Vector3::new(mm.0, mm.1, angle),
                    Vector3::new(px.0, px.1, frame),
                    flags::PREDICTED,
                );
            }
        }
    }

    /// Prediction constrained to a known entering flag and panel. Exactly
    /// one row is appended whatever the outcome.
    fn append_for_index_constrained(
        &self,
        table: &mut ReflectionTable,
        ub: &Matrix3<f64>,
        h: MillerIndex,
        entering: bool,
        panel: usize,
    ) {
        for ray in self.predict_rays.predict(h, ub) {
            if ray.entering != entering {
                continue;
            }
            let frame = self.scan.array_index_from_angle(ray.angle);
            let (xyz_mm, xyz_px, flag) = match self.detector.panel_ray_intersection(panel, &ray.s1)
            {
                Some(mm) => {
                    let px = self.detector.millimeter_to_pixel(panel, mm);
                    (
                        Vector3::new(mm.0, mm.1, ray.angle),
                        Vector3::new(px.0, px.1, frame),
                        flags::PREDICTED,
                    )
                }
                None => (
                    Vector3::new(0.0, 0.0, ray.angle),
                    Vector3::new(0.0, 0.0, frame),
                    0,
                ),
            };
            table.push_row(h, entering, ray.s1, panel, xyz_mm, xyz_px, flag);
            return;
        }
        // No ray with the requested entering flag
        table.push_row(
            h,
            entering,
            Vector3::zeros(),
            panel,
            Vector3::zeros(),
            Vector3::zeros(),
            0,
        );
    }
}
