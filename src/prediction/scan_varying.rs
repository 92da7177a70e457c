use anyhow::Error;
use nalgebra::{Matrix3, Vector3};

use crate::geometry::axis_angle_matrix;
use crate::interfaces::{IndexSource, MillerIndex};
use crate::prediction::ray::{Detector, Ray, ScanVaryingRayPredictor};
use crate::prediction::scan::Scan;
use crate::prediction::table::{flags, ReflectionTable};
use crate::reeke::ReekeIndexGenerator;

/// Reflection prediction for a scan whose crystal orientation drifts from
/// image to image.
///
/// The caller supplies one setting matrix per frame boundary
/// (`num_images + 1` of them); each image is predicted from a Reeke index
/// generator built on its bracketing pair of orientations.
pub struct ScanVaryingPredictor<D, R> {
    s0: Vector3<f64>,
    axis: Vector3<f64>,
    detector: D,
    scan: Scan,
    dmin: f64,
    margin: i32,
    predict_ray: R,
}

impl<D: Detector, R: ScanVaryingRayPredictor> ScanVaryingPredictor<D, R> {
    pub fn new(
        s0: Vector3<f64>,
        axis: Vector3<f64>,
        detector: D,
        scan: Scan,
        dmin: f64,
        margin: i32,
        predict_ray: R,
    ) -> Self {
        ScanVaryingPredictor {
            s0,
            axis,
            detector,
            scan,
            dmin,
            margin,
            predict_ray,
        }
    }

    pub fn scan(&self) -> &Scan {
        &self.scan
    }

    /// Predict every image of the scan from a frame-boundary array of
    /// setting matrices.
    pub fn for_ub(&self, a: &[Matrix3<f64>]) -> Result<ReflectionTable, Error> {
        if a.len() != self.scan.num_images() + 1 {
            return Err(Error::msg(
                "One setting matrix is required per frame boundary (num_images + 1).",
            ));
        }
        let mut table = ReflectionTable::new();
        let (begin, end) = self.scan.array_range();
        for frame in begin..end {
            let i = (frame - begin) as usize;
            self.append_for_image(&mut table, frame, &a[i], &a[i + 1])?;
        }
        Ok(table)
    }

    /// Predict a single image bracketed by two explicit setting matrices.
    pub fn for_ub_on_single_image(
        &self,
        frame: i32,
        a1: &Matrix3<f64>,
        a2: &Matrix3<f64>,
    ) -> Result<ReflectionTable, Error> {
        let (begin, end) = self.scan.array_range();
        if frame < begin || frame >= end {
            return Err(Error::msg("Frame lies outside the scan."));
        }
        let mut table = ReflectionTable::new();
        self.append_for_image(&mut table, frame, a1, a2)?;
        Ok(table)
    }

    /// Rotate the frame-boundary orientations onto the goniometer at the
    /// frame's angular interval, then predict each candidate index.
    fn append_for_image(
        &self,
        table: &mut ReflectionTable,
        frame: i32,
        a1: &Matrix3<f64>,
        a2: &Matrix3<f64>,
    ) -> Result<(), Error> {
        let phi_beg = self.scan.angle_from_array_index(frame as f64);
        let phi_end = self.scan.angle_from_array_index((frame + 1) as f64);
        let a1 = axis_angle_matrix(&self.axis, phi_beg) * a1;
        let a2 = axis_angle_matrix(&self.axis, phi_end) * a2;

        let mut indices =
            ReekeIndexGenerator::new(&a1, &a2, &self.axis, &self.s0, self.dmin, self.margin)?;
        while let Some(h) = indices.next_index() {
            if let Some(ray) = self.predict_ray.predict(h, &a1, &a2, frame, 1) {
                self.append_for_ray(table, h, &ray);
            }
        }
        Ok(())
    }

    fn append_for_ray(&self, table: &mut ReflectionTable, h: MillerIndex, ray: &Ray) {
        let Some((panel, mm)) = self.detector.ray_intersection(&ray.s1) else {
            return;
        };
        let px = self.detector.millimeter_to_pixel(panel, mm);
        let frame = self.scan.array_index_from_angle(ray.angle);
        table.push_row(
            h,
            ray.entering,
            ray.s1,
            panel,
            Vector3::new(mm.0, mm.1, ray.angle),
            Vector3::new(px.0, px.1, frame),
            flags::PREDICTED,
        );
    }
}
