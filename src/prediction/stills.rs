use anyhow::Error;
use nalgebra::{Matrix3, Vector3};

use crate::config::DELPSI_CUTOFF;
use crate::interfaces::{IndexSource, MillerIndex};
use crate::prediction::ray::{Detector, StillsRayPredictor};
use crate::prediction::table::{flags, StillsReflectionTable};

/// Reflection prediction for still images.
///
/// Without rotation no index sits exactly on the Ewald sphere; every
/// prediction carries the offset `delpsi`, the smallest rotation that would
/// bring it there. The `z` entries of the calculated positions stay zero.
pub struct StillsPredictor<D, R> {
    detector: D,
    predict_ray: R,
}

impl<D: Detector, R: StillsRayPredictor> StillsPredictor<D, R> {
    pub fn new(detector: D, predict_ray: R) -> Self {
        StillsPredictor {
            detector,
            predict_ray,
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Predict every index from `indices` that lies close enough to the
    /// Ewald sphere (`|delpsi|` below the cutoff). Detector misses drop
    /// silently.
    pub fn for_ub<I: IndexSource>(
        &self,
        indices: &mut I,
        ub: &Matrix3<f64>,
    ) -> StillsReflectionTable {
        let mut table = StillsReflectionTable::new();
        while let Some(h) = indices.next_index() {
            let Some(still) = self.predict_ray.predict(h, ub) else {
                continue;
            };
            if still.delpsi.abs() < DELPSI_CUTOFF {
                self.append_for_index(&mut table, ub, h, None, false);
            }
        }
        table
    }

    /// Predict one row per requested index, unconditionally; the detector
    /// search spans every panel.
    pub fn for_hkl(&self, h: &[MillerIndex], ub: &Matrix3<f64>) -> StillsReflectionTable {
        let mut table = StillsReflectionTable::new();
        for &hkl in h {
            self.append_for_index(&mut table, ub, hkl, None, true);
        }
        debug_assert!(table.len() == h.len() && table.is_consistent());
        table
    }

    /// Predict one row per requested index, all constrained to one panel.
    pub fn for_hkl_with_panel(
        &self,
        h: &[MillerIndex],
        panel: usize,
        ub: &Matrix3<f64>,
    ) -> StillsReflectionTable {
        let mut table = StillsReflectionTable::new();
        for &hkl in h {
            self.append_for_index(&mut table, ub, hkl, Some(panel), true);
        }
        table
    }

    /// Predict one row per requested `(hkl, panel)` pair.
    pub fn for_hkl_with_panels(
        &self,
        h: &[MillerIndex],
        panel: &[usize],
        ub: &Matrix3<f64>,
    ) -> Result<StillsReflectionTable, Error> {
        let ubs = vec![*ub; h.len()];
        self.for_hkl_with_individual_ub(h, panel, &ubs)
    }

    /// Predict one row per requested `(hkl, panel)` pair, each with its own
    /// orientation.
    pub fn for_hkl_with_individual_ub(
        &self,
        h: &[MillerIndex],
        panel: &[usize],
        ub: &[Matrix3<f64>],
    ) -> Result<StillsReflectionTable, Error> {
        if ub.len() != h.len() || panel.len() != h.len() {
            return Err(Error::msg("Prediction request columns differ in length."));
        }
        let mut table = StillsReflectionTable::new();
        for i in 0..h.len() {
            self.append_for_index(&mut table, &ub[i], h[i], Some(panel[i]), true);
        }
        debug_assert!(table.len() == h.len() && table.is_consistent());
        Ok(table)
    }

    /// Re-predict the reflections already listed in `table`, updating the
    /// calculated columns (including `delpsi`) in place.
    pub fn for_reflection_table(
        &self,
        table: &mut StillsReflectionTable,
        ub: &Matrix3<f64>,
    ) -> Result<(), Error> {
        let ubs = vec![*ub; table.len()];
        self.for_reflection_table_with_individual_ub(table, &ubs)
    }

    pub fn for_reflection_table_with_individual_ub(
        &self,
        table: &mut StillsReflectionTable,
        ub: &[Matrix3<f64>],
    ) -> Result<(), Error> {
        if ub.len() != table.len() {
            return Err(Error::msg("One orientation matrix is required per table row."));
        }
        let new = self.for_hkl_with_individual_ub(&table.base.hkl, &table.base.panel, ub)?;
        table.base.hkl = new.base.hkl;
        table.base.entering = new.base.entering;
        table.base.panel = new.base.panel;
        table.base.s1 = new.base.s1;
        table.base.xyz_mm = new.base.xyz_mm;
        table.base.xyz_px = new.base.xyz_px;
        table.delpsi = new.delpsi;
        for (old, fresh) in table.base.flags.iter_mut().zip(new.base.flags) {
            *old = (*old & !flags::PREDICTED) | fresh;
        }
        Ok(())
    }

    /// Append the prediction for one index. With `emit_on_miss` a failed
    /// intersection still books a row, with zeroed coordinates and an unset
    /// `PREDICTED` flag; otherwise it is dropped.
    fn append_for_index(
        &self,
        table: &mut StillsReflectionTable,
        ub: &Matrix3<f64>,
        h: MillerIndex,
        panel: Option<usize>,
        emit_on_miss: bool,
    ) {
        let Some(still) = self.predict_ray.predict(h, ub) else {
            if emit_on_miss {
                table.base.push_row(
                    h,
                    false,
                    Vector3::zeros(),
                    panel.unwrap_or(0),
                    Vector3::zeros(),
                    Vector3::zeros(),
                    0,
                );
                table.delpsi.push(0.0);
            }
            return;
        };
        let ray = still.ray;

        let impact = match panel {
            Some(p) => self
                .detector
                .panel_ray_intersection(p, &ray.s1)
                .map(|mm| (p, mm)),
            None => self.detector.ray_intersection(&ray.s1),
        };

        match impact {
            Some((p, mm)) => {
                let px = self.detector.millimeter_to_pixel(p, mm);
                table.base.push_row(
                    h,
                    ray.entering,
                    ray.s1,
                    p,
                    Vector3::new(mm.0, mm.1, 0.0),
                    Vector3::new(px.0, px.1, 0.0),
                    flags::PREDICTED,
                );
                table.delpsi.push(still.delpsi);
            }
            None if emit_on_miss => {
                table.base.push_row(
                    h,
                    ray.entering,
                    ray.s1,
                    panel.unwrap_or(0),
                    Vector3::zeros(),
                    Vector3::zeros(),
                    0,
                );
                table.delpsi.push(still.delpsi);
            }
            None => {}
        }
    }
}
