use anyhow::Error;
use nalgebra::{Matrix3, Vector3};
use smallvec::SmallVec;

use crate::config::BEAM_TOLERANCE;
use crate::geometry::solve_quadratic;
use crate::interfaces::IndexRange;
use crate::reeke::constants::PConstants;
use crate::reeke::permute::{AxisPermutation, PermutedBases};

/// Up to two half-open r-index intervals for a fixed `(p, q)`.
pub type RRanges = SmallVec<[IndexRange; 2]>;

/// Limit model for Reeke index generation between two crystal orientations.
///
/// Construction permutes the reciprocal basis so that `p` planes stack along
/// the beam and `r` runs along the rotation axis, precomputes the scalars of
/// the tangent quadratics, and fixes the overall `p` range. The per-plane
/// [`q_limits`](Self::q_limits) and per-line [`r_limits`](Self::r_limits)
/// are then cheap to evaluate inside the generation loops. The model is
/// read-only after construction.
#[derive(Debug, Clone)]
pub struct ReekeModel {
    source: Vector3<f64>,
    axis: Vector3<f64>,
    margin: i32,
    wavelength: f64,
    wavelength_sq: f64,
    dstarmax: f64,
    dstarmax_sq: f64,
    permutation: AxisPermutation,
    cp: PConstants,
    ewald_p_lim_beg: (f64, f64),
    ewald_p_lim_end: (f64, f64),
    res_p_lim_beg: (f64, f64),
    res_p_lim_end: (f64, f64),
    p_lim: IndexRange,
}

impl ReekeModel {
    /// Build the model from the bracketing orientations of one scan step.
    ///
    /// `source` points from the sample towards the source, i.e. `-s0`.
    /// Scan-static use passes the same matrix for both orientations.
    pub fn new(
        ub_beg: &Matrix3<f64>,
        ub_end: &Matrix3<f64>,
        axis: &Vector3<f64>,
        source: &Vector3<f64>,
        dmin: f64,
        margin: i32,
    ) -> Result<Self, Error> {
        if source.norm() < BEAM_TOLERANCE {
            return Err(Error::msg("Source vector is too close to zero."));
        }
        if dmin <= 0.0 {
            return Err(Error::msg("Resolution limit dmin must be positive."));
        }
        if margin < 0 {
            return Err(Error::msg("Margin must be non-negative."));
        }

        let bases = PermutedBases::new(ub_beg, ub_end, axis, source)?;
        let cp = PConstants::new(&bases.rlv_beg, &bases.rlv_end, source);

        let wavelength = 1.0 / source.norm();
        let dstarmax = 1.0 / dmin;

        let mut model = ReekeModel {
            source: *source,
            axis: *axis,
            margin,
            wavelength,
            wavelength_sq: wavelength * wavelength,
            dstarmax,
            dstarmax_sq: dstarmax * dstarmax,
            permutation: bases.permutation,
            cp,
            ewald_p_lim_beg: (0.0, 0.0),
            ewald_p_lim_end: (0.0, 0.0),
            res_p_lim_beg: (0.0, 0.0),
            res_p_lim_end: (0.0, 0.0),
            p_lim: (0, 0),
        };
        model.compute_p_limits(&bases.rlv_beg, &bases.rlv_end)?;
        Ok(model)
    }

    /// The column permutation applied to the orientation matrices.
    pub fn permutation(&self) -> &AxisPermutation {
        &self.permutation
    }

    /// Tangent-plane p limits of the Ewald sphere, begin and end settings.
    pub fn ewald_sphere_p_limits(&self) -> ((f64, f64), (f64, f64)) {
        (self.ewald_p_lim_beg, self.ewald_p_lim_end)
    }

    /// Tangent-plane p limits of the resolution sphere, begin and end settings.
    pub fn resolution_p_limits(&self) -> ((f64, f64), (f64, f64)) {
        (self.res_p_lim_beg, self.res_p_lim_end)
    }

    /// The overall half-open integer p interval.
    pub fn p_limits(&self) -> IndexRange {
        self.p_lim
    }

    /// Overall q limits on plane `p`: the most restrictive combination of the
    /// tangent-q values against the Ewald circles (begin and end settings)
    /// and the resolution circle. Empty when either family of tangents has
    /// no real solution.
    pub fn q_limits(&self, p: i32) -> IndexRange {
        let res = match self.resolution_q_limits(p) {
            Some(lim) => lim,
            None => return (0, 0),
        };
        let ewald = match self.ewald_sphere_q_limits(p) {
            Some(lim) => lim,
            None => return (0, 0),
        };

        // Middle two of the four sorted endpoints pick the overlap
        let mut limits = [ewald.0, ewald.1, res.0, res.1];
        limits.sort_unstable();
        (limits[1], limits[2] + 1)
    }

    /// Intervals of r along the line of constant `(p, q)`, bounded by the
    /// Ewald sphere crossings of both settings and clipped to the resolution
    /// sphere. At most two disjoint intervals in ascending order.
    pub fn r_limits(&self, p: i32, q: i32) -> RRanges {
        let cp = self.cp.values();
        let (pf, qf) = (p as f64, q as f64);

        // Quantities that vary with p but are constant with q
        let cq = [
            pf * cp[10],
            pf * pf * cp[12],
            pf * cp[14],
            pf * cp[19],
            pf * cp[20],
        ];

        let mut result = RRanges::new();
        let res = match self.resolution_r_limits(qf, &cq) {
            Some(lim) => lim,
            None => return result,
        };

        // Clip each Ewald range to the resolution range
        for lim in self.ewald_sphere_r_limits(qf, &cq) {
            let lower = lim.0.max(res.0);
            let upper = lim.1.min(res.1);
            if lower < upper {
                result.push((lower, upper + 1));
            }
        }

        // Two surviving ranges must come out ordered and non-overlapping
        if result.len() == 2 {
            if result[1].0 < result[0].0 {
                result.swap(0, 1);
            }
            if result[1].0 < result[0].1 {
                result[1].0 = result[0].1;
            }
        }
        result
    }

    /// Tangent planes of constant p for both spheres, and the combined
    /// integer p interval widened by the margin.
    fn compute_p_limits(
        &mut self,
        rlv_beg: &Matrix3<f64>,
        rlv_end: &Matrix3<f64>,
    ) -> Result<(), Error> {
        let beg: [Vector3<f64>; 3] = [
            rlv_beg.row(0).transpose(),
            rlv_beg.row(1).transpose(),
            rlv_beg.row(2).transpose(),
        ];
        let end: [Vector3<f64>; 3] = [
            rlv_end.row(0).transpose(),
            rlv_end.row(1).transpose(),
            rlv_end.row(2).transpose(),
        ];

        // Unit normals to the planes of constant p, oriented towards
        // increasing p
        let mut v_beg = beg[1].cross(&beg[2]).normalize();
        let mut v_end = end[1].cross(&end[2]).normalize();
        if beg[0].dot(&v_beg) < 0.0 {
            v_beg = -v_beg;
        }
        if end[0].dot(&v_end) < 0.0 {
            v_end = -v_end;
        }

        // Spacing between p planes, and the distance from p = 0 to the plane
        // through the centre of the Ewald sphere
        let p_dist = beg[0].dot(&v_beg).abs();
        let dp_beg = v_beg.dot(&self.source).abs();
        let dp_end = v_end.dot(&self.source).abs();

        self.compute_ewald_sphere_p_limits(&v_beg, &v_end, dp_beg, dp_end, p_dist);
        self.compute_resolution_p_limits(&v_end, dp_beg, dp_end, p_dist)?;

        // Select between Ewald and resolution limits on the basis of sign
        let limits = if v_end.dot(&self.source) < 0.0 {
            // p axis aligned with the beam, against the source
            [
                self.res_p_lim_beg.0.max(self.ewald_p_lim_beg.0),
                self.res_p_lim_end.0.max(self.ewald_p_lim_end.0),
                self.res_p_lim_beg.1.max(self.ewald_p_lim_beg.1),
                self.res_p_lim_end.1.max(self.ewald_p_lim_end.1),
            ]
        } else {
            // p axis aligned with the source, against the beam
            [
                self.res_p_lim_beg.0.min(self.ewald_p_lim_beg.0),
                self.res_p_lim_end.0.min(self.ewald_p_lim_end.0),
                self.res_p_lim_beg.1.min(self.ewald_p_lim_beg.1),
                self.res_p_lim_end.1.min(self.ewald_p_lim_end.1),
            ]
        };

        // Single half-open interval covering the overall range
        let min = limits.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = limits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        self.p_lim = (
            min.floor() as i32 - self.margin,
            max.floor() as i32 + self.margin + 1,
        );
        Ok(())
    }

    /// The two planes of constant p tangential to the Ewald sphere. The
    /// smaller magnitude counts the planes within one radius minus those
    /// between the sphere centre and p = 0; the larger adds them. The sign
    /// follows whether the plane normal runs with or against the source.
    fn compute_ewald_sphere_p_limits(
        &mut self,
        v_beg: &Vector3<f64>,
        v_end: &Vector3<f64>,
        dp_beg: f64,
        dp_end: f64,
        p_dist: f64,
    ) {
        let source_len = self.source.norm();

        let sign = if v_beg.dot(&self.source) >= 0.0 { 1.0 } else { -1.0 };
        self.ewald_p_lim_beg = sort2((
            -sign * (source_len - dp_beg) / p_dist,
            sign * (source_len + dp_beg) / p_dist,
        ));

        let sign = if v_end.dot(&self.source) >= 0.0 { 1.0 } else { -1.0 };
        self.ewald_p_lim_end = sort2((
            -sign * (source_len - dp_end) / p_dist,
            sign * (source_len + dp_end) / p_dist,
        ));
    }

    /// The planes of constant p touching the circle where the Ewald and
    /// resolution spheres intersect. Both settings take their sign from the
    /// end normal.
    fn compute_resolution_p_limits(
        &mut self,
        v_end: &Vector3<f64>,
        dp_beg: f64,
        dp_end: f64,
        p_dist: f64,
    ) -> Result<(), Error> {
        let sin_theta = 0.5 * self.wavelength * self.dstarmax;
        if !(-1.0..=1.0).contains(&sin_theta) {
            return Err(Error::msg(
                "Resolution limit lies outside the accessible diffraction range.",
            ));
        }
        let sin_2theta = (2.0 * sin_theta.asin()).sin();
        let sign = if v_end.dot(&self.source) >= 0.0 { 1.0 } else { -1.0 };

        let e = 2.0 * sin_theta * sin_theta * dp_beg;
        let f = sin_2theta * (1.0 / self.wavelength_sq - dp_beg * dp_beg).max(0.0).sqrt();
        self.res_p_lim_beg = sort2(((sign * e - f) / p_dist, (sign * e + f) / p_dist));

        let e = 2.0 * sin_theta * sin_theta * dp_end;
        let f = sin_2theta * (1.0 / self.wavelength_sq - dp_end * dp_end).max(0.0).sqrt();
        self.res_p_lim_end = sort2(((sign * e - f) / p_dist, (sign * e + f) / p_dist));
        Ok(())
    }

    fn resolution_q_limits(&self, p: i32) -> Option<IndexRange> {
        let cp = self.cp.values();
        let pf = p as f64;
        let a = cp[9];
        let b = 2.0 * pf * cp[8];
        let c = pf * pf * cp[5] + cp[0] * self.dstarmax_sq;
        self.widened(&solve_quadratic(a, b, c))
    }

    fn ewald_sphere_q_limits(&self, p: i32) -> Option<IndexRange> {
        let cp = self.cp.values();
        let pf = p as f64;
        let a = cp[9];

        let b = 2.0 * (cp[6] + pf * cp[8]);
        let c = cp[1] + pf * (2.0 * cp[3] + pf * cp[5]);
        let beg = solve_quadratic(a, b, c);

        let b = 2.0 * (cp[7] + pf * cp[8]);
        let c = cp[2] + pf * (2.0 * cp[4] + pf * cp[5]);
        let end = solve_quadratic(a, b, c);

        // Overall extent of the (up to four) tangent values
        let all: SmallVec<[f64; 4]> = beg.iter().chain(end.iter()).cloned().collect();
        self.widened(&all)
    }

    fn resolution_r_limits(&self, q: f64, cq: &[f64; 5]) -> Option<IndexRange> {
        let cp = self.cp.values();
        let a = cp[0];
        let b = cq[0] + q * cp[11];
        let c = cq[1] + q * q * cp[13] + q * cq[2] - self.dstarmax_sq;
        self.widened(&solve_quadratic(a, b, c))
    }

    fn ewald_sphere_r_limits(&self, q: f64, cq: &[f64; 5]) -> RRanges {
        let cp = self.cp.values();
        let a = cp[0];

        let b = cq[0] + q * cp[11] + cp[15];
        let c = cq[1] + q * (cq[2] + cp[17]) + q * q * cp[13] + cq[3];
        let beg = solve_quadratic(a, b, c);

        // NB: the end setting keeps the begin constant in b; only c picks up
        // the end-setting terms. TODO: confirm whether b should use cp[16].
        let b = cq[0] + q * cp[11] + cp[15];
        let c = cq[1] + q * (cq[2] + cp[18]) + q * q * cp[13] + cq[4];
        let end = solve_quadratic(a, b, c);

        // One range per crossing point swept from the begin to the end
        // setting: the pair of smaller roots and the pair of larger roots
        let mut result = RRanges::new();
        match (beg.is_empty(), end.is_empty()) {
            (false, false) => {
                let (min_beg, max_beg) = (beg[0], beg[beg.len() - 1]);
                let (min_end, max_end) = (end[0], end[end.len() - 1]);
                result.push((
                    min_beg.min(min_end) as i32 - self.margin,
                    min_beg.max(min_end) as i32 + self.margin,
                ));
                result.push((
                    max_beg.min(max_end) as i32 - self.margin,
                    max_beg.max(max_end) as i32 + self.margin,
                ));
            }
            (false, true) => {
                result.push((
                    beg[0] as i32 - self.margin,
                    beg[beg.len() - 1] as i32 + self.margin,
                ));
            }
            (true, false) => {
                result.push((
                    end[0] as i32 - self.margin,
                    end[end.len() - 1] as i32 + self.margin,
                ));
            }
            (true, true) => {}
        }
        result
    }

    /// Closed integer interval spanning a root set, widened by the margin.
    /// A single root still produces a usable range.
    fn widened(&self, roots: &[f64]) -> Option<IndexRange> {
        if roots.is_empty() {
            return None;
        }
        let min = roots.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = roots.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some((min as i32 - self.margin, max as i32 + self.margin))
    }

    /// The rotation axis the model was built with.
    pub fn axis(&self) -> &Vector3<f64> {
        &self.axis
    }

    /// The sample-to-source vector (`-s0`).
    pub fn source(&self) -> &Vector3<f64> {
        &self.source
    }

    /// The resolution limit as a maximum reciprocal-space radius.
    pub fn dstarmax(&self) -> f64 {
        self.dstarmax
    }
}

/// Order a pair ascending.
fn sort2(pair: (f64, f64)) -> (f64, f64) {
    if pair.0 > pair.1 {
        (pair.1, pair.0)
    } else {
        pair
    }
}
