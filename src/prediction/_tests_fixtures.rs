#![cfg(test)]
// Shared fixtures for the prediction driver tests: a flat multi-panel
// detector and simple concrete implementations of the collaborator traits.

use nalgebra::{Matrix3, Vector3};
use smallvec::SmallVec;

use crate::geometry::axis_angle_matrix;
use crate::interfaces::{IndexSource, MillerIndex};
use crate::prediction::ray::{
    Detector, Ray, RayPredictor, ScanVaryingRayPredictor, StillRay, StillsRayPredictor,
};
use crate::prediction::scan::Scan;

// ======================== DETECTOR ========================

/// A flat panel in the plane z = distance, bounded in lab-frame x and y.
/// Millimetre coordinates are measured from the panel's lower-left corner.
pub struct FlatPanel {
    pub distance: f64,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub pixel_size: f64,
}

impl FlatPanel {
    fn intersect(&self, s1: &Vector3<f64>) -> Option<(f64, f64)> {
        if s1.z <= 0.0 {
            return None;
        }
        let x = s1.x / s1.z * self.distance;
        let y = s1.y / s1.z * self.distance;
        if x < self.x_range.0 || x >= self.x_range.1 || y < self.y_range.0 || y >= self.y_range.1 {
            return None;
        }
        Some((x - self.x_range.0, y - self.y_range.0))
    }
}

pub struct PlaneDetector {
    pub panels: Vec<FlatPanel>,
}

impl PlaneDetector {
    /// One square panel of the given half-width, centred on the beam.
    pub fn single(distance: f64, half_width: f64, pixel_size: f64) -> Self {
        PlaneDetector {
            panels: vec![FlatPanel {
                distance,
                x_range: (-half_width, half_width),
                y_range: (-half_width, half_width),
                pixel_size,
            }],
        }
    }

    /// Two half panels split at x = 0: panel 0 on negative x, panel 1 on
    /// positive x.
    pub fn split(distance: f64, half_width: f64, pixel_size: f64) -> Self {
        let panel = |x_range| FlatPanel {
            distance,
            x_range,
            y_range: (-half_width, half_width),
            pixel_size,
        };
        PlaneDetector {
            panels: vec![panel((-half_width, 0.0)), panel((0.0, half_width))],
        }
    }
}

impl Detector for PlaneDetector {
    fn ray_intersection(&self, s1: &Vector3<f64>) -> Option<(usize, (f64, f64))> {
        self.panels
            .iter()
            .enumerate()
            .find_map(|(i, panel)| panel.intersect(s1).map(|mm| (i, mm)))
    }

    fn panel_ray_intersection(&self, panel: usize, s1: &Vector3<f64>) -> Option<(f64, f64)> {
        self.panels[panel].intersect(s1)
    }

    fn millimeter_to_pixel(&self, panel: usize, mm: (f64, f64)) -> (f64, f64) {
        let size = self.panels[panel].pixel_size;
        (mm.0 / size, mm.1 / size)
    }
}

// ======================== RAY PREDICTORS ========================

/// Scan-static ray prediction: solve for the rotation angles in [0, 2pi)
/// at which a reciprocal-lattice point crosses the Ewald sphere.
pub struct RotationRayPredictor {
    s0: Vector3<f64>,
    axis: Vector3<f64>,
}

impl RotationRayPredictor {
    pub fn new(s0: Vector3<f64>, axis: Vector3<f64>) -> Self {
        RotationRayPredictor {
            s0,
            axis: axis.normalize(),
        }
    }
}

impl RayPredictor for RotationRayPredictor {
    fn predict(&self, h: MillerIndex, ub: &Matrix3<f64>) -> SmallVec<[Ray; 2]> {
        let mut rays = SmallVec::new();
        let r0 = ub * h.map(|v| v as f64);

        // Split into components along and perpendicular to the axis; the
        // diffraction condition becomes a*cos(phi) + b*sin(phi) = c
        let r_par = self.axis * r0.dot(&self.axis);
        let r_perp = r0 - r_par;
        let a = r_perp.dot(&self.s0);
        let b = self.axis.cross(&r_perp).dot(&self.s0);
        let c = -0.5 * r0.norm_squared() - r_par.dot(&self.s0);
        let amplitude = (a * a + b * b).sqrt();
        if amplitude < 1e-12 || c.abs() > amplitude {
            return rays;
        }

        let centre = b.atan2(a);
        let delta = (c / amplitude).clamp(-1.0, 1.0).acos();
        for phi in [centre - delta, centre + delta] {
            let angle = phi.rem_euclid(2.0 * std::f64::consts::PI);
            let rotated = axis_angle_matrix(&self.axis, angle) * r0;
            let s1 = rotated + self.s0;
            let entering = self.axis.cross(&rotated).dot(&self.s0) < 0.0;
            rays.push(Ray { s1, angle, entering });
        }
        rays
    }
}

/// Scan-varying ray prediction by linear interpolation of the reciprocal
/// lattice vector between the two frame-boundary settings.
pub struct InterpolatingRayPredictor {
    s0: Vector3<f64>,
    scan: Scan,
}

impl InterpolatingRayPredictor {
    pub fn new(s0: Vector3<f64>, scan: Scan) -> Self {
        InterpolatingRayPredictor { s0, scan }
    }
}

impl ScanVaryingRayPredictor for InterpolatingRayPredictor {
    fn predict(
        &self,
        h: MillerIndex,
        a1: &Matrix3<f64>,
        a2: &Matrix3<f64>,
        frame: i32,
        step: usize,
    ) -> Option<Ray> {
        let hf = h.map(|v| v as f64);
        let r1 = a1 * hf;
        let r2 = a2 * hf;
        let d1 = (r1 + self.s0).norm_squared() - self.s0.norm_squared();
        let d2 = (r2 + self.s0).norm_squared() - self.s0.norm_squared();
        if d1 * d2 > 0.0 || d1 == d2 {
            return None;
        }

        let t = d1 / (d1 - d2);
        let r = r1 + (r2 - r1) * t;
        let s1 = (r + self.s0).normalize() * self.s0.norm();
        let angle = self
            .scan
            .angle_from_array_index(frame as f64 + t * step as f64);
        Some(Ray {
            s1,
            angle,
            entering: d1 > 0.0,
        })
    }
}

/// Still-image ray prediction: rotate the reciprocal-lattice point through
/// the smallest angle that puts it on the Ewald sphere.
pub struct EwaldStillsPredictor {
    s0: Vector3<f64>,
}

impl EwaldStillsPredictor {
    pub fn new(s0: Vector3<f64>) -> Self {
        EwaldStillsPredictor { s0 }
    }
}

impl StillsRayPredictor for EwaldStillsPredictor {
    fn predict(&self, h: MillerIndex, ub: &Matrix3<f64>) -> Option<StillRay> {
        let r = ub * h.map(|v| v as f64);
        let cross = r.cross(&self.s0);
        if r.norm() < 1e-12 || cross.norm() < 1e-12 {
            return None;
        }

        // In-plane orthonormal frame about the rotation axis e1
        let e1 = cross.normalize();
        let along = self.s0.normalize();
        let across = e1.cross(&along);

        // On-sphere image of r in the same plane
        let alpha = -r.norm_squared() / (2.0 * self.s0.norm());
        let beta = -(r.norm_squared() - alpha * alpha).max(0.0).sqrt();
        let r_on_sphere = along * alpha + across * beta;

        let delpsi = r.cross(&r_on_sphere).dot(&e1).atan2(r.dot(&r_on_sphere));
        Some(StillRay {
            ray: Ray {
                s1: r_on_sphere + self.s0,
                angle: 0.0,
                entering: false,
            },
            delpsi,
        })
    }
}

// ======================== INDEX SOURCE ========================

/// Plain resolution-shell enumerator standing in for the symmetry-aware
/// static index generator.
pub struct ShellIndexSource {
    indices: std::vec::IntoIter<MillerIndex>,
}

impl ShellIndexSource {
    pub fn new(ub: &Matrix3<f64>, dmin: f64) -> Self {
        let dstarmax = 1.0 / dmin;
        let bound = |i: usize| (dstarmax / ub.column(i).norm()).ceil() as i32 + 1;
        let (nh, nk, nl) = (bound(0), bound(1), bound(2));

        let mut indices = Vec::new();
        for h in -nh..=nh {
            for k in -nk..=nk {
                for l in -nl..=nl {
                    let hkl = MillerIndex::new(h, k, l);
                    if hkl == MillerIndex::zeros() {
                        continue;
                    }
                    if (ub * hkl.map(|v| v as f64)).norm() <= dstarmax {
                        indices.push(hkl);
                    }
                }
            }
        }
        ShellIndexSource {
            indices: indices.into_iter(),
        }
    }
}

impl IndexSource for ShellIndexSource {
    fn next_index(&mut self) -> Option<MillerIndex> {
        self.indices.next()
    }
}
