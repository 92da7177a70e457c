use nalgebra::{Matrix3, Vector3};
use smallvec::SmallVec;

use crate::interfaces::MillerIndex;

/// A diffracted ray leaving the crystal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Diffracted beam vector, length `1/wavelength`.
    pub s1: Vector3<f64>,
    /// Rotation angle at which the reflection diffracts (radians).
    pub angle: f64,
    /// Whether the reciprocal-lattice point enters (rather than exits) the
    /// Ewald sphere at this angle.
    pub entering: bool,
}

/// A still-image ray together with its angular offset from the Ewald sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StillRay {
    pub ray: Ray,
    /// Smallest rotation that would place the index on the sphere (radians).
    pub delpsi: f64,
}

/// Ray prediction for a fixed orientation over a full turn.
///
/// Implementations are primed with the beam and rotation axis; for a given
/// index they return every Ewald-sphere crossing in `[0, 2pi]`, of which
/// there are at most two.
pub trait RayPredictor {
    fn predict(&self, h: MillerIndex, ub: &Matrix3<f64>) -> SmallVec<[Ray; 2]>;
}

/// Ray prediction between two orientations bracketing one image.
///
/// Returns a ray only if the reflection crosses the Ewald sphere between the
/// two settings; `frame` and `step` locate the crossing on the scan.
pub trait ScanVaryingRayPredictor {
    fn predict(
        &self,
        h: MillerIndex,
        a1: &Matrix3<f64>,
        a2: &Matrix3<f64>,
        frame: i32,
        step: usize,
    ) -> Option<Ray>;
}

/// Ray prediction for still images: no rotation, every index diffracts with
/// an angular offset `delpsi`. `None` only for degenerate geometry (an index
/// collinear with the beam).
pub trait StillsRayPredictor {
    fn predict(&self, h: MillerIndex, ub: &Matrix3<f64>) -> Option<StillRay>;
}

/// A multi-panel detector.
///
/// Coordinates are millimetres in the panel plane; a `None` intersection
/// means the ray misses the panel (or every panel).
pub trait Detector {
    /// First panel hit by a diffracted beam vector, with the impact position.
    fn ray_intersection(&self, s1: &Vector3<f64>) -> Option<(usize, (f64, f64))>;

    /// Impact position on one specific panel.
    fn panel_ray_intersection(&self, panel: usize, s1: &Vector3<f64>) -> Option<(f64, f64)>;

    /// Convert a panel-plane position to fractional pixel coordinates.
    fn millimeter_to_pixel(&self, panel: usize, mm: (f64, f64)) -> (f64, f64);
}
