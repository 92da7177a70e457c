use std::f64::consts::PI;

use anyhow::Error;
use serde::{Deserialize, Serialize};

const TWO_PI: f64 = 2.0 * PI;

/// A rotation scan: a contiguous range of image frames, each covering one
/// oscillation step about the goniometer axis.
///
/// Angles are radians throughout. Frame coordinates are continuous: the
/// integer part names the image, the fraction the position within it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    /// Half-open frame interval `[begin, end)`.
    array_range: (i32, i32),
    /// Angle at the start of the first frame, and the width of one frame.
    oscillation: (f64, f64),
}

impl Scan {
    pub fn new(array_range: (i32, i32), oscillation: (f64, f64)) -> Result<Self, Error> {
        if array_range.1 < array_range.0 {
            return Err(Error::msg("Scan frame range is reversed."));
        }
        if oscillation.1 < 0.0 {
            return Err(Error::msg("Oscillation width must not be negative."));
        }
        Ok(Scan {
            array_range,
            oscillation,
        })
    }

    pub fn array_range(&self) -> (i32, i32) {
        self.array_range
    }

    pub fn num_images(&self) -> usize {
        (self.array_range.1 - self.array_range.0) as usize
    }

    pub fn oscillation(&self) -> (f64, f64) {
        self.oscillation
    }

    /// Total angular interval covered by the scan.
    pub fn oscillation_range(&self) -> (f64, f64) {
        let (phi0, dphi) = self.oscillation;
        (phi0, phi0 + self.num_images() as f64 * dphi)
    }

    /// Rotation angle at a (fractional) frame coordinate.
    pub fn angle_from_array_index(&self, index: f64) -> f64 {
        let (phi0, dphi) = self.oscillation;
        phi0 + (index - self.array_range.0 as f64) * dphi
    }

    /// Fractional frame coordinate at a rotation angle.
    pub fn array_index_from_angle(&self, angle: f64) -> f64 {
        let (phi0, dphi) = self.oscillation;
        assert!(dphi > 0.0, "angle lookup requires a non-zero oscillation");
        self.array_range.0 as f64 + (angle - phi0) / dphi
    }

    /// Whether some turn of the rotation brings `angle` into the scan.
    pub fn is_angle_valid(&self, angle: f64) -> bool {
        let (begin, end) = self.oscillation_range();
        if end - begin >= TWO_PI {
            return true;
        }
        (angle - begin).rem_euclid(TWO_PI) <= end - begin
    }

    /// Every `(angle, frame)` at which the scan passes through `angle`,
    /// one entry per turn for scans covering more than a full rotation.
    pub fn array_indices_with_angle(&self, angle: f64) -> Vec<(f64, f64)> {
        let (begin, end) = self.oscillation_range();
        let mut result = Vec::new();
        let mut turn = ((begin - angle) / TWO_PI).ceil();
        loop {
            let phi = angle + turn * TWO_PI;
            if phi > end {
                break;
            }
            result.push((phi, self.array_index_from_angle(phi)));
            turn += 1.0;
        }
        result
    }
}
