use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::interfaces::MillerIndex;

/// Reflection status bits.
pub mod flags {
    /// Set when prediction located the reflection on a detector panel.
    pub const PREDICTED: u32 = 1 << 0;
}

/// Columnar store of predicted reflections: one entry per column per row.
///
/// `xyz_mm` carries the panel impact in millimetres with the diffraction
/// angle in `z`; `xyz_px` the pixel impact with the fractional frame in `z`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReflectionTable {
    pub hkl: Vec<MillerIndex>,
    pub entering: Vec<bool>,
    pub s1: Vec<Vector3<f64>>,
    pub panel: Vec<usize>,
    pub xyz_mm: Vec<Vector3<f64>>,
    pub xyz_px: Vec<Vector3<f64>>,
    pub flags: Vec<u32>,
}

impl ReflectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hkl.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hkl.is_empty()
    }

    /// All columns hold the same number of rows.
    pub fn is_consistent(&self) -> bool {
        let n = self.hkl.len();
        self.entering.len() == n
            && self.s1.len() == n
            && self.panel.len() == n
            && self.xyz_mm.len() == n
            && self.xyz_px.len() == n
            && self.flags.len() == n
    }

    #[allow(clippy::too_many_arguments)]
    pub fn push_row(
        &mut self,
        hkl: MillerIndex,
        entering: bool,
        s1: Vector3<f64>,
        panel: usize,
        xyz_mm: Vector3<f64>,
        xyz_px: Vector3<f64>,
        flags: u32,
    ) {
        self.hkl.push(hkl);
        self.entering.push(entering);
        self.s1.push(s1);
        self.panel.push(panel);
        self.xyz_mm.push(xyz_mm);
        self.xyz_px.push(xyz_px);
        self.flags.push(flags);
    }
}

/// Reflection table for still images, extended with the angular offset of
/// each reflection from the Ewald sphere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StillsReflectionTable {
    pub base: ReflectionTable,
    pub delpsi: Vec<f64>,
}

impl StillsReflectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn is_consistent(&self) -> bool {
        self.base.is_consistent() && self.delpsi.len() == self.base.len()
    }
}
