use anyhow::Error;
use nalgebra::{Matrix3, Vector3};

use crate::geometry::{reciprocal_axis_directions, validate_setting_matrix};
use crate::interfaces::MillerIndex;

/// Column permutation of an orientation matrix into Reeke order.
///
/// Column `p` is the reciprocal axis most nearly parallel (or antiparallel)
/// to the source direction, column `r` is the one of the remaining two most
/// nearly along the rotation axis, and `q` is the survivor. Ties resolve to
/// the first maximum.
#[derive(Debug, Clone, Copy)]
pub struct AxisPermutation {
    index: [usize; 3],
    matrix: Matrix3<i32>,
}

impl AxisPermutation {
    pub fn new(ub: &Matrix3<f64>, axis: &Vector3<f64>, source: &Vector3<f64>) -> Self {
        let rl_dirs = reciprocal_axis_directions(ub);
        let mut index = [0usize, 1, 2];

        // Reciprocal axis closest to the source direction becomes p
        let p_index = argmax3(
            rl_dirs[0].dot(source).abs(),
            rl_dirs[1].dot(source).abs(),
            rl_dirs[2].dot(source).abs(),
        );
        index.swap(0, p_index);

        // Of the two remaining axes, the one closest to the rotation axis
        // becomes r and goes last
        let r_index = if rl_dirs[index[2]].dot(axis).abs() > rl_dirs[index[1]].dot(axis).abs() {
            1
        } else {
            0
        };
        index.swap(2, r_index + 1);

        // Permutation matrix such that (h, k, l) = M * (p, q, r)
        let mut matrix = Matrix3::zeros();
        matrix[(index[0], 0)] = 1;
        matrix[(index[1], 1)] = 1;
        matrix[(index[2], 2)] = 1;

        AxisPermutation { index, matrix }
    }

    /// Column order of the permuted setting matrix as indices into UB.
    pub fn index(&self) -> [usize; 3] {
        self.index
    }

    /// The 0/1 matrix mapping permuted `(p, q, r)` triples back to `(h, k, l)`.
    pub fn matrix(&self) -> &Matrix3<i32> {
        &self.matrix
    }

    /// Map a permuted triple back to a Miller index.
    pub fn to_hkl(&self, pqr: Vector3<i32>) -> MillerIndex {
        self.matrix * pqr
    }

    /// Map a Miller index into permuted coordinates.
    pub fn to_pqr(&self, hkl: MillerIndex) -> Vector3<i32> {
        self.matrix.transpose() * hkl
    }
}

/// Index of the first maximum of three values.
fn argmax3(a: f64, b: f64, c: f64) -> usize {
    let mut best = 0;
    let mut max = a;
    if b > max {
        best = 1;
        max = b;
    }
    if c > max {
        best = 2;
    }
    best
}

/// The permuted reciprocal basis matrices for a pair of orientations.
///
/// Rows of `rlv_beg` and `rlv_end` are the `p`, `q` and `r` basis vectors;
/// the permutation is always derived from the begin orientation.
#[derive(Debug, Clone)]
pub struct PermutedBases {
    pub permutation: AxisPermutation,
    pub rlv_beg: Matrix3<f64>,
    pub rlv_end: Matrix3<f64>,
}

impl PermutedBases {
    pub fn new(
        ub_beg: &Matrix3<f64>,
        ub_end: &Matrix3<f64>,
        axis: &Vector3<f64>,
        source: &Vector3<f64>,
    ) -> Result<Self, Error> {
        validate_setting_matrix(ub_beg)?;
        validate_setting_matrix(ub_end)?;

        let permutation = AxisPermutation::new(ub_beg, axis, source);
        let [i0, i1, i2] = permutation.index();

        let rows = |ub: &Matrix3<f64>| {
            Matrix3::from_columns(&[
                ub.column(i0).into_owned(),
                ub.column(i1).into_owned(),
                ub.column(i2).into_owned(),
            ])
            .transpose()
        };

        Ok(PermutedBases {
            permutation,
            rlv_beg: rows(ub_beg),
            rlv_end: rows(ub_end),
        })
    }
}
