use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector3};

/// The scalars of the limit quadratics that do not vary with `p`.
///
/// Each permuted setting matrix `P` (columns `p`, `q`, `r`) is augmented
/// with the source vector into `P' = [P | -source]`, placing the reciprocal
/// basis in a coordinate system concentric with the Ewald sphere. The 4x4
/// metric tensor `T = P'^T P'` then carries every coefficient needed to
/// intersect lines of constant `p` and `q` with the Ewald and resolution
/// spheres, so they are hoisted out of the index loops here.
#[derive(Debug, Clone)]
pub struct PConstants {
    cp: [f64; 21],
}

impl PConstants {
    pub fn new(rlv_beg: &Matrix3<f64>, rlv_end: &Matrix3<f64>, source: &Vector3<f64>) -> Self {
        let t_beg = ewald_metric_tensor(&rlv_beg.transpose(), source);
        let t_end = ewald_metric_tensor(&rlv_end.transpose(), source);
        let (tb, te) = (&t_beg, &t_end);

        let mut cp = [0.0; 21];
        cp[0] = tb[(2, 2)];
        cp[1] = tb[(2, 3)] * tb[(2, 3)];
        cp[2] = te[(2, 3)] * te[(2, 3)];
        cp[3] = tb[(0, 2)] * tb[(2, 3)] - tb[(0, 3)] * tb[(2, 2)];
        cp[4] = te[(0, 2)] * te[(2, 3)] - te[(0, 3)] * te[(2, 2)];
        cp[5] = tb[(0, 2)] * tb[(0, 2)] - tb[(0, 0)] * tb[(2, 2)];
        cp[6] = tb[(1, 2)] * tb[(2, 3)] - tb[(1, 3)] * tb[(2, 2)];
        cp[7] = te[(1, 2)] * te[(2, 3)] - te[(1, 3)] * te[(2, 2)];
        cp[8] = tb[(0, 2)] * tb[(1, 2)] - tb[(0, 1)] * tb[(2, 2)];
        cp[9] = tb[(1, 2)] * tb[(1, 2)] - tb[(1, 1)] * tb[(2, 2)];
        cp[10] = 2.0 * tb[(0, 2)];
        cp[11] = 2.0 * tb[(1, 2)];
        cp[12] = tb[(0, 0)];
        cp[13] = tb[(1, 1)];
        cp[14] = 2.0 * tb[(0, 1)];
        cp[15] = 2.0 * tb[(2, 3)];
        cp[16] = 2.0 * te[(2, 3)];
        cp[17] = 2.0 * tb[(1, 3)];
        cp[18] = 2.0 * te[(1, 3)];
        cp[19] = 2.0 * tb[(0, 3)];
        cp[20] = 2.0 * te[(0, 3)];

        PConstants { cp }
    }

    pub fn values(&self) -> &[f64; 21] {
        &self.cp
    }
}

/// Reciprocal metric tensor of the setting matrix augmented with the
/// beam-to-source translation: `T = [P | -source]^T [P | -source]`.
fn ewald_metric_tensor(setting: &Matrix3<f64>, source: &Vector3<f64>) -> Matrix4<f64> {
    let mut augmented = Matrix3x4::zeros();
    augmented.fixed_view_mut::<3, 3>(0, 0).copy_from(setting);
    augmented.set_column(3, &-source);
    augmented.tr_mul(&augmented)
}
