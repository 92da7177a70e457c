use smallvec::{smallvec, SmallVec};

/// Real roots of a quadratic, at most two, in ascending order.
pub type Roots = SmallVec<[f64; 2]>;

/// Solve `a*x^2 + b*x + c = 0` over the reals.
///
/// Returns 0, 1 or 2 roots in ascending order. A vanishing leading
/// coefficient degenerates to the linear case with the single root `-c/b`,
/// or no roots at all when `b` also vanishes. A negative discriminant yields
/// no roots; a zero discriminant yields one.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    if a == 0.0 {
        if b == 0.0 {
            return Roots::new();
        }
        return smallvec![-c / b];
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Roots::new();
    }
    if discriminant == 0.0 {
        return smallvec![-b / (2.0 * a)];
    }

    // Evaluate the stable root first to avoid cancellation against b
    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    let x0 = q / a;
    let x1 = c / q;
    if x0 <= x1 {
        smallvec![x0, x1]
    } else {
        smallvec![x1, x0]
    }
}
