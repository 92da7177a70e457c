// Definitions that are used throughout all modules

use nalgebra::Vector3;

/// A Miller index: integer coordinates of a reciprocal-lattice point.
pub type MillerIndex = Vector3<i32>;

/// A half-open integer interval `[start, end)`. Empty when `start >= end`.
pub type IndexRange = (i32, i32);

/// A pull-based source of Miller indices, exhausted when `None` is returned.
///
/// Both the Reeke generator and external symmetry-aware enumerators present
/// this interface to the prediction drivers.
pub trait IndexSource {
    fn next_index(&mut self) -> Option<MillerIndex>;
}
