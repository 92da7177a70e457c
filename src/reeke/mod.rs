// Reeke module: restricted Miller-index enumeration for rotation scans
//
// The Reeke construction avoids testing every index in a resolution shell
// by bounding, plane by plane, the thin region of reciprocal space that
// passes through the Ewald sphere between two crystal orientations.

// ======================== MODULE DECLARATIONS ========================
pub mod constants;
pub mod generator;
pub mod model;
pub mod permute;


// ======================== RE-EXPORTS ========================
pub use constants::PConstants;      // struct - the 21 per-scan-step scalars of the limit quadratics
pub use generator::ReekeIndexGenerator; // struct - lazy (h, k, l) iterator over the swept region
pub use model::{ReekeModel, RRanges};   // struct - p/q/r limit machinery; alias - up to two r intervals
pub use permute::{AxisPermutation, PermutedBases}; // structs - beam/axis column permutation of UB
