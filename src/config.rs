// Constants

// Tolerances
pub const SETTING_MATRIX_TOLERANCE: f64 = 1e-10; // For validation of orientation (UB) matrices
pub const BEAM_TOLERANCE: f64 = 1e-10; // Smallest usable |s0|

// Cutoffs
pub const DELPSI_CUTOFF: f64 = 1e-3; // Radians; still-image proximity to the Ewald sphere
