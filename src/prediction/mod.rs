// Prediction module: drivers that turn generated Miller indices into
// reflection-table rows with calculated detector positions
//
// The three drivers share one skeleton: pull indices from a source, ask a
// ray predictor for diffracted rays, intersect with the detector, append.
// Ray prediction and the detector stay behind traits; the scan model and
// the reflection tables are concrete.

// ======================== MODULE DECLARATIONS ========================
pub mod ray;
pub mod scan;
pub mod scan_static;
pub mod scan_varying;
pub mod stills;
pub mod table;

// Test modules
mod _tests_fixtures;
mod _tests_scan_static;
mod _tests_scan_varying;

// ======================== RE-EXPORTS ========================
pub use ray::{
    Detector,                 // trait - multi-panel ray intersection and mm->pixel mapping
    Ray,                      // struct - diffracted beam vector, angle, entering flag
    RayPredictor,             // trait - scan-static ray prediction over a full turn
    ScanVaryingRayPredictor,  // trait - single-ray prediction between two settings
    StillRay,                 // struct - ray plus angular offset from the Ewald sphere
    StillsRayPredictor,       // trait - still-image ray prediction
};
pub use scan::Scan;
pub use scan_static::ScanStaticPredictor;
pub use scan_varying::ScanVaryingPredictor;
pub use stills::StillsPredictor;
pub use table::{flags, ReflectionTable, StillsReflectionTable};
