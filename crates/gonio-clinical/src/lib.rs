//! # Gonio-Clinical
//!
//! Turns anatomical reference frames into graded joint-angle measurements.
//!
//! ## Pipeline
//!
//! ```text
//! LandmarkSet ─► view check ─► frames (cached) ─► primary angle ─► grade
//!                                   │                   │
//!                                   │                   └─► secondary joint checks
//!                                   └─► CompensationDetector ─► patterns
//!                                                   │
//!                                  QualityAssessment ◄┘
//! ```
//!
//! ## Movements
//!
//! | movement           | views              | plane                  |
//! |--------------------|--------------------|------------------------|
//! | shoulder flexion   | sagittal, frontal  | sagittal (thorax X)    |
//! | shoulder abduction | frontal, posterior | frontal (thorax Z)     |
//! | shoulder rotation  | frontal            | transverse to humerus  |
//! | elbow flexion      | sagittal, frontal  | sagittal (thorax X)    |
//! | knee flexion       | sagittal           | sagittal (pelvis X)    |

pub mod compensation;
pub mod measurement;
pub mod quality;

pub use compensation::*;
pub use measurement::*;
pub use quality::*;
