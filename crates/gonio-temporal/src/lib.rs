//! # Gonio-Temporal
//!
//! Temporal validation of clinical joint measurements recorded over a clip.
//!
//! ## Analysis stages
//!
//! A [`TemporalMeasurementSequence`] is analysed in one pass by the
//! [`TemporalAnalyzer`]:
//!
//! 1. **Consistency** - frame-to-frame jumps and a jerk-based smoothness score
//! 2. **Trajectory** - observed shape (increasing, decreasing, static,
//!    oscillating) against an optional expected shape, plus velocity statistics
//! 3. **Compensation tracking** - persistence and progression of each
//!    compensation seen in the clip
//! 4. **Quality** - per-frame quality trend and dropouts
//!
//! ## Angle wrap-around
//!
//! Every frame-to-frame difference is the shortest angular distance, so a
//! reading passing 350° → 0° → 10° moves by 10° per frame, not 350°.

pub mod analyzer;
pub mod consistency;
pub mod quality;
pub mod sequence;
pub mod tracking;
pub mod trajectory;

pub use analyzer::*;
pub use consistency::*;
pub use quality::*;
pub use sequence::*;
pub use tracking::*;
pub use trajectory::*;
