//! # Gonio-Frames
//!
//! Anatomical reference frames and their cache.
//!
//! ## Frame chain
//!
//! ```text
//! Global ─┬─ Thorax ── UpperArm(L/R) ── Forearm(L/R)
//!         └─ Pelvis
//! ```
//!
//! The [`FrameBuilder`] is pure: identical landmark sets always produce
//! bit-identical frames, which is what makes memoizing them in the
//! [`FrameCache`] sound. The cache quantizes landmark coordinates before
//! keying (spatial bucketing), so sub-centimeter jitter between video frames
//! reuses the previous frame instead of recomputing it.
//!
//! A cache is owned by one processing lane. Hosts that must share one across
//! threads wrap it in a [`SharedFrameCache`].

pub mod builder;
pub mod cache;

pub use builder::*;
pub use cache::*;
