//! # Gonio-Core
//!
//! Core types and utilities for the goniometry engine: landmark sets produced
//! by an upstream pose detector, anatomical reference frames, vector geometry,
//! angle-series kinematics and the validated configuration records shared by
//! every layer.
//!
//! ## Coordinate convention
//!
//! Detector output uses image coordinates (x right, y down, optional depth
//! where negative is closer to the camera). Everything downstream works in a
//! right-handed body space:
//!
//! - **X** = image x
//! - **Y** = -image y (up)
//! - **Z** = -depth (toward the camera, 0 when no depth is available)

pub mod config;
pub mod error;
pub mod geometry;
pub mod kinematics;
pub mod synthetic;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use kinematics::*;
pub use types::*;
