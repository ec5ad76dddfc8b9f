//! Error types for the goniometry engine.

use thiserror::Error;

use crate::types::{FrameType, LandmarkName, ViewOrientation};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Insufficient landmarks for {context}: {missing:?} missing or below visibility floor")]
    InsufficientLandmarks {
        context: String,
        missing: Vec<LandmarkName>,
    },

    #[error("Reference frame {frame:?} was not computed before it was required")]
    MissingFrame { frame: FrameType },

    #[error("View orientation {view:?} cannot observe {movement}: expected one of {expected:?}")]
    InvalidViewOrientation {
        movement: String,
        view: ViewOrientation,
        expected: Vec<ViewOrientation>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid measurement sequence: {0}")]
    InvalidSequence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn insufficient(context: impl Into<String>, missing: Vec<LandmarkName>) -> Self {
        Error::InsufficientLandmarks {
            context: context.into(),
            missing,
        }
    }

    /// Whether a caller can skip the offending frame and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InsufficientLandmarks { .. } | Error::InvalidViewOrientation { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Configuration(e.to_string())
    }
}
