//! Error types for hullcarve.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for hullcarve operations.
#[derive(Error, Debug)]
pub enum HullError {
    /// A provided image could not be decoded into pixels.
    #[error("image for view {view} could not be decoded: {source}")]
    ImageDecode {
        view: usize,
        #[source]
        source: image::ImageError,
    },

    /// Camera parameters are missing, malformed, or disagree with their images.
    #[error("invalid camera data: {0}")]
    InvalidCameraData(String),

    /// Carving removed every voxel; the silhouettes share no common volume.
    #[error("visual hull is empty: carving against {views} views removed every voxel")]
    HullEmpty { views: usize },

    /// Grid resolution, isovalue, or bounds are out of range.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HullError {
    /// Classifies this error into the kind reported in a terminal failure message.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ImageDecode { .. } => FailureKind::ImageDecodeError,
            Self::InvalidCameraData(_) => FailureKind::InvalidCameraData,
            Self::HullEmpty { .. } => FailureKind::HullEmpty,
            Self::InvalidParameters(_) | Self::Io(_) | Self::Json(_) => FailureKind::InvalidParameters,
        }
    }

    /// Builds the structured failure payload for this error.
    #[must_use]
    pub fn to_failure(&self) -> Failure {
        Failure {
            kind: self.kind(),
            detail: self.to_string(),
        }
    }
}

/// Kind of a fatal reconstruction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// An input image could not be turned into pixels.
    ImageDecodeError,
    /// Missing or malformed camera parameters, checked before carving.
    InvalidCameraData,
    /// Carving left no occupied voxel.
    HullEmpty,
    /// Request parameters (resolution, isovalue, bounds) or configuration are unusable.
    InvalidParameters,
}

/// Terminal failure message: a kind plus a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

/// A specialized Result type for hullcarve operations.
pub type Result<T> = std::result::Result<T, HullError>;
