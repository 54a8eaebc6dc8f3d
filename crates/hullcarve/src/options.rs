//! Configuration options for the reconstruction pipeline.

use std::path::Path;

use hullcarve_core::{HullError, SilhouetteConfig};
use serde::{Deserialize, Serialize};

/// Default guard on the grid resolution.
pub const DEFAULT_MAX_RESOLUTION: u32 = 256;

/// Pipeline-wide settings shared by every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionOptions {
    /// Silhouette keying settings.
    pub silhouette: SilhouetteConfig,

    /// Whether to carve X slabs in parallel on the rayon pool.
    pub parallel: bool,

    /// Largest accepted grid resolution.
    ///
    /// Carving time and memory grow with the cube of the resolution. Meshing builds a
    /// padded `f32` field of `(resolution + 2)^3` values, about 68 MB at 256 and 543 MB
    /// at 512.
    pub max_resolution: u32,
}

impl Default for ReconstructionOptions {
    fn default() -> Self {
        Self {
            silhouette: SilhouetteConfig::default(),
            parallel: true,
            max_resolution: DEFAULT_MAX_RESOLUTION,
        }
    }
}

impl ReconstructionOptions {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, HullError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HullError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the options as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, HullError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hullcarve_core::KeyMode;

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = ReconstructionOptions::from_json_str(
            r#"{ "parallel": false, "silhouette": { "mode": "Alpha", "alpha_threshold": 10 } }"#,
        )
        .unwrap();
        assert!(!options.parallel);
        assert_eq!(options.max_resolution, DEFAULT_MAX_RESOLUTION);
        assert_eq!(options.silhouette.mode, KeyMode::Alpha);
        assert_eq!(options.silhouette.alpha_threshold, 10);
        assert_eq!(options.silhouette.background_color, [255, 255, 255]);
    }

    #[test]
    fn test_json_round_trip() {
        let options = ReconstructionOptions {
            max_resolution: 96,
            ..ReconstructionOptions::default()
        };
        let parsed = ReconstructionOptions::from_json_str(&options.to_json().unwrap()).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_bad_json_is_reported() {
        let err = ReconstructionOptions::from_json_str("{ parallel: ").unwrap_err();
        assert!(matches!(err, HullError::Json(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ReconstructionOptions::load("/nonexistent/hullcarve.json").unwrap_err();
        assert!(matches!(err, HullError::Io(_)));
    }
}
