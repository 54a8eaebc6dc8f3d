//! Core geometry for hullcarve.
//!
//! This crate provides the building blocks of silhouette-based reconstruction:
//! - [`CameraParameters`] and [`CameraRig`] for projecting world points into views
//! - [`SilhouetteExtractor`] for turning decoded images into binary masks
//! - [`VoxelGrid`] and [`VisualHullCarver`] for space carving
//! - [`MarchingCubesMesher`] for extracting a closed [`Mesh`] from the carved grid

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod carver;
pub mod error;
pub mod marching_cubes;
pub mod mesh;
pub mod rig;
pub mod silhouette;
pub mod voxel_grid;

pub use camera::{CameraExtrinsics, CameraIntrinsics, CameraParameters, ProjectedPoint, ProjectionKind};
pub use carver::{CarveReport, VisualHullCarver};
pub use error::{Failure, FailureKind, HullError, Result};
pub use marching_cubes::{marching_cubes, MarchingCubesMesher, DEFAULT_ISOVALUE};
pub use mesh::Mesh;
pub use rig::{CameraRig, StandardView, ViewPose};
pub use silhouette::{decode_image, KeyMode, Silhouette, SilhouetteConfig, SilhouetteExtractor};
pub use voxel_grid::{Axis, GridBounds, VoxelGrid};

// Re-export glam types for convenience
pub use glam::{UVec2, UVec3, Vec3};
