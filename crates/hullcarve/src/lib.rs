//! hullcarve: 3D reconstruction from multi-view silhouettes.
//!
//! Images are keyed into binary silhouettes, a voxel grid is carved down to the visual
//! hull those silhouettes admit, and marching cubes turns the carved grid into a closed
//! triangle mesh.
//!
//! # Quick Start
//!
//! ```no_run
//! use hullcarve::*;
//!
//! fn main() -> std::result::Result<(), ReconstructionError> {
//!     // Six cameras on a ring around the origin
//!     let rig = CameraRig::ring(6, 0.0, 4.0, ProjectionKind::default(), 256, 256);
//!
//!     let images = (0..6)
//!         .map(|i| std::fs::read(format!("view_{i}.png")).map(ImageSource::Encoded))
//!         .collect::<std::io::Result<Vec<_>>>()
//!         .map_err(HullError::from)?;
//!
//!     let request = ReconstructionRequest::from_rig(&rig, images)?.with_resolution(64);
//!     let mesh = reconstruct(&request)?;
//!     println!("{} triangles", mesh.num_triangles());
//!     Ok(())
//! }
//! ```
//!
//! # Running in the background
//!
//! [`ReconstructionWorker`] runs the same pipeline on a dedicated thread and streams
//! [`PipelineEvent`]s: one [`Progress`] per completed [`Stage`], then either the mesh or a
//! [`Failure`]. A cancelled run emits nothing further.
//!
//! # Mesh layout
//!
//! Vertex stride is three `f32` (x, y, z), indices are `u32` with three per triangle,
//! and triangles wind counter-clockwise seen from outside.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

mod events;
mod options;
mod pipeline;
mod request;
mod worker;

// Re-export core types
pub use hullcarve_core::{
    camera::nearest_pixel, Axis, CameraExtrinsics, CameraIntrinsics, CameraParameters, CameraRig,
    CarveReport, Failure, FailureKind, GridBounds, HullError, KeyMode, MarchingCubesMesher, Mesh,
    ProjectedPoint, ProjectionKind, Result, Silhouette, SilhouetteConfig, SilhouetteExtractor,
    StandardView, ViewPose, VisualHullCarver, VoxelGrid, DEFAULT_ISOVALUE,
};
pub use hullcarve_core::{UVec2, UVec3, Vec3};

pub use events::{PipelineEvent, PipelineState, Progress, Stage};
pub use options::{ReconstructionOptions, DEFAULT_MAX_RESOLUTION};
pub use pipeline::{CancellationToken, ReconstructionError, ReconstructionPipeline};
pub use request::{
    ImageSource, ReconstructionRequest, ViewInput, DEFAULT_RESOLUTION, MIN_VIEWS,
};
pub use worker::ReconstructionWorker;

/// Runs `request` to completion on the calling thread with default options.
pub fn reconstruct(request: &ReconstructionRequest) -> std::result::Result<Mesh, ReconstructionError> {
    ReconstructionPipeline::default().reconstruct(request, &CancellationToken::new(), |_| {})
}

/// Runs `request` on a background thread with the given options.
pub fn spawn_reconstruction(
    options: ReconstructionOptions,
    request: ReconstructionRequest,
) -> Result<ReconstructionWorker> {
    ReconstructionWorker::spawn(ReconstructionPipeline::new(options), request)
}
