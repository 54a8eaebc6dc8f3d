//! Visual hull carving: clears every voxel whose center falls outside any silhouette.

use glam::{UVec3, Vec3};
use rayon::prelude::*;

use crate::camera::CameraParameters;
use crate::error::{HullError, Result};
use crate::silhouette::Silhouette;
use crate::voxel_grid::VoxelGrid;

/// Voxel counts before and after a carving pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarveReport {
    /// Number of views tested.
    pub views: usize,
    /// Occupied voxels before the pass.
    pub initial: usize,
    /// Voxels cleared by the pass.
    pub removed: usize,
    /// Occupied voxels after the pass.
    pub remaining: usize,
}

/// Space carver over a [`VoxelGrid`].
///
/// Off-frame and behind-camera projections count as background, so a voxel survives
/// only when every view sees its center on a foreground pixel.
#[derive(Debug, Clone, Copy)]
pub struct VisualHullCarver {
    parallel: bool,
}

impl Default for VisualHullCarver {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl VisualHullCarver {
    /// Creates a carver; `parallel` splits the grid into X slabs across the rayon pool.
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Checks that views pair up and that every silhouette matches its camera resolution.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidCameraData`] on the first mismatch.
    pub fn validate_views(silhouettes: &[Silhouette], cameras: &[CameraParameters]) -> Result<()> {
        if silhouettes.len() != cameras.len() {
            return Err(HullError::InvalidCameraData(format!(
                "{} silhouettes but {} cameras",
                silhouettes.len(),
                cameras.len()
            )));
        }
        if cameras.is_empty() {
            return Err(HullError::InvalidCameraData("no views to carve with".into()));
        }
        for (view, (silhouette, camera)) in silhouettes.iter().zip(cameras).enumerate() {
            camera
                .validate()
                .map_err(|e| HullError::InvalidCameraData(format!("view {view}: {e}")))?;
            let expected = camera.intrinsics.resolution();
            if silhouette.dimensions() != expected {
                return Err(HullError::InvalidCameraData(format!(
                    "view {view}: silhouette is {}x{} but camera resolution is {}x{}",
                    silhouette.width(),
                    silhouette.height(),
                    expected.x,
                    expected.y
                )));
            }
        }
        Ok(())
    }

    /// Carves `grid` against all views at once.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidCameraData`] for mismatched views (before touching the
    /// grid) and [`HullError::HullEmpty`] if no voxel survives.
    pub fn carve(
        &self,
        grid: &mut VoxelGrid,
        silhouettes: &[Silhouette],
        cameras: &[CameraParameters],
    ) -> Result<CarveReport> {
        Self::validate_views(silhouettes, cameras)?;
        let initial = grid.occupied_count();
        let removed = self.clear_outside(grid, silhouettes, cameras);
        let remaining = initial - removed;
        log::info!(
            "carved {removed} of {initial} voxels against {} views, {remaining} remain",
            cameras.len()
        );
        if remaining == 0 {
            return Err(HullError::HullEmpty {
                views: cameras.len(),
            });
        }
        Ok(CarveReport {
            views: cameras.len(),
            initial,
            removed,
            remaining,
        })
    }

    /// Carves `grid` against a single view and returns the number of cleared voxels.
    ///
    /// An emptied grid is not an error here; callers carving view by view decide.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidCameraData`] if the view is malformed.
    pub fn carve_view(
        &self,
        grid: &mut VoxelGrid,
        silhouette: &Silhouette,
        camera: &CameraParameters,
    ) -> Result<usize> {
        let silhouettes = std::slice::from_ref(silhouette);
        let cameras = std::slice::from_ref(camera);
        Self::validate_views(silhouettes, cameras)?;
        let removed = self.clear_outside(grid, silhouettes, cameras);
        log::debug!("view cleared {removed} voxels");
        Ok(removed)
    }

    fn clear_outside(
        &self,
        grid: &mut VoxelGrid,
        silhouettes: &[Silhouette],
        cameras: &[CameraParameters],
    ) -> usize {
        let r = grid.resolution() as usize;
        let origin = grid.bounds().min;
        let size = grid.voxel_size();

        #[allow(clippy::cast_possible_truncation)]
        let carve_slab = |(i, slab): (usize, &mut [bool])| -> usize {
            let mut removed = 0;
            for (offset, cell) in slab.iter_mut().enumerate() {
                if !*cell {
                    continue;
                }
                let index = UVec3::new(i as u32, (offset / r) as u32, (offset % r) as u32);
                let center = origin + (index.as_vec3() + Vec3::splat(0.5)) * size;
                let survives = silhouettes
                    .iter()
                    .zip(cameras)
                    .all(|(silhouette, camera)| sees_foreground(silhouette, camera, center));
                if !survives {
                    *cell = false;
                    removed += 1;
                }
            }
            removed
        };

        let cells = grid.cells_mut();
        if self.parallel {
            cells.par_chunks_mut(r * r).enumerate().map(&carve_slab).sum()
        } else {
            cells.chunks_mut(r * r).enumerate().map(&carve_slab).sum()
        }
    }
}

/// Whether `point` projects onto a foreground pixel of `silhouette`.
#[inline]
fn sees_foreground(silhouette: &Silhouette, camera: &CameraParameters, point: Vec3) -> bool {
    camera
        .project(point)
        .pixel
        .is_some_and(|px| silhouette.contains(px.x, px.y))
}
