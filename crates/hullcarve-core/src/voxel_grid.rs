//! Cubic voxel occupancy grid.

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{HullError, Result};
use crate::silhouette::Silhouette;

/// Axis-aligned bounding cube of a voxel grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    /// Minimum corner in world space.
    pub min: Vec3,
    /// Edge length of the cube.
    pub extent: f32,
}

impl GridBounds {
    pub fn new(min: Vec3, extent: f32) -> Self {
        Self { min, extent }
    }

    /// A cube of half-size `half_extent` centered on `center`.
    pub fn centered(center: Vec3, half_extent: f32) -> Self {
        Self {
            min: center - Vec3::splat(half_extent),
            extent: 2.0 * half_extent,
        }
    }

    /// Maximum corner in world space.
    pub fn max(&self) -> Vec3 {
        self.min + Vec3::splat(self.extent)
    }

    /// Center of the cube.
    pub fn center(&self) -> Vec3 {
        self.min + Vec3::splat(self.extent * 0.5)
    }

    /// Checks that the cube is finite and non-degenerate.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidParameters`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.min.is_finite() && self.extent.is_finite() && self.extent > 0.0 {
            Ok(())
        } else {
            Err(HullError::InvalidParameters(format!(
                "grid bounds min={} extent={} are not a finite, positive cube",
                self.min, self.extent
            )))
        }
    }
}

impl Default for GridBounds {
    fn default() -> Self {
        Self::centered(Vec3::ZERO, 1.0)
    }
}

/// Slicing axis for [`VoxelGrid::slice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// An R×R×R occupancy grid over [`GridBounds`].
///
/// Storage is C-contiguous: voxel `(i, j, k)` lives at `(i * R + j) * R + k`, with `i`
/// along X, `j` along Y and `k` along Z. Voxels can be cleared but never set again, and
/// the bounds are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    resolution: u32,
    bounds: GridBounds,
    occupied: Vec<bool>,
}

impl VoxelGrid {
    /// Creates a fully occupied grid, the starting state for carving.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidParameters`] for a zero resolution or bad bounds.
    pub fn new_full(resolution: u32, bounds: GridBounds) -> Result<Self> {
        Self::from_fn(resolution, bounds, |_| true)
    }

    /// Creates a grid whose occupancy is `f(index)` for every voxel.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidParameters`] for a zero resolution or bad bounds.
    pub fn from_fn(resolution: u32, bounds: GridBounds, mut f: impl FnMut(UVec3) -> bool) -> Result<Self> {
        if resolution == 0 {
            return Err(HullError::InvalidParameters(
                "grid resolution must be at least 1".into(),
            ));
        }
        bounds.validate()?;

        let n = resolution as usize;
        let mut occupied = Vec::with_capacity(n * n * n);
        for i in 0..resolution {
            for j in 0..resolution {
                for k in 0..resolution {
                    occupied.push(f(UVec3::new(i, j, k)));
                }
            }
        }
        Ok(Self {
            resolution,
            bounds,
            occupied,
        })
    }

    /// Voxels along each axis.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// World-space bounding cube.
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Edge length of one voxel.
    #[allow(clippy::cast_precision_loss)]
    pub fn voxel_size(&self) -> f32 {
        self.bounds.extent / self.resolution as f32
    }

    /// Total number of voxels.
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    /// Always false: a valid grid has at least one voxel.
    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Linear storage index of voxel `index`.
    #[inline]
    pub fn linear_index(&self, index: UVec3) -> usize {
        let r = self.resolution as usize;
        (index.x as usize * r + index.y as usize) * r + index.z as usize
    }

    /// Voxel coordinates of a linear storage index.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn voxel_index(&self, linear: usize) -> UVec3 {
        let r = self.resolution as usize;
        UVec3::new((linear / (r * r)) as u32, ((linear / r) % r) as u32, (linear % r) as u32)
    }

    /// Whether voxel `index` is occupied. Out-of-range voxels are empty.
    #[inline]
    pub fn is_occupied(&self, index: UVec3) -> bool {
        index.max_element() < self.resolution && self.occupied[self.linear_index(index)]
    }

    /// Marks voxel `index` as empty. Out-of-range voxels are already empty.
    pub fn clear(&mut self, index: UVec3) {
        if index.max_element() >= self.resolution {
            return;
        }
        let linear = self.linear_index(index);
        self.occupied[linear] = false;
    }

    /// World-space center of voxel `index`.
    #[inline]
    pub fn voxel_center(&self, index: UVec3) -> Vec3 {
        self.bounds.min + (index.as_vec3() + Vec3::splat(0.5)) * self.voxel_size()
    }

    /// Number of occupied voxels.
    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    /// Returns true if no voxel is occupied.
    pub fn is_hollow(&self) -> bool {
        !self.occupied.iter().any(|&o| o)
    }

    /// World-space box `(min, max)` spanned by the occupied voxels, or `None` if none is.
    pub fn occupied_bounds(&self) -> Option<(Vec3, Vec3)> {
        let half = Vec3::splat(self.voxel_size() * 0.5);
        self.occupied
            .iter()
            .enumerate()
            .filter(|&(_, &o)| o)
            .map(|(linear, _)| self.voxel_center(self.voxel_index(linear)))
            .fold(None, |acc: Option<(Vec3, Vec3)>, c| {
                Some(acc.map_or((c, c), |(lo, hi)| (lo.min(c), hi.max(c))))
            })
            .map(|(lo, hi)| (lo - half, hi + half))
    }

    /// Occupancy of the plane perpendicular to `axis` at voxel layer `layer`.
    ///
    /// Pixel `(u, v)` maps to voxel `(layer, v, u)` for X, `(u, layer, v)` for Y and
    /// `(u, v, layer)` for Z. A layer outside the grid yields an empty mask.
    pub fn slice(&self, axis: Axis, layer: u32) -> Silhouette {
        let r = self.resolution;
        Silhouette::from_fn(r, r, |u, v| {
            let index = match axis {
                Axis::X => UVec3::new(layer, v, u),
                Axis::Y => UVec3::new(u, layer, v),
                Axis::Z => UVec3::new(u, v, layer),
            };
            self.is_occupied(index)
        })
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [bool] {
        &mut self.occupied
    }
}
