//! Camera parameters (intrinsics and extrinsics) and the projection used for carving.
//!
//! Conventions: right-handed world, the camera looks along `look_dir`, image row 0 is at
//! the top. Continuous pixel coordinates place pixel centers on integers, so pixel `i`
//! covers `[i - 0.5, i + 0.5)` and the nearest pixel is `floor(u + 0.5)` (ties round up).

use glam::{Mat4, UVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{HullError, Result};

/// Projection model of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionKind {
    /// Pinhole camera with a vertical field of view in degrees.
    Perspective { fov_y_degrees: f32 },
    /// Parallel projection; `half_height` is half the visible height in world units.
    Orthographic { half_height: f32 },
}

impl Default for ProjectionKind {
    fn default() -> Self {
        Self::Perspective { fov_y_degrees: 45.0 }
    }
}

/// Camera intrinsics parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Projection model.
    pub projection: ProjectionKind,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Near clip distance along the look direction.
    pub near: f32,
    /// Far clip distance along the look direction.
    pub far: f32,
}

impl CameraIntrinsics {
    /// Creates perspective intrinsics.
    pub fn perspective(fov_y_degrees: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        Self {
            projection: ProjectionKind::Perspective { fov_y_degrees },
            width,
            height,
            near,
            far,
        }
    }

    /// Creates orthographic intrinsics.
    pub fn orthographic(half_height: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        Self {
            projection: ProjectionKind::Orthographic { half_height },
            width,
            height,
            near,
            far,
        }
    }

    /// Aspect ratio (width / height).
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Image resolution as `(width, height)`.
    pub fn resolution(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

/// Camera extrinsics parameters (position and orientation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraExtrinsics {
    /// Camera position in world space.
    pub position: Vec3,
    /// Look direction (normalized).
    pub look_dir: Vec3,
    /// Up direction (normalized).
    pub up_dir: Vec3,
}

impl CameraExtrinsics {
    /// Creates new camera extrinsics from position and directions.
    pub fn new(position: Vec3, look_dir: Vec3, up_dir: Vec3) -> Self {
        Self {
            position,
            look_dir: look_dir.normalize_or_zero(),
            up_dir: up_dir.normalize_or_zero(),
        }
    }

    /// Creates extrinsics for a camera looking at a target point.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self::new(position, target - position, up)
    }

    /// Gets the right direction (look cross up).
    pub fn right_dir(&self) -> Vec3 {
        self.look_dir.cross(self.up_dir).normalize_or_zero()
    }

    /// Gets the camera frame as (look, up, right).
    pub fn camera_frame(&self) -> (Vec3, Vec3, Vec3) {
        let right = self.right_dir();
        // Re-orthogonalize up
        let up = right.cross(self.look_dir).normalize_or_zero();
        (self.look_dir, up, right)
    }

    /// Returns the view matrix (world to camera space, camera looking down -Z).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.look_dir, self.up_dir)
    }
}

/// A world point mapped into an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Continuous pixel column (pixel centers on integers).
    pub x: f32,
    /// Continuous pixel row, growing downwards.
    pub y: f32,
    /// Nearest pixel, or `None` when the point is off-frame, behind the camera, or clipped.
    pub pixel: Option<UVec2>,
}

impl ProjectedPoint {
    /// Whether the point lands on a pixel of the image.
    pub fn in_frustum(&self) -> bool {
        self.pixel.is_some()
    }

    fn outside() -> Self {
        Self {
            x: f32::NAN,
            y: f32::NAN,
            pixel: None,
        }
    }
}

/// Combined camera parameters (intrinsics + extrinsics) for one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParameters {
    /// Intrinsic parameters (projection, resolution, clip planes).
    pub intrinsics: CameraIntrinsics,
    /// Extrinsic parameters (position, orientation).
    pub extrinsics: CameraExtrinsics,
}

impl CameraParameters {
    /// Creates new camera parameters.
    pub fn new(intrinsics: CameraIntrinsics, extrinsics: CameraExtrinsics) -> Self {
        Self {
            intrinsics,
            extrinsics,
        }
    }

    /// Creates a perspective camera looking at a target.
    pub fn look_at(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_degrees: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let distance = (target - position).length();
        Self {
            intrinsics: CameraIntrinsics::perspective(
                fov_y_degrees,
                width,
                height,
                distance * 0.01,
                distance * 4.0,
            ),
            extrinsics: CameraExtrinsics::look_at(position, target, up),
        }
    }

    /// Gets the camera position.
    pub fn position(&self) -> Vec3 {
        self.extrinsics.position
    }

    /// Gets the look direction.
    pub fn look_dir(&self) -> Vec3 {
        self.extrinsics.look_dir
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.intrinsics.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.intrinsics.height
    }

    /// Gets the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        self.extrinsics.view_matrix()
    }

    /// Gets the projection matrix (depth mapped to `[0, 1]`).
    pub fn projection_matrix(&self) -> Mat4 {
        let CameraIntrinsics { near, far, .. } = self.intrinsics;
        let aspect = self.intrinsics.aspect_ratio();
        match self.intrinsics.projection {
            ProjectionKind::Perspective { fov_y_degrees } => {
                Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far)
            }
            ProjectionKind::Orthographic { half_height } => {
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }

    /// Checks that the parameters describe a usable camera.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidCameraData`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let CameraIntrinsics {
            projection,
            width,
            height,
            near,
            far,
        } = self.intrinsics;
        let invalid = |msg: String| Err(HullError::InvalidCameraData(msg));

        if width == 0 || height == 0 {
            return invalid(format!("image resolution {width}x{height} has a zero dimension"));
        }
        if !(near.is_finite() && far.is_finite()) || near < 0.0 || far <= near {
            return invalid(format!("clip planes near={near} far={far} are not 0 <= near < far"));
        }
        match projection {
            ProjectionKind::Perspective { fov_y_degrees } => {
                if !(fov_y_degrees > 0.0 && fov_y_degrees < 180.0) {
                    return invalid(format!("field of view {fov_y_degrees} is outside (0, 180)"));
                }
                if near <= 0.0 {
                    return invalid("perspective near plane must be positive".into());
                }
            }
            ProjectionKind::Orthographic { half_height } => {
                if !(half_height.is_finite() && half_height > 0.0) {
                    return invalid(format!("orthographic half height {half_height} must be positive"));
                }
            }
        }
        if !self.extrinsics.position.is_finite() {
            return invalid("camera position is not finite".into());
        }
        let (look, up, _) = self.extrinsics.camera_frame();
        if look.length_squared() < 0.5 || up.length_squared() < 0.5 {
            return invalid("look and up directions are degenerate or parallel".into());
        }
        Ok(())
    }

    /// Projects a world point into the image.
    ///
    /// Points behind the camera, outside the clip range, or off-frame get `pixel: None`;
    /// this is never an error.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn project(&self, point: Vec3) -> ProjectedPoint {
        let (look, up, right) = self.extrinsics.camera_frame();
        let d = point - self.extrinsics.position;
        let depth = d.dot(look);
        let CameraIntrinsics {
            width,
            height,
            near,
            far,
            ..
        } = self.intrinsics;
        if depth < near || depth > far {
            return ProjectedPoint::outside();
        }

        let half_height = match self.intrinsics.projection {
            ProjectionKind::Perspective { fov_y_degrees } => {
                depth * (fov_y_degrees.to_radians() * 0.5).tan()
            }
            ProjectionKind::Orthographic { half_height } => half_height,
        };
        let half_width = half_height * self.intrinsics.aspect_ratio();
        let ndc_x = d.dot(right) / half_width;
        let ndc_y = d.dot(up) / half_height;

        let x = (ndc_x + 1.0) * 0.5 * width as f32 - 0.5;
        let y = (1.0 - ndc_y) * 0.5 * height as f32 - 0.5;
        let px = nearest_pixel(x);
        let py = nearest_pixel(y);
        let pixel = (px >= 0.0 && py >= 0.0 && px < width as f32 && py < height as f32)
            .then(|| UVec2::new(px as u32, py as u32));

        ProjectedPoint { x, y, pixel }
    }
}

/// Rounds a continuous pixel coordinate to the nearest pixel index, ties upward.
#[inline]
pub fn nearest_pixel(coord: f32) -> f32 {
    (coord + 0.5).floor()
}
