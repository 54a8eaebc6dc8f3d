//! Camera rigs: sets of views arranged around a target.
//!
//! Yaw rotates about +Y with yaw 0 on the +Z axis ("front"), yaw 90 on +X ("right").
//! Elevation tilts the camera towards +Y; ±90 gives the top and bottom views.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraExtrinsics, CameraIntrinsics, CameraParameters, ProjectionKind};

/// The six named reference views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardView {
    Front,
    Right,
    Back,
    Left,
    Top,
    Bottom,
}

impl StandardView {
    /// All six views in ring order followed by top and bottom.
    pub const ALL: [StandardView; 6] = [
        Self::Front,
        Self::Right,
        Self::Back,
        Self::Left,
        Self::Top,
        Self::Bottom,
    ];

    /// Angular pose of this view.
    pub fn pose(self) -> ViewPose {
        match self {
            Self::Front => ViewPose::new(0.0, 0.0),
            Self::Right => ViewPose::new(90.0, 0.0),
            Self::Back => ViewPose::new(180.0, 0.0),
            Self::Left => ViewPose::new(270.0, 0.0),
            Self::Top => ViewPose::new(0.0, 90.0),
            Self::Bottom => ViewPose::new(0.0, -90.0),
        }
    }
}

/// Direction from the target to a camera, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPose {
    pub yaw_degrees: f32,
    pub elevation_degrees: f32,
}

impl ViewPose {
    pub fn new(yaw_degrees: f32, elevation_degrees: f32) -> Self {
        Self {
            yaw_degrees,
            elevation_degrees,
        }
    }

    /// Unit vector from the target towards the camera.
    pub fn direction(&self) -> Vec3 {
        let (sy, cy) = self.yaw_degrees.to_radians().sin_cos();
        let (se, ce) = self.elevation_degrees.to_radians().sin_cos();
        Vec3::new(sy * ce, se, cy * ce)
    }

    /// Image-up direction: the tangent of increasing elevation.
    ///
    /// Stays well defined at ±90° elevation, where world +Y is parallel to the view axis.
    pub fn up(&self) -> Vec3 {
        let (sy, cy) = self.yaw_degrees.to_radians().sin_cos();
        let (se, ce) = self.elevation_degrees.to_radians().sin_cos();
        Vec3::new(-se * sy, ce, -se * cy)
    }
}

/// A set of cameras sharing intrinsics, all looking at one target from a fixed distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    /// Point every camera looks at.
    pub target: Vec3,
    /// Distance from target to each camera.
    pub radius: f32,
    /// Projection shared by every view.
    pub projection: ProjectionKind,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Per-view poses, in output order.
    pub poses: Vec<ViewPose>,
}

impl CameraRig {
    /// A ring of `count` cameras at a fixed elevation, evenly spaced in yaw starting at 0.
    #[allow(clippy::cast_precision_loss)]
    pub fn ring(
        count: usize,
        elevation_degrees: f32,
        radius: f32,
        projection: ProjectionKind,
        width: u32,
        height: u32,
    ) -> Self {
        let step = if count == 0 { 0.0 } else { 360.0 / count as f32 };
        let poses = (0..count)
            .map(|i| ViewPose::new(step * i as f32, elevation_degrees))
            .collect();
        Self {
            target: Vec3::ZERO,
            radius,
            projection,
            width,
            height,
            poses,
        }
    }

    /// Cameras at the named standard views.
    pub fn standard_views(
        views: &[StandardView],
        radius: f32,
        projection: ProjectionKind,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            target: Vec3::ZERO,
            radius,
            projection,
            width,
            height,
            poses: views.iter().map(|v| v.pose()).collect(),
        }
    }

    /// Sets the target point.
    #[must_use]
    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Number of views in the rig.
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Returns true if the rig has no views.
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Camera parameters for the view at `pose`.
    pub fn camera(&self, pose: ViewPose) -> CameraParameters {
        let position = self.target + pose.direction() * self.radius;
        let intrinsics = CameraIntrinsics {
            projection: self.projection,
            width: self.width,
            height: self.height,
            near: self.radius * 0.01,
            far: self.radius * 4.0,
        };
        let extrinsics = CameraExtrinsics::new(position, -pose.direction(), pose.up());
        CameraParameters::new(intrinsics, extrinsics)
    }

    /// Camera parameters for every view, in pose order.
    pub fn cameras(&self) -> Vec<CameraParameters> {
        self.poses.iter().map(|&pose| self.camera(pose)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_ring_spacing() {
        let rig = CameraRig::ring(6, 0.0, 4.0, ProjectionKind::default(), 64, 64);
        let yaws: Vec<f32> = rig.poses.iter().map(|p| p.yaw_degrees).collect();
        assert_eq!(yaws, vec![0.0, 60.0, 120.0, 180.0, 240.0, 300.0]);
    }

    #[test]
    fn test_standard_view_positions() {
        let rig = CameraRig::standard_views(
            &StandardView::ALL,
            2.0,
            ProjectionKind::default(),
            32,
            32,
        );
        let cams = rig.cameras();
        assert!(approx(cams[0].position(), Vec3::new(0.0, 0.0, 2.0)));
        assert!(approx(cams[1].position(), Vec3::new(2.0, 0.0, 0.0)));
        assert!(approx(cams[2].position(), Vec3::new(0.0, 0.0, -2.0)));
        assert!(approx(cams[3].position(), Vec3::new(-2.0, 0.0, 0.0)));
        assert!(approx(cams[4].position(), Vec3::new(0.0, 2.0, 0.0)));
        assert!(approx(cams[5].position(), Vec3::new(0.0, -2.0, 0.0)));
        for cam in &cams {
            assert!(cam.validate().is_ok());
            assert!(approx(cam.look_dir(), -cam.position().normalize()));
        }
    }

    #[test]
    fn test_top_view_up_points_back() {
        let pose = StandardView::Top.pose();
        assert!(approx(pose.up(), Vec3::new(0.0, 0.0, -1.0)));
        assert!(pose.up().dot(pose.direction()).abs() < 1e-6);
    }

    #[test]
    fn test_target_offset() {
        let target = Vec3::new(1.0, 2.0, 3.0);
        let rig = CameraRig::ring(4, 30.0, 5.0, ProjectionKind::default(), 16, 16).with_target(target);
        for cam in rig.cameras() {
            assert!(((cam.position() - target).length() - 5.0).abs() < 1e-4);
            let p = cam.project(target);
            assert!(p.in_frustum());
        }
    }
}
