//! Reconstruction requests: the images, cameras and grid settings for one run.

use hullcarve_core::{
    decode_image, CameraParameters, CameraRig, GridBounds, HullError, Result, DEFAULT_ISOVALUE,
};
use image::DynamicImage;

/// Fewest views that can constrain a hull.
pub const MIN_VIEWS: usize = 2;

/// Default voxels per grid axis.
pub const DEFAULT_RESOLUTION: u32 = 64;

/// Pixels for one view, already fetched by the caller.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Encoded bytes (PNG, JPEG, ...), decoded during silhouette extraction.
    Encoded(Vec<u8>),
    /// A decoded pixel buffer.
    Decoded(DynamicImage),
}

impl ImageSource {
    /// Returns the decoded image, decoding if necessary.
    ///
    /// # Errors
    /// Returns [`HullError::ImageDecode`] naming `view` if decoding fails.
    pub fn decode(&self, view: usize) -> Result<std::borrow::Cow<'_, DynamicImage>> {
        match self {
            Self::Encoded(bytes) => decode_image(view, bytes).map(std::borrow::Cow::Owned),
            Self::Decoded(image) => Ok(std::borrow::Cow::Borrowed(image)),
        }
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        Self::Decoded(image)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Encoded(bytes)
    }
}

/// One image paired with the camera that captured it.
#[derive(Debug, Clone)]
pub struct ViewInput {
    pub image: ImageSource,
    pub camera: CameraParameters,
}

impl ViewInput {
    pub fn new(image: impl Into<ImageSource>, camera: CameraParameters) -> Self {
        Self {
            image: image.into(),
            camera,
        }
    }
}

/// Everything one reconstruction run consumes.
#[derive(Debug, Clone)]
pub struct ReconstructionRequest {
    /// Image/camera pairs.
    pub views: Vec<ViewInput>,
    /// Voxels per grid axis.
    pub resolution: u32,
    /// Marching cubes threshold in `[0, 1]`.
    pub isovalue: f32,
    /// World-space cube that is carved.
    pub bounds: GridBounds,
}

impl ReconstructionRequest {
    /// Creates a request with default resolution, isovalue and bounds.
    pub fn new(views: Vec<ViewInput>) -> Self {
        Self {
            views,
            resolution: DEFAULT_RESOLUTION,
            isovalue: DEFAULT_ISOVALUE,
            bounds: GridBounds::default(),
        }
    }

    /// Pairs images with the cameras of `rig`, in order.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidCameraData`] if the counts differ.
    pub fn from_rig(rig: &CameraRig, images: Vec<ImageSource>) -> Result<Self> {
        if images.len() != rig.len() {
            return Err(HullError::InvalidCameraData(format!(
                "{} images for a rig of {} cameras",
                images.len(),
                rig.len()
            )));
        }
        let views = images
            .into_iter()
            .zip(rig.cameras())
            .map(|(image, camera)| ViewInput { image, camera })
            .collect();
        Ok(Self::new(views))
    }

    /// Sets the grid resolution.
    #[must_use]
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the isovalue.
    #[must_use]
    pub fn with_isovalue(mut self, isovalue: f32) -> Self {
        self.isovalue = isovalue;
        self
    }

    /// Sets the carved volume.
    #[must_use]
    pub fn with_bounds(mut self, bounds: GridBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Cameras of every view, in order.
    pub fn cameras(&self) -> Vec<CameraParameters> {
        self.views.iter().map(|v| v.camera).collect()
    }

    /// Checks the cheap invariants before any image is touched.
    ///
    /// Camera problems are reported first, then grid parameters.
    ///
    /// # Errors
    /// Returns [`HullError::InvalidCameraData`] or [`HullError::InvalidParameters`].
    pub fn validate(&self, max_resolution: u32) -> Result<()> {
        if self.views.len() < MIN_VIEWS {
            return Err(HullError::InvalidCameraData(format!(
                "{} view(s) given, at least {MIN_VIEWS} are required",
                self.views.len()
            )));
        }
        for (view, input) in self.views.iter().enumerate() {
            input
                .camera
                .validate()
                .map_err(|e| HullError::InvalidCameraData(format!("view {view}: {e}")))?;
        }
        if self.resolution == 0 || self.resolution > max_resolution {
            return Err(HullError::InvalidParameters(format!(
                "grid resolution {} is outside 1..={max_resolution}",
                self.resolution
            )));
        }
        if !(0.0..=1.0).contains(&self.isovalue) {
            return Err(HullError::InvalidParameters(format!(
                "isovalue {} is outside [0, 1]",
                self.isovalue
            )));
        }
        self.bounds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hullcarve_core::{FailureKind, ProjectionKind, Vec3};

    fn rig(count: usize) -> CameraRig {
        CameraRig::ring(count, 0.0, 4.0, ProjectionKind::default(), 8, 8)
    }

    fn blank() -> ImageSource {
        DynamicImage::new_rgb8(8, 8).into()
    }

    #[test]
    fn test_single_view_is_invalid_camera_data() {
        let request = ReconstructionRequest::from_rig(&rig(1), vec![blank()]).unwrap();
        let err = request.validate(512).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidCameraData);
    }

    #[test]
    fn test_rig_count_mismatch() {
        let err = ReconstructionRequest::from_rig(&rig(3), vec![blank(), blank()]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidCameraData);
    }

    #[test]
    fn test_parameter_checks() {
        let base = ReconstructionRequest::from_rig(&rig(4), (0..4).map(|_| blank()).collect()).unwrap();
        assert!(base.validate(512).is_ok());

        let kind = |r: ReconstructionRequest| r.validate(128).unwrap_err().kind();
        assert_eq!(kind(base.clone().with_resolution(0)), FailureKind::InvalidParameters);
        assert_eq!(kind(base.clone().with_resolution(129)), FailureKind::InvalidParameters);
        assert_eq!(kind(base.clone().with_isovalue(1.01)), FailureKind::InvalidParameters);
        assert_eq!(kind(base.clone().with_isovalue(f32::NAN)), FailureKind::InvalidParameters);
        assert_eq!(
            kind(base.clone().with_bounds(GridBounds::new(Vec3::ZERO, -1.0))),
            FailureKind::InvalidParameters
        );
        assert!(base.clone().with_isovalue(0.0).validate(512).is_ok());
        assert!(base.with_isovalue(1.0).validate(512).is_ok());
    }

    #[test]
    fn test_camera_errors_come_first() {
        let mut request =
            ReconstructionRequest::from_rig(&rig(2), vec![blank(), blank()]).unwrap().with_resolution(0);
        request.views[1].camera.intrinsics.height = 0;
        let err = request.validate(512).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidCameraData);
        assert!(err.to_string().contains("view 1"));
    }

    #[test]
    fn test_decode_borrows_decoded_images() {
        let source = blank();
        assert!(matches!(source.decode(0).unwrap(), std::borrow::Cow::Borrowed(_)));
        let bad = ImageSource::Encoded(vec![1, 2, 3]);
        assert_eq!(bad.decode(2).unwrap_err().kind(), FailureKind::ImageDecodeError);
    }
}
