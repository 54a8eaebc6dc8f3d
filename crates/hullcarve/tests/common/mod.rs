//! Synthetic views shared by the integration tests.

#![allow(dead_code)]

use std::io::Cursor;

use hullcarve::*;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

pub const FOREGROUND: Rgb<u8> = Rgb([30, 60, 90]);
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Renders a `size` x `size` image whose foreground is given by `inside(x, y)`.
pub fn render(size: u32, inside: impl Fn(u32, u32) -> bool) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
        if inside(x, y) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    }))
}

/// A centered square covering the middle half of the frame in each direction.
pub fn centered_square(size: u32) -> DynamicImage {
    let lo = size / 4;
    let hi = size - size / 4;
    render(size, |x, y| (lo..hi).contains(&x) && (lo..hi).contains(&y))
}

/// A centered disc of `radius` pixels.
#[allow(clippy::cast_precision_loss)]
pub fn centered_disc(size: u32, radius: f32) -> DynamicImage {
    let c = (size as f32 - 1.0) / 2.0;
    render(size, |x, y| {
        let (dx, dy) = (x as f32 - c, y as f32 - c);
        dx * dx + dy * dy <= radius * radius
    })
}

/// PNG-encodes an image.
pub fn png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG encoding failed");
    bytes
}

/// A request pairing every camera of `rig` with the same encoded image.
pub fn uniform_request(rig: &CameraRig, image: &DynamicImage) -> ReconstructionRequest {
    let encoded = png(image);
    let images = (0..rig.len()).map(|_| ImageSource::Encoded(encoded.clone())).collect();
    ReconstructionRequest::from_rig(rig, images).expect("rig and images pair up")
}

/// Six perspective cameras around the origin at distance 4.
pub fn six_view_ring(size: u32) -> CameraRig {
    CameraRig::ring(6, 0.0, 4.0, ProjectionKind::Perspective { fov_y_degrees: 45.0 }, size, size)
}

/// Collects every event of a synchronous run.
pub fn run_collect(
    pipeline: &ReconstructionPipeline,
    request: &ReconstructionRequest,
) -> (PipelineState, Vec<PipelineEvent>) {
    let mut events = Vec::new();
    let state = pipeline.run(request, &CancellationToken::new(), |e| events.push(e));
    (state, events)
}

/// Progress stages in the order they were reported.
pub fn stages(events: &[PipelineEvent]) -> Vec<Stage> {
    events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::Progress(p) => Some(p.stage),
            _ => None,
        })
        .collect()
}
