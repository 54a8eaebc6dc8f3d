#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
//! Reconstructs a capsule from six synthetic views on a camera ring.
//!
//! Silhouettes are rendered by projecting dense samples of the shape through each
//! camera, encoded as PNG, and handed to a background worker. The resulting mesh is
//! written as a Wavefront OBJ file.
//!
//! Usage: `cargo run --example ring_reconstruction [output.obj] [resolution]`

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::time::Duration;

use hullcarve::{
    spawn_reconstruction, CameraParameters, CameraRig, ImageSource, Mesh, PipelineEvent,
    ProjectionKind, ReconstructionOptions, ReconstructionRequest, Vec3,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

const FRAME: u32 = 160;

/// A capsule along Y: radius 0.35, segment from y = -0.4 to y = 0.4.
fn inside_capsule(p: Vec3) -> bool {
    let y = p.y.clamp(-0.4, 0.4);
    p.distance(Vec3::new(0.0, y, 0.0)) <= 0.35
}

fn render_view(camera: &CameraParameters) -> DynamicImage {
    let mut image = RgbImage::from_pixel(FRAME, FRAME, Rgb([255, 255, 255]));
    let samples = 140;
    let step = 2.0 / samples as f32;
    for i in 0..samples {
        for j in 0..samples {
            for k in 0..samples {
                let p = Vec3::new(i as f32, j as f32, k as f32) * step - Vec3::ONE;
                if !inside_capsule(p) {
                    continue;
                }
                if let Some(pixel) = camera.project(p).pixel {
                    image.put_pixel(pixel.x, pixel.y, Rgb([90, 40, 20]));
                }
            }
        }
    }
    DynamicImage::ImageRgb8(image)
}

fn write_obj(mesh: &Mesh, path: &str) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# hullcarve visual hull")?;
    for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    for [a, b, c] in mesh.triangles() {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    out.flush()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "hull.obj".to_string());
    let resolution: u32 = match args.next() {
        Some(r) => r.parse()?,
        None => 64,
    };

    let rig = CameraRig::ring(
        6,
        15.0,
        3.5,
        ProjectionKind::Perspective { fov_y_degrees: 40.0 },
        FRAME,
        FRAME,
    );

    let mut images = Vec::with_capacity(rig.len());
    for camera in rig.cameras() {
        let mut bytes = Vec::new();
        render_view(&camera).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        images.push(ImageSource::Encoded(bytes));
    }

    let request = ReconstructionRequest::from_rig(&rig, images)?.with_resolution(resolution);
    let worker = spawn_reconstruction(ReconstructionOptions::default(), request)?;

    while let Some(event) = worker.next_event(Duration::from_secs(300)) {
        match event {
            PipelineEvent::Progress(progress) => {
                println!(
                    "[{:>5.1}%] {} done",
                    progress.percent.unwrap_or(0.0),
                    progress.stage
                );
            }
            PipelineEvent::Completed(mesh) => {
                if let Some((lo, hi)) = mesh.bounding_box() {
                    println!("bounds: {lo} .. {hi}");
                }
                println!(
                    "{} vertices, {} triangles, volume {:.4}",
                    mesh.num_vertices(),
                    mesh.num_triangles(),
                    mesh.signed_volume()
                );
                write_obj(&mesh, &output)?;
                println!("wrote {output}");
                return Ok(());
            }
            PipelineEvent::Failed(failure) => {
                return Err(format!("{:?}: {}", failure.kind, failure.detail).into());
            }
        }
    }
    Err("worker stopped without a result".into())
}
