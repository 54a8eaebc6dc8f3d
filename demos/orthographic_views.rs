#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
//! Carves a grid view by view from orthographic front, side and top silhouettes and
//! prints a cross-section after each view.
//!
//! The front view sees a square, the side view a disc and the top view a diamond, so the
//! hull is the intersection of three extruded shapes.
//!
//! Usage: `cargo run --example orthographic_views [options.json]`

use hullcarve::{
    Axis, CameraRig, GridBounds, MarchingCubesMesher, ProjectionKind, ReconstructionOptions,
    Silhouette, SilhouetteExtractor, StandardView, VisualHullCarver, VoxelGrid, DEFAULT_ISOVALUE,
};
use image::{DynamicImage, Rgba, RgbaImage};

const FRAME: u32 = 64;
const RESOLUTION: u32 = 24;

fn render(inside: impl Fn(f32, f32) -> bool) -> DynamicImage {
    let c = (FRAME as f32 - 1.0) / 2.0;
    DynamicImage::ImageRgba8(RgbaImage::from_fn(FRAME, FRAME, |x, y| {
        let (u, v) = ((x as f32 - c) / c, (y as f32 - c) / c);
        if inside(u, v) {
            Rgba([0, 120, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

fn print_slice(slice: &Silhouette) {
    for y in 0..slice.height() {
        let row: String = (0..slice.width())
            .map(|x| if slice.contains(x, y) { '#' } else { '.' })
            .collect();
        println!("  {row}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => ReconstructionOptions::load(path)?,
        None => ReconstructionOptions::default(),
    };

    let views = [StandardView::Front, StandardView::Right, StandardView::Top];
    let rig = CameraRig::standard_views(
        &views,
        3.0,
        ProjectionKind::Orthographic { half_height: 1.0 },
        FRAME,
        FRAME,
    );
    let images = [
        render(|u, v| u.abs() < 0.7 && v.abs() < 0.7),
        render(|u, v| u * u + v * v < 0.6),
        render(|u, v| u.abs() + v.abs() < 0.9),
    ];

    let extractor = SilhouetteExtractor::new(options.silhouette.clone());
    let carver = VisualHullCarver::new(options.parallel);
    let mut grid = VoxelGrid::new_full(RESOLUTION, GridBounds::default())?;

    for ((view, camera), image) in views.iter().zip(rig.cameras()).zip(&images) {
        let silhouette = extractor.extract(image);
        let removed = carver.carve_view(&mut grid, &silhouette, &camera)?;
        println!(
            "{view:?}: removed {removed}, {} of {} voxels remain",
            grid.occupied_count(),
            grid.len()
        );
        print_slice(&grid.slice(Axis::Z, RESOLUTION / 2));
    }

    if grid.is_hollow() {
        return Err("every voxel was carved away".into());
    }

    let mesh = MarchingCubesMesher::new(DEFAULT_ISOVALUE)?.mesh(&grid);
    println!(
        "mesh: {} vertices, {} triangles, {} bytes of vertex data",
        mesh.num_vertices(),
        mesh.num_triangles(),
        mesh.vertex_bytes().len()
    );
    Ok(())
}
