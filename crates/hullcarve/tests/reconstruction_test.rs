//! End-to-end reconstruction scenarios over synthetic silhouettes.

mod common;

use common::*;
use hullcarve::*;

const FRAME: u32 = 100;

fn completed_mesh(events: &[PipelineEvent]) -> &Mesh {
    match events.last() {
        Some(PipelineEvent::Completed(mesh)) => mesh,
        other => panic!("expected a mesh as the last event, got {other:?}"),
    }
}

fn failure(events: &[PipelineEvent]) -> &Failure {
    match events.last() {
        Some(PipelineEvent::Failed(failure)) => failure,
        other => panic!("expected a failure as the last event, got {other:?}"),
    }
}

#[test]
fn test_six_view_square_hull_projects_inside_square() {
    let rig = six_view_ring(FRAME);
    let request = uniform_request(&rig, &centered_square(FRAME)).with_resolution(32);
    let (state, events) = run_collect(&ReconstructionPipeline::default(), &request);

    assert_eq!(state, PipelineState::Done);
    assert_eq!(stages(&events), Stage::ALL);
    let mesh = completed_mesh(&events);
    assert!(!mesh.is_empty());
    assert_eq!(mesh.vertex_buffer().len(), mesh.num_vertices() * Mesh::VERTEX_STRIDE);
    assert_eq!(mesh.indices.len() % 3, 0);
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.num_vertices()));
    assert!(mesh.signed_volume() > 0.0, "triangles must wind outward");

    // Foreground pixels 25..75 cover continuous coordinates [24.5, 74.5); vertices sit
    // half a voxel outside the surviving voxel centers at most.
    let tolerance = 2.5;
    for camera in rig.cameras() {
        for &p in &mesh.positions {
            let projected = camera.project(p);
            assert!(projected.in_frustum());
            assert!(
                projected.x > 24.5 - tolerance && projected.x < 74.5 + tolerance,
                "x {} out of square",
                projected.x
            );
            assert!(
                projected.y > 24.5 - tolerance && projected.y < 74.5 + tolerance,
                "y {} out of square",
                projected.y
            );
        }
    }
}

#[test]
fn test_single_camera_is_rejected_before_carving() {
    let rig = CameraRig::ring(1, 0.0, 4.0, ProjectionKind::default(), FRAME, FRAME);
    let request = uniform_request(&rig, &centered_square(FRAME));
    let (state, events) = run_collect(&ReconstructionPipeline::default(), &request);

    assert_eq!(events.len(), 1, "no progress may precede the failure");
    assert_eq!(failure(&events).kind, FailureKind::InvalidCameraData);
    assert_eq!(state, PipelineState::Failed(FailureKind::InvalidCameraData));
}

#[test]
fn test_empty_silhouette_empties_the_hull() {
    let rig = six_view_ring(FRAME);
    let mut request = uniform_request(&rig, &centered_square(FRAME));
    request.views[3].image = ImageSource::Decoded(render(FRAME, |_, _| false));
    let (state, events) = run_collect(&ReconstructionPipeline::default(), &request.with_resolution(16));

    assert_eq!(stages(&events), vec![Stage::ExtractingSilhouettes]);
    assert_eq!(failure(&events).kind, FailureKind::HullEmpty);
    assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Completed(_))));
    assert_eq!(state, PipelineState::Failed(FailureKind::HullEmpty));
}

#[test]
fn test_output_is_deterministic() {
    let rig = six_view_ring(FRAME);
    let request = uniform_request(&rig, &centered_disc(FRAME, 22.0)).with_resolution(24);

    let first = reconstruct(&request).unwrap();
    let second = reconstruct(&request).unwrap();
    assert_eq!(first.vertex_bytes(), second.vertex_bytes());
    assert_eq!(first.indices, second.indices);

    let sequential = ReconstructionPipeline::new(ReconstructionOptions {
        parallel: false,
        ..ReconstructionOptions::default()
    })
    .reconstruct(&request, &CancellationToken::new(), |_| {})
    .unwrap();
    assert_eq!(first, sequential);
}

#[test]
fn test_isovalue_one_yields_empty_successful_mesh() {
    let rig = six_view_ring(FRAME);
    let request = uniform_request(&rig, &centered_square(FRAME))
        .with_resolution(16)
        .with_isovalue(1.0);
    let (state, events) = run_collect(&ReconstructionPipeline::default(), &request);

    assert_eq!(state, PipelineState::Done);
    assert_eq!(stages(&events), Stage::ALL);
    assert!(completed_mesh(&events).is_empty());
}

#[test]
fn test_isovalue_zero_pushes_vertices_to_empty_voxels() {
    let rig = six_view_ring(FRAME);
    let request = uniform_request(&rig, &centered_square(FRAME)).with_resolution(16);

    let mid = reconstruct(&request).unwrap();
    let outer = reconstruct(&request.clone().with_isovalue(0.0)).unwrap();
    assert_eq!(mid.num_triangles(), outer.num_triangles());

    let (mid_lo, mid_hi) = mid.bounding_box().unwrap();
    let (outer_lo, outer_hi) = outer.bounding_box().unwrap();
    assert!(outer_lo.cmplt(mid_lo).all());
    assert!(outer_hi.cmpgt(mid_hi).all());
}

#[test]
fn test_undecodable_image_names_the_view() {
    let rig = six_view_ring(FRAME);
    let mut request = uniform_request(&rig, &centered_square(FRAME));
    request.views[4].image = ImageSource::Encoded(b"not an image".to_vec());
    let (_, events) = run_collect(&ReconstructionPipeline::default(), &request);

    assert_eq!(events.len(), 1);
    let failure = failure(&events);
    assert_eq!(failure.kind, FailureKind::ImageDecodeError);
    assert!(failure.detail.contains("view 4"), "{}", failure.detail);
}

#[test]
fn test_resolution_mismatch_is_invalid_camera_data() {
    let rig = six_view_ring(FRAME);
    let mut request = uniform_request(&rig, &centered_square(FRAME));
    request.views[2].image = ImageSource::Decoded(centered_square(FRAME - 10));
    let err = reconstruct(&request).unwrap_err();

    let failure = err.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::InvalidCameraData);
    assert!(failure.detail.contains("view 2"));
}

#[test]
fn test_orthographic_standard_views_bound_the_disc() {
    let rig = CameraRig::standard_views(
        &StandardView::ALL,
        3.0,
        ProjectionKind::Orthographic { half_height: 1.0 },
        64,
        64,
    );
    let request = uniform_request(&rig, &centered_disc(64, 16.0)).with_resolution(32);
    let mesh = reconstruct(&request).unwrap();

    let (lo, hi) = mesh.bounding_box().unwrap();
    for axis in 0..3 {
        assert!(hi[axis] < 0.6 && hi[axis] > 0.4, "max {axis}: {}", hi[axis]);
        assert!(lo[axis] > -0.6 && lo[axis] < -0.4, "min {axis}: {}", lo[axis]);
    }
    assert!(mesh.signed_volume() > 0.0);
}

#[test]
fn test_options_loaded_from_json_file() {
    let path = std::env::temp_dir().join(format!("hullcarve-options-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "max_resolution": 16, "parallel": false }"#).unwrap();
    let options = ReconstructionOptions::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(options.max_resolution, 16);
    assert_eq!(options.silhouette, SilhouetteConfig::default());

    let rig = six_view_ring(FRAME);
    let request = uniform_request(&rig, &centered_square(FRAME)).with_resolution(32);
    let err = ReconstructionPipeline::new(options)
        .reconstruct(&request, &CancellationToken::new(), |_| {})
        .unwrap_err();
    assert_eq!(err.failure().unwrap().kind, FailureKind::InvalidParameters);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn disc_hull_stays_within_its_radius(radius_px in 10.0_f32..28.0, resolution in 8_u32..20) {
            let rig = CameraRig::standard_views(
                &StandardView::ALL,
                3.0,
                ProjectionKind::Orthographic { half_height: 1.0 },
                64,
                64,
            );
            let request = uniform_request(&rig, &centered_disc(64, radius_px)).with_resolution(resolution);
            let mesh = reconstruct(&request).unwrap();

            // One pixel of rounding plus a full voxel of surface offset
            let limit = (radius_px + 1.0) / 32.0 + 2.0 / resolution as f32;
            let (lo, hi) = mesh.bounding_box().unwrap();
            prop_assert!(hi.max_element() <= limit, "{} > {}", hi.max_element(), limit);
            prop_assert!(-lo.min_element() <= limit, "{} > {}", -lo.min_element(), limit);
        }
    }
}
