//! The synchronous reconstruction pipeline.
//!
//! [`ReconstructionPipeline::run`] drives one request through the stages
//! `ExtractingSilhouettes -> Carving -> Meshing` on the calling thread and reports each
//! completed stage through a callback. [`crate::ReconstructionWorker`] wraps the same
//! call on a background thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hullcarve_core::{
    Failure, HullError, MarchingCubesMesher, Mesh, Silhouette, SilhouetteExtractor,
    VisualHullCarver, VoxelGrid,
};
use thiserror::Error;

use crate::events::{PipelineEvent, PipelineState, Progress, Stage};
use crate::options::ReconstructionOptions;
use crate::request::ReconstructionRequest;

/// Shared flag asking a run to stop at the next stage boundary.
///
/// Clones share one flag. A [`child`](Self::child) token has its own flag and also
/// reports cancellation once its parent is cancelled, never the other way round.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    parent: Option<Arc<CancellationToken>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled by itself or by `self`; cancelling it leaves `self` untouched.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancelled: Arc::default(),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|parent| parent.is_cancelled())
    }
}

/// Why a run produced no mesh.
#[derive(Error, Debug)]
pub enum ReconstructionError {
    /// A stage failed; the run ended with a failure message.
    #[error(transparent)]
    Failed(#[from] HullError),

    /// The caller cancelled the run; nothing further was emitted.
    #[error("reconstruction was cancelled")]
    Cancelled,
}

impl ReconstructionError {
    /// The failure payload, or `None` for a cancelled run.
    pub fn failure(&self) -> Option<Failure> {
        match self {
            Self::Failed(err) => Some(err.to_failure()),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Runs reconstruction requests with a fixed set of options.
///
/// The pipeline holds no per-run state; every voxel grid and mesh belongs to the run
/// that created it.
#[derive(Debug, Clone, Default)]
pub struct ReconstructionPipeline {
    options: ReconstructionOptions,
}

impl ReconstructionPipeline {
    pub fn new(options: ReconstructionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconstructionOptions {
        &self.options
    }

    /// Reconstructs a mesh, reporting each completed stage to `on_progress`.
    ///
    /// Progress is reported at most once per stage, in stage order, and only after the
    /// stage's output is complete. Cancellation is observed at stage boundaries; once it
    /// is seen no further progress is reported.
    ///
    /// # Errors
    /// Returns [`ReconstructionError::Failed`] with the classified cause, or
    /// [`ReconstructionError::Cancelled`].
    pub fn reconstruct(
        &self,
        request: &ReconstructionRequest,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<Mesh, ReconstructionError> {
        let mut state = PipelineState::Idle;
        self.execute(request, cancel, &mut state, &mut on_progress)
    }

    /// Runs a request and emits every message of the run to `sink`.
    ///
    /// A finished run ends with [`PipelineEvent::Completed`] or [`PipelineEvent::Failed`];
    /// a cancelled run ends without a terminal message. Returns the state the run stopped
    /// in, which is only non-terminal for a cancelled run.
    pub fn run(
        &self,
        request: &ReconstructionRequest,
        cancel: &CancellationToken,
        mut sink: impl FnMut(PipelineEvent),
    ) -> PipelineState {
        let mut state = PipelineState::Idle;
        let result = self.execute(request, cancel, &mut state, &mut |progress| {
            sink(PipelineEvent::Progress(progress));
        });
        match result {
            Ok(mesh) => sink(PipelineEvent::Completed(mesh)),
            Err(ReconstructionError::Failed(err)) => sink(PipelineEvent::Failed(err.to_failure())),
            Err(ReconstructionError::Cancelled) => {}
        }
        state
    }

    fn execute(
        &self,
        request: &ReconstructionRequest,
        cancel: &CancellationToken,
        state: &mut PipelineState,
        on_progress: &mut dyn FnMut(Progress),
    ) -> Result<Mesh, ReconstructionError> {
        checkpoint(cancel)?;
        *state = state.next();
        log::info!(
            "reconstructing from {} views at {}^3 voxels, isovalue {}",
            request.views.len(),
            request.resolution,
            request.isovalue
        );

        let outcome = self.run_stages(request, cancel, state, on_progress);
        match &outcome {
            Ok(mesh) => {
                *state = PipelineState::Done;
                log::info!(
                    "reconstruction done: {} vertices, {} triangles",
                    mesh.num_vertices(),
                    mesh.num_triangles()
                );
            }
            Err(ReconstructionError::Failed(err)) => {
                *state = state.fail(err.kind());
                log::error!("reconstruction failed: {err}");
            }
            Err(ReconstructionError::Cancelled) => {
                log::info!("reconstruction cancelled in state {state:?}");
            }
        }
        outcome
    }

    fn run_stages(
        &self,
        request: &ReconstructionRequest,
        cancel: &CancellationToken,
        state: &mut PipelineState,
        on_progress: &mut dyn FnMut(Progress),
    ) -> Result<Mesh, ReconstructionError> {
        request.validate(self.options.max_resolution)?;
        let silhouettes = self.extract_silhouettes(request)?;
        complete_stage(Stage::ExtractingSilhouettes, cancel, state, on_progress)?;

        let grid = self.carve(request, &silhouettes)?;
        drop(silhouettes);
        complete_stage(Stage::Carving, cancel, state, on_progress)?;

        let mesher = MarchingCubesMesher::new(request.isovalue)?;
        let mesh = mesher.mesh(&grid);
        complete_stage(Stage::Meshing, cancel, state, on_progress)?;

        // Last chance to honor a cancel before ownership moves to the caller
        checkpoint(cancel)?;
        Ok(mesh)
    }

    fn extract_silhouettes(&self, request: &ReconstructionRequest) -> Result<Vec<Silhouette>, HullError> {
        let extractor = SilhouetteExtractor::new(self.options.silhouette.clone());
        let silhouettes = request
            .views
            .iter()
            .enumerate()
            .map(|(view, input)| {
                let image = input.image.decode(view)?;
                let silhouette = extractor.extract(&image);
                if silhouette.is_empty() {
                    log::warn!("view {view}: silhouette has no foreground pixels");
                } else {
                    log::debug!(
                        "view {view}: {} foreground pixels of {}",
                        silhouette.foreground_count(),
                        silhouette.width() as usize * silhouette.height() as usize
                    );
                }
                Ok(silhouette)
            })
            .collect::<Result<Vec<_>, HullError>>()?;

        VisualHullCarver::validate_views(&silhouettes, &request.cameras())?;
        Ok(silhouettes)
    }

    fn carve(
        &self,
        request: &ReconstructionRequest,
        silhouettes: &[Silhouette],
    ) -> Result<VoxelGrid, HullError> {
        let mut grid = VoxelGrid::new_full(request.resolution, request.bounds)?;
        let carver = VisualHullCarver::new(self.options.parallel);
        let report = carver.carve(&mut grid, silhouettes, &request.cameras())?;
        log::debug!("{} of {} voxels survive", report.remaining, report.initial);
        Ok(grid)
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), ReconstructionError> {
    if cancel.is_cancelled() {
        Err(ReconstructionError::Cancelled)
    } else {
        Ok(())
    }
}

fn complete_stage(
    stage: Stage,
    cancel: &CancellationToken,
    state: &mut PipelineState,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<(), ReconstructionError> {
    checkpoint(cancel)?;
    log::info!("stage complete: {stage}");
    on_progress(Progress::completed(stage));
    // `Done` is only entered once the mesh is handed over
    if stage != Stage::Meshing {
        *state = state.next();
    }
    Ok(())
}
