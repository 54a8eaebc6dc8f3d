//! Background adapter around [`ReconstructionPipeline`].
//!
//! A [`ReconstructionWorker`] owns one request, runs it on a dedicated thread and
//! forwards every [`PipelineEvent`] over a channel, so the caller's thread never blocks
//! on carving or meshing.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, TryRecvError};
use hullcarve_core::{Failure, HullError, Mesh};

use crate::events::PipelineEvent;
use crate::pipeline::{CancellationToken, ReconstructionPipeline};
use crate::request::ReconstructionRequest;

/// Handle to a reconstruction running on its own thread.
///
/// Each worker observes a private child of the caller's token, so cancelling or
/// dropping one worker never cancels another run. Dropping the handle cancels this run
/// and joins the thread.
pub struct ReconstructionWorker {
    cancel: CancellationToken,
    event_rx: Receiver<PipelineEvent>,
    handle: Option<JoinHandle<()>>,
}

impl ReconstructionWorker {
    /// Starts `request` on a new thread.
    ///
    /// # Errors
    /// Returns [`HullError::Io`] if the thread cannot be spawned.
    pub fn spawn(pipeline: ReconstructionPipeline, request: ReconstructionRequest) -> Result<Self, HullError> {
        Self::spawn_with_token(pipeline, request, &CancellationToken::new())
    }

    /// Starts `request` on a new thread that also stops when `parent` is cancelled.
    ///
    /// `parent` may be shared by several workers; no worker ever cancels it.
    ///
    /// # Errors
    /// Returns [`HullError::Io`] if the thread cannot be spawned.
    pub fn spawn_with_token(
        pipeline: ReconstructionPipeline,
        request: ReconstructionRequest,
        parent: &CancellationToken,
    ) -> Result<Self, HullError> {
        let cancel = parent.child();
        let (event_tx, event_rx) = unbounded::<PipelineEvent>();
        let worker_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("hullcarve-reconstruction".into())
            .spawn(move || {
                let state = pipeline.run(&request, &worker_cancel, |event| {
                    // A dropped receiver only means nobody is listening any more
                    let _ = event_tx.send(event);
                });
                log::debug!("reconstruction worker finished in state {state:?}");
            })?;

        Ok(Self {
            cancel,
            event_rx,
            handle: Some(handle),
        })
    }

    /// Asks the run to stop at the next stage boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run only; can be handed to other threads.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The event stream. It disconnects once the worker thread exits.
    pub fn events(&self) -> &Receiver<PipelineEvent> {
        &self.event_rx
    }

    /// Returns the next pending event without blocking.
    pub fn try_next(&self) -> Option<PipelineEvent> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the next event.
    pub fn next_event(&self, timeout: Duration) -> Option<PipelineEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Blocks until the run ends, discarding progress events.
    ///
    /// Returns `None` if the run was cancelled before producing a terminal message.
    pub fn wait(self) -> Option<Result<Mesh, Failure>> {
        for event in self.event_rx.iter() {
            match event {
                PipelineEvent::Progress(_) => {}
                PipelineEvent::Completed(mesh) => return Some(Ok(mesh)),
                PipelineEvent::Failed(failure) => return Some(Err(failure)),
            }
        }
        None
    }
}

impl Drop for ReconstructionWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("reconstruction worker thread panicked");
            }
        }
    }
}
