use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::OcrdeskError;

use super::engine::OcrEngine;
use super::results::Block;

/// One region recognition job.
///
/// Carries its own crop of the page image so the worker never touches
/// shared page state.
pub struct RecognitionRequest {
    pub region_id: Uuid,
    pub image: DynamicImage,
    pub dpi: f32,
    pub language: String,
    /// Request character-exact output without post-processing.
    pub raw: bool,
}

/// Completed recognition, delivered back to the control thread.
///
/// The region named by `region_id` may have been deleted while the job
/// ran; the reconciler checks and drops stale messages.
pub struct RecognitionMessage {
    pub region_id: Uuid,
    pub raw: bool,
    pub result: Result<Vec<Block>, OcrdeskError>,
}

/// Dispatches recognition jobs onto the blocking pool and funnels their
/// results into a single channel.
///
/// Page mutation stays on the control thread: workers only compute and
/// send, the receiver half is drained by whoever owns the page and fed
/// through the reconciler one message at a time.
pub struct RecognitionPool {
    engine: Arc<dyn OcrEngine>,
    sender: mpsc::UnboundedSender<RecognitionMessage>,
    workers: Vec<JoinHandle<()>>,
}

impl RecognitionPool {
    /// Creates a pool around `engine` and returns the receiving half of
    /// its result channel.
    pub fn new(
        engine: Arc<dyn OcrEngine>,
    ) -> (Self, mpsc::UnboundedReceiver<RecognitionMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                engine,
                sender,
                workers: Vec::new(),
            },
            receiver,
        )
    }

    /// Queues a recognition job. Returns immediately; the result arrives
    /// on the channel whenever the engine finishes.
    ///
    /// Fails if the receiving half is gone, since the result could never
    /// be delivered.
    pub fn dispatch(&mut self, request: RecognitionRequest) -> Result<(), OcrdeskError> {
        if self.sender.is_closed() {
            return Err(OcrdeskError::ChannelClosed);
        }
        // Handles of completed jobs would otherwise pile up for the
        // whole session
        self.workers.retain(|worker| !worker.is_finished());
        let engine = Arc::clone(&self.engine);
        let sender = self.sender.clone();

        let handle = tokio::spawn(async move {
            let RecognitionRequest {
                region_id,
                image,
                dpi,
                language,
                raw,
            } = request;
            debug!(%region_id, language, raw, "recognition job started");

            let result =
                tokio::task::spawn_blocking(move || engine.recognize(&image, dpi, &language, raw))
                    .await
                    .unwrap_or_else(|join| {
                        Err(OcrdeskError::Engine {
                            stage: "recognize".into(),
                            message: join.to_string(),
                        })
                    });

            if let Err(error) = &result {
                error!(%region_id, %error, "recognition job failed");
            }

            // Receiver dropped means shutdown; nothing left to notify.
            let _ = sender.send(RecognitionMessage {
                region_id,
                raw,
                result,
            });
        });
        self.workers.push(handle);
        Ok(())
    }

    /// Runs page segmentation off the control thread and waits for it.
    ///
    /// Unlike recognition this is awaited in place: layout analysis is a
    /// one-shot operation whose result is committed as a single undo step,
    /// so there is no region to go stale against.
    pub async fn analyze_layout(
        &self,
        image: DynamicImage,
        exclude_top: f32,
        exclude_bottom: f32,
    ) -> Result<Vec<Block>, OcrdeskError> {
        let engine = Arc::clone(&self.engine);

        tokio::task::spawn_blocking(move || {
            engine.analyze_layout(&image, exclude_top, exclude_bottom)
        })
        .await
        .unwrap_or_else(|join| {
            Err(OcrdeskError::Engine {
                stage: "analyze_layout".into(),
                message: join.to_string(),
            })
        })
    }

    /// Number of jobs dispatched and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_finished()).count()
    }

    /// Waits for every dispatched job to finish and deliver its message.
    pub async fn drain(&mut self) {
        futures::future::join_all(self.workers.drain(..)).await;
    }

    #[cfg(test)]
    fn worker_slots(&self) -> usize {
        self.workers.len()
    }
}
