use crate::error::Result;
use crate::processors::{CancellationFlag, ChartPipeline, PipelineEvent, RunSummary};
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

/// A pipeline run on tokio's blocking pool, observed through its event channel.
pub struct ChartJob {
    events: UnboundedReceiver<PipelineEvent>,
    cancel: CancellationFlag,
    handle: JoinHandle<Result<RunSummary>>,
}

impl ChartJob {
    pub fn spawn(pipeline: ChartPipeline, input: PathBuf, output_root: PathBuf) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationFlag::new();
        let flag = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || {
            pipeline.run(&input, &output_root, Some(&tx), &flag)
        });

        Self {
            events,
            cancel,
            handle,
        }
    }

    pub fn cancel_handle(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Next progress event; `None` once the worker has finished and the channel is drained.
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    pub async fn wait(self) -> Result<RunSummary> {
        self.handle.await?
    }
}
