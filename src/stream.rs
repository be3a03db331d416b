//! Stream implementation that runs a harvester in the background.

use crate::error::{Error, Result};
use crate::event::FileEvent;
use crate::harvester::Harvester;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::error;

/// Default number of events buffered between the harvester and its consumer.
pub const DEFAULT_CAPACITY: usize = 64;

/// How a harvester run ended.
#[derive(Debug)]
pub struct Finished {
    /// Offset of the first line the consumer has not seen; resume from here.
    pub offset: u64,
    /// `Ok` when the file went quiet, the error otherwise.
    pub result: Result<()>,
}

/// A stream of events from a harvester running on its own task.
///
/// The stream ends when the harvester stops. Dropping it aborts the task;
/// the harvester still reports its offset, but nobody is left to read it.
pub struct HarvestStream {
    receiver: mpsc::Receiver<FileEvent>,
    finished: Option<oneshot::Receiver<u64>>,
    task_handle: Option<JoinHandle<Result<()>>>,
}

impl HarvestStream {
    /// Spawns `harvester` with a sink holding up to `capacity` unread events.
    pub fn spawn(harvester: Harvester, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (finish_tx, finish_rx) = oneshot::channel();

        let task_handle = tokio::spawn(harvester.harvest(tx, finish_tx));

        HarvestStream {
            receiver: rx,
            finished: Some(finish_rx),
            task_handle: Some(task_handle),
        }
    }

    /// Waits for the harvester to stop and returns its final offset.
    ///
    /// Events not yet consumed are discarded, which unblocks a harvester
    /// waiting on a full sink; it then stops with `Error::StreamClosed`.
    /// The returned offset points at the first discarded line, so resuming
    /// from it reads those lines again.
    pub async fn finish(mut self) -> Finished {
        self.receiver.close();
        let mut first_unread = None;
        while let Some(event) = self.receiver.recv().await {
            first_unread.get_or_insert(event.offset);
        }

        let result = match self.task_handle.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "harvester task failed");
                    Err(Error::StreamClosed)
                }
            },
            None => Err(Error::StreamClosed),
        };

        let reported = match self.finished.take() {
            Some(finished) => finished.await.unwrap_or_default(),
            None => 0,
        };
        let offset = first_unread.unwrap_or(reported);

        Finished { offset, result }
    }

    /// Check if the harvester has stopped producing events
    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl Drop for HarvestStream {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl Stream for HarvestStream {
    type Item = FileEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
