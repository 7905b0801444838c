//! Rendering seams: item identity, cover production and job execution.
//!
//! The carousel itself never touches pixels. Hosts describe their items via
//! [`CoverItem`] and [`CoverSource`], produce covers in a [`CoverRenderer`],
//! and choose where that work runs with a [`RenderExecutor`] — the bundled
//! [`ThreadExecutor`] for production, [`InlineExecutor`] for tests.

use std::{io, sync::mpsc, thread};

use thiserror::Error;
use tracing::debug;

use crate::cache::CoverKey;

/// Item whose cover can be shown by the carousel.
pub trait CoverItem: Clone + PartialEq + Send + 'static {
    /// Stable identity under which this item's cover is cached.
    ///
    /// `None` marks a placeholder item that renders nothing, such as the
    /// entry shown past either end of the sequence.
    fn cover_key(&self) -> Option<CoverKey>;
}

/// Sequential provider of the items around the current position.
pub trait CoverSource {
    /// Item type served by this source.
    type Item: CoverItem;

    /// Returns the item `offset` pages away from the current one: `-1` for
    /// the previous page, `0` for the current, `1` for the next.
    ///
    /// `None` leaves the corresponding slot blank.
    fn item_at(&mut self, offset: i32) -> Option<Self::Item>;
}

/// Visual treatment applied when rendering a cover page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Track information drawn over the cover art.
    #[default]
    Overlapping,
    /// Cover art and track information in separate regions.
    Separated,
}

impl RenderMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Overlapping => Self::Separated,
            Self::Separated => Self::Overlapping,
        }
    }
}

/// Producer of displayable covers, invoked on the render executor.
pub trait CoverRenderer: Send + Sync + 'static {
    /// Item type this renderer understands.
    type Item: CoverItem;
    /// Finished cover handed to the cache and the host's draw path.
    type Cover: Send + 'static;
    /// Failure reported when a cover cannot be produced.
    type Error: std::error::Error + Send + 'static;

    /// Renders `item` against a `width` × `height` surface.
    ///
    /// `reuse` offers a retired cover whose buffer may be recycled instead
    /// of allocating a fresh one; implementations are free to ignore it.
    fn render(
        &self,
        item: &Self::Item,
        width: u32,
        height: u32,
        mode: RenderMode,
        reuse: Option<Self::Cover>,
    ) -> Result<Self::Cover, Self::Error>;

    /// Releases a cover that will never be shown again.
    fn release(&self, cover: Self::Cover);
}

/// Executor running render jobs away from the control thread.
///
/// Jobs submitted by one carousel must run in submission order; nothing else
/// is assumed about where or when they run.
pub trait RenderExecutor {
    /// Queues `job` for execution.
    fn execute(&self, job: Box<dyn FnOnce() + Send + 'static>);
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Failure to start the background render worker.
#[derive(Debug, Error)]
#[error("failed to spawn render worker: {0}")]
pub struct SpawnError(#[from] io::Error);

/// Executor backed by a single named worker thread.
///
/// Jobs run strictly in submission order. Once the executor is dropped the
/// queue drains and the worker exits on its own.
pub struct ThreadExecutor {
    sender: mpsc::Sender<Job>,
}

impl ThreadExecutor {
    /// Starts the worker thread.
    pub fn spawn() -> Result<Self, SpawnError> {
        let (sender, receiver) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("coverdeck-render".into())
            .spawn(move || worker_loop(receiver))?;
        Ok(Self { sender })
    }
}

impl RenderExecutor for ThreadExecutor {
    fn execute(&self, job: Job) {
        // A gone worker only happens during teardown; the job is moot then.
        if self.sender.send(job).is_err() {
            debug!("render worker gone, dropping job");
        }
    }
}

fn worker_loop(receiver: mpsc::Receiver<Job>) {
    debug!("render worker started");
    for job in receiver {
        job();
    }
    debug!("render worker stopped");
}

/// Executor running every job inline on the calling thread.
///
/// Makes rendering synchronous, which keeps tests deterministic.
pub struct InlineExecutor;

impl RenderExecutor for InlineExecutor {
    fn execute(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        job();
    }
}

/// Completed render job, drained by the controller on its own thread.
pub(crate) struct RenderOutcome<C, E> {
    pub(crate) key: CoverKey,
    /// Cache generation the job was queued under; a mismatch on drain means
    /// the covers were invalidated while this one was in flight.
    pub(crate) generation: u64,
    pub(crate) result: Result<C, E>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_render_mode_toggle_is_an_involution() {
        assert_eq!(RenderMode::Overlapping.toggled(), RenderMode::Separated);
        assert_eq!(RenderMode::Separated.toggled(), RenderMode::Overlapping);
        assert_eq!(RenderMode::default(), RenderMode::Overlapping);
    }

    #[test]
    fn test_inline_executor_runs_jobs_immediately() {
        let executor = InlineExecutor;
        let (sender, receiver) = mpsc::channel();
        executor.execute(Box::new(move || {
            sender.send(7).expect("receiver alive");
        }));
        assert_eq!(receiver.try_recv(), Ok(7));
    }

    #[test]
    fn test_thread_executor_preserves_submission_order() {
        let executor = ThreadExecutor::spawn().expect("worker spawns");
        let (sender, receiver) = mpsc::channel();
        for index in 0..4 {
            let sender = sender.clone();
            executor.execute(Box::new(move || {
                sender.send(index).expect("receiver alive");
            }));
        }
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(
                receiver
                    .recv_timeout(Duration::from_secs(5))
                    .expect("job completes"),
            );
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
