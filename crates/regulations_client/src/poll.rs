use std::sync::mpsc;
use std::time::Duration;

use regulations_logging::{regs_debug, regs_warn};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{Backend, EngineEvent, TaskId, PROGRESS_COMPLETE};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// The backend reported progress 100.
    Completed,
    /// The token was cancelled: view hidden, task replaced, cancel or shutdown.
    Stopped,
}

/// Polls task status once per `interval` until the task completes or `cancel` fires.
///
/// The first request goes out one interval after the call. Failed polls are
/// logged and the loop keeps going. Cancellation also abandons a request that
/// is still in flight.
pub async fn poll_task(
    backend: &dyn Backend,
    task_id: TaskId,
    interval: Duration,
    cancel: CancellationToken,
    sink: &dyn EventSink,
) -> PollExit {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollExit::Stopped,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollExit::Stopped,
            result = backend.task_progress(task_id) => result,
        };

        match result {
            Ok(status) => {
                regs_debug!(
                    "task {} progress={} message={:?}",
                    task_id,
                    status.progress,
                    status.message
                );
                let complete = status.progress >= i64::from(PROGRESS_COMPLETE);
                sink.emit(EngineEvent::TaskProgress { task_id, status });
                if complete {
                    return PollExit::Completed;
                }
            }
            Err(err) => {
                regs_warn!("Polling task {} failed: {}", task_id, err);
            }
        }
    }
}
