use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use regulations_logging::{regs_debug, regs_info, regs_warn};
use tokio_util::sync::CancellationToken;

use crate::poll::{poll_task, ChannelEventSink, EventSink, PollExit};
use crate::{
    ActionResponse, Backend, CancelStatus, ClientError, ClientSettings, FailureKind,
    RegulationVersion, ReqwestBackend, ResourceRecord, TaskId, TaskStatus, UploadRequest,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TaskCreated(Result<TaskId, ClientError>),
    TaskProgress {
        task_id: TaskId,
        status: TaskStatus,
    },
    TaskCancelled {
        task_id: TaskId,
        result: Result<CancelStatus, ClientError>,
    },
    SearchCompleted(Result<Vec<ResourceRecord>, ClientError>),
    Saved {
        exist_name: String,
        result: Result<ActionResponse, ClientError>,
    },
    RevisionLoaded {
        exist_name: String,
        version: u32,
        result: Result<RegulationVersion, ClientError>,
    },
    Deleted {
        exist_name: String,
        result: Result<ActionResponse, ClientError>,
    },
}

enum EngineCommand {
    Submit(UploadRequest),
    StartPolling { task_id: TaskId },
    StopPolling { task_id: TaskId },
    Cancel { task_id: TaskId },
    Search(Vec<(String, String)>),
    Save { exist_name: String, xml: String },
    FetchRevision { exist_name: String, version: u32 },
    Delete { exist_name: String },
    Shutdown,
}

/// Handle to the background runtime that talks to the backend.
///
/// Commands are executed concurrently on a tokio runtime owned by a worker
/// thread; results come back as [`EngineEvent`]s in arrival order. At most one
/// task is polled at a time.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let poll_interval = settings.poll_interval;
        let backend = ReqwestBackend::new(settings)?;
        Self::with_backend(Arc::new(backend), poll_interval)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        poll_interval: Duration,
    ) -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut worker = Worker {
                backend,
                poll_interval,
                event_tx,
                active_poll: None,
            };
            while let Ok(command) = cmd_rx.recv() {
                if !worker.handle(&runtime, command) {
                    break;
                }
            }
            worker.stop_active_poll();
            runtime.shutdown_timeout(Duration::from_secs(1));
            regs_debug!("engine worker stopped");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn submit_upload(&self, request: UploadRequest) {
        self.send(EngineCommand::Submit(request));
    }

    pub fn start_polling(&self, task_id: TaskId) {
        self.send(EngineCommand::StartPolling { task_id });
    }

    pub fn stop_polling(&self, task_id: TaskId) {
        self.send(EngineCommand::StopPolling { task_id });
    }

    pub fn cancel_task(&self, task_id: TaskId) {
        self.send(EngineCommand::Cancel { task_id });
    }

    pub fn search(&self, query: Vec<(String, String)>) {
        self.send(EngineCommand::Search(query));
    }

    pub fn save(&self, exist_name: impl Into<String>, xml: impl Into<String>) {
        self.send(EngineCommand::Save {
            exist_name: exist_name.into(),
            xml: xml.into(),
        });
    }

    pub fn fetch_revision(&self, exist_name: impl Into<String>, version: u32) {
        self.send(EngineCommand::FetchRevision {
            exist_name: exist_name.into(),
            version,
        });
    }

    pub fn delete(&self, exist_name: impl Into<String>) {
        self.send(EngineCommand::Delete {
            exist_name: exist_name.into(),
        });
    }

    /// Stops polling and shuts the runtime down. Further commands are dropped.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Disconnected` means the worker
    /// has stopped and no further events will arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        let receiver = self
            .event_rx
            .lock()
            .map_err(|_| RecvTimeoutError::Disconnected)?;
        receiver.recv_timeout(timeout)
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            regs_warn!("engine worker is gone; command dropped");
        }
    }
}

struct Worker {
    backend: Arc<dyn Backend>,
    poll_interval: Duration,
    event_tx: mpsc::Sender<EngineEvent>,
    active_poll: Option<(TaskId, CancellationToken)>,
}

impl Worker {
    /// Returns false once the worker should stop.
    fn handle(&mut self, runtime: &tokio::runtime::Runtime, command: EngineCommand) -> bool {
        match command {
            EngineCommand::StartPolling { task_id } => {
                // Only one task is ever polled; a new one replaces the old loop.
                self.stop_active_poll();
                let token = CancellationToken::new();
                self.active_poll = Some((task_id, token.clone()));
                let backend = self.backend.clone();
                let interval = self.poll_interval;
                let sink = ChannelEventSink::new(self.event_tx.clone());
                regs_info!("Polling task {} every {:?}", task_id, interval);
                runtime.spawn(async move {
                    let exit = poll_task(backend.as_ref(), task_id, interval, token, &sink).await;
                    regs_debug!("poll loop for task {} ended: {:?}", task_id, exit);
                    if exit == PollExit::Completed {
                        regs_info!("Task {} completed", task_id);
                    }
                });
            }
            EngineCommand::StopPolling { task_id } => {
                if matches!(&self.active_poll, Some((active, _)) if *active == task_id) {
                    self.stop_active_poll();
                }
            }
            EngineCommand::Shutdown => return false,
            command => {
                let backend = self.backend.clone();
                let sink = ChannelEventSink::new(self.event_tx.clone());
                runtime.spawn(async move {
                    run_request(backend.as_ref(), command, &sink).await;
                });
            }
        }
        true
    }

    fn stop_active_poll(&mut self) {
        if let Some((task_id, token)) = self.active_poll.take() {
            regs_debug!("stopping poll loop for task {}", task_id);
            token.cancel();
        }
    }
}

async fn run_request(backend: &dyn Backend, command: EngineCommand, sink: &dyn EventSink) {
    let event = match command {
        EngineCommand::Submit(request) => {
            regs_info!("Submitting upload with {} file(s)", request.files.len());
            let result = backend.create_task(&request).await;
            log_failure("upload", &result);
            EngineEvent::TaskCreated(result)
        }
        EngineCommand::Cancel { task_id } => {
            regs_info!("Cancelling task {}", task_id);
            let result = backend.cancel_task(task_id).await;
            log_failure("cancel", &result);
            EngineEvent::TaskCancelled { task_id, result }
        }
        EngineCommand::Search(query) => {
            let result = backend.search(&query).await;
            log_failure("search", &result);
            EngineEvent::SearchCompleted(result)
        }
        EngineCommand::Save { exist_name, xml } => {
            regs_info!("Saving {} ({} bytes)", exist_name, xml.len());
            let result = backend.update_regulation(&exist_name, &xml).await;
            log_failure("save", &result);
            EngineEvent::Saved { exist_name, result }
        }
        EngineCommand::FetchRevision {
            exist_name,
            version,
        } => {
            let result = backend.regulation_version(&exist_name, version).await;
            log_failure("revision fetch", &result);
            EngineEvent::RevisionLoaded {
                exist_name,
                version,
                result,
            }
        }
        EngineCommand::Delete { exist_name } => {
            regs_info!("Deleting {}", exist_name);
            let result = backend.delete_regulation(&exist_name).await;
            log_failure("delete", &result);
            EngineEvent::Deleted { exist_name, result }
        }
        EngineCommand::StartPolling { .. }
        | EngineCommand::StopPolling { .. }
        | EngineCommand::Shutdown => return,
    };
    sink.emit(event);
}

fn log_failure<T>(action: &str, result: &Result<T, ClientError>) {
    if let Err(err) = result {
        regs_warn!("{} failed: {}", action, err);
    }
}
