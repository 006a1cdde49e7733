use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use regulations_client::{
    ActionResponse, ClientError, ClientSettings, EngineEvent, EngineHandle, ResourceRecord, RevisionRecord,
    UploadRequest,
};
use regulations_core::{ActionOutcome, Effect, Msg, Resource, Revision};
use regulations_logging::{regs_debug, regs_info};

use super::app::Inbound;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings, tx: mpsc::Sender<Inbound>) -> Result<Self, ClientError> {
        let engine = EngineHandle::new(settings)?;
        let runner = Self { engine };
        runner.spawn_event_loop(tx);
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitUpload { metadata, files } => {
                    regs_info!(
                        "SubmitUpload files={} fields={}",
                        files.len(),
                        metadata.len()
                    );
                    self.engine.submit_upload(UploadRequest { metadata, files });
                }
                Effect::StartPolling { task_id } => self.engine.start_polling(task_id),
                Effect::StopPolling { task_id } => self.engine.stop_polling(task_id),
                Effect::CancelTask { task_id } => self.engine.cancel_task(task_id),
                Effect::RunSearch { query } => {
                    regs_debug!("RunSearch {:?}", query);
                    self.engine.search(query);
                }
                Effect::SaveRegulation { exist_name, xml } => self.engine.save(exist_name, xml),
                Effect::FetchRevision {
                    exist_name,
                    version,
                } => {
                    regs_debug!("FetchRevision {} version={}", exist_name, version);
                    self.engine.fetch_revision(exist_name, version);
                }
                Effect::DeleteRegulation { exist_name } => self.engine.delete(exist_name),
                Effect::Shutdown => self.engine.shutdown(),
            }
        }
    }

    fn spawn_event_loop(&self, tx: mpsc::Sender<Inbound>) {
        let engine = self.engine.clone();
        thread::spawn(move || forward_events(&engine, &tx));
    }
}

/// Forwards engine events until either the engine stops or the app stops listening.
fn forward_events(engine: &EngineHandle, tx: &mpsc::Sender<Inbound>) {
    loop {
        match engine.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => {
                if tx.send(Inbound::Msg(map_event(event))).is_err() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    regs_debug!("engine event forwarding stopped");
}

/// Translates an engine result into the message the state machine expects.
pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::TaskCreated(Ok(task_id)) => Msg::UploadSubmitted { task_id },
        EngineEvent::TaskCreated(Err(err)) => Msg::UploadFailed {
            message: err.to_string(),
        },
        EngineEvent::TaskProgress { task_id, status } => Msg::TaskProgress {
            task_id,
            progress: status.progress,
            message: status.message,
            resource: status.resource.map(map_resource),
        },
        EngineEvent::TaskCancelled {
            task_id,
            result: Ok(status),
        } => Msg::TaskCancelled {
            task_id,
            progress: status.progress,
            message: status.message,
        },
        EngineEvent::TaskCancelled {
            task_id,
            result: Err(err),
        } => Msg::CancelFailed {
            task_id,
            message: err.to_string(),
        },
        EngineEvent::SearchCompleted(Ok(records)) => {
            Msg::SearchCompleted(records.into_iter().map(map_resource).collect())
        }
        EngineEvent::SearchCompleted(Err(err)) => Msg::SearchFailed {
            message: err.to_string(),
        },
        EngineEvent::Saved {
            exist_name,
            result: Ok(response),
        } => Msg::SaveCompleted {
            exist_name,
            outcome: map_outcome(response),
        },
        EngineEvent::Saved {
            exist_name,
            result: Err(err),
        } => Msg::SaveFailed {
            exist_name,
            message: err.to_string(),
        },
        EngineEvent::RevisionLoaded {
            exist_name,
            version,
            result: Ok(found),
        } => Msg::RevisionLoaded {
            exist_name,
            version,
            regulation: found.regulation,
            revisions: found.revisions.into_iter().map(map_revision).collect(),
        },
        EngineEvent::RevisionLoaded {
            exist_name,
            version,
            result: Err(err),
        } => Msg::RevisionFailed {
            exist_name,
            version,
            message: err.to_string(),
        },
        EngineEvent::Deleted {
            exist_name,
            result: Ok(response),
        } => Msg::DeleteCompleted {
            exist_name,
            outcome: map_outcome(response),
        },
        EngineEvent::Deleted {
            exist_name,
            result: Err(err),
        } => Msg::DeleteFailed {
            exist_name,
            message: err.to_string(),
        },
    }
}

fn map_outcome(response: ActionResponse) -> ActionOutcome {
    ActionOutcome {
        success: response.success,
        message: response.message,
    }
}

fn map_resource(record: ResourceRecord) -> Resource {
    Resource {
        exist_name: record.exist_name,
        title: record.title,
        time: record.time,
        regulation: record.regulation,
        page_images: record.page_images,
        revisions: record.revisions.into_iter().map(map_revision).collect(),
    }
}

fn map_revision(record: RevisionRecord) -> Revision {
    Revision {
        version: record.version,
        timestamp: record.timestamp,
        user: record.user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use regulations_client::{CancelStatus, FailureKind, TaskStatus};

    fn record(name: &str) -> ResourceRecord {
        ResourceRecord {
            exist_name: name.to_string(),
            title: "Koch".to_string(),
            time: "0".to_string(),
            regulation: "<TEI/>".to_string(),
            page_images: Vec::new(),
            revisions: vec![RevisionRecord {
                version: 2,
                timestamp: None,
                user: Some("admin".to_string()),
            }],
        }
    }

    fn failure(kind: FailureKind, message: &str) -> ClientError {
        // `ClientError::new` is crate-private, so build it from its public fields.
        ClientError {
            kind,
            message: message.to_string(),
        }
    }

    #[test]
    fn finished_task_carries_converted_resource() {
        let msg = map_event(EngineEvent::TaskProgress {
            task_id: 4,
            status: TaskStatus {
                progress: 100,
                message: "Fertig!".to_string(),
                resource: Some(record("koch.xml")),
            },
        });

        let Msg::TaskProgress {
            task_id,
            progress,
            resource: Some(resource),
            ..
        } = msg
        else {
            panic!("unexpected message: {msg:?}");
        };
        assert_eq!((task_id, progress), (4, 100));
        assert_eq!(resource.exist_name, "koch.xml");
        assert_eq!(
            resource.revisions,
            vec![Revision {
                version: 2,
                timestamp: None,
                user: Some("admin".to_string()),
            }]
        );
    }

    #[test]
    fn failures_become_failure_messages() {
        assert_eq!(
            map_event(EngineEvent::TaskCreated(Err(failure(
                FailureKind::FileRead,
                "scan.png: not found"
            )))),
            Msg::UploadFailed {
                message: "file read error: scan.png: not found".to_string()
            }
        );
        assert_eq!(
            map_event(EngineEvent::TaskCancelled {
                task_id: 3,
                result: Err(failure(FailureKind::Timeout, "slow")),
            }),
            Msg::CancelFailed {
                task_id: 3,
                message: "timeout: slow".to_string()
            }
        );
        assert_eq!(
            map_event(EngineEvent::RevisionLoaded {
                exist_name: "koch.xml".to_string(),
                version: 1,
                result: Err(failure(FailureKind::Backend, "no regulation found")),
            }),
            Msg::RevisionFailed {
                exist_name: "koch.xml".to_string(),
                version: 1,
                message: "backend error: no regulation found".to_string()
            }
        );
    }

    #[test]
    fn editor_outcomes_name_their_resource() {
        assert_eq!(
            map_event(EngineEvent::Deleted {
                exist_name: "koch.xml".to_string(),
                result: Ok(ActionResponse {
                    success: true,
                    message: "Verordnung wurde gelöscht".to_string(),
                }),
            }),
            Msg::DeleteCompleted {
                exist_name: "koch.xml".to_string(),
                outcome: ActionOutcome {
                    success: true,
                    message: "Verordnung wurde gelöscht".to_string(),
                },
            }
        );
        assert_eq!(
            map_event(EngineEvent::Saved {
                exist_name: "koch.xml".to_string(),
                result: Err(failure(FailureKind::Network, "refused")),
            }),
            Msg::SaveFailed {
                exist_name: "koch.xml".to_string(),
                message: "network error: refused".to_string(),
            }
        );
    }

    #[test]
    fn event_forwarding_ends_when_engine_stops() {
        let settings = ClientSettings::with_base_url("http://127.0.0.1:9").unwrap();
        let engine = EngineHandle::new(settings).unwrap();
        let (tx, _rx) = mpsc::channel();
        engine.shutdown();

        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            forward_events(&engine, &tx);
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn bare_cancel_message_keeps_progress_unknown() {
        let msg = map_event(EngineEvent::TaskCancelled {
            task_id: 8,
            result: Ok(CancelStatus {
                progress: None,
                message: "Task cancelled".to_string(),
            }),
        });
        assert_eq!(
            msg,
            Msg::TaskCancelled {
                task_id: 8,
                progress: None,
                message: "Task cancelled".to_string()
            }
        );
    }
}
