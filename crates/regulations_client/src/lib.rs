//! Regulations client: backend HTTP contract, task polling and effect execution.
mod backend;
mod engine;
mod poll;
mod settings;
mod types;
mod upload;

pub use backend::{Backend, ReqwestBackend};
pub use engine::{EngineEvent, EngineHandle};
pub use poll::{poll_task, ChannelEventSink, EventSink, PollExit};
/// Task ids and the completion threshold are shared with the state machine.
pub use regulations_core::{TaskId, PROGRESS_COMPLETE};
pub use settings::{ClientSettings, DEFAULT_BASE_URL};
pub use types::{
    ActionResponse, CancelStatus, ClientError, FailureKind, RegulationVersion, ResourceRecord,
    RevisionRecord, TaskStatus,
};
pub use upload::{content_type_for, UploadRequest, FILE_FIELD};
