use std::path::PathBuf;

use crate::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitUpload {
        metadata: Vec<(String, String)>,
        files: Vec<PathBuf>,
    },
    StartPolling { task_id: TaskId },
    StopPolling { task_id: TaskId },
    CancelTask { task_id: TaskId },
    RunSearch { query: Vec<(String, String)> },
    SaveRegulation { exist_name: String, xml: String },
    FetchRevision { exist_name: String, version: u32 },
    DeleteRegulation { exist_name: String },
    /// Release every background activity before exiting.
    Shutdown,
}
