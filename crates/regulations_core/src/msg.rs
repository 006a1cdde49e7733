use crate::{ActionOutcome, MetadataField, Resource, Revision, Route, StagedFile, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User switched to another top-level view.
    Navigate(Route),

    /// User edited one upload metadata field.
    MetadataChanged { field: MetadataField, value: String },
    /// User added files to the upload selection.
    FilesStaged(Vec<StagedFile>),
    /// User removed one staged file.
    FileUnstaged { index: usize },
    /// User clicked the upload button.
    UploadClicked,
    /// Backend accepted the upload and created a task.
    UploadSubmitted { task_id: TaskId },
    /// Upload request failed before a task existed.
    UploadFailed { message: String },

    /// Progress view became visible.
    ProgressViewShown,
    /// Progress view was dismissed.
    ProgressViewHidden,
    /// Poll response for a task.
    TaskProgress {
        task_id: TaskId,
        progress: i64,
        message: String,
        resource: Option<Resource>,
    },
    /// User clicked the cancel button.
    CancelClicked,
    /// Backend answered the cancellation request.
    TaskCancelled {
        task_id: TaskId,
        progress: Option<i64>,
        message: String,
    },
    /// Cancellation request failed.
    CancelFailed { task_id: TaskId, message: String },
    /// User followed the link to the resource produced by the task.
    OpenCreatedResource,

    /// User edited one search field.
    SearchFieldChanged { field: MetadataField, value: String },
    /// User clicked the search button.
    SearchClicked,
    SearchCompleted(Vec<Resource>),
    SearchFailed { message: String },
    /// User opened one entry of the result list.
    SearchResultOpened { index: usize },

    /// A resource arrived through navigation (handoff or direct load).
    EditorOpened(Resource),
    /// User replaced the working text.
    TextEdited(String),
    SaveClicked,
    /// Backend answered a save of `exist_name`.
    SaveCompleted {
        exist_name: String,
        outcome: ActionOutcome,
    },
    SaveFailed { exist_name: String, message: String },
    RevisionsShown,
    RevisionsClosed,
    /// User picked a revision; 0 is the original document.
    RevisionRequested { version: u32 },
    RevisionLoaded {
        exist_name: String,
        version: u32,
        regulation: String,
        revisions: Vec<Revision>,
    },
    RevisionFailed {
        exist_name: String,
        version: u32,
        message: String,
    },
    DeleteClicked,
    /// Backend answered a delete of `exist_name`.
    DeleteCompleted {
        exist_name: String,
        outcome: ActionOutcome,
    },
    DeleteFailed { exist_name: String, message: String },
    AlertDismissed,

    /// User asked to leave the application.
    QuitClicked,
    /// Render tick.
    Tick,
    /// Fallback for unrecognized input.
    NoOp,
}
