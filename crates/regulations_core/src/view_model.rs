use crate::{Alert, MetadataField, PollPhase, Revision, Route, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub route: Route,
    pub notice: Option<String>,
    pub upload: UploadView,
    pub progress: Option<ProgressView>,
    pub search: SearchView,
    pub editor: Option<EditorView>,
    pub exit_requested: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub field: MetadataField,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadView {
    pub fields: Vec<FieldRow>,
    pub files: Vec<String>,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub task_id: TaskId,
    pub progress: u8,
    pub message: String,
    pub phase: PollPhase,
    pub visible: bool,
    pub cancel_visible: bool,
    /// Title of the produced resource once the editor link is available.
    pub editor_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchView {
    pub fields: Vec<FieldRow>,
    pub results: Vec<SearchResultRow>,
    pub searching: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultRow {
    pub index: usize,
    pub title: String,
    pub time: String,
    pub exist_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub exist_name: String,
    pub title: String,
    pub time: String,
    pub text: String,
    pub page_images: Vec<String>,
    pub revisions: Vec<Revision>,
    pub revisions_visible: bool,
    pub alert: Option<Alert>,
    pub saving: bool,
    pub deleting: bool,
    pub loading_revision: Option<u32>,
}
