use crate::view_model::{
    AppViewModel, EditorView, FieldRow, ProgressView, SearchResultRow, SearchView, UploadView,
};
use crate::{Alert, FieldValues, Resource, Revision, StagedFile, TaskId};

/// Top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    Upload,
    Search,
    Editor,
}

/// Lifecycle of the tracked task's polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    /// Not polling: before the first poll, or while the view is hidden.
    #[default]
    Idle,
    Polling,
    Complete,
    Cancelled,
}

impl PollPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PollPhase::Complete | PollPhase::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskTracker {
    pub(crate) task_id: TaskId,
    pub(crate) progress: u8,
    pub(crate) message: String,
    pub(crate) phase: PollPhase,
    pub(crate) view_visible: bool,
    pub(crate) cancel_visible: bool,
    pub(crate) cancel_pending: bool,
    pub(crate) created: Option<Resource>,
}

impl TaskTracker {
    pub(crate) fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            progress: 0,
            message: String::new(),
            phase: PollPhase::Idle,
            view_visible: false,
            cancel_visible: true,
            cancel_pending: false,
            created: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadSession {
    pub(crate) metadata: FieldValues,
    pub(crate) files: Vec<StagedFile>,
    pub(crate) submitting: bool,
    pub(crate) task: Option<TaskTracker>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self {
            metadata: FieldValues::upload(),
            files: Vec::new(),
            submitting: false,
            task: None,
        }
    }
}

impl UploadSession {
    pub(crate) fn clear_draft(&mut self) {
        self.metadata.clear();
        self.files.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchSession {
    pub(crate) query: FieldValues,
    pub(crate) results: Vec<Resource>,
    pub(crate) searching: bool,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self {
            query: FieldValues::search(),
            results: Vec::new(),
            searching: false,
        }
    }
}

/// Working copy of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EditorSession {
    pub(crate) resource: Resource,
    pub(crate) working_text: String,
    pub(crate) revisions: Vec<Revision>,
    pub(crate) revisions_visible: bool,
    pub(crate) alert: Option<Alert>,
    pub(crate) saving: bool,
    pub(crate) deleting: bool,
    pub(crate) pending_revision: Option<u32>,
}

impl EditorSession {
    pub(crate) fn load(resource: Resource) -> Self {
        Self {
            working_text: resource.regulation.clone(),
            revisions: resource.revisions.clone(),
            resource,
            revisions_visible: false,
            alert: None,
            saving: false,
            deleting: false,
            pending_revision: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) route: Route,
    pub(crate) upload: UploadSession,
    pub(crate) search: SearchSession,
    pub(crate) editor: Option<EditorSession>,
    pub(crate) notice: Option<String>,
    pub(crate) exit_requested: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Task id currently tracked by the upload view, if any.
    pub fn current_task(&self) -> Option<TaskId> {
        self.upload.task.as_ref().map(|task| task.task_id)
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Text the editor would send on save.
    pub fn working_text(&self) -> Option<&str> {
        self.editor.as_ref().map(|editor| editor.working_text.as_str())
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            route: self.route,
            notice: self.notice.clone(),
            upload: self.upload_view(),
            progress: self.upload.task.as_ref().map(progress_view),
            search: self.search_view(),
            editor: self.editor.as_ref().map(editor_view),
            exit_requested: self.exit_requested,
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
        self.mark_dirty();
    }

    fn upload_view(&self) -> UploadView {
        UploadView {
            fields: field_rows(&self.upload.metadata),
            files: self
                .upload
                .files
                .iter()
                .map(StagedFile::display_name)
                .collect(),
            submitting: self.upload.submitting,
        }
    }

    fn search_view(&self) -> SearchView {
        SearchView {
            fields: field_rows(&self.search.query),
            results: self
                .search
                .results
                .iter()
                .enumerate()
                .map(|(index, resource)| SearchResultRow {
                    index,
                    title: resource.title.clone(),
                    time: resource.time.clone(),
                    exist_name: resource.exist_name.clone(),
                })
                .collect(),
            searching: self.search.searching,
        }
    }
}

fn field_rows(values: &FieldValues) -> Vec<FieldRow> {
    values
        .iter()
        .map(|(field, value)| FieldRow {
            field,
            label: field.label(),
            value: value.to_string(),
        })
        .collect()
}

fn progress_view(task: &TaskTracker) -> ProgressView {
    ProgressView {
        task_id: task.task_id,
        progress: task.progress,
        message: task.message.clone(),
        phase: task.phase,
        visible: task.view_visible,
        cancel_visible: task.cancel_visible,
        editor_link: task.created.as_ref().map(|resource| resource.title.clone()),
    }
}

fn editor_view(editor: &EditorSession) -> EditorView {
    EditorView {
        exist_name: editor.resource.exist_name.clone(),
        title: editor.resource.title.clone(),
        time: editor.resource.time.clone(),
        text: editor.working_text.clone(),
        page_images: editor.resource.page_images.clone(),
        revisions: editor.revisions.clone(),
        revisions_visible: editor.revisions_visible,
        alert: editor.alert.clone(),
        saving: editor.saving,
        deleting: editor.deleting,
        loading_revision: editor.pending_revision,
    }
}
