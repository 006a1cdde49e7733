use crate::state::{EditorSession, TaskTracker};
use crate::{
    ActionOutcome, Alert, AppState, Effect, Msg, PollPhase, Resource, Revision, Route, TaskId,
};

/// Progress value at which a task counts as finished.
pub const PROGRESS_COMPLETE: u8 = 100;

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Navigate(route) => navigate(&mut state, route),
        Msg::MetadataChanged { field, value } => {
            if state.upload.metadata.set(field, value) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FilesStaged(files) => {
            if !files.is_empty() {
                state.upload.files.extend(files);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FileUnstaged { index } => {
            if index < state.upload.files.len() {
                state.upload.files.remove(index);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::UploadClicked => submit_upload(&mut state),
        Msg::UploadSubmitted { task_id } => start_task(&mut state, task_id),
        Msg::UploadFailed { message } => {
            // The draft stays so the user can retry.
            state.upload.submitting = false;
            state.set_notice(format!("Upload failed: {message}"));
            Vec::new()
        }
        Msg::ProgressViewShown => show_progress(&mut state),
        Msg::ProgressViewHidden => hide_progress(&mut state),
        Msg::TaskProgress {
            task_id,
            progress,
            message,
            resource,
        } => apply_progress(&mut state, task_id, progress, message, resource),
        Msg::CancelClicked => cancel_task(&mut state),
        Msg::TaskCancelled {
            task_id,
            progress,
            message,
        } => {
            if let Some(task) = current_task_mut(&mut state, task_id) {
                if let Some(progress) = progress {
                    task.progress = clamp_progress(progress);
                }
                task.message = message;
                task.cancel_pending = false;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CancelFailed { task_id, message } => {
            if let Some(task) = current_task_mut(&mut state, task_id) {
                task.cancel_pending = false;
                state.set_notice(format!("Cancellation failed: {message}"));
            }
            Vec::new()
        }
        Msg::OpenCreatedResource => {
            let created = state
                .upload
                .task
                .as_ref()
                .and_then(|task| task.created.clone());
            match created {
                Some(resource) => open_editor(&mut state, resource),
                None => Vec::new(),
            }
        }
        Msg::SearchFieldChanged { field, value } => {
            if state.search.query.set(field, value) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SearchClicked => run_search(&mut state),
        Msg::SearchCompleted(results) => {
            state.search.searching = false;
            state.search.results = results;
            state.mark_dirty();
            Vec::new()
        }
        Msg::SearchFailed { message } => {
            // Previous results stay on screen.
            state.search.searching = false;
            state.set_notice(format!("Search failed: {message}"));
            Vec::new()
        }
        Msg::SearchResultOpened { index } => match state.search.results.get(index).cloned() {
            Some(resource) => open_editor(&mut state, resource),
            None => Vec::new(),
        },
        Msg::EditorOpened(resource) => open_editor(&mut state, resource),
        Msg::TextEdited(text) => {
            if let Some(editor) = state.editor.as_mut() {
                editor.working_text = text;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SaveClicked => save(&mut state),
        Msg::SaveCompleted {
            exist_name,
            outcome,
        } => {
            finish_save(&mut state, &exist_name, outcome.alert());
            Vec::new()
        }
        Msg::SaveFailed {
            exist_name,
            message,
        } => {
            finish_save(&mut state, &exist_name, Alert::danger(message));
            Vec::new()
        }
        Msg::RevisionsShown => {
            set_revisions_visible(&mut state, true);
            Vec::new()
        }
        Msg::RevisionsClosed => {
            set_revisions_visible(&mut state, false);
            Vec::new()
        }
        Msg::RevisionRequested { version } => request_revision(&mut state, version),
        Msg::RevisionLoaded {
            exist_name,
            version,
            regulation,
            revisions,
        } => {
            apply_revision(&mut state, &exist_name, version, regulation, revisions);
            Vec::new()
        }
        Msg::RevisionFailed {
            exist_name,
            version,
            message,
        } => {
            if let Some(editor) = awaited_revision(&mut state, &exist_name, version) {
                editor.pending_revision = None;
                editor.alert = Some(Alert::danger(message));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DeleteClicked => delete(&mut state),
        Msg::DeleteCompleted {
            exist_name,
            outcome,
        } => {
            finish_delete(&mut state, &exist_name, outcome);
            Vec::new()
        }
        Msg::DeleteFailed {
            exist_name,
            message,
        } => {
            finish_delete(
                &mut state,
                &exist_name,
                ActionOutcome {
                    success: false,
                    message,
                },
            );
            Vec::new()
        }
        Msg::AlertDismissed => {
            if let Some(editor) = state.editor.as_mut() {
                if editor.alert.take().is_some() {
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::QuitClicked => {
            state.exit_requested = true;
            state.mark_dirty();
            vec![Effect::Shutdown]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Clamps a reported progress value into `0..=100`.
pub fn clamp_progress(raw: i64) -> u8 {
    raw.clamp(0, i64::from(PROGRESS_COMPLETE)) as u8
}

fn navigate(state: &mut AppState, route: Route) -> Vec<Effect> {
    if route == state.route {
        return Vec::new();
    }
    if route == Route::Editor && state.editor.is_none() {
        return Vec::new();
    }
    let effects = leave_current_route(state, route);
    // The upload form starts blank on every visit unless a submit is still in flight.
    if route == Route::Upload && !state.upload.submitting {
        state.upload.clear_draft();
    }
    state.route = route;
    state.notice = None;
    state.mark_dirty();
    effects
}

/// Leaving the upload view unmounts the progress view, which releases its poll loop.
fn leave_current_route(state: &mut AppState, next: Route) -> Vec<Effect> {
    if state.route == Route::Upload && next != Route::Upload {
        hide_progress(state)
    } else {
        Vec::new()
    }
}

fn submit_upload(state: &mut AppState) -> Vec<Effect> {
    if state.upload.submitting {
        return Vec::new();
    }
    if state.upload.files.is_empty() {
        state.set_notice("Select at least one file before uploading.");
        return Vec::new();
    }

    state.upload.submitting = true;
    state.notice = None;
    state.mark_dirty();
    vec![Effect::SubmitUpload {
        metadata: state.upload.metadata.to_pairs(),
        files: state
            .upload
            .files
            .iter()
            .map(|file| file.path.clone())
            .collect(),
    }]
}

fn start_task(state: &mut AppState, task_id: TaskId) -> Vec<Effect> {
    state.upload.submitting = false;
    state.upload.clear_draft();

    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = state.upload.task.take() {
        if previous.phase == PollPhase::Polling {
            effects.push(Effect::StopPolling {
                task_id: previous.task_id,
            });
        }
    }

    // Progress view is only mounted on the upload view; elsewhere the task waits for `show`.
    let mut task = TaskTracker::new(task_id);
    if state.route == Route::Upload {
        task.view_visible = true;
        task.phase = PollPhase::Polling;
        effects.push(Effect::StartPolling { task_id });
    }
    state.upload.task = Some(task);

    state.notice = None;
    state.mark_dirty();
    effects
}

fn show_progress(state: &mut AppState) -> Vec<Effect> {
    let Some(task) = state.upload.task.as_mut() else {
        return Vec::new();
    };
    if task.view_visible {
        return Vec::new();
    }

    task.view_visible = true;
    let mut effects = Vec::new();
    if task.phase == PollPhase::Idle && task.progress < PROGRESS_COMPLETE {
        task.phase = PollPhase::Polling;
        effects.push(Effect::StartPolling {
            task_id: task.task_id,
        });
    }
    state.mark_dirty();
    effects
}

fn hide_progress(state: &mut AppState) -> Vec<Effect> {
    let Some(task) = state.upload.task.as_mut() else {
        return Vec::new();
    };
    if !task.view_visible {
        return Vec::new();
    }

    task.view_visible = false;
    let mut effects = Vec::new();
    if task.phase == PollPhase::Polling {
        task.phase = PollPhase::Idle;
        effects.push(Effect::StopPolling {
            task_id: task.task_id,
        });
    }
    state.mark_dirty();
    effects
}

fn current_task_mut(state: &mut AppState, task_id: TaskId) -> Option<&mut TaskTracker> {
    state
        .upload
        .task
        .as_mut()
        .filter(|task| task.task_id == task_id)
}

fn apply_progress(
    state: &mut AppState,
    task_id: TaskId,
    progress: i64,
    message: String,
    resource: Option<Resource>,
) -> Vec<Effect> {
    let Some(task) = current_task_mut(state, task_id) else {
        return Vec::new();
    };
    // Late responses after completion or cancellation must not overwrite the final state.
    if task.phase.is_terminal() {
        return Vec::new();
    }

    task.progress = clamp_progress(progress);
    task.message = message;
    if let Some(resource) = resource {
        task.created = Some(resource);
    }

    let mut effects = Vec::new();
    if task.progress >= PROGRESS_COMPLETE {
        if task.phase == PollPhase::Polling {
            effects.push(Effect::StopPolling { task_id });
        }
        task.phase = PollPhase::Complete;
        task.cancel_visible = false;
    }
    state.mark_dirty();
    effects
}

fn cancel_task(state: &mut AppState) -> Vec<Effect> {
    let Some(task) = state.upload.task.as_mut() else {
        return Vec::new();
    };
    if !task.cancel_visible || task.cancel_pending || task.phase.is_terminal() {
        return Vec::new();
    }

    let mut effects = Vec::with_capacity(2);
    if task.phase == PollPhase::Polling {
        effects.push(Effect::StopPolling {
            task_id: task.task_id,
        });
    }
    task.phase = PollPhase::Cancelled;
    task.cancel_visible = false;
    task.cancel_pending = true;
    effects.push(Effect::CancelTask {
        task_id: task.task_id,
    });
    state.mark_dirty();
    effects
}

fn run_search(state: &mut AppState) -> Vec<Effect> {
    if state.search.query.is_blank() {
        state.set_notice("Enter at least one search field.");
        return Vec::new();
    }

    state.search.searching = true;
    state.notice = None;
    state.mark_dirty();
    vec![Effect::RunSearch {
        query: state.search.query.to_pairs(),
    }]
}

fn open_editor(state: &mut AppState, resource: Resource) -> Vec<Effect> {
    let effects = leave_current_route(state, Route::Editor);
    state.editor = Some(EditorSession::load(resource));
    state.route = Route::Editor;
    state.notice = None;
    state.mark_dirty();
    effects
}

fn save(state: &mut AppState) -> Vec<Effect> {
    let Some(editor) = state.editor.as_mut() else {
        return Vec::new();
    };
    if editor.saving {
        return Vec::new();
    }

    editor.saving = true;
    let effect = Effect::SaveRegulation {
        exist_name: editor.resource.exist_name.clone(),
        xml: editor.working_text.clone(),
    };
    state.mark_dirty();
    vec![effect]
}

/// Editor session for `exist_name`, if that resource is still the one open.
fn editor_for<'a>(state: &'a mut AppState, exist_name: &str) -> Option<&'a mut EditorSession> {
    state
        .editor
        .as_mut()
        .filter(|editor| editor.resource.exist_name == exist_name)
}

/// Editor session still waiting for `version` of `exist_name`.
fn awaited_revision<'a>(
    state: &'a mut AppState,
    exist_name: &str,
    version: u32,
) -> Option<&'a mut EditorSession> {
    editor_for(state, exist_name).filter(|editor| editor.pending_revision == Some(version))
}

fn finish_save(state: &mut AppState, exist_name: &str, alert: Alert) {
    if let Some(editor) = editor_for(state, exist_name) {
        editor.saving = false;
        editor.alert = Some(alert);
        state.mark_dirty();
    }
}

fn set_revisions_visible(state: &mut AppState, visible: bool) {
    if let Some(editor) = state.editor.as_mut() {
        if editor.revisions_visible != visible {
            editor.revisions_visible = visible;
            state.mark_dirty();
        }
    }
}

fn request_revision(state: &mut AppState, version: u32) -> Vec<Effect> {
    let Some(editor) = state.editor.as_mut() else {
        return Vec::new();
    };

    editor.pending_revision = Some(version);
    let effect = Effect::FetchRevision {
        exist_name: editor.resource.exist_name.clone(),
        version,
    };
    state.mark_dirty();
    vec![effect]
}

fn apply_revision(
    state: &mut AppState,
    exist_name: &str,
    version: u32,
    regulation: String,
    revisions: Vec<Revision>,
) {
    // Only the most recently requested version of the open resource may replace the working copy.
    let Some(editor) = awaited_revision(state, exist_name, version) else {
        return;
    };

    editor.pending_revision = None;
    editor.working_text = regulation;
    editor.revisions = revisions;
    editor.revisions_visible = false;
    state.mark_dirty();
}

fn delete(state: &mut AppState) -> Vec<Effect> {
    let Some(editor) = state.editor.as_mut() else {
        return Vec::new();
    };
    if editor.deleting {
        return Vec::new();
    }

    editor.deleting = true;
    let effect = Effect::DeleteRegulation {
        exist_name: editor.resource.exist_name.clone(),
    };
    state.mark_dirty();
    vec![effect]
}

fn finish_delete(state: &mut AppState, exist_name: &str, outcome: ActionOutcome) {
    if editor_for(state, exist_name).is_none() {
        return;
    }
    if outcome.success {
        state.editor = None;
        if state.route == Route::Editor {
            state.route = Route::Home;
        }
        state.set_notice(outcome.message);
        return;
    }
    if let Some(editor) = state.editor.as_mut() {
        editor.deleting = false;
        editor.alert = Some(outcome.alert());
        state.mark_dirty();
    }
}
