use chrono::DateTime;
use regulations_core::{
    AlertVariant, AppViewModel, EditorView, FieldRow, PollPhase, ProgressView, Revision, Route,
    SearchView, UploadView, PROGRESS_COMPLETE,
};

const BAR_WIDTH: usize = 20;

/// Renders the active view as terminal lines.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(notice) = &view.notice {
        lines.push(format!("! {notice}"));
    }

    match view.route {
        Route::Home => lines.push("Regulations. Type `go upload`, `go search` or `help`.".into()),
        Route::Upload => render_upload(&mut lines, &view.upload, view.progress.as_ref()),
        Route::Search => render_search(&mut lines, &view.search),
        Route::Editor => match &view.editor {
            Some(editor) => render_editor(&mut lines, editor),
            None => lines.push("No regulation open.".into()),
        },
    }

    if view.exit_requested {
        lines.push("Bye.".into());
    }
    lines
}

fn render_upload(lines: &mut Vec<String>, upload: &UploadView, progress: Option<&ProgressView>) {
    lines.push("== Upload ==".into());
    render_fields(lines, &upload.fields);
    if upload.files.is_empty() {
        lines.push("  Files: none".into());
    } else {
        lines.push("  Files:".into());
        for (index, name) in upload.files.iter().enumerate() {
            lines.push(format!("    [{index}] {name}"));
        }
    }
    if upload.submitting {
        lines.push("  Uploading...".into());
    }

    let Some(progress) = progress else {
        return;
    };
    if !progress.visible {
        lines.push(format!(
            "  Task {} (progress hidden, type `show`)",
            progress.task_id
        ));
        return;
    }

    lines.push(format!(
        "  Task {} {} {:>3}% {}",
        progress.task_id,
        progress_bar(progress.progress),
        progress.progress,
        progress.message
    ));
    match progress.phase {
        PollPhase::Cancelled => lines.push("  Cancelled.".into()),
        PollPhase::Complete => {
            if let Some(title) = &progress.editor_link {
                lines.push(format!(
                    "  Done: {} (type `open` to edit)",
                    display_or_dash(title)
                ));
            }
        }
        PollPhase::Idle | PollPhase::Polling => {}
    }
    if progress.cancel_visible {
        lines.push("  Type `cancel` to stop the task.".into());
    }
}

fn render_search(lines: &mut Vec<String>, search: &SearchView) {
    lines.push("== Search ==".into());
    render_fields(lines, &search.fields);
    if search.searching {
        lines.push("  Searching...".into());
    }
    if search.results.is_empty() {
        lines.push("  No results.".into());
        return;
    }
    lines.push(format!("  {} result(s):", search.results.len()));
    for row in &search.results {
        lines.push(format!(
            "    [{}] {} ({}) {}",
            row.index,
            display_or_dash(&row.title),
            display_or_dash(&row.time),
            row.exist_name
        ));
    }
}

fn render_editor(lines: &mut Vec<String>, editor: &EditorView) {
    lines.push(format!(
        "== {} ({}, {}) ==",
        display_or_dash(&editor.title),
        editor.exist_name,
        display_or_dash(&editor.time)
    ));
    if let Some(alert) = &editor.alert {
        let tag = match alert.variant {
            AlertVariant::Success => "ok",
            AlertVariant::Danger => "error",
        };
        lines.push(format!("  [{tag}] {} (type `dismiss`)", alert.message));
    }
    lines.push(format!(
        "  Working text: {} line(s), {} byte(s); {} page image(s)",
        editor.text.lines().count(),
        editor.text.len(),
        editor.page_images.len()
    ));
    if editor.saving {
        lines.push("  Saving...".into());
    }
    if editor.deleting {
        lines.push("  Deleting...".into());
    }
    if let Some(version) = editor.loading_revision {
        lines.push(format!("  Loading version {version}..."));
    }
    if editor.revisions_visible {
        lines.push("  Versions:".into());
        lines.push("    [0] original".into());
        for revision in &editor.revisions {
            lines.push(format!("    {}", revision_line(revision)));
        }
    }
}

fn render_fields(lines: &mut Vec<String>, fields: &[FieldRow]) {
    for row in fields {
        lines.push(format!("  {:<18} {}", format!("{}:", row.label), row.value));
    }
}

fn revision_line(revision: &Revision) -> String {
    let when = revision
        .timestamp
        .as_deref()
        .map(format_timestamp)
        .unwrap_or_else(|| "-".to_string());
    let user = revision.user.as_deref().unwrap_or("-");
    format!("[{}] {when} {user}", revision.version)
}

/// RFC 3339 timestamps are shortened to minutes; anything else is shown as is.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn progress_bar(progress: u8) -> String {
    let progress = usize::from(progress.min(PROGRESS_COMPLETE));
    let filled = progress * BAR_WIDTH / usize::from(PROGRESS_COMPLETE);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn display_or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use regulations_core::{update, AppState, Msg, Resource, StagedFile};

    fn drive(msgs: Vec<Msg>) -> AppViewModel {
        let mut state = AppState::new();
        for msg in msgs {
            state = update(state, msg).0;
        }
        state.view()
    }

    fn resource() -> Resource {
        Resource {
            exist_name: "koch.xml".to_string(),
            title: "Fachkraft Küche".to_string(),
            time: "2022".to_string(),
            regulation: "<TEI>\n<body/>\n</TEI>".to_string(),
            page_images: vec!["http://backend/p1.png".to_string()],
            revisions: vec![Revision {
                version: 1,
                timestamp: Some("2024-03-05T10:20:30Z".to_string()),
                user: Some("admin".to_string()),
            }],
        }
    }

    #[test]
    fn progress_bar_scales_to_width() {
        assert_eq!(progress_bar(0), format!("[{}]", ".".repeat(20)));
        assert_eq!(progress_bar(40), format!("[{}{}]", "#".repeat(8), ".".repeat(12)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn timestamps_are_shortened_when_parseable() {
        assert_eq!(format_timestamp("2024-03-05T10:20:30Z"), "2024-03-05 10:20");
        assert_eq!(format_timestamp("gestern"), "gestern");
    }

    #[test]
    fn running_task_offers_cancel() {
        let view = drive(vec![
            Msg::Navigate(Route::Upload),
            Msg::FilesStaged(vec![StagedFile::new("scan.png")]),
            Msg::UploadClicked,
            Msg::UploadSubmitted { task_id: 7 },
            Msg::TaskProgress {
                task_id: 7,
                progress: 40,
                message: "Scans werden verarbeitet...".to_string(),
                resource: None,
            },
        ]);
        let lines = render(&view);

        assert!(lines.contains(&format!(
            "  Task 7 {}  40% Scans werden verarbeitet...",
            progress_bar(40)
        )));
        assert!(lines.contains(&"  Type `cancel` to stop the task.".to_string()));
    }

    #[test]
    fn finished_task_links_to_editor() {
        let view = drive(vec![
            Msg::Navigate(Route::Upload),
            Msg::FilesStaged(vec![StagedFile::new("scan.png")]),
            Msg::UploadClicked,
            Msg::UploadSubmitted { task_id: 7 },
            Msg::TaskProgress {
                task_id: 7,
                progress: 100,
                message: "Fertig!".to_string(),
                resource: Some(resource()),
            },
        ]);
        let lines = render(&view);

        assert!(lines.contains(&"  Done: Fachkraft Küche (type `open` to edit)".to_string()));
        assert!(!lines.iter().any(|line| line.contains("cancel")));
    }

    #[test]
    fn editor_lists_revisions_with_original_first() {
        let view = drive(vec![Msg::EditorOpened(resource()), Msg::RevisionsShown]);
        let lines = render(&view);

        assert_eq!(lines[0], "== Fachkraft Küche (koch.xml, 2022) ==");
        assert_eq!(
            &lines[lines.len() - 3..],
            &[
                "  Versions:".to_string(),
                "    [0] original".to_string(),
                "    [1] 2024-03-05 10:20 admin".to_string(),
            ]
        );
    }

    #[test]
    fn notice_comes_first() {
        let view = drive(vec![Msg::Navigate(Route::Search), Msg::SearchClicked]);
        let lines = render(&view);

        assert_eq!(lines[0], "! Enter at least one search field.");
        assert_eq!(lines[1], "== Search ==");
        assert_eq!(lines.last().map(String::as_str), Some("  No results."));
    }
}
