use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context};
use log::LevelFilter;
use regulations_core::{
    update, AppState, Effect, MetadataField, Msg, Resource, Route, StagedFile, ORIGINAL_VERSION,
};
use regulations_logging::{regs_info, regs_warn};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::persist::{read_handoff, write_atomic, write_handoffs};
use super::ui::input::{self, parse_command};
use super::ui::render::render;
use crate::cli::{Cli, Command};

/// Everything the dispatch loop reacts to.
pub(crate) enum Inbound {
    Msg(Msg),
    Line(String),
    InputClosed,
}

/// Executes effects produced by `update`.
pub(crate) trait EffectSink {
    fn enqueue(&self, effects: Vec<Effect>);
}

impl EffectSink for EffectRunner {
    fn enqueue(&self, effects: Vec<Effect>) {
        EffectRunner::enqueue(self, effects);
    }
}

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    regulations_logging::initialize(config.log_destination, LevelFilter::Info);
    let settings = config.client_settings(cli.base_url.as_deref())?;
    regs_info!("Starting; backend at {}", settings.base_url);

    let startup = startup_messages(&cli.command)?;
    let handoff_dir = match &cli.command {
        Command::Search(args) => args.handoff_dir.clone(),
        Command::Upload(_) | Command::Edit(_) => None,
    };

    let (tx, rx) = mpsc::channel::<Inbound>();
    let runner =
        EffectRunner::new(settings, tx.clone()).context("failed to start the backend client")?;
    spawn_input_reader(tx);

    let mut app = App::new(runner, io::stdout(), handoff_dir);
    for msg in startup {
        app.dispatch(msg);
    }
    app.render_if_dirty();

    while !app.state.exit_requested() {
        match rx.recv().unwrap_or(Inbound::InputClosed) {
            Inbound::Msg(msg) => app.dispatch(msg),
            Inbound::Line(line) => app.handle_line(&line),
            Inbound::InputClosed => app.dispatch(Msg::QuitClicked),
        }
        app.render_if_dirty();
    }

    regs_info!("Exiting");
    Ok(())
}

/// Messages that put the state machine where the chosen subcommand starts.
pub(crate) fn startup_messages(command: &Command) -> anyhow::Result<Vec<Msg>> {
    let msgs = match command {
        Command::Upload(args) => {
            let mut msgs = vec![Msg::Navigate(Route::Upload)];
            msgs.extend(
                args.metadata
                    .values()
                    .into_iter()
                    .map(|(field, value)| Msg::MetadataChanged { field, value }),
            );
            if !args.files.is_empty() {
                msgs.push(Msg::FilesStaged(
                    args.files.iter().map(StagedFile::new).collect(),
                ));
                msgs.push(Msg::UploadClicked);
            }
            msgs
        }
        Command::Search(args) => {
            let mut fields = args.metadata.values();
            if let Some(text) = &args.text {
                fields.insert(0, (MetadataField::Text, text.clone()));
            }
            let mut msgs = vec![Msg::Navigate(Route::Search)];
            let run = !fields.is_empty();
            msgs.extend(
                fields
                    .into_iter()
                    .map(|(field, value)| Msg::SearchFieldChanged { field, value }),
            );
            if run {
                msgs.push(Msg::SearchClicked);
            }
            msgs
        }
        Command::Edit(args) => match (&args.handoff, &args.name) {
            (Some(path), _) => vec![Msg::EditorOpened(read_handoff(path)?)],
            // Only the name is known; the content arrives with the original version.
            (None, Some(name)) => vec![
                Msg::EditorOpened(Resource {
                    exist_name: name.clone(),
                    ..Resource::default()
                }),
                Msg::RevisionRequested {
                    version: ORIGINAL_VERSION,
                },
            ],
            (None, None) => bail!("edit needs --handoff or --name"),
        },
    };
    Ok(msgs)
}

fn spawn_input_reader(tx: mpsc::Sender<Inbound>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Inbound::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    regs_warn!("Reading stdin failed: {}", err);
                    break;
                }
            }
        }
        let _ = tx.send(Inbound::InputClosed);
    });
}

pub(crate) struct App<E, W> {
    state: AppState,
    effects: E,
    out: W,
    handoff_dir: Option<PathBuf>,
}

impl<E: EffectSink, W: Write> App<E, W> {
    pub(crate) fn new(effects: E, out: W, handoff_dir: Option<PathBuf>) -> Self {
        Self {
            state: AppState::new(),
            effects,
            out,
            handoff_dir,
        }
    }

    pub(crate) fn dispatch(&mut self, msg: Msg) {
        if let Msg::SearchCompleted(results) = &msg {
            self.store_handoffs(results);
        }
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.effects.enqueue(effects);
    }

    pub(crate) fn handle_line(&mut self, line: &str) {
        match parse_command(line, self.state.route()) {
            Ok(input::Command::Dispatch(msg)) => self.dispatch(msg),
            Ok(input::Command::ShowText) => {
                let text = self.state.working_text().map(str::to_owned);
                match text {
                    Some(text) => self.print(text.lines()),
                    None => self.print(["? no regulation open"]),
                }
            }
            Ok(input::Command::ShowPages) => {
                let pages = self
                    .state
                    .view()
                    .editor
                    .map(|editor| editor.page_images)
                    .unwrap_or_default();
                if pages.is_empty() {
                    self.print(["  no page images"]);
                } else {
                    self.print(pages.iter().map(|page| format!("  {page}")));
                }
            }
            Ok(input::Command::Import(path)) => self.import(&path),
            Ok(input::Command::Export(path)) => self.export(&path),
            Ok(input::Command::Help) => self.print(input::help_lines(self.state.route())),
            Ok(input::Command::Nothing) => {}
            Err(message) => self.print([format!("? {message}")]),
        }
    }

    pub(crate) fn render_if_dirty(&mut self) {
        if !self.state.consume_dirty() {
            return;
        }
        let lines = render(&self.state.view());
        self.print(lines);
    }

    fn import(&mut self, path: &Path) {
        match fs::read_to_string(path) {
            Ok(text) => {
                regs_info!("Imported {} bytes from {:?}", text.len(), path);
                self.dispatch(Msg::TextEdited(text));
            }
            Err(err) => self.print([format!("? cannot read {}: {err}", path.display())]),
        }
    }

    fn export(&mut self, path: &Path) {
        let Some(text) = self.state.working_text().map(str::to_owned) else {
            self.print(["? no regulation open"]);
            return;
        };
        match write_atomic(path, &text) {
            Ok(()) => self.print([format!("  wrote {}", path.display())]),
            Err(err) => self.print([format!("? {err:#}")]),
        }
    }

    fn store_handoffs(&mut self, results: &[Resource]) {
        let Some(dir) = self.handoff_dir.clone() else {
            return;
        };
        match write_handoffs(&dir, results) {
            Ok(written) => self.print([format!(
                "  wrote {} handoff file(s) to {}",
                written.len(),
                dir.display()
            )]),
            Err(err) => {
                regs_warn!("Writing handoffs failed: {:#}", err);
                self.print([format!("? {err:#}")]);
            }
        }
    }

    fn print<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for line in lines {
            if let Err(err) = writeln!(self.out, "{}", line.as_ref()) {
                regs_warn!("Writing output failed: {}", err);
                return;
            }
        }
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::cli::{EditArgs, MetadataArgs, SearchArgs, UploadArgs};
    use pretty_assertions::assert_eq;
    use regulations_core::Revision;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        effects: RefCell<Vec<Effect>>,
    }

    impl EffectSink for &RecordingSink {
        fn enqueue(&self, effects: Vec<Effect>) {
            self.effects.borrow_mut().extend(effects);
        }
    }

    fn resource() -> Resource {
        Resource {
            exist_name: "koch.xml".to_string(),
            title: "Fachkraft Küche".to_string(),
            time: "2022".to_string(),
            regulation: "<TEI>original</TEI>".to_string(),
            page_images: vec!["http://backend/p1.png".to_string()],
            revisions: vec![Revision {
                version: 1,
                timestamp: None,
                user: None,
            }],
        }
    }

    fn output(out: &[u8]) -> String {
        String::from_utf8_lossy(out).into_owned()
    }

    #[test]
    fn upload_startup_submits_given_files() {
        let command = Command::Upload(UploadArgs {
            files: vec![PathBuf::from("a.png"), PathBuf::from("b.pdf")],
            metadata: MetadataArgs {
                verlag: Some("Beuth".to_string()),
                ..MetadataArgs::default()
            },
        });
        let sink = RecordingSink::default();
        let mut app = App::new(&sink, Vec::new(), None);
        for msg in startup_messages(&command).unwrap() {
            app.dispatch(msg);
        }

        let effects = sink.effects.borrow();
        let [Effect::SubmitUpload { metadata, files }] = effects.as_slice() else {
            panic!("unexpected effects: {effects:?}");
        };
        assert_eq!(files, &vec![PathBuf::from("a.png"), PathBuf::from("b.pdf")]);
        assert!(metadata.contains(&("verlag".to_string(), "Beuth".to_string())));
    }

    #[test]
    fn search_startup_without_fields_waits_for_input() {
        let command = Command::Search(SearchArgs {
            text: None,
            metadata: MetadataArgs::default(),
            handoff_dir: None,
        });
        assert_eq!(
            startup_messages(&command).unwrap(),
            vec![Msg::Navigate(Route::Search)]
        );

        let command = Command::Search(SearchArgs {
            text: Some("Koch".to_string()),
            metadata: MetadataArgs::default(),
            handoff_dir: None,
        });
        assert_eq!(
            startup_messages(&command).unwrap(),
            vec![
                Msg::Navigate(Route::Search),
                Msg::SearchFieldChanged {
                    field: MetadataField::Text,
                    value: "Koch".to_string()
                },
                Msg::SearchClicked,
            ]
        );
    }

    #[test]
    fn edit_by_name_fetches_the_original_version() {
        let command = Command::Edit(EditArgs {
            handoff: None,
            name: Some("koch.xml".to_string()),
        });
        let sink = RecordingSink::default();
        let mut app = App::new(&sink, Vec::new(), None);
        for msg in startup_messages(&command).unwrap() {
            app.dispatch(msg);
        }

        assert_eq!(
            *sink.effects.borrow(),
            vec![Effect::FetchRevision {
                exist_name: "koch.xml".to_string(),
                version: 0,
            }]
        );
        assert_eq!(app.state.route(), Route::Editor);
    }

    #[test]
    fn edit_from_missing_handoff_fails() {
        let command = Command::Edit(EditArgs {
            handoff: Some(PathBuf::from("/nonexistent/koch.xml.json")),
            name: None,
        });
        assert!(startup_messages(&command).is_err());
    }

    #[test]
    fn import_then_export_moves_the_working_text() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("edited.xml");
        let target = dir.path().join("out").join("saved.xml");
        fs::write(&source, "<TEI>edited</TEI>").unwrap();

        let sink = RecordingSink::default();
        let mut app = App::new(&sink, Vec::new(), None);
        app.dispatch(Msg::EditorOpened(resource()));
        app.handle_line(&format!("import {}", source.display()));
        assert_eq!(app.state.working_text(), Some("<TEI>edited</TEI>"));

        app.handle_line(&format!("export {}", target.display()));
        assert_eq!(fs::read_to_string(&target).unwrap(), "<TEI>edited</TEI>");

        app.handle_line("save");
        assert_eq!(
            sink.effects.borrow().last(),
            Some(&Effect::SaveRegulation {
                exist_name: "koch.xml".to_string(),
                xml: "<TEI>edited</TEI>".to_string(),
            })
        );
    }

    #[test]
    fn search_results_are_written_as_handoffs() {
        let dir = TempDir::new().unwrap();
        let sink = RecordingSink::default();
        let mut app = App::new(&sink, Vec::new(), Some(dir.path().to_path_buf()));

        app.dispatch(Msg::SearchCompleted(vec![resource()]));

        let written = dir.path().join("koch.xml.json");
        assert_eq!(read_handoff(&written).unwrap(), resource());
        assert!(output(&app.out).contains("wrote 1 handoff file(s)"));
    }

    #[test]
    fn renders_only_after_changes() {
        let sink = RecordingSink::default();
        let mut app = App::new(&sink, Vec::new(), None);

        app.dispatch(Msg::Navigate(Route::Upload));
        app.render_if_dirty();
        let first = output(&app.out);
        assert!(first.contains("== Upload =="));

        app.dispatch(Msg::Tick);
        app.render_if_dirty();
        assert_eq!(output(&app.out), first);
    }

    #[test]
    fn unknown_input_is_reported_not_dispatched() {
        let sink = RecordingSink::default();
        let mut app = App::new(&sink, Vec::new(), None);

        app.handle_line("frobnicate");
        assert!(output(&app.out).starts_with("? unknown command `frobnicate`"));
        assert!(sink.effects.borrow().is_empty());
    }
}
