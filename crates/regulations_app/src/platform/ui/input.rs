use std::path::PathBuf;

use regulations_core::{MetadataField, Msg, Route, StagedFile};

/// One line of user input, resolved against the active view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Msg),
    ShowText,
    ShowPages,
    Import(PathBuf),
    Export(PathBuf),
    Help,
    Nothing,
}

/// Parses a command line. Errors carry a short message for the user.
pub fn parse_command(line: &str, route: Route) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Nothing);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let word = word.to_ascii_lowercase();

    match word.as_str() {
        "quit" | "exit" => return Ok(Command::Dispatch(Msg::QuitClicked)),
        "help" | "?" => return Ok(Command::Help),
        "go" => return parse_route(rest).map(|route| Command::Dispatch(Msg::Navigate(route))),
        _ => {}
    }

    match route {
        Route::Home => Err(unknown(&word)),
        Route::Upload => parse_upload(&word, rest),
        Route::Search => parse_search(&word, rest),
        Route::Editor => parse_editor(&word, rest),
    }
}

/// Commands available in a view, for the help listing.
pub fn help_lines(route: Route) -> Vec<&'static str> {
    let mut lines = match route {
        Route::Home => vec![],
        Route::Upload => vec![
            "set FIELD VALUE   edit a metadata field",
            "add PATH          stage one file",
            "drop N            unstage file N",
            "submit            upload the staged files",
            "cancel            cancel the running task",
            "hide | show       hide or show the progress view",
            "open              edit the uploaded regulation",
        ],
        Route::Search => vec![
            "set FIELD VALUE   edit a search field",
            "search            run the search",
            "open N            edit result N",
        ],
        Route::Editor => vec![
            "show              print the working text",
            "pages             list page images",
            "import PATH       replace the working text with a file",
            "export PATH       write the working text to a file",
            "save              store the working text",
            "revisions | close show or close the revision list",
            "load N            load version N (0 is the original)",
            "delete            delete the regulation",
            "dismiss           dismiss the alert",
        ],
    };
    lines.push("go home|upload|search|editor");
    lines.push("quit");
    lines
}

fn parse_route(raw: &str) -> Result<Route, String> {
    match raw.to_ascii_lowercase().as_str() {
        "home" => Ok(Route::Home),
        "upload" => Ok(Route::Upload),
        "search" => Ok(Route::Search),
        "editor" | "edit" => Ok(Route::Editor),
        other => Err(format!("unknown view `{other}`")),
    }
}

fn parse_upload(word: &str, rest: &str) -> Result<Command, String> {
    let msg = match word {
        "set" => {
            let (field, value) = parse_field(rest)?;
            Msg::MetadataChanged { field, value }
        }
        "add" => Msg::FilesStaged(vec![StagedFile::new(parse_path(rest, "add PATH")?)]),
        "drop" => Msg::FileUnstaged {
            index: parse_number(rest, "drop N")?,
        },
        "submit" | "upload" => Msg::UploadClicked,
        "cancel" => Msg::CancelClicked,
        "hide" => Msg::ProgressViewHidden,
        "show" => Msg::ProgressViewShown,
        "open" => Msg::OpenCreatedResource,
        other => return Err(unknown(other)),
    };
    Ok(Command::Dispatch(msg))
}

fn parse_search(word: &str, rest: &str) -> Result<Command, String> {
    let msg = match word {
        "set" => {
            let (field, value) = parse_field(rest)?;
            Msg::SearchFieldChanged { field, value }
        }
        "search" | "run" => Msg::SearchClicked,
        "open" => Msg::SearchResultOpened {
            index: parse_number(rest, "open N")?,
        },
        other => return Err(unknown(other)),
    };
    Ok(Command::Dispatch(msg))
}

fn parse_editor(word: &str, rest: &str) -> Result<Command, String> {
    let command = match word {
        "show" => Command::ShowText,
        "pages" => Command::ShowPages,
        "import" => Command::Import(parse_path(rest, "import PATH")?),
        "export" => Command::Export(parse_path(rest, "export PATH")?),
        "save" => Command::Dispatch(Msg::SaveClicked),
        "revisions" => Command::Dispatch(Msg::RevisionsShown),
        "close" => Command::Dispatch(Msg::RevisionsClosed),
        "load" => Command::Dispatch(Msg::RevisionRequested {
            version: parse_number(rest, "load N")?,
        }),
        "delete" => Command::Dispatch(Msg::DeleteClicked),
        "dismiss" => Command::Dispatch(Msg::AlertDismissed),
        other => return Err(unknown(other)),
    };
    Ok(command)
}

/// `FIELD VALUE`, where the value is the rest of the line and may be empty.
fn parse_field(rest: &str) -> Result<(MetadataField, String), String> {
    let (name, value) = match rest.split_once(char::is_whitespace) {
        Some((name, value)) => (name, value.trim()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return Err("usage: set FIELD VALUE".to_string());
    }
    let field = MetadataField::from_key(name).ok_or_else(|| format!("unknown field `{name}`"))?;
    Ok((field, value.to_string()))
}

fn parse_number<T: std::str::FromStr>(raw: &str, usage: &str) -> Result<T, String> {
    raw.parse().map_err(|_| format!("usage: {usage}"))
}

fn parse_path(raw: &str, usage: &str) -> Result<PathBuf, String> {
    if raw.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(PathBuf::from(raw))
    }
}

fn unknown(word: &str) -> String {
    format!("unknown command `{word}` (type `help`)")
}
