use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub type TaskId = u64;

/// Version number that addresses the originally uploaded document.
pub const ORIGINAL_VERSION: u32 = 0;

/// One immutable snapshot in a resource's history, as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// A stored regulation as the client sees it.
///
/// `exist_name` is the stable identifier used by every editor endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub exist_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub time: String,
    pub regulation: String,
    #[serde(default)]
    pub page_images: Vec<String>,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertVariant {
    Success,
    Danger,
}

/// Dismissible banner shown in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub variant: AlertVariant,
    pub message: String,
}

impl Alert {
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            variant: AlertVariant::Danger,
            message: message.into(),
        }
    }
}

/// `{success, message}` answer of the update and delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    pub fn alert(&self) -> Alert {
        Alert {
            variant: if self.success {
                AlertVariant::Success
            } else {
                AlertVariant::Danger
            },
            message: self.message.clone(),
        }
    }
}

/// A file chosen for upload. Contents are read only when the request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn display_name(&self) -> String {
        file_name_of(&self.path)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
