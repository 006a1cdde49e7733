use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::TaskId;

/// Revision entry as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RevisionRecord {
    /// The store reports the version as an XML attribute, so it may arrive as a string.
    #[serde(deserialize_with = "version_from_scalar")]
    pub version: u32,
    #[serde(default, deserialize_with = "optional_text")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub user: Option<String>,
}

/// One regulation as returned by search and by a finished upload task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceRecord {
    pub exist_name: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub title: String,
    /// Missing dates are reported as the number `0`.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub time: String,
    pub regulation: String,
    #[serde(default)]
    pub page_images: Vec<String>,
    #[serde(default)]
    pub revisions: Vec<RevisionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub progress: i64,
    pub message: String,
    pub resource: Option<ResourceRecord>,
}

/// State reported after a cancellation request. Older backends answer with a
/// bare `{message}`, so progress is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelStatus {
    pub progress: Option<i64>,
    pub message: String,
}

/// `{success, message}` answer of the update and delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Content and history of one stored version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegulationVersion {
    pub regulation: String,
    #[serde(default)]
    pub revisions: Vec<RevisionRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateResponse {
    pub(crate) task_id: TaskId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTaskStatus {
    #[serde(default)]
    progress: Option<i64>,
    #[serde(default)]
    content: Option<TaskContent>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskContent {
    Detailed {
        #[serde(default)]
        message: String,
        #[serde(default)]
        resource: Option<ResourceRecord>,
    },
    Plain(String),
}

impl RawTaskStatus {
    fn into_parts(self) -> Result<(Option<i64>, String, Option<ResourceRecord>), ClientError> {
        if let Some(error) = self.error {
            return Err(ClientError::new(FailureKind::Backend, error));
        }
        let (message, resource) = match self.content {
            Some(TaskContent::Detailed { message, resource }) => (message, resource),
            Some(TaskContent::Plain(message)) => (message, None),
            None => (self.message.unwrap_or_default(), None),
        };
        Ok((self.progress, message, resource))
    }

    pub(crate) fn into_task_status(self) -> Result<TaskStatus, ClientError> {
        let (progress, message, resource) = self.into_parts()?;
        let progress = progress.ok_or_else(|| {
            ClientError::new(FailureKind::Decode, "task status without progress")
        })?;
        Ok(TaskStatus {
            progress,
            message,
            resource,
        })
    }

    pub(crate) fn into_cancel_status(self) -> Result<CancelStatus, ClientError> {
        let (progress, message, _) = self.into_parts()?;
        Ok(CancelStatus { progress, message })
    }
}

/// The version endpoint answers with a bare string when nothing matches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum VersionLookup {
    Found(RegulationVersion),
    Missing(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Int(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Text(value) => value,
        }
    }
}

fn version_from_scalar<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Scalar::deserialize(deserializer)? {
        Scalar::Int(value) => u32::try_from(value).map_err(D::Error::custom),
        Scalar::Text(value) => value.trim().parse().map_err(D::Error::custom),
        Scalar::Float(value) => Err(D::Error::custom(format!(
            "revision version must be an integer, got {value}"
        ))),
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    NoFiles,
    FileRead,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    /// The backend answered, but reported an error in the body.
    Backend,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::NoFiles => write!(f, "no files selected"),
            FailureKind::FileRead => write!(f, "file read error"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::Backend => write!(f, "backend error"),
        }
    }
}
