//! Regulations core: pure state machine for the upload, search and editor workflows.
mod effect;
mod fields;
mod handoff;
mod model;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use fields::{FieldValues, MetadataField};
pub use handoff::{decode_handoff, encode_handoff, HandoffError};
pub use model::{
    ActionOutcome, Alert, AlertVariant, Resource, Revision, StagedFile, TaskId, ORIGINAL_VERSION,
};
pub use msg::Msg;
pub use state::{AppState, PollPhase, Route};
pub use update::{clamp_progress, update, PROGRESS_COMPLETE};
pub use view_model::{
    AppViewModel, EditorView, FieldRow, ProgressView, SearchResultRow, SearchView, UploadView,
};
