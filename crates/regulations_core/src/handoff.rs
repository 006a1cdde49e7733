//! Canonical serialization of a resource handed to the editor.
//!
//! Search results and finished uploads reach the editor through this one JSON
//! shape. Each revision is an object inside the `revisions` array; nothing is
//! encoded twice.

use crate::Resource;

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("malformed handoff: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("handoff has an empty `{0}`")]
    Empty(&'static str),
}

pub fn encode_handoff(resource: &Resource) -> Result<String, HandoffError> {
    Ok(serde_json::to_string_pretty(resource)?)
}

pub fn decode_handoff(raw: &str) -> Result<Resource, HandoffError> {
    let resource: Resource = serde_json::from_str(raw)?;
    if resource.exist_name.trim().is_empty() {
        return Err(HandoffError::Empty("exist_name"));
    }
    Ok(resource)
}
