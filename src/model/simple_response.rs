use serde::{Deserialize, Serialize};

/// Serializes as `{ "message": ... }` or `{ "error": ... }`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleResponse {
    Message(String),
    Error(String),
}
