//! Remote build job domain types

use serde::{Deserialize, Deserializer, Serialize};

/// Remote build job as reported by the Odevio API
///
/// Only ever replaced by a fresh copy fetched from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildJob {
    /// Opaque key assigned by the service
    #[serde(default, deserialize_with = "deserialize_key")]
    pub key: String,
    /// Raw status code; see [`BuildJob::status`]
    #[serde(default, deserialize_with = "deserialize_text")]
    pub status_code: Option<String>,
    /// Reason given by the service when the build failed
    #[serde(default, deserialize_with = "deserialize_text")]
    pub error_message: Option<String>,
}

impl BuildJob {
    /// Status of the job in the poller's state model
    pub fn status(&self) -> JobStatus {
        JobStatus::from_code(self.status_code.as_deref())
    }
}

/// Build job status
///
/// The three terminal states are closed; every other code the service may
/// send, including none at all, is `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
    Stopped,
}

impl JobStatus {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("succeeded") => JobStatus::Succeeded,
            Some("failed") => JobStatus::Failed,
            Some("stopped") => JobStatus::Stopped,
            _ => JobStatus::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Accepts the job key as either a JSON string or a JSON number
fn deserialize_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Key::deserialize(deserializer)? {
        Key::Text(text) => text,
        Key::Number(number) => number.to_string(),
    })
}

/// Accepts any JSON value; strings are kept as is, `null` is absent and
/// anything else becomes its JSON text
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
