//! Shared identifier and enum types.

use serde::{Deserialize, Serialize};

/// Internal database row ID (BIGSERIAL).
pub type DbId = i64;

/// Static model catalog key.
pub type ModelId = i32;

/// Caller identity. Issued by the upstream auth layer; opaque here.
pub type UserId = uuid::Uuid;

/// UTC timestamp matching TIMESTAMPTZ columns.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// External compute platform a model runs on.
///
/// Each variant maps to exactly one provider adapter. The serialized
/// form is the lowercase platform slug stored on task rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Fal,
    Replicate,
    Ark,
    Kie,
    /// In-process provider: schedules the generation locally instead of
    /// calling out to an external queue.
    Nano,
}

impl Platform {
    /// Lowercase slug used in task rows and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fal => "fal",
            Self::Replicate => "replicate",
            Self::Ark => "ark",
            Self::Kie => "kie",
            Self::Nano => "nano",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation job category. Video carries a per-category rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Image,
    Video,
}

impl TaskType {
    /// Lowercase slug used in task rows and quota lookups.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
