//! File modification events.
//!
//! One event per file touch, whether it came from the editor live or
//! from replayed version-control history. History-derived events carry
//! the commit hash so co-modification mining can group them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for ModificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        write!(f, "{}", s)
    }
}

/// A single file touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationEvent {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub kind: ModificationKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Set for events replayed from version-control history. Live
    /// editor events have no shared transaction id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
}

impl ModificationEvent {
    /// Creates an event stamped with the current time.
    pub fn now(path: impl Into<String>, kind: ModificationKind) -> Self {
        Self {
            timestamp: Utc::now(),
            path: path.into(),
            kind,
            author: None,
            commit_id: None,
        }
    }

    /// Creates an event at an explicit timestamp.
    pub fn at(timestamp: DateTime<Utc>, path: impl Into<String>, kind: ModificationKind) -> Self {
        Self {
            timestamp,
            path: path.into(),
            kind,
            author: None,
            commit_id: None,
        }
    }

    /// Tags the event with a commit hash.
    pub fn with_commit(mut self, commit_id: impl Into<String>) -> Self {
        self.commit_id = Some(commit_id.into());
        self
    }

    /// Tags the event with an author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_builder_tags() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = ModificationEvent::at(ts, "src/main.rs", ModificationKind::Updated)
            .with_commit("abc123")
            .with_author("dev");
        assert_eq!(event.commit_id.as_deref(), Some("abc123"));
        assert_eq!(event.author.as_deref(), Some("dev"));
        assert_eq!(event.timestamp, ts);
    }
}
