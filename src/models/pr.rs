use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A merged pull request, immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PRInfo {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub author: String,
    pub labels: Vec<String>,
    pub url: String,
    pub additions: u32,
    pub deletions: u32,
    pub changed_files: u32,
    pub merged_at: DateTime<Utc>,
}

impl PRInfo {
    /// Breaking-change signal inferred from labels and title keywords.
    pub fn is_breaking(&self) -> bool {
        let hit = |s: &str| s.to_lowercase().contains("breaking");
        hit(&self.title) || self.labels.iter().any(|l| hit(l))
    }

    /// First `max_chars` of the description, newlines flattened.
    pub fn body_excerpt(&self, max_chars: usize) -> Option<String> {
        let body = self.body.as_deref()?.trim();
        if body.is_empty() {
            return None;
        }
        let flat: String = body.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
        if flat.chars().count() > max_chars {
            let mut cut: String = flat.chars().take(max_chars).collect();
            cut.push_str("...");
            Some(cut)
        } else {
            Some(flat)
        }
    }
}

/// A published release: tag, publication time, and the commit it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub tag: String,
    pub published_at: Option<DateTime<Utc>>,
    pub target_commit: String,
}

/// A commit reference from the release window walk. Only the sha and the
/// message matter; PR numbers are mined from the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
    pub message: String,
}
