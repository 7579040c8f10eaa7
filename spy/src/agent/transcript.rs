//! Append-only session transcript

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
    Tool(String),
    Approval,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "[User]"),
            Speaker::Assistant => write!(f, "[Assistant]"),
            Speaker::Tool(name) => write!(f, "[Tool {}]", name),
            Speaker::Approval => write!(f, "[Approval]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub content: String,
}

/// Ordered record of everything said in a session
///
/// Entries can only be appended.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, content: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            content: content.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_tags() {
        assert_eq!(Speaker::User.to_string(), "[User]");
        assert_eq!(Speaker::Assistant.to_string(), "[Assistant]");
        assert_eq!(Speaker::Tool("bash".to_string()).to_string(), "[Tool bash]");
        assert_eq!(Speaker::Approval.to_string(), "[Approval]");
    }

    #[test]
    fn test_push_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.push(Speaker::User, "list files");
        transcript.push(Speaker::Assistant, "calling bash");
        transcript.push(Speaker::Tool("bash".to_string()), "a.txt");

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.entries()[0].speaker, Speaker::User);
        assert_eq!(transcript.entries()[2].content, "a.txt");
        assert_eq!(transcript.entries()[2].speaker.to_string(), "[Tool bash]");
    }
}
