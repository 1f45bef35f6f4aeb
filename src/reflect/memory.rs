//! Append-only memory log for one reflection run
//!
//! Every stage of every iteration leaves a tagged entry. Entries are never
//! mutated or removed; the only read path is "most recent entry of kind K".
//! One run owns one log, and the log travels out inside the run's outcome.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::llm::CompletionResult;

/// Tag distinguishing the three entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Evaluation,
    Reflection,
    RefinedPrompt,
}

/// One tagged record in the log.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemoryEntry {
    Evaluation {
        prompt: String,
        raw: String,
        json: Map<String, Value>,
        call: CompletionResult,
    },
    Reflection {
        text: String,
        call: CompletionResult,
    },
    RefinedPrompt {
        text: String,
        call: CompletionResult,
    },
}

impl MemoryEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            MemoryEntry::Evaluation { .. } => EntryKind::Evaluation,
            MemoryEntry::Reflection { .. } => EntryKind::Reflection,
            MemoryEntry::RefinedPrompt { .. } => EntryKind::RefinedPrompt,
        }
    }
}

/// Append-only ordered log.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Memory {
    entries: Vec<MemoryEntry>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: MemoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry of the given kind.
    pub fn last(&self, kind: EntryKind) -> Option<&MemoryEntry> {
        self.entries.iter().rev().find(|entry| entry.kind() == kind)
    }
}
