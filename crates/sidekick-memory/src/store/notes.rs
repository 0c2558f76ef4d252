//! Notes: appended in order, cleared in bulk, never edited.

use super::Store;
use chrono::{DateTime, Local};
use serde::Serialize;

/// A saved note.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl Store {
    /// Append a note. Returns the new note count.
    pub async fn add_note(&self, text: &str, now: DateTime<Local>) -> usize {
        let mut notes = self.inner.notes.lock().await;
        notes.push(Note {
            text: text.to_string(),
            timestamp: now,
        });
        notes.len()
    }

    /// All notes in insertion order.
    pub async fn notes(&self) -> Vec<Note> {
        self.inner.notes.lock().await.clone()
    }

    /// Remove every note. Returns how many were removed.
    pub async fn clear_notes(&self) -> usize {
        let mut notes = self.inner.notes.lock().await;
        let count = notes.len();
        notes.clear();
        count
    }
}
