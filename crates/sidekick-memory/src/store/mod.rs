//! In-memory state stores.
//!
//! Split into focused submodules:
//! - `notes`: append-only notes, bulk clear
//! - `todos`: to-do items and completion by active position
//! - `timed`: reminders and scheduled commands
//! - `monitors`: monitored chats and the last incoming message

mod monitors;
mod notes;
mod timed;
mod todos;


pub use monitors::{LastIncoming, MonitorChange, MonitorSubscription};
pub use notes::Note;
pub use timed::{Reminder, ScheduledCommand};
pub use todos::{DoneError, Todo};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// All bot state, shared by the dispatcher, timers, and the HTTP surface.
///
/// Cloning is cheap; clones share the same stores. Each store sits behind its
/// own lock and no lock is held across an await point outside this crate.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Stores>,
}

#[derive(Default)]
struct Stores {
    notes: Mutex<Vec<Note>>,
    todos: Mutex<Vec<Todo>>,
    reminders: Mutex<Vec<Reminder>>,
    scheduled: Mutex<Vec<ScheduledCommand>>,
    monitors: Mutex<HashMap<String, MonitorSubscription>>,
    last_incoming: Mutex<Option<LastIncoming>>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}
