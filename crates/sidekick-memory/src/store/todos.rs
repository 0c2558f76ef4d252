//! To-do items and completion by position among active items.

use super::Store;
use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

/// A to-do item. `completed_at` is set if and only if `done` is true.
#[derive(Debug, Clone, Serialize)]
pub struct Todo {
    pub text: String,
    pub timestamp: DateTime<Local>,
    pub done: bool,
    pub completed_at: Option<DateTime<Local>>,
}

/// Why a `@done` position was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DoneError {
    #[error("there are no active to-dos")]
    NoActive,
    #[error("position {position} is out of range (1-{active})")]
    OutOfRange { position: usize, active: usize },
}

impl Store {
    /// Append an active to-do. Returns the new active count.
    pub async fn add_todo(&self, text: &str, now: DateTime<Local>) -> usize {
        let mut todos = self.inner.todos.lock().await;
        todos.push(Todo {
            text: text.to_string(),
            timestamp: now,
            done: false,
            completed_at: None,
        });
        todos.iter().filter(|t| !t.done).count()
    }

    /// All to-dos in insertion order.
    pub async fn todos(&self) -> Vec<Todo> {
        self.inner.todos.lock().await.clone()
    }

    /// Mark the `position`-th active to-do (1-indexed, current order) as done.
    ///
    /// Positions are recomputed on every call, so they shift as items complete.
    pub async fn complete_active_todo(
        &self,
        position: usize,
        now: DateTime<Local>,
    ) -> Result<Todo, DoneError> {
        let mut todos = self.inner.todos.lock().await;
        let active = todos.iter().filter(|t| !t.done).count();
        if active == 0 {
            return Err(DoneError::NoActive);
        }
        if position == 0 || position > active {
            return Err(DoneError::OutOfRange { position, active });
        }

        let todo = todos
            .iter_mut()
            .filter(|t| !t.done)
            .nth(position - 1)
            .ok_or(DoneError::OutOfRange { position, active })?;
        todo.done = true;
        todo.completed_at = Some(now);
        Ok(todo.clone())
    }
}
