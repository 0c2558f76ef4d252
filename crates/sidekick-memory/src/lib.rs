//! # sidekick-memory
//!
//! Process-wide state for Sidekick, held in memory and lost on restart.

pub mod store;

pub use store::{
    DoneError, LastIncoming, MonitorChange, MonitorSubscription, Note, Reminder, ScheduledCommand, Store, Todo,
};
