#![forbid(unsafe_code)]

//! Core domain model and session engine for Setwise.
//!
//! This crate provides:
//! - Domain types (workouts, exercises, completion steps, summaries)
//! - The workout session engine (timers, cursor, ledger, gestures, lifecycle)
//! - Collaborator contracts and file-backed implementations
//!   (session journal, schedule board, kudos phrase book)
//! - History, CSV export, configuration and logging

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod clock;
pub mod timer;
pub mod cursor;
pub mod ledger;
pub mod gesture;
pub mod ticker;
pub mod store;
pub mod kudos;
pub mod schedule;
pub mod session;
pub mod catalog;
pub mod journal;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use catalog::{default_catalog, resolve_workout};
pub use journal::Journal;
pub use schedule::ScheduleBoard;
pub use store::{KudosFeed, ScheduleApi, SessionStore};
pub use session::{Collaborators, EngineEvent, LifecycleState, SessionEngine, SessionOptions};
