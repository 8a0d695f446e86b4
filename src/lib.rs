//! Core library surface for the school records TUI.
//!
//! Students and staff live in a single JSON document. The [`store`] module
//! reads and rewrites that document, the [`repository`] owns the in-memory
//! copy and enforces the key and required-field rules, and [`ui`] drives both
//! from the terminal. The binary only wires these together, so tests and other
//! tooling can use the same pieces without a terminal.
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod repository;
pub mod store;
pub mod ui;

/// Startup settings: data file, log directory and log level.
pub use config::AppConfig;
pub use error::{RepoError, RepoResult, StoreError, ValidationError};
pub use logging::{init_logging, LoggingError};
pub use models::{
    Collection, Dataset, Gender, Record, RecordRef, Staff, StaffDraft, Student, StudentDraft,
};
pub use report::ResultCard;
pub use repository::{Repository, SearchHit};
/// Persistence layer. `main.rs` opens a [`JsonStore`] and hands it to the
/// [`Repository`]; tests swap in their own [`Store`].
pub use store::{JsonStore, Store};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
