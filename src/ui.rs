//! Ratatui front-end: one tab per task (registration, records table, search,
//! result card) drawn over the shared [`Repository`](crate::repository::Repository).

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::{App, Tab};
pub use terminal::run_app;
