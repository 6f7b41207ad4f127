//! UI layer for desktop GUI: record list, row editors, and creation form.

pub mod app;

pub use app::{CrudApp, APP_TITLE};
