//! Terminal front-end for tagscan.
//!
//! Exposes the ratatui screens and the event loop behind `tagscan ui`.

pub mod app;
pub mod input;
pub mod render;
pub mod runner;

pub use app::{AppState, Field, InputForm};
pub use input::{handle_key_event, Command};
pub use render::draw_ui;
pub use runner::{run_ui, ScanDone, Scanner, ScannerDeps};
