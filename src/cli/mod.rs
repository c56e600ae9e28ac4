//! CLI module for docquery
//!
//! Handles command-line argument parsing and loading documents from disk.

pub mod args;
pub mod documents;

pub use args::{Args, Commands, Verbosity};
pub use documents::{load_document, media_type_for};
