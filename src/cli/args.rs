//! Command-line argument parsing for docquery
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Subcommand names win over a bare one-word question
const QUESTION_HELP: &str = "\
A question that is exactly a subcommand name (chunks, config, init) is read as
that subcommand. Phrase it as a longer question, e.g. \"What is the config?\".";

/// docquery - Ask questions against your documents
#[derive(Parser, Debug)]
#[command(name = "docquery")]
#[command(version)]
#[command(about = "Ask a question against a set of documents and get a cited answer")]
#[command(long_about = None)]
#[command(after_help = QUESTION_HELP)]
pub struct Args {
    /// Question to answer from the documents (not a bare subcommand name)
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Document to include (repeatable)
    #[arg(short, long = "doc", value_name = "PATH")]
    pub docs: Vec<PathBuf>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except the answer)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how the documents would be chunked (no model calls)
    Chunks {
        /// Maximum characters per chunk (defaults to config)
        #[arg(long)]
        max_chunk_size: Option<usize>,
    },

    /// Display current configuration
    Config,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_none() && self.question.is_none() {
            return Err(
                "Question required. Use 'docquery \"<QUESTION>\" --doc <PATH>' or run a subcommand."
                    .to_string(),
            );
        }

        if self.command.is_some() && self.question.is_some() {
            return Err("Cannot specify a question with a subcommand.".to_string());
        }

        if matches!(self.command, Some(Commands::Chunks { .. })) && self.docs.is_empty() {
            return Err("'chunks' needs at least one --doc.".to_string());
        }

        Ok(())
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show the progress spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show detailed events
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
