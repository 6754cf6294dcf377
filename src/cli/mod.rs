//! CLI module for copyedit
//!
//! Provides command-line interface parsing and handling for the copyedit-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod edit;
pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// copyedit - Copy-editing server for long documents
#[derive(Parser, Debug)]
#[command(
    name = "copyedit-server",
    version,
    about = "Copy-edit long documents with a local language model",
    long_about = "Splits plain-text and Word documents into paragraph-aligned chunks and sends\n\
                  each one to a model served by Ollama for Chicago-style copy editing.\n\n\
                  Run without arguments to start the server, or use 'edit' for a one-shot run.",
    after_help = "EXAMPLES:\n    \
                  copyedit-server init                      # Write a default copyedit.toml\n    \
                  copyedit-server                           # Start the server\n    \
                  copyedit-server check                     # Is the model ready?\n    \
                  copyedit-server edit draft.docx -o out.docx\n    \
                  cat notes.txt | copyedit-server edit -"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "copyedit.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Copy-edit files, stdin or a string in one run
    Edit {
        /// `.txt` / `.docx` files to edit, joined in order; `-` reads stdin
        #[arg(required_unless_present = "text")]
        inputs: Vec<PathBuf>,

        /// Edit this text instead of files
        #[arg(short, long, conflicts_with = "inputs")]
        text: Option<String>,

        /// Write the edited document here; defaults to `<first file>_edited`
        /// beside the first input file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (txt or docx); defaults to the output file's extension
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Check that the editing service is reachable and the model installed
    Check,

    /// Write a default configuration file
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
