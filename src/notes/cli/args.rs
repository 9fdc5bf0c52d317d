use clap::{Parser, Subcommand, ValueEnum};
use notes::catalog::SyncMode;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Storage {
    Cloud,
    Local,
}

impl From<Storage> for SyncMode {
    fn from(storage: Storage) -> Self {
        match storage {
            Storage::Cloud => SyncMode::Cloud,
            Storage::Local => SyncMode::Local,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "notes", bin_name = "notes", version)]
#[command(
    about = "Package-format notes, kept locally or in a synced cloud folder",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Where to keep notes, if not chosen before
    #[arg(long, global = true, value_enum, help_heading = "Options")]
    pub storage: Option<Storage>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List notes (default)
    #[command(alias = "ls")]
    List,

    /// Create a note, optionally with markdown text (or piped input)
    #[command(alias = "n")]
    New {
        /// Text words (joined with spaces)
        text: Vec<String>,
    },

    /// Print notes
    #[command(alias = "view")]
    Show {
        /// Indexes or names
        #[arg(required = true, num_args = 1..)]
        selectors: Vec<String>,
    },

    /// Replace a note's text with markdown (or piped input)
    Write {
        /// Index or name
        selector: String,

        /// Text words (joined with spaces)
        text: Vec<String>,
    },

    /// Attach a place to a note
    Locate {
        /// Index or name
        selector: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Place name
        #[arg(long)]
        name: Option<String>,
    },

    /// Export notes to a .tar.gz archive (all notes when none are given)
    Export {
        /// Indexes or names
        selectors: Vec<String>,

        /// Archive path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the package path of notes
    Path {
        /// Indexes or names
        #[arg(required = true, num_args = 1..)]
        selectors: Vec<String>,
    },

    /// Get or set configuration values
    Config {
        /// Configuration key (cloud-dir, download-command, poll-interval)
        key: Option<String>,

        /// Value to set
        value: Option<String>,
    },
}
