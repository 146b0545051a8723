//! Command-line surface: a thin `clap` front end over the library's read,
//! filter/copy, encode, write pipeline, mirroring the teacher's
//! `Cli`/`Commands` derive pattern (`src/main.rs`). No business logic
//! lives here, only argument parsing and dispatch.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "opendse",
    version,
    about = "Design-space exploration: compiles application/architecture specifications into pseudo-Boolean constraint systems."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a specification and check its structural invariants.
    Validate {
        /// Path to a specification XML file.
        file: String,
    },

    /// Read a specification and write it back out unchanged, exercising
    /// the round-trip.
    Roundtrip {
        /// Path to a specification XML file.
        file: String,
        /// Output path; defaults to stdout.
        #[arg(long)]
        output: Option<String>,
    },

    /// Apply `filter_by_resources` and write the result.
    FilterResources {
        /// Path to a specification XML file.
        file: String,
        /// Resource ids to keep. Repeat `--keep` or pass comma-separated.
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        keep: Vec<String>,
        /// Output path; defaults to stdout.
        #[arg(long)]
        output: Option<String>,
    },

    /// Apply `filter_by_functions`, keeping only functions anchored
    /// at one of `--anchor`, and write the result.
    FilterFunctions {
        /// Path to a specification XML file.
        file: String,
        /// Task ids anchoring the functions to keep.
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        anchor: Vec<String>,
        /// Output path; defaults to stdout.
        #[arg(long)]
        output: Option<String>,
    },

    /// Deep-copy a specification and write the copy.
    Copy {
        /// Path to a specification XML file.
        file: String,
        /// Output path; defaults to stdout.
        #[arg(long)]
        output: Option<String>,
    },

    /// Encode a specification into a pseudo-Boolean constraint system and
    /// report its size.
    Encode {
        /// Path to a specification XML file.
        file: String,
    },

    /// Import a best-effort TGFF benchmark file and write it out as an
    /// OpenDSE specification.
    ImportTgff {
        /// Path to a TGFF file.
        file: String,
        /// Output path; defaults to stdout.
        #[arg(long)]
        output: Option<String>,
    },

    /// Print one element's attribute map as JSON, for debugging.
    Inspect {
        /// Path to a specification XML file.
        file: String,
        /// Element kind to look up.
        #[arg(value_enum)]
        kind: ElementKind,
        /// Element id.
        id: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum ElementKind {
    Task,
    Resource,
    Mapping,
}
