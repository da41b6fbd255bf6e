//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use opentale::StageIdentifier;
use std::path::PathBuf;

/// OpenTale - staged LLM writing pipeline for long-form fiction
#[derive(Parser, Debug)]
#[command(name = "opentale")]
#[command(about = "Staged LLM writing pipeline: world, characters, outline, chapters", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print raw server-sent-event frames instead of plain text
    #[arg(long, global = true)]
    pub sse: bool,

    /// Project name (defaults to `[project] name` from configuration)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Load this configuration file over the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a project from a topic and generate its world setting
    World {
        /// What the book is about
        #[arg(long)]
        topic: Option<String>,

        /// Declared number of chapters
        #[arg(long)]
        chapters: Option<u32>,

        /// Print a few directions the world could take instead of generating it
        #[arg(long, conflicts_with = "finalize")]
        suggest: bool,

        /// Turn the world-building conversation into the final world document
        #[arg(long)]
        finalize: bool,
    },

    /// Generate character profiles for the stored world
    Characters {
        /// Number of characters
        #[arg(long)]
        count: Option<u32>,

        /// Finalize from the character conversation
        #[arg(long)]
        finalize: bool,
    },

    /// Generate the chapter outline
    Outline {
        /// Number of chapters to plan
        #[arg(long)]
        chapters: Option<u32>,

        /// Finalize from the outline conversation
        #[arg(long)]
        finalize: bool,
    },

    /// Send one message to a conversational stage
    Chat {
        /// Stage identifier, e.g. `world_builder_chat`
        stage: StageIdentifier,

        /// Message text
        message: String,
    },

    /// Ask a stage for advice without storing the reply
    Consult {
        /// Stage identifier, e.g. `story_planner`
        stage: StageIdentifier,

        /// Message text
        message: String,
    },

    /// Re-parse the stored outline into chapter records
    Chapters {
        /// Declared number of chapters
        #[arg(long)]
        count: Option<u32>,
    },

    /// Draft one chapter
    Chapter {
        /// Chapter number
        number: u32,

        /// Additional scene details for the writer
        #[arg(long)]
        context: Option<String>,
    },

    /// Revise one chapter with the editor stage
    Edit {
        /// Chapter number
        number: u32,
    },

    /// Replace an artifact with the contents of a file
    Save {
        /// Artifact to replace
        target: SaveTarget,

        /// File holding the edited text
        file: PathBuf,

        /// Declared number of chapters (outline only)
        #[arg(long)]
        chapters: Option<u32>,
    },

    /// Print the current state of the project
    Show,
}

/// Artifacts that accept manual edits
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveTarget {
    /// World setting document
    World,
    /// Character profiles
    Characters,
    /// Raw outline text
    Outline,
}
