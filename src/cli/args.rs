//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Segment identifier or file name (e.g. TVRI_SB_061119_0052.mp4)
    pub identifier: String,
}

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Video file to store
    pub file: PathBuf,

    /// Segment identifier (default: the file name)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Folder label (default: the collection key)
    #[arg(short, long)]
    pub folder: Option<String>,
}

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Directory to walk for video files
    pub dir: PathBuf,

    /// Folder label (default: the directory name)
    #[arg(short, long)]
    pub folder: Option<String>,

    /// Name files {folder}_0001, {folder}_0002, ... in file-name order
    #[arg(long)]
    pub renumber: bool,
}

/// Arguments for commands that act on one segment
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// Segment identifier (e.g. TVRI_SB_061119_0052)
    pub identifier: String,
}

/// Arguments for the cut command
#[derive(Args, Debug)]
pub struct CutArgs {
    /// Segment identifier
    pub identifier: String,

    /// Start of the kept part (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub start: String,

    /// End of the kept part (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: String,
}

/// Arguments for the annotate command
#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Segment identifier
    pub identifier: String,

    /// Transcript of the signed content
    #[arg(long)]
    pub transcript: Option<String>,

    /// Notes on sign/speech alignment
    #[arg(long)]
    pub alignment_notes: Option<String>,

    /// Problems found in the clip
    #[arg(long)]
    pub problem_notes: Option<String>,

    /// Reviewer comment
    #[arg(long)]
    pub comment: Option<String>,

    /// Annotating user (default: annotation.default_user)
    #[arg(short, long)]
    pub user: Option<String>,
}

/// Arguments for the next command
#[derive(Args, Debug)]
pub struct NextArgs {
    /// Segment identifier
    pub identifier: String,

    /// Skip ahead to the next segment that still needs annotating
    #[arg(long)]
    pub unannotated: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only this collection, in ordinal order
    #[arg(short, long, conflicts_with = "folder")]
    pub collection: Option<String>,

    /// Only segments uploaded with this folder label
    #[arg(short, long)]
    pub folder: Option<String>,

    /// Only segments that still need annotating
    #[arg(long, conflicts_with_all = ["annotated", "collection", "folder"])]
    pub pending: bool,

    /// Only annotated segments
    #[arg(long, conflicts_with_all = ["collection", "folder"])]
    pub annotated: bool,

    /// Maximum number of rows
    #[arg(short, long, default_value = "100")]
    pub limit: usize,
}

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to find in identifiers and transcripts
    pub query: String,

    /// Restrict to one folder label
    #[arg(short, long)]
    pub folder: Option<String>,

    /// Maximum number of rows
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Also report how many segments this user annotated
    #[arg(short, long)]
    pub user: Option<String>,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a configuration file with default values
    Init {
        /// Destination file
        #[arg(long, default_value = "signclip.toml")]
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}
