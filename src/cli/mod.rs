//! CLI module for SignClip
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// SignClip
///
/// Stores sequential sign-language video segments, stitches each one with its
/// successor into an editing preview, moves the boundary between them and
/// records annotations.
#[derive(Parser, Debug)]
#[command(name = "signclip")]
#[command(about = "SignClip - stitch, re-split and annotate sign-language video segments")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: signclip.toml, then config/signclip.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Media root directory
    #[arg(long, global = true)]
    pub media_root: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split an identifier into collection key and ordinal
    Resolve(args::ResolveArgs),
    /// Store a video file as a new segment
    Upload(args::UploadArgs),
    /// Store every video file of a directory
    Import(args::ImportArgs),
    /// Show a segment with its annotation
    Show(args::SegmentArgs),
    /// Build (or reuse) the preview of a segment and its successor
    Stitch(args::SegmentArgs),
    /// Keep part of the preview and push the rest into the successor
    Cut(args::CutArgs),
    /// Save annotation fields for a segment
    Annotate(args::AnnotateArgs),
    /// Show the segment after this one
    Next(args::NextArgs),
    /// Show the segment before this one
    Prev(args::SegmentArgs),
    /// List collections with segment counts
    Collections,
    /// List segments
    List(args::ListArgs),
    /// Search identifiers and transcripts
    Search(args::SearchArgs),
    /// Remove a segment and its media
    Delete(args::SegmentArgs),
    /// Show dashboard figures
    Stats(args::StatsArgs),
    /// Export every segment with its annotation as JSON
    Export(args::ExportArgs),
    /// Inspect or create configuration
    #[command(subcommand)]
    Config(args::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cut_with_global_flags() {
        let cli = Cli::try_parse_from([
            "signclip",
            "cut",
            "A_0001",
            "--start",
            "3",
            "--end",
            "00:12.5",
            "--json",
            "--database",
            "x.db",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.database, Some(PathBuf::from("x.db")));
        match cli.command {
            Commands::Cut(args) => {
                assert_eq!(args.identifier, "A_0001");
                assert_eq!(args.end, "00:12.5");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_list_filters_conflict() {
        assert!(Cli::try_parse_from(["signclip", "list", "--pending", "--annotated"]).is_err());
    }
}
