//! Command implementations

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::adapters::toml_config::Settings;
use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::cli::args::*;
use crate::cli::{Cli, Commands};
use crate::domain::model::*;
use crate::domain::rules::SequenceResolver;
use crate::utils::Utils;

/// Prints results either as JSON or as plain lines
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human(value));
        }
        Ok(())
    }
}

/// A segment as shown to the user, with resolved URLs
#[derive(Serialize)]
struct SegmentView<'a> {
    identifier: String,
    media_url: String,
    raw_url: String,
    #[serde(flatten)]
    segment: &'a Segment,
}

fn segment_view<'a>(container: &DefaultAppContainer, segment: &'a Segment) -> SegmentView<'a> {
    let browse = container.browse_interactor();
    SegmentView {
        identifier: segment.name(),
        media_url: browse.media_url(&segment.canonical_media),
        raw_url: browse.media_url(&segment.raw_media),
        segment,
    }
}

fn segment_line(segment: &Segment) -> String {
    format!(
        "{:<32} {:<10} folder={} {}",
        segment.name(),
        if segment.is_annotated { "annotated" } else { "pending" },
        segment.folder,
        segment.canonical_media
    )
}

fn segment_lines(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "No segments".to_string();
    }
    segments
        .iter()
        .map(segment_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn segment_details(view: &SegmentView<'_>) -> String {
    let segment = view.segment;
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let mut lines = vec![
        format!("Segment:        {}", view.identifier),
        format!("Folder:         {}", segment.folder),
        format!("Media:          {}", view.media_url),
        format!("Raw media:      {}", view.raw_url),
        format!(
            "Stitched:       {}",
            segment.stitched_preview.as_deref().unwrap_or("-")
        ),
        format!(
            "Annotated:      {}",
            match (segment.is_annotated, &segment.annotated_by) {
                (true, Some(user)) => format!("yes, by {}", user),
                (true, None) => "yes".to_string(),
                (false, _) => "no".to_string(),
            }
        ),
        format!("Transcript:     {}", field(&segment.annotation.transcript)),
        format!("Alignment:      {}", field(&segment.annotation.alignment_notes)),
        format!("Problems:       {}", field(&segment.annotation.problem_notes)),
        format!("Comment:        {}", field(&segment.annotation.reviewer_comment)),
    ];
    lines.push(format!(
        "Updated:        {}",
        segment.updated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.join("\n")
}

/// Execute the parsed command line against `settings`
pub async fn execute(cli: Cli, settings: Settings) -> Result<()> {
    let out = Output::new(cli.json);
    let container = || DefaultAppContainer::from_settings(&settings).context("Failed to open storage");

    match cli.command {
        Commands::Resolve(args) => resolve(&args, &out),
        Commands::Config(command) => config(command, &settings, &out),
        Commands::Upload(args) => upload(&container()?, args, &out).await,
        Commands::Import(args) => import(&container()?, args, &out).await,
        Commands::Show(args) => show(&container()?, &args.identifier, &out).await,
        Commands::Stitch(args) => stitch(&container()?, &args.identifier, &out).await,
        Commands::Cut(args) => cut(&container()?, args, &out).await,
        Commands::Annotate(args) => annotate(&container()?, args, &settings, &out).await,
        Commands::Next(args) => next(&container()?, args, &out).await,
        Commands::Prev(args) => prev(&container()?, &args.identifier, &out).await,
        Commands::Collections => collections(&container()?, &out).await,
        Commands::List(args) => list(&container()?, args, &out).await,
        Commands::Search(args) => search(&container()?, args, &out).await,
        Commands::Delete(args) => delete(&container()?, &args.identifier, &out).await,
        Commands::Stats(args) => stats(&container()?, args, &out).await,
        Commands::Export(args) => export(&container()?, args).await,
    }
}

#[derive(Serialize)]
struct Resolution {
    identifier: String,
    collection_key: String,
    ordinal: u32,
    successor: Option<String>,
    predecessor: Option<String>,
}

/// Execute the resolve command
pub fn resolve(args: &ResolveArgs, out: &Output) -> Result<()> {
    let key = SequenceResolver::parse(&args.identifier)?;
    let resolution = Resolution {
        identifier: key.name(),
        collection_key: key.collection_key.clone(),
        ordinal: key.ordinal,
        successor: key.successor().map(|k| k.name()),
        predecessor: key.predecessor().map(|k| k.name()),
    };

    out.emit(&resolution, |r| {
        format!(
            "{} (collection {}, ordinal {})\n  successor:   {}\n  predecessor: {}",
            r.identifier,
            r.collection_key,
            r.ordinal,
            r.successor.as_deref().unwrap_or("-"),
            r.predecessor.as_deref().unwrap_or("-")
        )
    })
}

async fn upload(container: &DefaultAppContainer, args: UploadArgs, out: &Output) -> Result<()> {
    let segment = container
        .ingest_interactor()
        .upload(&args.file, args.title.as_deref(), args.folder.as_deref())
        .await?;
    out.emit(&segment_view(container, &segment), |v| {
        format!("Uploaded {} ({})", v.identifier, v.media_url)
    })
}

async fn import(container: &DefaultAppContainer, args: ImportArgs, out: &Output) -> Result<()> {
    let report = container
        .ingest_interactor()
        .import_folder(&args.dir, args.folder.as_deref(), args.renumber)
        .await?;

    out.emit(&report, |r| {
        let mut lines = vec![format!(
            "Imported {} files, skipped {}",
            r.imported.len(),
            r.skipped.len()
        )];
        lines.extend(r.imported.iter().map(|name| format!("  + {}", name)));
        lines.extend(
            r.skipped
                .iter()
                .map(|s| format!("  - {}: {}", s.path.display(), s.reason)),
        );
        lines.join("\n")
    })
}

async fn show(container: &DefaultAppContainer, identifier: &str, out: &Output) -> Result<()> {
    let segment = container.browse_interactor().details(identifier).await?;
    out.emit(&segment_view(container, &segment), segment_details)
}

#[derive(Serialize)]
struct PreviewView {
    #[serde(flatten)]
    preview: StitchedPreview,
    url: String,
}

async fn stitch(container: &DefaultAppContainer, identifier: &str, out: &Output) -> Result<()> {
    let preview = container
        .stitch_interactor()
        .ensure_stitched(identifier)
        .await?;
    let url = container.browse_interactor().media_url(&preview.preview_ref);

    out.emit(&PreviewView { preview, url }, |v| {
        if v.preview.is_single_segment {
            format!("{} has no successor; preview is its own media: {}", identifier, v.url)
        } else {
            format!(
                "Preview: {}\nBoundary at {}",
                v.url,
                v.preview
                    .boundary_offset
                    .map(|b| TimeSpec::from_seconds(b).format_hms())
                    .unwrap_or_else(|| "-".to_string())
            )
        }
    })
}

async fn cut(container: &DefaultAppContainer, args: CutArgs, out: &Output) -> Result<()> {
    let start = TimeSpec::parse(&args.start)
        .with_context(|| format!("Invalid start time '{}'", args.start))?;
    let end = TimeSpec::parse(&args.end)
        .with_context(|| format!("Invalid end time '{}'", args.end))?;

    let outcome = container
        .resplit_interactor()
        .apply_cut(&args.identifier, start.as_seconds(), end.as_seconds())
        .await?;

    out.emit(&outcome, |o| {
        let mut lines = vec![format!(
            "Kept {} - {} ({}) as {}",
            o.kept_range.start,
            o.kept_range.end,
            o.kept_range.duration(),
            o.kept_ref
        )];
        match &o.remainder_ref {
            Some(remainder) => lines.push(format!("Remainder pushed into {}", remainder)),
            None => lines.push("Successor left unchanged".to_string()),
        }
        lines.join("\n")
    })
}

async fn annotate(
    container: &DefaultAppContainer,
    args: AnnotateArgs,
    settings: &Settings,
    out: &Output,
) -> Result<()> {
    let update = AnnotationUpdate {
        transcript: args.transcript,
        alignment_notes: args.alignment_notes,
        problem_notes: args.problem_notes,
        reviewer_comment: args.comment,
    };
    let user = args
        .user
        .or_else(|| settings.annotation.default_user.clone())
        .map(UserRef::new);

    let segment = container
        .annotate_interactor()
        .save_annotation(&args.identifier, update, user)
        .await?;
    out.emit(&segment_view(container, &segment), |v| {
        format!("Saved annotation for {}", v.identifier)
    })
}

fn emit_neighbour(
    container: &DefaultAppContainer,
    neighbour: Option<Segment>,
    missing: &str,
    out: &Output,
) -> Result<()> {
    match neighbour {
        Some(segment) => out.emit(&segment_view(container, &segment), segment_details),
        None if out.is_json() => out.emit(&Option::<Segment>::None, |_| String::new()),
        None => {
            println!("{}", missing);
            Ok(())
        }
    }
}

async fn next(container: &DefaultAppContainer, args: NextArgs, out: &Output) -> Result<()> {
    let browse = container.browse_interactor();
    let neighbour = if args.unannotated {
        browse.next_unannotated(&args.identifier).await?
    } else {
        browse.resolve_successor(&args.identifier).await?
    };
    emit_neighbour(container, neighbour, "No next segment", out)
}

async fn prev(container: &DefaultAppContainer, identifier: &str, out: &Output) -> Result<()> {
    let neighbour = container
        .browse_interactor()
        .resolve_predecessor(identifier)
        .await?;
    emit_neighbour(container, neighbour, "No previous segment", out)
}

async fn collections(container: &DefaultAppContainer, out: &Output) -> Result<()> {
    let collections = container.browse_interactor().collections().await?;
    out.emit(&collections, |rows| {
        if rows.is_empty() {
            return "No collections".to_string();
        }
        rows.iter()
            .map(|c| {
                format!(
                    "{:<28} {:>4} segments  {:>4} annotated  ordinals {}-{}{}",
                    c.collection_key,
                    c.segment_count,
                    c.annotated_count,
                    c.first_ordinal,
                    c.last_ordinal,
                    match c.gap_count() {
                        0 => String::new(),
                        gaps => format!("  ({} missing)", gaps),
                    }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

async fn list(container: &DefaultAppContainer, args: ListArgs, out: &Output) -> Result<()> {
    let browse = container.browse_interactor();
    let mut segments = if let Some(collection) = &args.collection {
        browse.list_collection(collection).await?
    } else if let Some(folder) = &args.folder {
        browse.list_folder(folder).await?
    } else {
        browse.list_by_status(args.annotated, args.limit).await?
    };
    segments.truncate(args.limit);

    out.emit(&segments, |s| segment_lines(s))
}

async fn search(container: &DefaultAppContainer, args: SearchArgs, out: &Output) -> Result<()> {
    let segments = container
        .browse_interactor()
        .search(args.folder.as_deref(), &args.query, args.limit)
        .await?;
    out.emit(&segments, |s| segment_lines(s))
}

async fn delete(container: &DefaultAppContainer, identifier: &str, out: &Output) -> Result<()> {
    let segment = container.ingest_interactor().delete(identifier).await?;
    out.emit(&segment_view(container, &segment), |v| {
        format!("Deleted {}", v.identifier)
    })
}

#[derive(Serialize)]
struct StatsView {
    #[serde(flatten)]
    dashboard: DashboardStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<UserStats>,
}

async fn stats(container: &DefaultAppContainer, args: StatsArgs, out: &Output) -> Result<()> {
    let browse = container.browse_interactor();
    let dashboard = browse.dashboard().await?;
    let user = match args.user {
        Some(user) => Some(browse.user_stats(&UserRef::new(user)).await?),
        None => None,
    };

    out.emit(&StatsView { dashboard, user }, |v| {
        let mut lines = vec![
            format!("Segments:         {}", v.dashboard.total_segments),
            format!(
                "Annotated:        {} ({:.1}%)",
                v.dashboard.annotated_segments,
                Utils::percentage(v.dashboard.annotated_segments, v.dashboard.total_segments)
            ),
            format!(
                "Average duration: {:.1} min (over {} recent)",
                v.dashboard.average_duration_minutes, v.dashboard.sampled_segments
            ),
        ];
        if let Some(user) = &v.user {
            lines.push(format!(
                "Annotated by {}: {}",
                user.user, user.annotated_segments
            ));
        }
        lines.join("\n")
    })
}

async fn export(container: &DefaultAppContainer, args: ExportArgs) -> Result<()> {
    let annotate = container.annotate_interactor();
    let count = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let count = annotate.export(&mut writer).await?;
            writer.flush()?;
            count
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            annotate.export(&mut writer).await?
        }
    };
    info!("Export finished with {} segments", count);
    Ok(())
}

fn config(command: ConfigCommand, settings: &Settings, out: &Output) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if out.is_json() {
                println!("{}", serde_json::to_string_pretty(settings)?);
            } else {
                print!("{}", settings.to_toml_string()?);
            }
            Ok(())
        }
        ConfigCommand::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to replace it)",
                    path.display()
                );
            }
            Settings::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}
