//! snapnote - study notes in the terminal.
//!
//! # Usage
//!
//! ```bash
//! snapnote view notes.txt
//! snapnote view --watch --paper lined notes.txt
//! snapnote export notes.txt --subject Biology
//! snapnote import response.json && snapnote list --subject Biology
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use snapnote::app::{App, NoteSource};
use snapnote::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use snapnote::document::{FontStyle, PaperStyle};
use snapnote::export::{self, PlacedImageSource};
use snapnote::mermaid::{self, DiagramConfig, MermaidEngine};
use snapnote::note::envelope::{parse_generated_notes, parse_image_analysis};
use snapnote::note::{ChatMessage, Note, NoteFilter, NoteStore, PREVIEW_CHARS, subjects};
use snapnote::perf;
use snapnote::render::{NoteView, RenderContext};
use snapnote::ui::{lines_to_text, tree_lines};

/// How long `--plain` waits for diagrams before printing.
const PLAIN_SETTLE: Duration = Duration::from_secs(10);
const PLAIN_WIDTH: u16 = 80;

/// Study notes with diagrams, in the terminal and on paper
#[derive(Parser, Debug)]
#[command(name = "snapnote", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Watch the note for changes and auto-reload
    #[arg(short, long, global = true)]
    watch: bool,

    /// Hide diagram blocks
    #[arg(long, global = true)]
    no_diagrams: bool,

    /// Font style
    #[arg(long, value_enum, global = true)]
    font: Option<FontStyle>,

    /// Paper style
    #[arg(long, value_enum, global = true)]
    paper: Option<PaperStyle>,

    /// Print the rendered note instead of opening the viewer
    #[arg(long, global = true)]
    plain: bool,

    /// Enable performance logging
    #[arg(long, global = true)]
    perf: bool,

    /// Write detailed render debug events to a file
    #[arg(long, value_name = "PATH", global = true)]
    render_debug_log: Option<PathBuf>,

    /// Note store file
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,

    /// Owner id for stored notes
    #[arg(long, value_name = "ID", global = true)]
    owner: Option<String>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a note in the viewer
    View {
        /// Note text file
        #[arg(value_name = "FILE", required_unless_present = "note", conflicts_with = "note")]
        file: Option<PathBuf>,
        /// Stored note id
        #[arg(long, value_name = "ID")]
        note: Option<String>,
    },
    /// Write a note as PDF
    Export {
        /// Note text file
        #[arg(value_name = "FILE", required_unless_present = "note", conflicts_with = "note")]
        file: Option<PathBuf>,
        /// Stored note id
        #[arg(long, value_name = "ID")]
        note: Option<String>,
        /// Image placed above the note
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Subject, used for the file name
        #[arg(long)]
        subject: Option<String>,
        /// Output file
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Save the raw note text instead of a PDF
        #[arg(long)]
        text: bool,
    },
    /// List stored notes
    List {
        /// Case-insensitive text search
        #[arg(long)]
        search: Option<String>,
        /// Only notes with this subject ("All" for any)
        #[arg(long)]
        subject: Option<String>,
    },
    /// Store the notes found in a generator response
    Import {
        /// File holding the raw response text
        #[arg(value_name = "RESPONSE_FILE")]
        response: PathBuf,
        /// Image URL recorded with every imported note
        #[arg(long, value_name = "URL")]
        image: Option<String>,
        /// File holding an image analysis response
        #[arg(long, value_name = "FILE")]
        analysis: Option<PathBuf>,
    },
    /// Replace the content of a stored note
    Edit {
        /// Stored note id
        id: String,
        /// New content file, or - for stdin
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Delete a stored note
    Delete {
        /// Stored note id
        id: String,
    },
    /// Append assistant replies to a stored note
    Assist {
        /// Stored note id
        id: String,
        /// Assistant replies, in order
        #[arg(required = true)]
        replies: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = perf::debug_log_path(effective.render_debug_log.as_deref());
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            "failed to initialize render debug log {}: {err}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
        );
    }

    mermaid::init_config(DiagramConfig::default()).context("Diagram configuration")?;

    match cli.command {
        Command::View { file, note } => {
            let source = note_source(file, note, &effective)?;
            if effective.plain {
                print_plain(&source, &effective)
            } else {
                App::new(source)
                    .with_watch(effective.watch)
                    .with_options(effective.display_options())
                    .run()
                    .context("Application error")
            }
        }
        Command::Export {
            file,
            note,
            image,
            subject,
            output,
            text,
        } => {
            let source = note_source(file, note, &effective)?;
            if text {
                run_text_export(&effective, source, subject, output)
            } else {
                run_export(source, image, subject, output)
            }
        }
        Command::List { search, subject } => run_list(&effective, search, subject),
        Command::Import {
            response,
            image,
            analysis,
        } => run_import(&effective, &response, image, analysis.as_deref()),
        Command::Edit { id, file } => run_edit(&effective, &id, &file),
        Command::Delete { id } => {
            let store = NoteStore::new(effective.store_path());
            let removed = store.remove(&effective.owner_id(), &id)?;
            println!("Deleted {}  {}", removed.id, removed.subject_or_default());
            Ok(())
        }
        Command::Assist { id, replies } => run_assist(&effective, &id, &replies),
    }
}

fn note_source(
    file: Option<PathBuf>,
    note: Option<String>,
    flags: &ConfigFlags,
) -> Result<NoteSource> {
    match (file, note) {
        (Some(path), _) => {
            if !path.exists() {
                bail!("File not found: {}", path.display());
            }
            Ok(NoteSource::File(path))
        }
        (None, Some(id)) => Ok(NoteSource::Stored {
            store: NoteStore::new(flags.store_path()),
            owner: flags.owner_id(),
            id,
        }),
        (None, None) => bail!("Either a FILE or --note ID is required"),
    }
}

fn print_plain(source: &NoteSource, flags: &ConfigFlags) -> Result<()> {
    let loaded = source.load()?;
    let mut view = NoteView::open(
        loaded.content.as_deref(),
        flags.display_options(),
        RenderContext::Interactive,
        Arc::new(MermaidEngine),
    );
    if !view.settle(PLAIN_SETTLE) {
        tracing::warn!(
            pending = view.tree().pending_count(),
            "diagrams still rendering, printing placeholders"
        );
    }
    let width = crossterm::terminal::size().map_or(PLAIN_WIDTH, |(w, _)| w);
    println!("{}", lines_to_text(&tree_lines(view.tree(), width)));
    Ok(())
}

fn run_export(
    source: NoteSource,
    image: Option<PathBuf>,
    subject: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let (content, subject, image_path) = match source {
        NoteSource::File(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            (content, subject, image)
        }
        NoteSource::Stored { store, owner, id } => {
            let note = store.get(&owner, &id)?;
            let image = image.or_else(|| local_image(note.image_url.as_deref()));
            (note.note_content, subject.or(note.subject), image)
        }
    };

    let placed = image_path.as_deref().and_then(load_image_or_warn);
    let document = export::export_note(Some(&content), placed, subject.as_deref());
    let out_path = output.unwrap_or_else(|| PathBuf::from(&document.file_name));
    let file =
        File::create(&out_path).with_context(|| format!("Failed to create {}", out_path.display()))?;
    let mut writer = BufWriter::new(file);
    export::write_pdf(&document, &mut writer)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    println!(
        "Wrote {} ({} page{})",
        out_path.display(),
        document.pages.len(),
        if document.pages.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Stored notes keep their creation date in the file name; loose files get
/// today's.
fn run_text_export(
    flags: &ConfigFlags,
    source: NoteSource,
    subject: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let note = match source {
        NoteSource::File(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Note::new(flags.owner_id(), subject, content, None)
        }
        NoteSource::Stored { store, owner, id } => store.get(&owner, &id)?,
    };
    let out_path = output.unwrap_or_else(|| PathBuf::from(note.text_download_name()));
    std::fs::write(&out_path, &note.note_content)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    println!("Wrote {}", out_path.display());
    Ok(())
}

/// Image URLs that name an existing local file. Remote images are skipped.
fn local_image(url: Option<&str>) -> Option<PathBuf> {
    let url = url?;
    let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
    if path.is_file() {
        Some(path)
    } else {
        tracing::warn!("image {url} is not a local file, exporting without it");
        None
    }
}

fn load_image_or_warn(path: &Path) -> Option<PlacedImageSource> {
    export::load_image(path)
        .inspect_err(|err| {
            tracing::warn!("skipping image {}: {err}", path.display());
        })
        .ok()
}

fn run_list(flags: &ConfigFlags, search: Option<String>, subject: Option<String>) -> Result<()> {
    let store = NoteStore::new(flags.store_path());
    let notes = store.list(&flags.owner_id())?;
    let filter = NoteFilter { search, subject };
    let shown = filter.apply(&notes);

    println!("Subjects: {}", subjects(&notes).join(", "));
    if shown.is_empty() {
        println!("No notes found.");
        return Ok(());
    }
    for note in shown {
        println!(
            "{}  {}  {}",
            note.id,
            note.created_at.format("%Y-%m-%d"),
            note.subject_or_default()
        );
        println!("    {}", note.preview(PREVIEW_CHARS).replace('\n', " "));
    }
    Ok(())
}

fn run_import(
    flags: &ConfigFlags,
    response: &Path,
    image: Option<String>,
    analysis: Option<&Path>,
) -> Result<()> {
    let text = std::fs::read_to_string(response)
        .with_context(|| format!("Failed to read {}", response.display()))?;
    let generated = parse_generated_notes(&text);
    if generated.is_empty() {
        bail!("No notes found in {}", response.display());
    }

    let analysis = match analysis {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let analysis = parse_image_analysis(&text);
            println!("Image: {} - {}", analysis.category, analysis.description);
            Some(analysis)
        }
        None => None,
    };

    let store = NoteStore::new(flags.store_path());
    let imported = store.import(
        &flags.owner_id(),
        generated,
        image.as_deref(),
        analysis.as_ref(),
    )?;
    for note in imported {
        println!("{}  {}", note.id, note.subject_or_default());
    }
    Ok(())
}

fn run_edit(flags: &ConfigFlags, id: &str, file: &Path) -> Result<()> {
    let content = if file == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?
    };
    let store = NoteStore::new(flags.store_path());
    let note = store.replace_content(&flags.owner_id(), id, content)?;
    println!("Edited {}  {}", note.id, note.subject_or_default());
    Ok(())
}

fn run_assist(flags: &ConfigFlags, id: &str, replies: &[String]) -> Result<()> {
    let store = NoteStore::new(flags.store_path());
    let mut note = store.get(&flags.owner_id(), id)?;
    let chat: Vec<ChatMessage> = replies.iter().map(ChatMessage::assistant).collect();
    if !note.apply_assistant_update(&chat) {
        bail!("Nothing to add: every reply is empty");
    }
    store.update(&note)?;
    println!("Updated {}", note.id);
    Ok(())
}
