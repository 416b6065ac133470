//! convind-editor - markdown editing core for the convind wiki.
//!
//! # Usage
//!
//! ```bash
//! convind-editor render page.md --links
//! convind-editor --server http://localhost:8080/ open 3f9a
//! convind-editor upload diagram.png
//! convind-editor demo page.md
//! ```

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use convind_editor::app::{EditorSettings, EditorSurface, Message};
use convind_editor::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use convind_editor::markdown::{Arena, MarkdownEngine, RenderedOutput};
use convind_editor::paste::{AssetKind, ClipboardData, ClipboardFile, content_type_for_path};
use convind_editor::store::{ContentStore, HttpStore, MemoryStore, PageId, PageStore};
use convind_editor::surface::HeadlessSurface;
use convind_editor::title::derive_title;

/// Markdown editing core for the convind wiki
#[derive(Parser, Debug)]
#[command(name = "convind-editor", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Base URL of the wiki server
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Private link scheme rewritten to internal paths
    #[arg(long, global = true, value_name = "NAME")]
    link_scheme: Option<String>,

    /// Path that replaces `scheme://` in links
    #[arg(long, global = true, value_name = "PATH")]
    link_prefix: Option<String>,

    /// Path under which uploaded content is referenced
    #[arg(long, global = true, value_name = "PATH")]
    content_prefix: Option<String>,

    /// Milliseconds a save may take before the busy indicator shows
    #[arg(long, global = true, value_name = "MS")]
    save_grace_ms: Option<u64>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a markdown file with source positions
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the rendered node tree as JSON
        #[arg(long)]
        json: bool,
        /// List the pages the document links to
        #[arg(long)]
        links: bool,
    },
    /// Load a page from the server
    Open {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Create an empty page on the server
    New,
    /// Upload a file and print the markdown that references it
    Upload {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Content type (guessed from the extension when omitted)
        #[arg(long, value_name = "TYPE")]
        content_type: Option<String>,
    },
    /// Run a scripted editing session against in-memory stores
    Demo {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct RenderReport<'a> {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<Vec<String>>,
    output: &'a RenderedOutput,
}

fn main() -> Result<()> {
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

    let level = if effective.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let Some(command) = cli.command else {
        if cli.save || cli.clear {
            return Ok(());
        }
        anyhow::bail!("no command given (try --help)");
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    runtime.block_on(run(command, &effective))
}

async fn run(command: Command, flags: &ConfigFlags) -> Result<()> {
    let settings = flags.settings();
    match command {
        Command::Render { file, json, links } => render_file(&file, &settings, json, links),
        Command::Open { id } => {
            let store = Rc::new(http_store(flags)?);
            let mut editor = EditorSurface::new(
                settings,
                HeadlessSurface::new(),
                Rc::clone(&store),
                store,
            );
            editor
                .open(PageId::new(id))
                .await
                .context("Failed to open page")?;
            let revision = editor.model().revision.as_ref();
            println!("title: {}", editor.title());
            if let Some(revision) = revision {
                println!("revision: {} ({})", revision.id, revision.timestamp.to_rfc2822());
            }
            println!("lines: {}", editor.model().buffer.line_count());
            Ok(())
        }
        Command::New => {
            let page = http_store(flags)?
                .create()
                .await
                .context("Failed to create page")?;
            println!("{page}");
            Ok(())
        }
        Command::Upload { file, content_type } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let content_type =
                content_type.unwrap_or_else(|| content_type_for_path(&file).to_string());
            let id = http_store(flags)?
                .upload(&content_type, bytes)
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            println!(
                "{}",
                AssetKind::for_content_type(&content_type).markup(&settings.content_prefix, &id)
            );
            Ok(())
        }
        Command::Demo { file } => demo(&file, settings).await,
    }
}

fn http_store(flags: &ConfigFlags) -> Result<HttpStore> {
    HttpStore::new(flags.server()).with_context(|| format!("Invalid server URL {}", flags.server()))
}

fn render_file(file: &Path, settings: &EditorSettings, json: bool, with_links: bool) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let engine = MarkdownEngine::new(settings.links.clone());
    let arena = Arena::new();
    let doc = engine.parse(&arena, &source);
    // Collected before rewriting, while destinations still carry the scheme.
    let links = with_links.then(|| engine.page_links(&doc));
    engine.rewrite_links(&doc);
    let output = engine.render(&doc);
    let title = derive_title(&output, &source);

    if json {
        let report = RenderReport {
            title,
            links,
            output: &output,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("title: {title}");
    if let Some(links) = links {
        println!("links: {}", links.join(" "));
    }
    println!();
    print!("{}", output.to_html());
    Ok(())
}

/// Edit a copy of `file` in memory: change the first line, paste a link
/// and an image, then print every event and the final source.
async fn demo(file: &Path, settings: EditorSettings) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let store = Rc::new(MemoryStore::new());
    let page = PageId::new("demo");
    store.insert_page(&page, &source);

    let mut editor = EditorSurface::new(
        settings,
        HeadlessSurface::new(),
        Rc::clone(&store),
        Rc::clone(&store),
    );
    let events = editor.subscribe();
    editor.open(page.clone()).await?;

    let first = editor.model().buffer.line_text(1).unwrap_or_default();
    let edited = format!("{first} (edited)");
    editor.surface_mut().type_line(1, &edited);
    editor.dispatch(Message::LineEdited { line: 1, text: edited })?;

    let last = editor.model().buffer.line_count();
    editor.surface_mut().set_caret(last, usize::MAX);
    editor.dispatch(Message::Paste(ClipboardData::html(
        r#"<a href="https://example.com/">example</a>"#,
        "example",
    )))?;
    editor.dispatch(Message::Paste(ClipboardData::files(vec![ClipboardFile::new(
        "pixel.png",
        "image/png",
        b"\x89PNG\r\n\x1a\n".to_vec(),
    )])))?;
    editor.settle().await?;
    editor.detach();

    for event in events.try_iter() {
        println!("{}", serde_json::to_string(&event)?);
    }
    let snapshot = store.load(&page).await?;
    if let Some(revision) = snapshot.revision {
        println!("stored revision: {revision}");
    }
    println!();
    print!("{}", snapshot.body);
    Ok(())
}
