use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use metaclean::config::Config;
use metaclean::events::{Command, InputEvent};
use metaclean::form::Form;
use metaclean::render::{self, DirectorySink, MetadataView, RenderedAnalysis};
use metaclean::staging::{self, Mode, StagedFile};
use metaclean::transport::HttpTransport;
use metaclean::view::ResultPanel;

#[derive(Parser, Debug)]
#[command(
    name = "metaclean",
    version,
    about = "Inspect file metadata or download copies with metadata removed"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Action>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Override the metadata service URL
    #[arg(long, value_name = "URL", global = true)]
    server: Option<String>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Show the embedded metadata of one file
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Strip metadata and save the cleaned file (or a zip for several)
    Remove {
        /// Files or directories to clean
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Directory to save the download into
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let Some(action) = cli.command else {
        anyhow::bail!("No command specified. Use --help for usage.");
    };

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }

    let transport = HttpTransport::new(&config.server.base_url, config.server.timeout())?;
    log::debug!("Service: {}", config.server.base_url);

    let (mut form, sink) = match action {
        Action::Analyze { file } => {
            if !file.is_file() {
                anyhow::bail!("Not a file: {}", file.display());
            }
            let mut form = Form::new(Mode::Single, config.labels.analyze.clone());
            form.dispatch(InputEvent::PickerChanged(vec![StagedFile::new(file)]));
            (form, DirectorySink::new(&config.output.download_dir))
        }
        Action::Remove { paths, output } => {
            let files = staging::collect_files(&paths);
            if files.is_empty() {
                anyhow::bail!("No files found in the specified paths.");
            }
            log::info!("Found {} file(s) to clean", files.len());
            let mut form = Form::new(Mode::Multi, config.labels.remove.clone());
            form.dispatch(InputEvent::PickerChanged(files));
            let dir = output.unwrap_or_else(|| config.output.download_dir.clone());
            (form, DirectorySink::new(dir))
        }
    };

    for name in form.staging().display_names() {
        log::info!("  {name}");
    }

    if form.dispatch(InputEvent::Submit).command == Some(Command::Submit) {
        log::info!("{}", form.trigger().label());
        let submitted = form.submit(&transport, &sink).await;
        if let Err(e) = submitted {
            if cli.json {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            }
            log::error!("{}", form.view().status().text(form.mode()));
            return Err(e.into());
        }
    }

    print_panel(form.view().panel(), cli.json)?;
    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Width of the metadata table.
const TABLE_WIDTH: usize = 72;

fn print_panel(panel: &ResultPanel, json: bool) -> Result<()> {
    match panel {
        ResultPanel::Analysis(rendered) if json => {
            println!("{}", serde_json::to_string_pretty(&analysis_json(rendered))?);
        }
        ResultPanel::Analysis(rendered) => print_analysis(rendered),
        ResultPanel::Downloaded { filename, path } if json => {
            println!(
                "{}",
                serde_json::json!({ "filename": filename, "path": path.display().to_string() })
            );
        }
        ResultPanel::Downloaded { path, .. } => {
            println!("{GREEN}Saved{RESET} {}", path.display());
        }
        ResultPanel::Empty | ResultPanel::Error(_) => {}
    }
    Ok(())
}

fn analysis_json(rendered: &RenderedAnalysis) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = match &rendered.body {
        MetadataView::Empty => Vec::new(),
        MetadataView::Tree(rows) => rows
            .iter()
            .map(|row| match row {
                render::Row::Group { key, depth } => {
                    serde_json::json!({ "group": key, "depth": depth })
                }
                render::Row::Leaf { key, value, depth } => {
                    serde_json::json!({ "key": key, "value": value, "depth": depth })
                }
            })
            .collect(),
    };
    serde_json::json!({
        "filename": rendered.filename,
        "mimetype": rendered.mimetype,
        "rows": rows,
    })
}

/// Print an analysis as a title, file info, and the metadata table.
fn print_analysis(rendered: &RenderedAnalysis) {
    println!();
    println!("{BOLD}{}{RESET}", rendered.title);
    println!("{DIM}{}{RESET}", "═".repeat(TABLE_WIDTH));
    println!("  {:<22} : {}", "File name", rendered.filename);
    println!("  {:<22} : {}", "MIME type", rendered.mimetype);
    println!("{DIM}{}{RESET}", "─".repeat(TABLE_WIDTH));

    match &rendered.body {
        MetadataView::Empty => println!("  {DIM}({}){RESET}", render::NO_METADATA),
        MetadataView::Tree(rows) => {
            for line in render::layout_rows(rows, TABLE_WIDTH - 2) {
                println!("  {line}");
            }
        }
    }
    println!();
}
