use cardsheet::config::{self, SheetConfig};
use cardsheet::export::{ExportFormat, ExportMode};
use cardsheet::imaging::{ImageSource, RustBackend, identify_all};
use cardsheet::output::{self, CheckEntry};
use cardsheet::plan;
use cardsheet::render::Side;
use cardsheet::render::html::{self, PreviewView};
use cardsheet::session::Session;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    if env!("CARDSHEET_RELEASE") == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let commit = env!("CARDSHEET_COMMIT");
        if commit.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{commit}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "cardsheet")]
#[command(about = "Lay out trading cards on a print sheet and export PDF or 300 DPI PNG")]
#[command(long_about = "\
Lay out trading cards on a print sheet and export PDF or 300 DPI PNG

Cards are 2.5in x 3.5in with a 0.125in gap, centered on the page:

  letter      3x3 cards on 8.5in x 11in, slots 1-9 in reading order
  photo-4x6   one card on a 4in x 6in photo print, slot 1

A sheet plan lists what goes where (slots in the plan file are 0-based):

  layout = \"letter\"
  border = true

  [[card]]
  slot = 0
  front = \"images/dragon.png\"
  back = \"images/logo.png\"

Back pages are mirrored column-wise, so after printing the fronts, flipping
the sheet left-to-right and printing the backs, every back lands behind its
front.

Run 'cardsheet gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Sheet(SheetCommand),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Commands that build a sheet from a plan and therefore need the config.
#[derive(Subcommand)]
enum SheetCommand {
    /// Show the sheet a plan builds and verify every image can be read
    Check {
        /// Sheet plan (TOML)
        plan: PathBuf,
    },
    /// Export a print-ready PDF or 300 DPI PNG
    Export {
        /// Sheet plan (TOML)
        plan: PathBuf,
        /// front, back, or both (both is PDF only)
        #[arg(long, default_value = "front")]
        mode: ExportMode,
        /// pdf or png
        #[arg(long, default_value = "pdf")]
        format: ExportFormat,
        /// Output directory (overrides [export] output_dir)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the export report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write the print-preview HTML document
    Preview {
        /// Sheet plan (TOML)
        plan: PathBuf,
        /// all, fronts, or backs
        #[arg(long, default_value = "all")]
        view: PreviewView,
        /// Output file
        #[arg(long, default_value = "print-preview.html")]
        out: PathBuf,
    },
    /// Write the on-screen grid markup for one side
    Grid {
        /// Sheet plan (TOML)
        plan: PathBuf,
        /// front or back
        #[arg(long, default_value = "front")]
        side: Side,
        /// Output file
        #[arg(long, default_value = "grid.html")]
        out: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::GenConfig => print!("{}", config::stock_config_toml()),
        Command::Sheet(command) => {
            let sheet_config = match &cli.config {
                Some(path) => config::load_config_file(path)?,
                None => config::load_config(Path::new("."))?,
            };
            init_thread_pool(&sheet_config.processing);
            run(command, &sheet_config)?;
        }
    }

    Ok(())
}

fn run(command: SheetCommand, sheet_config: &SheetConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SheetCommand::Check { plan } => {
            let session = build_session(sheet_config, &plan)?;
            let entries = check_images(&session);
            output::print_check(session.state(), &entries);
        }
        SheetCommand::Export {
            plan,
            mode,
            format,
            out,
            json,
        } => {
            let session = build_session(sheet_config, &plan)?;
            let artifact = session.request_export(mode, format)?;
            let dir = out.unwrap_or_else(|| sheet_config.export.output_dir.clone());
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(&artifact.filename);
            std::fs::write(&path, &artifact.bytes)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&artifact.report)?);
            } else {
                output::print_export_report(&artifact, &path);
            }
        }
        SheetCommand::Preview { plan, view, out } => {
            let session = build_session(sheet_config, &plan)?;
            let markup = html::render_print_preview(session.state(), view).into_string();
            std::fs::write(&out, &markup)?;
            println!("{}", output::format_written("preview", &out, markup.len()));
        }
        SheetCommand::Grid { plan, side, out } => {
            let session = build_session(sheet_config, &plan)?;
            let markup = html::render_grid(session.state(), side, sheet_config.preview.screen_dpi)
                .into_string();
            std::fs::write(&out, &markup)?;
            println!("{}", output::format_written("grid", &out, markup.len()));
        }
    }
    Ok(())
}

/// Warnings (failed images) always reach stderr; `--verbose` adds debug detail.
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn build_session(
    sheet_config: &SheetConfig,
    plan_path: &Path,
) -> Result<Session, Box<dyn std::error::Error>> {
    let loaded = plan::load_plan(plan_path)?;
    let mut session = Session::new(sheet_config.initial_state())
        .with_export_options(sheet_config.export_options());
    loaded.apply(&mut session)?;
    Ok(session)
}

/// Identify every library image and every addressable back image.
fn check_images(session: &Session) -> Vec<CheckEntry> {
    let state = session.state();
    let mut jobs: Vec<(String, ImageSource)> = state
        .library()
        .iter()
        .map(|card| (card.display_name.clone(), card.source.clone()))
        .collect();
    for slot in 0..state.layout().capacity() {
        if let Some(back) = state.back(slot) {
            jobs.push((format!("back of {:0>3}", slot + 1), back.clone()));
        }
    }
    let sizes: Vec<usize> = jobs.iter().map(|(_, source)| source.len()).collect();

    identify_all(&RustBackend::new(), jobs)
        .into_iter()
        .zip(sizes)
        .map(|((label, result), bytes)| CheckEntry {
            label,
            bytes,
            result,
        })
        .collect()
}
