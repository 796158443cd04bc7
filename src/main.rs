use chat_page_export::config::{self, ExportConfig, ExportOptions};
use chat_page_export::delivery::DirectoryDelivery;
use chat_page_export::export::{self, ExportPlan, ExportReport};
use chat_page_export::source::PageCapture;
use chrono::Local;
use clap::Parser;
use eyre::{Context, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Export a captured chat page into text, code and snapshot artifacts.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Page capture JSON produced by the browser extension.
    #[arg(value_name = "CAPTURE")]
    capture: PathBuf,

    /// Directory to write artifacts into.
    /// Defaults to ./chat-page-export if not set in config.
    #[arg(value_name = "TARGET_DIR")]
    target_dir: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/chat-page-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Leading component of artifact names (e.g. "chatgpt").
    #[arg(long, value_name = "NAME")]
    app: Option<String>,

    /// Leave the YAML frontmatter out of the markdown export.
    #[arg(long)]
    no_frontmatter: bool,

    /// Overwrite artifacts that already exist in the target directory.
    #[arg(short, long)]
    force: bool,

    /// Build everything but only print what would be written.
    #[arg(long)]
    dry_run: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors.
    #[arg(short, long)]
    quiet: bool,
}

fn verbosity_level(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// `RUST_LOG` when set, otherwise the `-v`/`-q` level.
fn log_filter(rust_log: Option<&str>, verbose: u8, quiet: bool) -> EnvFilter {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::default().add_directive(verbosity_level(verbose, quiet).into()),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), verbose, quiet))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_plan(plan: &ExportPlan) {
    for artifact in &plan.artifacts {
        println!(
            "would write {} ({}, {} bytes)",
            artifact.name,
            artifact.mime_type(),
            artifact.data.len()
        );
    }
    for name in &plan.code_files {
        println!("  {:<10} {}", name.kind, name.file_name);
    }
}

fn print_report(report: &ExportReport) {
    println!("Export done.");
    for name in &report.delivered {
        println!("- {}", name);
    }
    if report.code_archive_skipped {
        println!("- (no code zip)");
    }
    println!("code blocks: {}", report.code_blocks);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // 1. Load config file (CLI path > default path)
    let file_cfg = config::load_file_config(cli.config.as_deref())?;

    // 2. Resolve target_dir (CLI > Config > Default)
    let target_dir = cli
        .target_dir
        .or_else(|| file_cfg.target_dir.clone())
        .unwrap_or_else(|| PathBuf::from("chat-page-export"));

    // 3. Build the Export Config
    let config = ExportConfig {
        capture_path: cli.capture,
        target_dir,
        force: cli.force,
        dry_run: cli.dry_run,
        options: ExportOptions::resolve(&file_cfg, cli.app, cli.no_frontmatter),
    };

    // 4. Run the Business Logic
    let capture = PageCapture::from_path(&config.capture_path)
        .wrap_err("Could not load page capture")?;
    let plan = export::plan(&capture, &config.options, Local::now().fixed_offset())
        .wrap_err("Failed to build export")?;

    if config.dry_run {
        print_plan(&plan);
        return Ok(());
    }

    let mut delivery = DirectoryDelivery::new(&config.target_dir, config.force);
    let report = export::deliver(plan, &mut delivery).wrap_err_with(|| {
        format!("Export into {} failed", config.target_dir.display())
    })?;

    if !cli.quiet {
        print_report(&report);
    }
    Ok(())
}
