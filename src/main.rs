use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;
use storefit::config::{self, StoreConfig};
use storefit::process::{ProcessEvent, ProcessReport};
use storefit::{listing, output, process, scan};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "storefit")]
#[command(about = "Render app store screenshots, icons and listing text")]
#[command(long_about = "\
Render app store screenshots, icons and listing text

Raw captures are resized to cover each store canvas and center-cropped to its
exact pixel size. The logo is square-cropped and rendered at every App Store,
iOS and Android launcher size. Localized listing text is checked against the
store limits and exported for the Play Console.

Project structure:

  project/
  ├── storefit.toml                # Project config (optional)
  ├── logo.png                     # Icon source, any aspect ratio
  ├── listing.toml                 # [locales.<code>] listing text
  ├── screenshots/                 # Raw captures
  │   ├── 02_today.png             # NN_name stems set the order
  │   └── 04_detail.png
  └── store/                       # Everything storefit writes
      ├── screenshots/appstore/    # 02_today_67.png, 02_today_65.png
      ├── screenshots/playstore/   # 02_today.png
      ├── icons/                   # appstore_icon_1024.png, ios/, android/
      └── playstore/               # store_listing.json, listings/<locale>/

Set RUST_LOG to control diagnostics (e.g. RUST_LOG=storefit=trace).

Run 'storefit gen-config' to generate a documented storefit.toml.")]
#[command(version)]
struct Cli {
    /// Project config file
    #[arg(long, short, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Project root for relative paths (default: the config file's directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Show debug diagnostics on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every screenshot source onto every target canvas
    Screenshots,
    /// Render the icon set from the logo
    Icons,
    /// Validate and export the store listing
    Listing,
    /// Run everything: screenshots → icons → listing
    Build,
    /// Validate config, sources and listing without writing anything
    Check,
    /// Print a stock storefit.toml with all options documented
    GenConfig,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli.command, &cli.config, cli.root.as_deref())
}

fn run(command: Command, config_path: &Path, cli_root: Option<&Path>) -> CliResult<()> {
    match command {
        Command::Screenshots => {
            let (store_config, root) = load_project(config_path, cli_root)?;
            init_thread_pool(&store_config.processing);
            run_screenshots(&store_config, &root)?.ensure_complete()?;
        }
        Command::Icons => {
            let (store_config, root) = load_project(config_path, cli_root)?;
            run_icons(&store_config, &root)?.ensure_complete()?;
        }
        Command::Listing => {
            let (store_config, root) = load_project(config_path, cli_root)?;
            run_listing(&store_config, &root)?;
        }
        Command::Build => {
            let (store_config, root) = load_project(config_path, cli_root)?;
            init_thread_pool(&store_config.processing);
            run_build(&store_config, &root)?;
            println!("==> Build complete");
        }
        Command::Check => {
            let (store_config, root) = load_project(config_path, cli_root)?;
            run_check(&store_config, &root)?;
            println!("==> Project is valid");
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

fn load_project(config_path: &Path, cli_root: Option<&Path>) -> CliResult<(StoreConfig, PathBuf)> {
    let store_config = config::load_config(config_path)?;
    let root = resolve_root(cli_root, config_path);
    debug!(root = %root.display(), config = %config_path.display(), "loaded config");
    Ok((store_config, root))
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. The user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    debug!(threads, "initializing thread pool");
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// `--root` if given, else the directory holding the config file.
fn resolve_root(cli_root: Option<&Path>, config_path: &Path) -> PathBuf {
    if let Some(root) = cli_root {
        return root.to_path_buf();
    }
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Print progress events from worker threads as they arrive.
fn spawn_printer(rx: mpsc::Receiver<ProcessEvent>, root: PathBuf) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event, &root) {
                println!("{}", line);
            }
        }
    })
}

fn join_printer(printer: JoinHandle<()>) -> CliResult<()> {
    printer
        .join()
        .map_err(|_| "progress printer thread panicked".into())
}

fn run_screenshots(store_config: &StoreConfig, root: &Path) -> CliResult<ProcessReport> {
    let manifest = scan::scan_sources(&store_config.screenshots, root)?;
    output::print_scan_output(&manifest, &store_config.screenshots, root);

    let (tx, rx) = mpsc::channel();
    let printer = spawn_printer(rx, root.to_path_buf());
    let report =
        process::process_screenshots(&store_config.screenshots, &manifest, root, Some(tx))?;
    join_printer(printer)?;

    output::print_process_summary("Screenshots", &report, root);
    Ok(report)
}

fn run_icons(store_config: &StoreConfig, root: &Path) -> CliResult<ProcessReport> {
    let (tx, rx) = mpsc::channel();
    let printer = spawn_printer(rx, root.to_path_buf());
    let report = process::process_icons(&store_config.icons, root, Some(tx))?;
    join_printer(printer)?;

    output::print_process_summary("Icons", &report, root);
    Ok(report)
}

fn run_listing(store_config: &StoreConfig, root: &Path) -> CliResult<()> {
    let source = config::resolve_path(root, &store_config.listing.source);
    let text = listing::load_listing(&source)?;
    let violations = listing::validate(&text);
    output::print_listing_report(&text, &violations);

    let output_dir = config::resolve_path(root, &store_config.listing.output_dir);
    let written = listing::export_play_listing(&text, &output_dir)?;
    output::print_listing_export(&written, root);
    Ok(())
}

/// Every stage runs even when an earlier one fails; failures surface at the end.
fn run_build(store_config: &StoreConfig, root: &Path) -> CliResult<()> {
    let mut report = ProcessReport::default();
    let mut failed_stages = Vec::new();

    println!("==> Stage 1: Screenshots");
    match run_screenshots(store_config, root) {
        Ok(stage) => report.merge(stage),
        Err(e) => stage_failed("screenshots", e, &mut failed_stages),
    }

    println!("==> Stage 2: Icons");
    match run_icons(store_config, root) {
        Ok(stage) => report.merge(stage),
        Err(e) => stage_failed("icons", e, &mut failed_stages),
    }

    println!("==> Stage 3: Listing");
    let listing_path = config::resolve_path(root, &store_config.listing.source);
    if listing_path.is_file() {
        if let Err(e) = run_listing(store_config, root) {
            stage_failed("listing", e, &mut failed_stages);
        }
    } else {
        println!("    No listing file at {}, skipped", listing_path.display());
    }

    if !failed_stages.is_empty() {
        return Err(format!("build failed in stage(s): {}", failed_stages.join(", ")).into());
    }
    report.ensure_complete()?;
    Ok(())
}

fn stage_failed(
    stage: &'static str,
    error: Box<dyn Error>,
    failed_stages: &mut Vec<&'static str>,
) {
    warn!(stage, error = %error, "build stage failed");
    println!("    {stage} failed: {error}");
    failed_stages.push(stage);
}

fn run_check(store_config: &StoreConfig, root: &Path) -> CliResult<()> {
    println!("==> Checking {}", root.display());
    let mut problems = Vec::new();

    let manifest = scan::scan_sources(&store_config.screenshots, root)?;
    output::print_scan_output(&manifest, &store_config.screenshots, root);
    let missing = manifest.missing().count();
    if missing > 0 {
        problems.push(format!("{missing} listed screenshot source(s) missing"));
    }

    let records = process::identify_sources(&manifest, &store_config.icons, root);
    output::print_decode_report(&records, &manifest, root);
    let unreadable = records.iter().filter(|r| r.result.is_err()).count();
    if unreadable > 0 {
        problems.push(format!("{unreadable} source(s) cannot be decoded"));
    }

    let listing_path = config::resolve_path(root, &store_config.listing.source);
    if listing_path.is_file() {
        let text = listing::load_listing(&listing_path)?;
        let violations = listing::validate(&text);
        output::print_listing_report(&text, &violations);
        if !violations.is_empty() {
            problems.push(listing::ListingError::Invalid(violations).to_string());
        }
    }

    if !problems.is_empty() {
        return Err(problems.join("; ").into());
    }
    Ok(())
}
