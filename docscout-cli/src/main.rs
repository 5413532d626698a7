use clap::{Parser, Subcommand};
use colored::Colorize;
use docscout::{
    catalog, search::CollectingReporter, CliOverrides, ResultSet, Scan, SearchConfig, SearchError,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{num::NonZeroUsize, path::PathBuf, thread, time::Duration};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

/// How often the progress bar samples the running scan
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Widest match shown in the table before it is shortened
const MAX_MATCH_WIDTH: usize = 40;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchConfig {
    /// Pattern to search for (regular expression, case-insensitive)
    #[arg(short = 'p', long = "pattern")]
    pattern: String,

    /// Root directory to search in [default: .]
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// File extensions to include (e.g. txt,csv,xlsx)
    #[arg(short = 'e', long)]
    extensions: Option<String>,

    /// Catalog category to include, by name or number (repeatable)
    #[arg(short = 'c', long = "category")]
    categories: Vec<String>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Characters of context on each side of a text match
    #[arg(long)]
    context: Option<usize>,

    /// Search raw cell values instead of resolving shared strings
    #[arg(long)]
    raw_cells: bool,

    /// Save results as JSON into this directory
    #[arg(long)]
    save: Option<PathBuf>,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search file contents for a pattern
    Search(Box<CliSearchConfig>),

    /// List the extension categories
    Categories,
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => {
            let file_config = SearchConfig::load_from(args.config.as_deref())
                .map_err(|e| SearchError::config_error(e.to_string()))?;

            let file_extensions = args.extensions.as_ref().map(|e| {
                e.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            });

            let overrides = CliOverrides {
                pattern: Some(args.pattern),
                root_path: args.root,
                file_extensions,
                categories: (!args.categories.is_empty()).then_some(args.categories),
                ignore_patterns: (!args.ignore.is_empty()).then_some(args.ignore),
                thread_count: args.threads,
                log_level: None,
                context_chars: args.context,
                resolve_shared_strings: args.raw_cells.then_some(false),
            };
            let config = file_config.merge_with_cli(overrides);
            init_logging(&config.log_level);

            let scan = Scan::new(&config)?;
            let reporter = CollectingReporter::new();
            let result = run_with_progress(scan, &reporter, !args.no_progress)?;

            print_failures(&reporter);
            print_search_results(&result, args.stats);

            if let Some(dir) = args.save {
                let path = result.save_to_dir(&dir)?;
                println!("Results saved to {}", path.display());
            }
            Ok(())
        }
        Commands::Categories => {
            init_logging("warn");
            print_categories();
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the scan on a separate thread while this one redraws the progress bar
fn run_with_progress(
    scan: Scan,
    reporter: &CollectingReporter,
    show_progress: bool,
) -> Result<ResultSet> {
    if !show_progress {
        return scan.run(reporter);
    }

    let progress = scan.progress();
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} files")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    thread::scope(|s| {
        let handle = s.spawn(move || scan.run(reporter));
        while !handle.is_finished() {
            let snapshot = progress.snapshot();
            bar.set_length(snapshot.total as u64);
            bar.set_position(snapshot.processed as u64);
            thread::sleep(POLL_INTERVAL);
        }
        bar.finish_and_clear();
        handle
            .join()
            .map_err(|_| SearchError::worker_pool("scan thread panicked"))?
    })
}

fn print_failures(reporter: &CollectingReporter) {
    let failures = reporter.take_failures();
    if failures.is_empty() {
        return;
    }
    eprintln!(
        "{} {} files could not be read",
        "warning:".yellow(),
        failures.len()
    );
    for failure in &failures {
        eprintln!("  {}: {}", failure.path.display(), failure.message);
    }
}

fn shorten(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn print_search_results(result: &ResultSet, stats_only: bool) {
    if !stats_only && !result.is_empty() {
        let rows: Vec<(String, String, &str)> = result
            .file_results
            .iter()
            .flat_map(|file_result| {
                let name = file_result
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file_result.path.display().to_string());
                file_result.matches.iter().map(move |m| {
                    (
                        name.clone(),
                        shorten(&m.matched, MAX_MATCH_WIDTH),
                        m.context.as_str(),
                    )
                })
            })
            .collect();

        let file_width = rows
            .iter()
            .map(|(name, _, _)| name.chars().count())
            .max()
            .unwrap_or(0)
            .max("File".len());
        let match_width = rows
            .iter()
            .map(|(_, matched, _)| matched.chars().count())
            .max()
            .unwrap_or(0)
            .max("Match".len());

        println!(
            "{}  {}  {}",
            format!("{:<file_width$}", "File").bold(),
            format!("{:<match_width$}", "Match").bold(),
            "Context".bold()
        );
        for (name, matched, context) in &rows {
            println!(
                "{}  {}  {}",
                format!("{:<file_width$}", name).blue(),
                format!("{:<match_width$}", matched).green(),
                context
            );
        }
        println!();
    }

    println!(
        "Found {} matches in {} files",
        result.total_matches(),
        result.files_with_matches()
    );
}

fn print_categories() {
    println!("{}", "Available categories:".bold());
    for (i, category) in catalog::CATEGORIES.iter().enumerate() {
        println!(
            "{}. {}: {}",
            i + 1,
            category.name.blue(),
            category.extensions.join(", ")
        );
    }
    println!(
        "\n{} extensions in total",
        catalog::all_extensions().len()
    );
}
