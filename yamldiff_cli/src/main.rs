mod render;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use yamldiff_common::{ensure_config, load_config, AppConfig, CompareOptions, LoadedConfig};
use yamldiff_core::{DiffReport, HtmlReport, YamlDiffEngine, DEFAULT_MIN_FAN_OUT};

#[derive(Parser)]
#[command(name = "yamldiff")]
#[command(author = "yamldiff Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Structural diff for YAML documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two YAML documents
    Diff(DiffArgs),

    /// Show the configuration file location and effective settings
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,

        /// Use the configuration file next to the executable
        #[arg(long)]
        portable: bool,
    },
}

#[derive(Args, Debug, Default)]
struct DiffArgs {
    /// Old document
    old: PathBuf,

    /// New document
    new: PathBuf,

    /// Ignore case in both mapping keys and scalar values
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Match mapping keys regardless of case
    #[arg(long)]
    ignore_key_case: bool,

    /// Compare scalar values regardless of case
    #[arg(long)]
    ignore_value_case: bool,

    /// Trim values and collapse whitespace runs before comparing
    #[arg(short = 'w', long)]
    ignore_whitespace: bool,

    /// Write an HTML report to this path
    #[arg(long, value_name = "PATH")]
    html: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Side-by-side view of old and new values
    #[arg(short = 'c', long)]
    columns: bool,

    /// Disable ANSI colors in output
    #[arg(long)]
    no_color: bool,

    /// Compare wide mappings and sequences on worker threads
    #[arg(long)]
    parallel: bool,

    /// Print the number of differences found
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Diff(args) => run_diff(args),
        Commands::Config { init, portable } => run_config(init, portable),
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_diff(args: DiffArgs) -> anyhow::Result<()> {
    // Validate paths
    if !args.old.is_file() {
        bail!("Old document does not exist: {}", args.old.display());
    }
    if !args.new.is_file() {
        bail!("New document does not exist: {}", args.new.display());
    }

    let loaded = load_config(false).context("Failed to load configuration")?;
    let config = loaded.config;
    let options = resolve_options(&config, &args);

    let mut engine = YamlDiffEngine::new().with_options(options);
    if args.parallel || config.parallel {
        engine = engine.with_parallelism(DEFAULT_MIN_FAN_OUT);
    }

    let result = engine
        .compare_files(&args.old, &args.new)
        .context("Comparison aborted")?;

    let old_name = args.old.display().to_string();
    let new_name = args.new.display().to_string();

    if let Some(html) = &args.html {
        HtmlReport::write(html, &old_name, &new_name, &result.differences)
            .with_context(|| format!("Failed to write HTML report to {}", html.display()))?;
        if !args.json {
            println!("HTML report generated to {}", html.display());
        }
    }

    if args.json {
        let report = DiffReport::build(&old_name, &new_name, &result);
        let output = serde_json::to_string_pretty(&report)?;
        println!("{output}");
        return Ok(());
    }

    if args.verbose {
        println!("Found {} differences", result.total());
    }

    let use_color = !args.no_color && !config.no_color && std::io::stdout().is_terminal();
    let output = if args.columns {
        render::render_columns(&old_name, &new_name, &result, use_color)
    } else {
        render::render_list(&result, use_color)
    };
    print!("{output}");

    info!("Found {} differences", result.total());
    Ok(())
}

/// Command-line flags switch options on; they never switch off what the
/// configuration file enabled
fn resolve_options(config: &AppConfig, args: &DiffArgs) -> CompareOptions {
    let mut options = config.compare;
    if args.ignore_case || args.ignore_key_case {
        options.case_insensitive_keys = true;
    }
    if args.ignore_case || args.ignore_value_case {
        options.case_insensitive_values = true;
    }
    if args.ignore_whitespace {
        options.ignore_whitespace = true;
    }
    options
}

fn run_config(init: bool, portable: bool) -> anyhow::Result<()> {
    let loaded = if init {
        ensure_config(portable)?
    } else {
        load_config(portable)?
    };
    print!("{}", describe_config(&loaded, init));
    Ok(())
}

fn describe_config(loaded: &LoadedConfig, init: bool) -> String {
    let status = if loaded.exists {
        "exists"
    } else if init {
        "created"
    } else {
        "not found, using defaults"
    };
    let compare = &loaded.config.compare;

    format!(
        "Config file: {} ({})\nPortable: {}\ncase_insensitive_keys = {}\ncase_insensitive_values = {}\nignore_whitespace = {}\nparallel = {}\nno_color = {}\n",
        loaded.path.display(),
        status,
        loaded.portable,
        compare.case_insensitive_keys,
        compare.case_insensitive_values,
        compare.ignore_whitespace,
        loaded.config.parallel,
        loaded.config.no_color,
    )
}
