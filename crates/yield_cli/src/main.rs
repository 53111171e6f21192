//! Cropcast command line interface
//!
//! Explore historical crop yields by country and crop, and predict one
//! future year with a GBDT model.

mod render;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cropcast_core::gbdt::{xgboost::from_xgboost_dump, Model, SCALE};
use cropcast_core::{EmptyHistory, ExplorerConfig, ExplorerState};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "cropcast")]
#[command(about = "Crop yield explorer and single-year predictor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Yield CSV, overrides the configured path
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Model JSON, overrides the configured path
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Expected BLAKE3 hash of the model artifact
    #[arg(long, global = true)]
    expected_hash: Option<String>,

    /// Years past the last observation that may be predicted
    #[arg(long, global = true)]
    horizon: Option<i32>,

    /// Policy for selections without rows: reject, global-mean or zero
    #[arg(long, global = true)]
    empty_history: Option<EmptyHistory>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List countries, crops and year bounds in the dataset
    Options {
        #[arg(long)]
        json: bool,
    },
    /// Show the yield trend for a selection
    History {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Also print the filtered rows
        #[arg(long)]
        table: bool,
        #[arg(long)]
        json: bool,
    },
    /// Predict the yield of one year from a selection
    Predict {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Year to predict (default: the year after --to)
        #[arg(long)]
        year: Option<i32>,
        /// Also print the filtered rows
        #[arg(long)]
        table: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print the BLAKE3 hash of the model artifact
    ModelHash {
        /// Store the hash next to the model as `<model>.hash`
        #[arg(long)]
        write: bool,
    },
    /// Check the model artifact against --expected-hash, the configured
    /// hash, or `<model>.hash`
    VerifyModel,
    /// Convert an XGBoost JSON dump into a model artifact
    ImportXgboost {
        /// Output of `Booster.dump_model(..., dump_format="json")`
        #[arg(long)]
        dump: PathBuf,
        /// Feature names in training order, one per line
        #[arg(long)]
        features: PathBuf,
        /// The booster's base_score, as stored in its saved config
        #[arg(long)]
        base_score: f64,
        #[arg(long, default_value_t = SCALE)]
        scale: i64,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SelectionArgs {
    #[arg(long)]
    country: String,
    #[arg(long)]
    crop: String,
    /// First year (default: first observed year)
    #[arg(long)]
    from: Option<i32>,
    /// Last year (default: last observed year)
    #[arg(long)]
    to: Option<i32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.global)?;
    init_logging(&config.logging.level, cli.global.verbose)?;
    debug!(config = ?config, "Configuration resolved");

    match cli.command {
        Commands::Options { json } => handle_options(&config, json),
        Commands::History {
            selection,
            table,
            json,
        } => handle_history(&config, &selection, table, json),
        Commands::Predict {
            selection,
            year,
            table,
            json,
        } => handle_predict(&config, &selection, year, table, json),
        Commands::ModelHash { write } => handle_model_hash(&config, write),
        Commands::VerifyModel => handle_verify_model(&config),
        Commands::ImportXgboost {
            dump,
            features,
            base_score,
            scale,
            output,
        } => handle_import_xgboost(&dump, &features, base_score, scale, &output),
    }
}

/// Config file and environment first, command line flags last
fn load_config(args: &GlobalArgs) -> Result<ExplorerConfig> {
    let mut config = ExplorerConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(path) = &args.data {
        config.data.path = path.clone();
    }
    if let Some(path) = &args.model {
        config.model.path = path.clone();
    }
    if let Some(hash) = &args.expected_hash {
        config.model.expected_hash = Some(hash.trim().to_string());
    }
    if let Some(horizon) = args.horizon {
        config.prediction.horizon_years = horizon;
    }
    if let Some(policy) = args.empty_history {
        config.prediction.empty_history = policy;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// RUST_LOG wins; otherwise the configured level, or debug with --verbose
fn init_logging(level: &str, verbose: bool) -> Result<()> {
    let fallback = if verbose { "debug" } else { level };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
        .with_context(|| format!("Invalid log level {fallback:?}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialise logging")?;
    Ok(())
}

fn load_state(config: &ExplorerConfig) -> Result<ExplorerState> {
    ExplorerState::load(config).with_context(|| {
        format!(
            "Failed to load {} and {}",
            config.data.path.display(),
            config.model.path.display()
        )
    })
}

fn handle_options(config: &ExplorerConfig, json: bool) -> Result<()> {
    let state = load_state(config)?;
    let options = state.options();
    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        print!("{}", render::render_options(&options));
    }
    Ok(())
}

fn handle_history(
    config: &ExplorerConfig,
    args: &SelectionArgs,
    table: bool,
    json: bool,
) -> Result<()> {
    let state = load_state(config)?;
    let selection = state.selection(&args.country, &args.crop, args.from, args.to);
    let history = state.history(&selection)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    print!("{}", render::render_trend(&history, render::CHART_WIDTH));
    if table {
        println!();
        print!("{}", render::render_table(&history.rows));
    }
    Ok(())
}

fn handle_predict(
    config: &ExplorerConfig,
    args: &SelectionArgs,
    year: Option<i32>,
    table: bool,
    json: bool,
) -> Result<()> {
    let state = load_state(config)?;
    let selection = state.selection(&args.country, &args.crop, args.from, args.to);
    let forecast = state.forecast(&selection, year)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
        return Ok(());
    }
    print!(
        "{}",
        render::render_trend(&forecast.history, render::CHART_WIDTH)
    );
    if table {
        println!();
        print!("{}", render::render_table(&forecast.history.rows));
    }
    println!();
    print!("{}", render::render_forecast(&forecast));
    Ok(())
}

fn handle_model_hash(config: &ExplorerConfig, write: bool) -> Result<()> {
    let path = &config.model.path;
    let model = Model::load_json(path)
        .with_context(|| format!("Failed to load model {}", path.display()))?;
    let hash = model.hash_hex()?;
    println!("{hash}");

    if write {
        let hash_path = hash_file_path(path);
        fs::write(&hash_path, format!("{hash}\n"))
            .with_context(|| format!("Failed to write {}", hash_path.display()))?;
        info!(path = %hash_path.display(), "Model hash written");
    }
    Ok(())
}

fn handle_verify_model(config: &ExplorerConfig) -> Result<()> {
    let path = &config.model.path;
    let expected = match config.model.expected_hash.clone() {
        Some(hash) => hash,
        None => {
            let hash_path = hash_file_path(path);
            fs::read_to_string(&hash_path).with_context(|| {
                format!(
                    "No expected hash given and {} could not be read",
                    hash_path.display()
                )
            })?
        }
    };

    let model = Model::load_json(path)
        .with_context(|| format!("Failed to load model {}", path.display()))?;
    let hash = model
        .verify_hash(&expected)
        .with_context(|| format!("Model {} failed verification", path.display()))?;
    println!("OK {hash} {}", path.display());
    Ok(())
}

fn handle_import_xgboost(
    dump: &Path,
    features: &Path,
    base_score: f64,
    scale: i64,
    output: &Path,
) -> Result<()> {
    let dump_json = fs::read_to_string(dump)
        .with_context(|| format!("Failed to read dump {}", dump.display()))?;
    let names = read_feature_names(features)?;
    if names.is_empty() {
        bail!("Feature list {} is empty", features.display());
    }

    let model = from_xgboost_dump(&dump_json, names, base_score, scale)
        .with_context(|| format!("Failed to convert {}", dump.display()))?;
    model
        .save_json(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} ({} trees, {} features)",
        output.display(),
        model.num_trees(),
        model.num_features()
    );
    println!("{}", model.hash_hex()?);
    Ok(())
}

/// One name per line; blank lines and `#` comments are skipped
fn read_feature_names(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read feature list {}", path.display()))?;
    Ok(parse_feature_names(&content))
}

fn parse_feature_names(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn hash_file_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.as_os_str().to_os_string();
    name.push(".hash");
    PathBuf::from(name)
}
