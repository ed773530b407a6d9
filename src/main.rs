use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tastematch::tables::{load_items, load_reviews, load_scene_table};
use tastematch::{
    BuildConfig, NumericPolicy, Recommender, Relevance, SceneTable, SimpleKeywordExtractor,
    Snapshot, SnapshotBuilder, SnapshotHandle, SnapshotManager, VectorizerConfig,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Content-based recommendations over an item catalogue
#[derive(Parser, Debug)]
#[command(name = "tastematch")]
#[command(about = "Content-based item recommendation", long_about = None)]
struct Args {
    /// Build configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Item table (.csv, .json or .jsonl); when given the snapshot is rebuilt
    #[arg(long, global = true)]
    items: Option<PathBuf>,

    /// Review table used for tags
    #[arg(long, global = true)]
    reviews: Option<PathBuf>,

    /// Scene table (JSON object of scene -> item names)
    #[arg(long, global = true)]
    scenes: Option<PathBuf>,

    /// Directory holding snapshot files
    #[arg(long, global = true, default_value = "./data/snapshots")]
    snapshot_dir: PathBuf,

    /// Dense model id (e.g. hash-384); overrides the configured vectorizer
    #[arg(long, global = true, conflicts_with = "max_features")]
    model: Option<String>,

    /// TF-IDF vocabulary cap; overrides the configured vectorizer
    #[arg(long, global = true)]
    max_features: Option<usize>,

    /// Replace malformed numeric fields with 0 instead of failing
    #[arg(long, global = true)]
    coerce_numeric: bool,

    /// Language of the reviews used for tags
    #[arg(long, global = true)]
    review_language: Option<String>,

    /// Log level; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a snapshot from --items and save it
    Build,
    /// Items most similar to a named item
    Similar {
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        name: Option<String>,
        #[arg(long)]
        id: Option<String>,
        #[arg(short, default_value_t = 10)]
        k: usize,
    },
    /// Text-space search over keywords
    Search {
        #[arg(required = true)]
        keywords: Vec<String>,
        #[arg(short, default_value_t = 10)]
        k: usize,
    },
    /// Extract keywords from a free-text request and search with them
    Recommend {
        text: String,
        #[arg(short, default_value_t = 10)]
        k: usize,
    },
    /// Ranking metrics with every relevant item as a query
    Evaluate {
        /// Cutoffs
        #[arg(long, value_delimiter = ',', default_values_t = [1usize, 5, 10])]
        ks: Vec<usize>,
        /// Rating threshold for the rating-based relevance
        #[arg(long, default_value_t = 4.5)]
        min_rating: f32,
    },
    /// List saved snapshots
    Snapshots,
}

#[derive(Serialize)]
struct EvaluationReport {
    relevance: String,
    metrics: Vec<tastematch::RankingMetrics>,
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Config file values with command-line overrides applied.
fn build_config(args: &Args) -> anyhow::Result<BuildConfig> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(model) = &args.model {
        config.vectorizer = VectorizerConfig::Dense {
            model: model.clone(),
        };
    }
    if let Some(max_features) = args.max_features {
        config.vectorizer = VectorizerConfig::Tfidf {
            max_features: Some(max_features),
        };
    }
    if args.coerce_numeric {
        config.numeric_policy = NumericPolicy::CoerceToZero;
    }
    if let Some(language) = &args.review_language {
        config.review_language = language.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_snapshot(args: &Args) -> anyhow::Result<Option<Snapshot>> {
    let Some(items_path) = &args.items else {
        return Ok(None);
    };
    let config = build_config(args)?;
    let items = load_items(items_path)?;
    let reviews = match &args.reviews {
        Some(path) => load_reviews(path)?,
        None => Vec::new(),
    };
    let snapshot = SnapshotBuilder::new(config)?.build(items, &reviews)?;
    Ok(Some(snapshot))
}

/// Fresh build when --items is given, otherwise the newest saved snapshot.
fn obtain_snapshot(args: &Args) -> anyhow::Result<Snapshot> {
    if let Some(snapshot) = build_snapshot(args)? {
        return Ok(snapshot);
    }
    let manager = SnapshotManager::new(&args.snapshot_dir)?;
    match manager.load_latest()? {
        Some(snapshot) => Ok(snapshot),
        None => bail!(
            "No snapshot in {}; pass --items or run `build` first",
            args.snapshot_dir.display()
        ),
    }
}

fn recommender(args: &Args, k: usize) -> anyhow::Result<Recommender> {
    let snapshot = obtain_snapshot(args)?;
    let scenes = match &args.scenes {
        Some(path) => load_scene_table(path)?,
        None => SceneTable::default(),
    };
    Ok(Recommender::new(Arc::new(SnapshotHandle::with_snapshot(snapshot)))
        .with_scenes(scenes)
        .with_k(k))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;
    info!("Starting tastematch v{}", env!("CARGO_PKG_VERSION"));

    match &args.command {
        Command::Build => {
            let Some(snapshot) = build_snapshot(&args)? else {
                bail!("`build` needs --items");
            };
            let manager = SnapshotManager::new(&args.snapshot_dir)?;
            let description = manager.save(&snapshot)?;
            print_json(&description)?;
        }
        Command::Similar { name, id, k } => {
            let recommender = recommender(&args, *k)?;
            let response = match (name, id) {
                (Some(name), _) => recommender.lookup_by_name(name)?,
                (None, Some(id)) => recommender.lookup_by_id(id)?,
                (None, None) => bail!("pass --name or --id"),
            };
            if !response.is_found() {
                warn!("No item matches {:?}", response.query);
            }
            print_json(&response)?;
        }
        Command::Search { keywords, k } => {
            let response = recommender(&args, *k)?.lookup_by_keywords(keywords.as_slice())?;
            print_json(&response)?;
        }
        Command::Recommend { text, k } => {
            let response =
                recommender(&args, *k)?.recommend(text, &SimpleKeywordExtractor::default())?;
            print_json(&response)?;
        }
        Command::Evaluate { ks, min_rating } => {
            let snapshot = obtain_snapshot(&args)?;
            let mut reports = Vec::new();
            for relevance in [
                Relevance::MinRating(*min_rating),
                Relevance::MedianReviewCount,
            ] {
                let metrics = snapshot.evaluate_at(relevance, ks)?;
                for row in &metrics {
                    info!("{}: {}", relevance, row.report());
                }
                reports.push(EvaluationReport {
                    relevance: relevance.to_string(),
                    metrics,
                });
            }
            print_json(&reports)?;
        }
        Command::Snapshots => {
            let manager = SnapshotManager::new(&args.snapshot_dir)?;
            print_json(&manager.list()?)?;
        }
    }

    Ok(())
}
