use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use quickrag::{RagConfig, StoreBackend};
use quickrag_vector_store::EmbeddingMode;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "quickrag")]
#[command(about = "Retrieval-augmented question answering over CSV knowledge bases", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML config file (overridden by environment and flags)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Model directory (overrides QUICKRAG_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Vector store backend (overrides QUICKRAG_STORE)
    #[arg(long, global = true, value_enum)]
    store: Option<StoreArg>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EmbedMode {
    Onnx,
    Stub,
}

impl From<EmbedMode> for EmbeddingMode {
    fn from(mode: EmbedMode) -> Self {
        match mode {
            EmbedMode::Onnx => Self::Onnx,
            EmbedMode::Stub => Self::Stub,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StoreArg {
    Memory,
    Qdrant,
}

impl From<StoreArg> for StoreBackend {
    fn from(store: StoreArg) -> Self {
        match store {
            StoreArg::Memory => Self::Memory,
            StoreArg::Qdrant => Self::Qdrant,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV, chunk it and index it into the selected store
    Index(IndexArgs),

    /// Print the documents closest to a query
    Retrieve(RetrieveArgs),

    /// Answer a question from retrieved context
    Ask(AskArgs),

    /// Split a FAQ JSON export into question/answer JSON and CSV
    #[command(name = "split-json")]
    SplitJson(SplitJsonArgs),
}

#[derive(Args)]
pub struct IndexArgs {
    /// CSV file with a text, title+content, content or question+answer column
    #[arg(long)]
    pub csv: PathBuf,

    /// Only index the first N rows
    #[arg(long)]
    pub max: Option<usize>,

    /// Documents embedded per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Drop and recreate the Qdrant collection first
    #[arg(long)]
    pub recreate: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RetrieveArgs {
    /// Query text
    #[arg(long)]
    pub query: String,

    /// CSV to index first (required for the memory store)
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Number of documents to return
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Only index the first N rows
    #[arg(long)]
    pub max: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AskArgs {
    /// Question to answer
    #[arg(long)]
    pub query: String,

    /// CSV to index first (required for the memory store)
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Number of documents passed as context
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Only index the first N rows
    #[arg(long)]
    pub max: Option<usize>,

    /// Groq model (overrides GROQ_MODEL)
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args)]
pub struct SplitJsonArgs {
    /// FAQ export: JSON array of {id, title, content, category, metadata}
    #[arg(long)]
    pub input: PathBuf,

    /// Split JSON output path
    #[arg(long)]
    pub output: PathBuf,

    /// Also write the records as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

impl Cli {
    fn json_output(&self) -> bool {
        match &self.command {
            Commands::Index(args) => args.json,
            Commands::Retrieve(args) => args.json,
            Commands::Ask(_) | Commands::SplitJson(_) => false,
        }
    }

    /// Defaults, config file and environment, then global flags
    fn load_config(&self) -> Result<RagConfig> {
        let mut config = RagConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;
        if let Some(mode) = self.embed_mode {
            config.embedding.mode = mode.into();
        }
        if let Some(dir) = &self.model_dir {
            config.embedding.model_dir = dir.clone();
        }
        if let Some(store) = self.store {
            config.store = store.into();
        }
        Ok(config)
    }
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    // JSON output keeps the terminal free of progress chatter as well
    if cli.quiet || cli.json_output() {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // ORT is extremely noisy
    if !cli.verbose {
        builder.filter_module("ort", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli);

    if let Commands::SplitJson(args) = &cli.command {
        return commands::run_split_json(args);
    }

    let config = cli.load_config()?;
    match cli.command {
        Commands::Index(args) => commands::run_index(args, config, cli.quiet).await?,
        Commands::Retrieve(args) => commands::run_retrieve(args, config).await?,
        Commands::Ask(args) => commands::run_ask(args, config).await?,
        Commands::SplitJson(_) => {}
    }

    Ok(())
}
