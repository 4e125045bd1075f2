//! tutorgrade CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tutorgrade",
    version,
    about = "Learner performance aggregation and pedagogical feedback"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Scoring options shared by `score` and `simulate`.
#[derive(Args, Debug, Clone)]
pub struct ScoringArgs {
    /// Question catalog (path or URL; .yml, .json or ENEM .jsonl)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Pedagogy file with feedback types and rules (path or URL)
    #[arg(long)]
    pub pedagogy: Option<String>,

    /// Topic review threshold in percent
    #[arg(long)]
    pub threshold_topics: Option<f64>,

    /// Area focus threshold in percent
    #[arg(long)]
    pub threshold_areas: Option<f64>,

    /// Max learners scored concurrently
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Output format: text, table, json, markdown
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score learners' answers and print feedback
    Score {
        /// Learners file (path or URL)
        #[arg(long)]
        learners: Option<String>,

        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Generate synthetic learners and score them
    Simulate {
        /// Number of learners to generate
        #[arg(long, default_value = "10")]
        count: usize,

        /// Probability of answering a question correctly
        #[arg(long, default_value = "0.5")]
        accuracy: f64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Validate catalog, pedagogy and domain files
    Validate {
        #[arg(long)]
        catalog: Option<String>,

        #[arg(long)]
        pedagogy: Option<String>,

        /// Domain hierarchy to check topic paths against
        #[arg(long)]
        domain: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List feedback rules in readable form
    Rules {
        #[arg(long)]
        pedagogy: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the domain hierarchy
    Domain {
        #[arg(long)]
        domain: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and sample data files
    Init,
}

#[tokio::main]
async fn main() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "tutorgrade=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score { learners, scoring } => commands::score::execute(learners, scoring).await,
        Commands::Simulate {
            count,
            accuracy,
            seed,
            scoring,
        } => commands::simulate::execute(count, accuracy, seed, scoring).await,
        Commands::Validate {
            catalog,
            pedagogy,
            domain,
            config,
        } => commands::validate::execute(catalog, pedagogy, domain, config).await,
        Commands::Rules { pedagogy, config } => commands::rules::execute(pedagogy, config).await,
        Commands::Domain { domain, config } => commands::domain::execute(domain, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
