use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use proxtrie::{config::EngineConfig, dictionary, Engine, PenaltyModel};

#[derive(Parser)]
#[command(name = "proxtrie", about = "Parallel trie-accelerated fuzzy word search")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a dictionary/penalty pair and report trie statistics.
    BuildCheck {
        #[arg(long)]
        dictionary: PathBuf,
        #[arg(long)]
        penalty: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Load a dictionary and penalty file, then run one query.
    Query {
        #[arg(long)]
        dictionary: PathBuf,
        #[arg(long)]
        penalty: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        threads: Option<usize>,
        #[arg(long = "no-pruning", default_value_t = false)]
        no_pruning: bool,
        #[arg(long, default_value_t = false)]
        stats: bool,
        #[arg(long, default_value_t = 5)]
        n: usize,
        query: String,
    },
}

fn resolve_config(
    config_path: Option<&PathBuf>,
    threads: Option<usize>,
    no_pruning: bool,
    stats: bool,
) -> Result<EngineConfig, proxtrie::ProxtrieError> {
    let mut config = match config_path {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(t) = threads {
        config.threads = Some(t);
    }
    if no_pruning {
        config.pruning = false;
    }
    if stats {
        config.stats = true;
    }
    Ok(config)
}

fn load_dictionary(path: &PathBuf) -> Result<Vec<proxtrie::Word>, proxtrie::ProxtrieError> {
    let file = std::fs::File::open(path)?;
    dictionary::load_words(std::io::BufReader::new(file))
}

fn load_penalty(path: &PathBuf) -> Result<PenaltyModel, proxtrie::ProxtrieError> {
    let file = std::fs::File::open(path)?;
    PenaltyModel::from_reader(std::io::BufReader::new(file))
}

fn run() -> Result<(), proxtrie::ProxtrieError> {
    let cli = Cli::parse();
    match cli.command {
        Command::BuildCheck {
            dictionary,
            penalty,
            config,
            threads,
        } => {
            let engine_config = resolve_config(config.as_ref(), threads, false, false)?;
            let words = load_dictionary(&dictionary)?;
            let word_count = words.len();
            let penalty = load_penalty(&penalty)?;
            let engine = Engine::build(words, penalty, engine_config)?;
            println!("words: {word_count}");
            println!("trie nodes: {}", engine.num_nodes());
            Ok(())
        }
        Command::Query {
            dictionary,
            penalty,
            config,
            threads,
            no_pruning,
            stats,
            n,
            query,
        } => {
            let engine_config = resolve_config(config.as_ref(), threads, no_pruning, stats)?;
            let words = load_dictionary(&dictionary)?;
            let penalty = load_penalty(&penalty)?;
            let engine = Engine::build(words, penalty, engine_config)?;

            let Some(n) = NonZeroUsize::new(n) else {
                return Ok(());
            };
            for (distance, word) in engine.query(&query, n) {
                println!("{distance}\t{word}");
            }
            Ok(())
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(err) = run() {
        tracing::error!("{err}");
        process::exit(1);
    }
}
