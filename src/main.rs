use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use lore_digest::chunking::{ApproxTokenizer, Cl100kTokenizer, Chunker, DirectoryContentSource, Tokenizer};
use lore_digest::input::load_records;
use lore_digest::{build_forest, init_logger, DigestConfig};

#[derive(Parser, Debug)]
#[command(
    name = "lore-digest",
    about = "Thread mailing-list messages and split their content into token-bounded chunks"
)]
struct Cli {
    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Group records into a thread forest.
    Thread {
        /// JSON array of message records.
        #[arg(long)]
        records: PathBuf,
    },
    /// Chunk the content of every threaded message.
    Chunk {
        /// JSON array of message records.
        #[arg(long)]
        records: PathBuf,

        /// Directory holding one raw message file per Message-ID.
        #[arg(long)]
        content_dir: PathBuf,

        /// Token budget per chunk (defaults to DIGEST_MAX_TOKENS or 8000).
        #[arg(long)]
        max_tokens: Option<usize>,

        /// Count tokens with the offline estimator instead of cl100k_base.
        #[arg(long)]
        approx_tokens: bool,
    },
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), serde_json::Error> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Command::Thread { records } => {
            let forest = build_forest(load_records(&records)?);
            print_json(&forest, cli.pretty)?;
        }
        Command::Chunk {
            records,
            content_dir,
            max_tokens,
            approx_tokens,
        } => {
            let mut config = DigestConfig::from_env();
            if let Some(max_tokens) = max_tokens {
                config = config.with_max_tokens(max_tokens);
            }

            let tokenizer: Arc<dyn Tokenizer> = if approx_tokens {
                Arc::new(ApproxTokenizer)
            } else {
                Arc::new(Cl100kTokenizer::new()?)
            };

            let forest = build_forest(load_records(&records)?);
            let chunker = Chunker::new(config, tokenizer)?;
            let outcome = chunker.chunk_forest(&forest, &DirectoryContentSource::new(content_dir));

            log::info!("chunk fingerprint {}", outcome.fingerprint());
            print_json(&outcome, cli.pretty)?;
        }
    }

    Ok(())
}
