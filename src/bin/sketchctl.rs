use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use line_sketch::batch::{load_items, BatchDriver};
use line_sketch::history::{HistoryStore, JsonFileBackend};
use line_sketch::prompt::{LineThickness, ProcessingParams, Style};
use line_sketch::replicate::PredictionApi;
use line_sketch::{Config, Credential, JobOrchestrator, PromptComposer, ReplicateClient};

#[derive(Parser, Debug)]
#[command(name = "sketchctl", about = "Turn photos into line art via Replicate", version)]
struct Cli {
    /// Override REPLICATE_API_URL
    #[arg(global = true, long)]
    api_url: Option<String>,

    /// Override HISTORY_PATH
    #[arg(global = true, long, value_name = "PATH")]
    history_path: Option<String>,

    /// API token; takes precedence over REPLICATE_API_TOKEN
    #[arg(global = true, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct StyleArgs {
    /// pencil, modern or experimental (unknown values use pencil)
    #[arg(long, default_value = "pencil")]
    style: String,
    /// thin, normal or thick
    #[arg(long, default_value = "normal")]
    thickness: String,
    /// Keep soft shading instead of pure outlines
    #[arg(long)]
    preserve_shading: bool,
}

impl StyleArgs {
    fn params(&self) -> ProcessingParams {
        ProcessingParams {
            style: Style::from_key(&self.style),
            line_thickness: LineThickness::from_key(&self.thickness),
            preserve_shading: self.preserve_shading,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert one or more images
    Generate {
        /// Image files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        style: StyleArgs,
        /// Jobs in flight at once (defaults to BATCH_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Do not record results in the history
        #[arg(long)]
        no_history: bool,
    },
    /// Print the composed request for a parameter set
    Prompt {
        #[command(flatten)]
        style: StyleArgs,
        /// Output the full request template as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available styles
    Styles,
    /// Local history of results
    History {
        #[command(subcommand)]
        cmd: HistoryCmd,
    },
    /// API token utilities
    Token {
        #[command(subcommand)]
        cmd: TokenCmd,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCmd {
    /// Show records, newest first
    List {
        /// Output raw JSON instead of lines
        #[arg(long)]
        json: bool,
    },
    /// Show one record as JSON
    Show { id: String },
    /// Delete one record (no-op when absent)
    Delete { id: String },
    /// Delete all records
    Clear,
}

#[derive(Subcommand, Debug)]
enum TokenCmd {
    /// Check the token format and ask the API whether it is accepted
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = Config::new()?;
    if let Some(url) = cli.api_url {
        conf.replicate_api_url = url;
    }
    if let Some(path) = cli.history_path {
        conf.history_path = path;
    }
    let caller_token = cli.token.as_deref().and_then(Credential::new);

    match cli.command {
        Commands::Generate { files, style, concurrency, no_history } => {
            let params = style.params();
            let client = ReplicateClient::new(conf.replicate_api_url.clone());
            let orchestrator = Arc::new(JobOrchestrator::new(
                Arc::new(client),
                conf.poll_policy(),
                conf.default_credential(),
            ));
            let history = if no_history {
                None
            } else {
                Some(Arc::new(HistoryStore::open(Box::new(JsonFileBackend::new(&conf.history_path)))?))
            };

            let (items, skipped) = load_items(&files).await;
            for (path, e) in &skipped {
                eprintln!("{}\t{}: {}", path.display(), e.user_message(), e.detail());
            }

            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Cancelling...");
                    trigger.cancel();
                }
            });

            let driver = BatchDriver::new(orchestrator, history)
                .with_concurrency(concurrency.unwrap_or(conf.batch_concurrency));
            let outcomes = driver.run(items, &params, caller_token.as_ref(), &cancel).await;

            let mut failed = skipped.len();
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(url) => println!("{}\t{}\t{}", outcome.filename, outcome.id, url),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}\t{}: {}", outcome.filename, e.user_message(), e.detail());
                    }
                }
                if let Some(e) = &outcome.history_error {
                    eprintln!("Warning: {} not saved to history: {}", outcome.filename, e);
                }
            }
            if failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Prompt { style, json } => {
            let template = PromptComposer::new().compose(&style.params());
            if json {
                println!("{}", serde_json::to_string_pretty(&template)?);
            } else {
                println!("{}", template.prompt);
            }
            Ok(())
        }
        Commands::Styles => {
            for profile in PromptComposer::new().styles() {
                println!("{}\t{}", profile.style.key(), profile.model_version);
            }
            Ok(())
        }
        Commands::History { cmd } => {
            let store = HistoryStore::open(Box::new(JsonFileBackend::new(&conf.history_path)))?;
            match cmd {
                HistoryCmd::List { json } => {
                    let records = store.list().await;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    } else {
                        for r in records {
                            println!(
                                "{}\t{}\t{}\t{}\t{}",
                                r.created_at.to_rfc3339(),
                                r.id,
                                r.params.style.key(),
                                r.filename,
                                r.result_image_ref
                            );
                        }
                    }
                }
                HistoryCmd::Show { id } => match store.get(&id).await {
                    Some(r) => println!("{}", serde_json::to_string_pretty(&r)?),
                    None => {
                        eprintln!("No history record with id={}", id);
                        std::process::exit(1);
                    }
                },
                HistoryCmd::Delete { id } => {
                    if store.delete(&id).await? {
                        println!("Deleted {}", id);
                    } else {
                        println!("Nothing to delete for {}", id);
                    }
                }
                HistoryCmd::Clear => {
                    store.clear().await?;
                    println!("History cleared");
                }
            }
            Ok(())
        }
        Commands::Token { cmd } => match cmd {
            TokenCmd::Check => {
                let default = conf.default_credential();
                let credential = Credential::resolve(caller_token.as_ref(), default.as_ref())?;
                if !credential.has_expected_prefix() {
                    eprintln!("Warning: token {} does not start with 'r8_'", credential.masked());
                }
                let client = ReplicateClient::new(conf.replicate_api_url.clone());
                if client.verify_credential(&credential).await? {
                    println!("Token {} is valid", credential.masked());
                    Ok(())
                } else {
                    eprintln!("Token {} was rejected", credential.masked());
                    std::process::exit(1);
                }
            }
        },
    }
}
