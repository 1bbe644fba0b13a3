//! Summarize or auto-tag one article against a live provider.
//!
//! Provider settings come from the environment (or `.env`); see
//! [`config::Settings::from_env`]. Without `--file` a built-in demo article
//! is used.

mod config;
mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use enrich_blocks::{
    DispatchOutcome, HostStore, HttpProviderFactory, RequestDispatcher, RequestKind,
};
use enrich_core::init_observability;

use crate::config::Settings;
use crate::demo::{DEMO_ENTITY, DemoArticle, seeded_host};

#[derive(Parser, Debug)]
#[command(name = "enrich", version, about = "LLM summaries and tags for articles")]
struct Cli {
    /// Article content (HTML or plain text). Defaults to a built-in article.
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Article title. Defaults to the file name.
    #[arg(long, global = true)]
    title: Option<String>,

    /// Provider kind: openai, ollama, or another NDJSON-speaking name.
    #[arg(long, global = true, env = "ENRICH_PROVIDER")]
    provider: Option<String>,

    /// Model name sent with each request.
    #[arg(long, global = true, env = "ENRICH_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream a summary and print the rendered HTML.
    Summarize {
        /// Print the raw markdown instead of HTML.
        #[arg(long)]
        markdown: bool,
    },
    /// Request a whole summary and print it as a TL;DR block.
    Tldr,
    /// Suggest labels and tags and apply them to the article.
    Autotag,
    /// Send a tiny request to check provider settings.
    TestConnection,
}

impl Cli {
    /// Environment settings with the provider and model resolved by clap.
    fn settings(&self) -> Settings {
        Settings {
            provider: self.provider.clone(),
            model: self.model.clone(),
            ..Settings::from_env()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_env();
    init_observability();
    let cli = Cli::parse();

    let settings = cli.settings();

    let article = match &cli.file {
        Some(path) => DemoArticle::from_file(path, cli.title.clone())?,
        None => DemoArticle::default(),
    };
    let host = seeded_host(article);
    for kind in [RequestKind::Summary, RequestKind::Tagging] {
        host.set_parameters(kind, settings.parameters(kind));
    }
    let store: Arc<dyn HostStore> = host.clone();
    let dispatcher = RequestDispatcher::new(store, Arc::new(HttpProviderFactory));

    match cli.command {
        Command::Summarize { markdown } => {
            let text = completed(dispatcher.summarize(DEMO_ENTITY).await)?;
            if markdown {
                println!("{text}");
            } else if let Some(slot) = dispatcher.presenter(&DEMO_ENTITY) {
                let presenter = slot.lock().await;
                println!("{}", presenter.html());
            }
        }
        Command::Tldr => {
            let html = completed(dispatcher.summarize_once(DEMO_ENTITY).await)?;
            println!("{html}");
        }
        Command::Autotag => {
            let applied = completed(dispatcher.autotag(DEMO_ENTITY).await)?;
            if applied.fallback {
                println!("(model answered in free text; labels are a best guess)");
            }
            println!("{}", applied.message());
            let tags = host.tags(&DEMO_ENTITY).unwrap_or_default();
            println!("tags now: {}", tags.join(", "));
        }
        Command::TestConnection => {
            let params = settings.parameters(RequestKind::Summary);
            match dispatcher.test_connection(&params).await {
                Ok(reply) => {
                    info!(event = "cli.connection_ok", domain = "cli", provider = %params.provider_kind);
                    println!("API connection successful");
                    println!("response: {}", reply.trim());
                }
                Err(err) => return Err(err.user_message().into()),
            }
        }
    }
    Ok(())
}

fn completed<T>(outcome: DispatchOutcome<T>) -> Result<T, Box<dyn std::error::Error>> {
    match outcome {
        DispatchOutcome::Completed(value) => Ok(value),
        DispatchOutcome::Failed { message } => Err(message.into()),
        DispatchOutcome::AlreadyInFlight => Err("a request is already running".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn provider_and_model_fall_back_to_env() {
        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .and_then(|name| name.to_str())
                .map(str::to_string)
        };
        assert_eq!(env_of("provider").as_deref(), Some("ENRICH_PROVIDER"));
        assert_eq!(env_of("model").as_deref(), Some("ENRICH_MODEL"));
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::try_parse_from([
            "enrich",
            "autotag",
            "--provider",
            "ollama",
            "--model",
            "llama3.1",
        ])
        .expect("args");
        assert!(matches!(cli.command, Command::Autotag));
        let settings = cli.settings();
        assert_eq!(settings.provider.as_deref(), Some("ollama"));
        assert_eq!(settings.model.as_deref(), Some("llama3.1"));
    }
}
