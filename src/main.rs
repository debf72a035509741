//! quill - CLI entry point.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quill::app::{self, GenerateArgs};
use quill::backend::BackendRegistry;

/// Draft Conventional Commit messages from your staged diff with a
/// pluggable AI backend.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Draft Conventional Commit messages from your staged diff")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    generate: GenerateFlags,
}

#[derive(Args, Debug)]
struct GenerateFlags {
    /// Backend to use (e.g. openai, openrouter, ollama)
    #[arg(long)]
    backend: Option<String>,

    /// Disable size-based backend auto-selection
    #[arg(long)]
    no_auto: bool,

    /// Conventional commit type override (feat, fix, refactor, ...)
    #[arg(long = "type")]
    type_hint: Option<String>,

    /// Do not commit; just print the approved message
    #[arg(long)]
    no_commit: bool,

    /// Max tokens for generation
    #[arg(long, default_value_t = 512)]
    max_tokens: u32,

    /// Print sanitized diff and prompt; do not call a backend
    #[arg(long)]
    dry_run: bool,

    /// Max diff bytes sent to a backend (after redaction)
    #[arg(long, default_value_t = 100_000)]
    max_bytes: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure a backend interactively and select it
    Setup {
        /// Backend to configure
        #[arg(long)]
        backend: Option<String>,
    },
    /// Stop or unload local backend resources
    Down {
        /// Backend to stop
        #[arg(long)]
        backend: Option<String>,
    },
    /// Set the default backend and its model identifier
    Default {
        /// Default backend name
        #[arg(long)]
        backend: Option<String>,

        /// Model identifier to set for that backend
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = BackendRegistry::with_builtins();

    // Ctrl-C aborts any in-flight generation by dropping its future; no
    // partial commit can exist because committing happens only after
    // explicit approval.
    tokio::select! {
        result = dispatch(cli, &registry) => result,
        _ = tokio::signal::ctrl_c() => bail!("interrupted"),
    }
}

async fn dispatch(cli: Cli, registry: &BackendRegistry) -> Result<()> {
    match cli.command {
        Some(Command::Setup { backend }) => app::run_setup(registry, backend).await,
        Some(Command::Down { backend }) => app::run_down(registry, backend).await,
        Some(Command::Default { backend, model }) => {
            app::run_default(registry, backend, model).await
        }
        None => {
            let flags = cli.generate;
            app::run_generate(
                registry,
                GenerateArgs {
                    backend: flags.backend,
                    no_auto: flags.no_auto,
                    type_hint: flags.type_hint,
                    no_commit: flags.no_commit,
                    max_tokens: flags.max_tokens,
                    dry_run: flags.dry_run,
                    max_bytes: flags.max_bytes,
                },
            )
            .await
        }
    }
}
