//! Command implementations: the generate pipeline and the setup/down/default
//! maintenance flows.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::approve::{ApprovalIo, ApprovalLoop, Verdict};
use crate::backend::{BackendRegistry, Generate, SelectionPolicy, generate_with_retry};
use crate::config;
use crate::error::{BackendError, GitError, UiError};
use crate::git;
use crate::message::{
    ALLOWED_TYPES, CommitMessage, DEFAULT_TYPE, MAX_BODY_LINE_LEN, MAX_TITLE_LEN,
    NormalizeOptions, PromptSpec, build_prompt, fallback_from_diff, normalize,
};
use crate::redact::redact;
use crate::ui::{self, Spinner};

/// Flags for the root generate flow.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub backend: Option<String>,
    pub no_auto: bool,
    pub type_hint: Option<String>,
    pub no_commit: bool,
    pub max_tokens: u32,
    pub dry_run: bool,
    pub max_bytes: usize,
}

/// The full pipeline: staged diff → redaction → backend selection → prompt
/// → generation (fallback on first failure) → normalization → approval.
pub async fn run_generate(registry: &BackendRegistry, args: GenerateArgs) -> Result<()> {
    // Step 1: the staged diff is the unit of work.
    let repo = git::open_repo().context("not a git repository")?;
    let raw_diff = git::staged_diff(&repo)?;
    if raw_diff.trim().is_empty() {
        return Err(GitError::NoStagedChanges.into());
    }

    // Step 2: redact before anything leaves the process.
    let (mut safe, stats) = redact(&raw_diff);
    if stats.redacted_count > 0 {
        println!(
            "Redacted {} credential-looking snippet(s) from the diff.",
            stats.redacted_count
        );
    }
    if safe.len() > args.max_bytes {
        let mut end = args.max_bytes;
        while end > 0 && !safe.is_char_boundary(end) {
            end -= 1;
        }
        safe.truncate(end);
        safe.push_str("\n... [TRUNCATED]\n");
    }

    // Step 3: pick a backend — explicit flag, then the configured
    // selection, then the size policy.
    let cfg = config::load()?;
    let explicit = args
        .backend
        .clone()
        .or_else(|| cfg.selected_backend.clone());
    let name = if args.no_auto {
        explicit.ok_or_else(|| anyhow!("no backend configured. Run: quill setup"))?
    } else {
        SelectionPolicy::default().select(explicit.as_deref(), safe.len())
    };
    println!("Using backend: {name}");

    let generator = registry.create(&name, &cfg.backend(&name))?;

    // Step 4: render the prompt.
    let spec = PromptSpec {
        diff: safe.clone(),
        types: ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
        max_title: MAX_TITLE_LEN,
        max_body: MAX_BODY_LINE_LEN,
        type_hint: args.type_hint.clone(),
    };
    let prompt = build_prompt(&spec);
    debug!(
        prompt_len = prompt.len(),
        diff_len = safe.len(),
        redacted = stats.redacted_count,
        "built generation prompt"
    );

    if args.dry_run {
        println!("=== [SANITIZED DIFF] ===");
        println!("{safe}");
        println!("\n=== [PROMPT] ===");
        println!("{prompt}");
        return Ok(());
    }

    let options = NormalizeOptions {
        max_title: MAX_TITLE_LEN,
        max_body: MAX_BODY_LINE_LEN,
        types: ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
        default_type: args
            .type_hint
            .clone()
            .unwrap_or_else(|| DEFAULT_TYPE.to_string()),
    };

    // Step 5: first attempt. Failure or silence here falls back to the
    // diff-statistics message; only later regenerations keep the proposal.
    let spinner = Spinner::start("Generating commit message...");
    let attempt = generate_with_retry(generator.as_ref(), &prompt, args.max_tokens).await;
    spinner.stop();

    let message = match attempt {
        Ok(text) if !text.trim().is_empty() => normalize(&text, &options),
        Ok(_) => {
            warn!("backend returned an empty message; using fallback");
            println!("Backend returned an empty message. Falling back to diff statistics.");
            fallback_from_diff(&raw_diff, MAX_TITLE_LEN)
        }
        Err(e) => {
            warn!(error = %e, "generation failed; using fallback");
            println!("Generation failed ({e}). Falling back to diff statistics.");
            fallback_from_diff(&raw_diff, MAX_TITLE_LEN)
        }
    };

    // Step 6: hand the proposal to the approval loop.
    let approval = ApprovalLoop {
        no_commit: args.no_commit,
        options,
    };
    let mut io = TerminalIo {
        repo,
        generator,
        prompt,
        max_tokens: args.max_tokens,
    };
    match approval.run(message, &mut io).await? {
        Verdict::Committed => println!("Committed."),
        Verdict::Printed => {}
        Verdict::Cancelled => bail!("cancelled by user"),
    }
    Ok(())
}

/// Production approval I/O: terminal, $EDITOR, and the git collaborator.
struct TerminalIo {
    repo: git2::Repository,
    generator: Box<dyn Generate>,
    prompt: String,
    max_tokens: u32,
}

#[async_trait]
impl ApprovalIo for TerminalIo {
    fn show_proposal(&mut self, message: &CommitMessage) {
        println!("\n--- Proposed commit message ---\n");
        println!("{message}");
        print!("\n[a]pprove  [e]dit  [r]egenerate  [c]ancel > ");
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }

    fn print_final(&mut self, message: &CommitMessage) {
        println!("\n[NO-COMMIT] Final message:\n{message}");
    }

    fn warn(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_choice(&mut self) -> Result<String, UiError> {
        ui::read_choice()
    }

    fn edit(&mut self, current: &str) -> Result<String, UiError> {
        ui::edit_in_editor(current)
    }

    fn commit(&mut self, message: &str) -> Result<(), GitError> {
        git::commit_staged(&self.repo, message).map(|_| ())
    }

    async fn regenerate(&mut self) -> Result<String, BackendError> {
        let spinner = Spinner::start("Regenerating commit message...");
        let result =
            generate_with_retry(self.generator.as_ref(), &self.prompt, self.max_tokens).await;
        spinner.stop();
        result
    }
}

/// Interactive (or `--backend`-pinned) first-time configuration.
pub async fn run_setup(registry: &BackendRegistry, backend: Option<String>) -> Result<()> {
    let mut cfg = config::load()?;

    let name = match backend {
        Some(name) => name,
        None => pick_backend(registry, &cfg, "Select a backend to set up:")?,
    };
    let plugin = registry
        .plugin_for(&name)
        .ok_or_else(|| unknown_backend(registry, &name))?;

    println!("Configuring backend: {name}");
    let settings = plugin.setup().await?;

    cfg.backends.insert(name.clone(), settings);
    cfg.selected_backend = Some(name.clone());
    config::save(&cfg)?;
    println!("Saved configuration for {name}");
    Ok(())
}

/// Stop or unload local backend resources.
pub async fn run_down(registry: &BackendRegistry, backend: Option<String>) -> Result<()> {
    let cfg = config::load()?;

    let name = match backend {
        Some(name) => name,
        None => pick_backend(registry, &cfg, "Select a backend to stop:")?,
    };
    let plugin = registry
        .plugin_for(&name)
        .ok_or_else(|| unknown_backend(registry, &name))?;

    if !plugin.supports_teardown() {
        println!("Backend {name} has nothing to stop.");
        return Ok(());
    }

    println!("Stopping backend: {name}");
    plugin.teardown(&cfg.backend(&name)).await?;
    println!("Stopped {name}");
    Ok(())
}

/// Set the selected backend and optionally its model identifier.
pub async fn run_default(
    registry: &BackendRegistry,
    backend: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let mut cfg = config::load()?;

    let name = match backend {
        Some(name) => name,
        None => pick_backend(registry, &cfg, "Select the default backend:")?,
    };
    let plugin = registry
        .plugin_for(&name)
        .ok_or_else(|| unknown_backend(registry, &name))?;

    let mut settings = cfg.backend(&name);
    let model = match model {
        Some(m) => m,
        None => {
            let variants = plugin.variants();
            if variants.is_empty() {
                let current = settings.get("model").cloned().unwrap_or_default();
                ui::input("Model identifier", &current)?
            } else {
                let idx = ui::select(&format!("Select default model for {name}:"), &variants, 0)?;
                variants[idx].to_string()
            }
        }
    };

    let model = model.trim().to_string();
    if !model.is_empty() {
        settings.insert("model".to_string(), model.clone());
    }
    cfg.selected_backend = Some(name.clone());
    cfg.backends.insert(name.clone(), settings);
    config::save(&cfg)?;

    println!("Default set: {name} ({model})");
    Ok(())
}

fn pick_backend(
    registry: &BackendRegistry,
    cfg: &config::Config,
    label: &str,
) -> Result<String> {
    let known = registry.known();
    if known.is_empty() {
        bail!("no backends registered");
    }
    let labels: Vec<String> = known
        .iter()
        .map(|name| {
            if cfg.is_configured(name) {
                format!("{name} (configured)")
            } else {
                name.clone()
            }
        })
        .collect();
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let idx = ui::select(label, &label_refs, 0)?;
    Ok(known[idx].clone())
}

fn unknown_backend(registry: &BackendRegistry, name: &str) -> BackendError {
    BackendError::Unknown {
        name: name.to_string(),
        known: registry.known().join(", "),
    }
}
