//! Terminal host for the recovery-code console.
//!
//! Reads one command per line from stdin, answers confirmation prompts on
//! the same stream and prints toasts and rendered state to stdout. Logs go
//! to stderr. Guarded by the `host` feature.

use anyhow::{Context, Result};
use async_lock::Mutex;
use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use codekeep_app::bridge::{ConfirmationDialog, ConsoleRenderer, ToastSurface};
use codekeep_app::http::HttpRemote;
use codekeep_app::views::operations::VerificationLine;
use codekeep_app::workflows::forms::DAYS_TO_EXPIRY;
use codekeep_app::{
    ActionId, ConfirmationSpec, ConsoleConfig, Decision, FormSubmission, HistoryWindow,
    QueuedToast, RecoveryConsole, Rendered, TokenSource, Trigger, WorkflowOutcome,
};

#[derive(Parser)]
#[command(name = "codekeep-host")]
#[command(about = "Drive a recovery-code console from the terminal", long_about = None)]
struct Cli {
    /// Config file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server origin, overrides the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Anti-forgery token; falls back to CODEKEEP_CSRF_TOKEN
    #[arg(long)]
    token: Option<String>,

    /// Extra config overrides as key=value
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Listen for server-pushed notifications
    #[arg(long)]
    notifications: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

type InputLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

async fn next_line(input: &InputLines) -> Option<String> {
    input.lock().await.next_line().await.ok().flatten()
}

struct TerminalDialog {
    input: InputLines,
}

#[async_trait]
impl ConfirmationDialog for TerminalDialog {
    async fn confirm(&self, spec: &ConfirmationSpec) -> Decision {
        println!("\n== {} ==\n{}", spec.title, spec.body);
        println!("[y] {}   [n] {}   [enter] dismiss", spec.confirm_label, spec.deny_label);
        match next_line(&self.input).await.as_deref().map(str::trim) {
            Some("y" | "Y" | "yes") => Decision::Confirmed,
            Some("n" | "N" | "no") => Decision::Denied,
            _ => Decision::Dismissed,
        }
    }
}

struct StdoutToasts;

impl ToastSurface for StdoutToasts {
    fn show(&self, toast: &QueuedToast) {
        println!("{} {}", toast.level.icon(), toast.message);
    }

    fn hide(&self, _toast: &QueuedToast) {}
}

struct StdoutRenderer;

impl ConsoleRenderer for StdoutRenderer {
    fn render_codes(&self, codes: &[String]) -> bool {
        if codes.is_empty() {
            return false;
        }
        println!("Recovery codes:");
        for chunk in codes.chunks(2) {
            println!("  {}", chunk.join("    "));
        }
        true
    }

    fn render_history(&self, history: &HistoryWindow) {
        println!("History ({} batches):", history.len());
        for batch in history.iter() {
            println!(
                "  {}  {:<8} issued {:>3}  removed {:>3}  invalidated {:>3}",
                batch.id, batch.status, batch.number_issued, batch.number_removed,
                batch.number_invalidated
            );
        }
    }

    fn render_total_issued(&self, total: u64) {
        println!("Total codes issued: {total}");
    }

    fn render_verification(&self, lines: &[VerificationLine]) {
        for line in lines {
            println!("  - {}", line.text);
        }
    }

    fn set_processing_notice(&self, visible: bool) {
        if visible {
            println!("Processing...");
        }
    }
}

struct StaticToken(Option<String>);

impl TokenSource for StaticToken {
    fn anti_forgery_token(&self) -> Option<String> {
        self.0.clone()
    }
}

fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConsoleConfig::default(),
    };
    config.merge_with_env()?;
    if let Some(base_url) = &cli.base_url {
        config.set_from_string("base_url", base_url)?;
    }
    for entry in &cli.overrides {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("override '{entry}' is not KEY=VALUE"))?;
        config.set_from_string(key.trim(), value.trim())?;
    }
    config.validate()?;
    Ok(config)
}

/// Parse one command line into a trigger and its form
fn parse_command(line: &str) -> Option<(ActionId, FormSubmission)> {
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let argument = words.next().unwrap_or_default();
    let form = FormSubmission::new();

    let parsed = match command {
        "generate" if argument.is_empty() => (ActionId::GenerateWithoutExpiry, form),
        "generate" => (
            ActionId::GenerateWithExpiry,
            form.with(DAYS_TO_EXPIRY, argument),
        ),
        "regenerate" => (ActionId::Regenerate, form),
        "invalidate" => (ActionId::Invalidate, form.with("invalidate_code", argument)),
        "delete" => (ActionId::DeleteOne, form.with("delete_code", argument)),
        "delete-all" => (ActionId::DeleteAll, form),
        "email" => (ActionId::Email, form),
        "download" => (ActionId::Download, form),
        "verify" => (ActionId::VerifySetup, form.with("verify_code", argument)),
        _ => return None,
    };
    Some(parsed)
}

fn report(outcome: &WorkflowOutcome) -> Result<()> {
    match outcome {
        WorkflowOutcome::Invalid(errors) => {
            for error in errors {
                println!("! {}", error.user_message());
            }
        }
        WorkflowOutcome::Rendered(Rendered::Downloaded(file)) => {
            std::fs::write(&file.filename, &file.bytes)
                .with_context(|| format!("writing {}", file.filename))?;
            println!("Saved {}", file.filename);
        }
        WorkflowOutcome::Ignored => println!("(nothing to do)"),
        _ => {}
    }
    Ok(())
}

const HELP: &str = "commands: generate [days] | regenerate | invalidate <code> | delete <code> \
                    | delete-all | email | download | verify <code> | quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var("CODEKEEP_CSRF_TOKEN").ok());
    let remote = Arc::new(HttpRemote::new(config.clone())?);
    let input: InputLines = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
    let toasts = Arc::new(StdoutToasts);

    let console = RecoveryConsole::builder(config)
        .with_remote(remote.clone())
        .with_tokens(Arc::new(StaticToken(token)))
        .with_dialog(Arc::new(TerminalDialog {
            input: Arc::clone(&input),
        }))
        .with_renderer(Arc::new(StdoutRenderer))
        .with_toasts(toasts.clone())
        .build()?;

    if cli.notifications {
        let feed = console.push_feed();
        let toasts = toasts.clone();
        tokio::spawn(async move {
            match remote.notifications().await {
                Ok(stream) => {
                    feed.pump(stream, toasts.as_ref()).await;
                }
                Err(err) => tracing::warn!(error = %err, "notification stream unavailable"),
            }
        });
    }

    println!("{HELP}");
    while let Some(line) = next_line(&input).await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            if let Some(prompt) = console.navigation_guard().prompt() {
                println!("{prompt} (type quit again once it finishes)");
                continue;
            }
            break;
        }

        let Some((action, form)) = parse_command(line) else {
            println!("{HELP}");
            continue;
        };
        let outcome = console.dispatch(&Trigger::for_action(action), &form).await;
        console.drain_messages().await;
        report(&outcome)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let (action, form) = parse_command("generate 30").unwrap();
        assert_eq!(action, ActionId::GenerateWithExpiry);
        assert_eq!(form.value(DAYS_TO_EXPIRY), Some("30"));

        let (action, _) = parse_command("generate").unwrap();
        assert_eq!(action, ActionId::GenerateWithoutExpiry);

        let (action, form) = parse_command("delete ABCD-1234").unwrap();
        assert_eq!(action, ActionId::DeleteOne);
        assert_eq!(form.value("delete_code"), Some("ABCD-1234"));

        assert!(parse_command("launch").is_none());
    }
}
