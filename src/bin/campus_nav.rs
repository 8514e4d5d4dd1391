//! Campus Navigation terminal chat
//!
//! Forwards typed input to a navigation session and prints the bot's replies.
//!
//! # Usage
//!
//! ```bash
//! # Interactive chat in Hindi
//! campus_nav --locale hi
//!
//! # Replay a script, one input per line, with mirrored reverse routes
//! campus_nav --script demo.txt --policy reverse-and-mirror
//! ```
//!
//! Plain text is sent as free text. A number picks from the last choice list.
//! Commands: `:next`, `:landmark`, `:new`, `:end`, `:lang <code>`,
//! `:choices [filter]`, `:status`, `:quit`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use uuid::Uuid;

use campus_nav::conversation::{
    ConversationInput, ConversationPhase, NavResponse, NavResponseKind, NavigationOrchestrator,
};
use campus_nav::{ConfigLoader, ReversePolicy};

#[derive(Parser)]
#[command(name = "campus_nav")]
#[command(version = "0.1.0")]
#[command(about = "Chat with the campus navigation assistant")]
#[command(long_about = None)]
struct Cli {
    /// Locale to start in (en, hi, te); defaults to the configured default
    #[arg(long, short, env = "CAMPUS_NAV_LOCALE")]
    locale: Option<String>,

    /// Directory holding nav.yaml and locales/
    #[arg(long, env = "CAMPUS_NAV_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Reverse-edge policy: reuse-as-is or reverse-and-mirror
    #[arg(long)]
    policy: Option<ReversePolicy>,

    /// Replay inputs from a file instead of reading the terminal
    #[arg(long)]
    script: Option<PathBuf>,

    /// Print each response as JSON
    #[arg(long)]
    json: bool,
}

/// What one line of input asks for
enum Command {
    Event(ConversationInput),
    Choices(String),
    Status,
    Quit,
    Help,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loader = cli
        .config_dir
        .clone()
        .map(ConfigLoader::new)
        .unwrap_or_else(ConfigLoader::from_env);

    let mut config = loader.load_config()?;
    if let Some(policy) = cli.policy {
        config.reverse_policy = policy;
    }
    let store = Arc::new(loader.load_store(&config)?);
    let orchestrator = NavigationOrchestrator::new(config.machine(store));

    let locale = cli
        .locale
        .clone()
        .unwrap_or_else(|| config.default_locale.clone());
    let id = orchestrator.create_session(&locale).await;

    let mut chat = Chat {
        orchestrator,
        id,
        json: cli.json,
        choices: Vec::new(),
    };
    chat.greet().await?;

    match &cli.script {
        Some(path) => {
            let script = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
                println!("{} {}", ">".dimmed(), line);
                if !chat.dispatch(line).await? {
                    break;
                }
            }
        }
        None => {
            let mut editor = DefaultEditor::new().context("Failed to start line editor")?;
            loop {
                match editor.readline("you> ") {
                    Ok(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let _ = editor.add_history_entry(line);
                        if !chat.dispatch(line).await? {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                    Err(e) => return Err(e).context("Failed to read input"),
                }
            }
        }
    }

    Ok(())
}

// =============================================================================
// CHAT LOOP
// =============================================================================

struct Chat {
    orchestrator: NavigationOrchestrator,
    id: Uuid,
    json: bool,
    /// Last choice list shown, for numeric picks
    choices: Vec<String>,
}

impl Chat {
    async fn greet(&mut self) -> Result<()> {
        let session = self
            .orchestrator
            .get_session(self.id)
            .await
            .context("Session vanished")?;
        for message in &session.messages {
            print_bot(&message.content);
        }
        self.show_choices("").await
    }

    /// Handle one input line. Returns false when the user quits.
    async fn dispatch(&mut self, line: &str) -> Result<bool> {
        let phase = self.phase().await?;
        match parse_command(line, phase, &self.choices) {
            Command::Quit => return Ok(false),
            Command::Help => print_help(),
            Command::Status => self.show_status().await?,
            Command::Choices(filter) => self.show_choices(&filter).await?,
            Command::Event(input) => {
                let response = self.orchestrator.process(self.id, input).await?;
                self.render(&response)?;
                if response.phase.is_selecting() {
                    self.show_choices("").await?;
                } else {
                    self.choices.clear();
                }
            }
        }
        Ok(true)
    }

    async fn phase(&self) -> Result<ConversationPhase> {
        let session = self
            .orchestrator
            .get_session(self.id)
            .await
            .context("Session vanished")?;
        Ok(session.phase)
    }

    fn render(&self, response: &NavResponse) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(response)?);
            return Ok(());
        }

        for message in response.bot_messages() {
            print_bot(message);
        }

        match &response.kind {
            NavResponseKind::Error { error, .. } => {
                println!("  {} {}", "!".yellow(), error.yellow());
            }
            NavResponseKind::SessionEnded { reset_after_ms } => {
                println!(
                    "  {}",
                    format!("(conversation resets in {} ms)", reset_after_ms).dimmed()
                );
            }
            NavResponseKind::LocaleChanged {
                requested,
                locale,
                fell_back: true,
            } => {
                println!(
                    "  {} unknown locale '{}', using '{}'",
                    "!".yellow(),
                    requested,
                    locale
                );
            }
            _ => {}
        }

        if let Some(progress) = &response.progress {
            println!(
                "  {}",
                format!(
                    "step {}/{} ({}%){}",
                    progress.current_step,
                    progress.total_steps,
                    progress.percent,
                    if response.waiting_for_milestone {
                        " - confirm the landmark with :landmark"
                    } else {
                        ""
                    }
                )
                .dimmed()
            );
        }
        Ok(())
    }

    async fn show_choices(&mut self, filter: &str) -> Result<()> {
        self.choices = self.orchestrator.choices(self.id, filter).await?;
        if self.choices.is_empty() {
            return Ok(());
        }
        for (i, choice) in self.choices.iter().enumerate() {
            println!("  {} {}", format!("{:>2}.", i + 1).cyan(), choice);
        }
        Ok(())
    }

    async fn show_status(&self) -> Result<()> {
        let session = self
            .orchestrator
            .get_session(self.id)
            .await
            .context("Session vanished")?;
        println!("  {} {}", "session:".bold(), session.id);
        println!("  {} {}", "locale:".bold(), session.locale);
        println!("  {} {}", "phase:".bold(), session.phase);
        if let Some(location) = &session.current_location {
            println!("  {} {}", "at:".bold(), location);
        }
        if let Some(destination) = &session.destination {
            println!("  {} {}", "to:".bold(), destination);
        }
        if let Some(progress) = session.progress() {
            println!(
                "  {} {}/{}",
                "step:".bold(),
                progress.current_step,
                progress.total_steps
            );
        }
        let milestones = self.orchestrator.machine().milestones(&session);
        if !milestones.is_empty() {
            println!("  {} {}", "landmarks:".bold(), milestones.join(" → "));
        }
        Ok(())
    }
}

fn parse_command(line: &str, phase: ConversationPhase, choices: &[String]) -> Command {
    if let Some(rest) = line.strip_prefix(':') {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("").to_lowercase();
        let arg = parts.next().unwrap_or("").trim().to_string();
        return match name.as_str() {
            "next" | "n" => Command::Event(ConversationInput::RequestAdvance),
            "landmark" | "l" => Command::Event(ConversationInput::ConfirmMilestone),
            "new" => Command::Event(ConversationInput::RequestNewRoute),
            "end" => Command::Event(ConversationInput::EndSession),
            "lang" => Command::Event(ConversationInput::SetLocale { code: arg }),
            "choices" | "c" => Command::Choices(arg),
            "status" | "s" => Command::Status,
            "quit" | "q" => Command::Quit,
            _ => Command::Help,
        };
    }

    if let Ok(n) = line.parse::<usize>() {
        if let Some(name) = n.checked_sub(1).and_then(|i| choices.get(i)) {
            let name = name.clone();
            match phase {
                ConversationPhase::CollectingOrigin => {
                    return Command::Event(ConversationInput::SelectOrigin { name })
                }
                ConversationPhase::CollectingDestination => {
                    return Command::Event(ConversationInput::SelectDestination { name })
                }
                _ => {}
            }
        }
    }

    Command::Event(ConversationInput::SubmitText {
        text: line.to_string(),
    })
}

fn print_bot(text: &str) {
    println!("{} {}", "bot>".green().bold(), text);
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  :next              next direction");
    println!("  :landmark          I've reached this landmark");
    println!("  :new               directions to somewhere else");
    println!("  :end               end navigation");
    println!("  :lang <code>       switch language");
    println!("  :choices [filter]  show the choice list");
    println!("  :status            show session state");
    println!("  :quit              leave");
    println!("  <number>           pick from the last choice list");
}
