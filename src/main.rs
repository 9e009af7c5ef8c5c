use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use miette::IntoDiagnostic;
use ratatui::{backend::CrosstermBackend, Terminal};

use tutorvox::config::AppConfig;
use tutorvox::core::education::{QuestionRequest, Tutor};
use tutorvox::core::llm::{ChatMessage, LocalModelClient, LocalModelRegistry};
use tutorvox::core::logging::{self, print_status, StartupError};
use tutorvox::core::voice::{JsonFileStore, SpeechPlatform, VoiceSettingsResolver};
use tutorvox::tui::AppState;

#[derive(Parser)]
#[command(name = "tutorvox")]
#[command(about = "Voice-guided education assistant", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the voice settings panel (default)
    Tui,
    /// Speak text with the saved voice settings
    Speak {
        text: String,
        /// Subject id used to pick a matching voice
        #[arg(long)]
        subject: Option<String>,
        /// Teaching mode override (fast, deep, interactive, practice)
        #[arg(long)]
        mode: Option<String>,
    },
    /// List profiles, teaching modes and detected voices
    Voices,
    /// Ask the tutor a question and speak the answer
    Ask {
        subject: String,
        topic: String,
        question: String,
    },
    /// Probe the local chat models
    Models,
    /// Send one message to a local model
    Chat {
        model: String,
        message: String,
        /// Optional system prompt sent ahead of the message
        #[arg(long)]
        system: Option<String>,
    },
}

type Resolver = VoiceSettingsResolver<JsonFileStore, Box<dyn SpeechPlatform>>;

fn build_resolver(config: &AppConfig) -> Resolver {
    let store = JsonFileStore::new(config.store_path());
    let mut resolver = VoiceSettingsResolver::with_catalog(
        store,
        config.speech_platform(),
        config.catalog(),
        config.locale(),
    );
    resolver.initialize();
    resolver
}

fn build_tutor(config: &AppConfig) -> Tutor {
    let seed = config.tutor.seed.unwrap_or_else(rand::random);
    Tutor::with_seed(seed).with_delay(config.tutor_delay())
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let data_dir = config.data_dir();

    let command = cli.command.unwrap_or(Commands::Tui);
    // The panel owns the terminal, so it logs to file only
    let _log_guard = if matches!(command, Commands::Tui) {
        logging::init_tui(Some(&data_dir))
    } else {
        logging::init(Some(&data_dir))
    };
    log::info!("{} v{} starting", tutorvox::NAME, tutorvox::VERSION);

    run_command(&config, command).await
}

async fn run_tui(config: &AppConfig) -> miette::Result<()> {
    let resolver = build_resolver(config);
    let mut app = AppState::new(
        resolver,
        build_tutor(config),
        Duration::from_millis(config.tui.tick_rate_ms),
    );

    enable_raw_mode().map_err(|e| {
        StartupError::new(format!("Cannot enter raw mode: {e}"))
            .with_help("tutorvox needs an interactive terminal; try `tutorvox speak` instead")
    })?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).into_diagnostic()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).into_diagnostic()?;

    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode().into_diagnostic()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).into_diagnostic()?;
    terminal.show_cursor().into_diagnostic()?;

    app.resolver().platform().cancel();
    result.into_diagnostic()
}

async fn run_command(config: &AppConfig, command: Commands) -> miette::Result<()> {
    match command {
        Commands::Tui => return run_tui(config).await,
        Commands::Speak { text, subject, mode } => {
            let resolver = build_resolver(config);
            if !resolver.is_enabled() {
                print_status("muted", "voice output is disabled in the saved settings");
                return Ok(());
            }
            match mode {
                Some(mode) => resolver.speak_in_mode(&text, subject.as_deref(), &mode),
                None => resolver.speak(&text, subject.as_deref()),
            }
            .into_diagnostic()?;
            wait_for_speech(resolver.platform()).await;
        }
        Commands::Voices => {
            let resolver = build_resolver(config);
            let catalog = resolver.catalog();
            for key in catalog.profile_keys() {
                let marker = if key == resolver.selected_profile() { "*" } else { " " };
                if let Some(p) = catalog.profile(key) {
                    print_status(
                        &format!("{marker}{key}"),
                        &format!(
                            "{} ({}/{}) rate {:.1} pitch {:.1} volume {:.1}",
                            p.name,
                            p.gender.display_name(),
                            p.age_group.display_name(),
                            p.settings.rate,
                            p.settings.pitch,
                            p.settings.volume
                        ),
                    );
                }
            }
            for key in catalog.mode_keys() {
                if let Some(m) = catalog.mode(key) {
                    print_status(&format!(" mode:{key}"), &format!("{} - {}", m.name, m.description));
                }
            }
            print_status(
                "voices",
                &format!("{} available", resolver.available_voices().len()),
            );
            for voice in resolver.available_voices() {
                println!("    {} [{}] {}", voice.id, voice.lang, voice.name);
            }
        }
        Commands::Ask {
            subject,
            topic,
            question,
        } => {
            let resolver = build_resolver(config);
            let mut tutor = build_tutor(config);
            let response = tutor
                .ask(&QuestionRequest::new(&subject, &topic, &question))
                .await;
            println!("{}\n", response.answer);
            print_status("explanation", &response.explanation);
            print_status("next", &response.next_steps.join(" → "));
            resolver.speak(&response.answer, Some(&subject)).into_diagnostic()?;
            wait_for_speech(resolver.platform()).await;
        }
        Commands::Models => {
            let mut registry = build_registry(config)?;
            let status = registry.scan().await;
            for model in registry.models() {
                let state = if model.available { "up" } else { "down" };
                print_status(
                    &format!("{:<14}", model.id),
                    &format!("{state:<5} {} {}", model.name, model.endpoint.as_deref().unwrap_or("-")),
                );
            }
            print_status(
                "total",
                &format!("{}/{} available", status.available_models, status.total_models),
            );
        }
        Commands::Chat { model, message, system } => {
            let mut registry = build_registry(config)?;
            registry.scan().await;
            let mut messages = Vec::with_capacity(2);
            if let Some(prompt) = system {
                messages.push(ChatMessage::system(prompt));
            }
            messages.push(ChatMessage::user(message));
            let reply = registry
                .send_message(&model, &messages)
                .await
                .into_diagnostic()?;
            println!("{reply}");
        }
    }
    Ok(())
}

fn build_registry(config: &AppConfig) -> miette::Result<LocalModelRegistry> {
    let client = LocalModelClient::new(config.health_timeout()).into_diagnostic()?;
    Ok(LocalModelRegistry::new(client, config.models()))
}

/// Keep the process alive until the engine finishes the utterance
async fn wait_for_speech(platform: &dyn SpeechPlatform) {
    while platform.is_speaking() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
