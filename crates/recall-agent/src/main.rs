//! A terminal chat with an agent served by Ollama.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use recall_agent::core::message::{Message, Role};
use recall_agent::core::{AgentConfigBuilder, TurnStage};
use recall_agent::tools::WeatherConfig;
use recall_agent::{Session, SessionBuilder};
use recall_agent_ollama_model::{OllamaConfigBuilder, OllamaProvider};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Idle,
    Stage(TurnStage),
    Reply(String),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut ollama = OllamaConfigBuilder::new();
    if let Ok(base_url) = env::var("OLLAMA_BASE_URL") {
        ollama = ollama.with_base_url(base_url);
    }
    let provider = OllamaProvider::new(ollama.build());

    let mut config = AgentConfigBuilder::new();
    if let Ok(model) = env::var("OLLAMA_MODEL") {
        config = config.with_model(model);
    }
    if let Ok(model) = env::var("OLLAMA_EMBEDDING_MODEL") {
        config = config.with_embedding_model(model);
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut builder = SessionBuilder::new(provider, config.build())
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::Idle).ok();
            }
        })
        .on_stage({
            let event_tx = event_tx.clone();
            move |stage| {
                event_tx.send(SessionEvent::Stage(stage)).ok();
            }
        })
        .on_message({
            let event_tx = event_tx.clone();
            move |message: &Message| {
                if message.role() == Role::Assistant {
                    event_tx
                        .send(SessionEvent::Reply(message.content().to_owned()))
                        .ok();
                }
            }
        });
    if let Ok(api_key) = env::var("WEATHER_API_KEY") {
        let mut weather = WeatherConfig::with_api_key(api_key);
        if let Ok(api_base) = env::var("WEATHER_API_BASE") {
            weather = weather.with_api_base(api_base);
        }
        builder = builder.with_weather(weather);
    }
    if let Ok(url) = env::var("MAIL_SERVICE_URL") {
        builder = builder.with_mail_service(url);
    }
    let session = builder.build();

    if session.selected_model().is_none() {
        select_first_model(&session).await;
    }

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('/') {
            if !run_command(&session, command).await {
                break;
            }
            continue;
        }
        session.send_message(line);

        let mut progress_bar = None;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🤔 Thinking...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            match event {
                SessionEvent::Stage(stage) => {
                    if let Some(progress_bar) = &progress_bar {
                        if stage.is_busy() {
                            progress_bar.set_message(stage_message(stage));
                        }
                    }
                    continue;
                }
                SessionEvent::Reply(reply) => {
                    // Finish the progress bar before printing anything else.
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    println!("{}🤖 {}", BAR_CHAR.bright_cyan(), reply.bright_white());
                }
                SessionEvent::Idle => {
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    if session.selected_model().is_none() {
                        println!("No model selected, pick one with /model <name>.");
                    }
                    break;
                }
            }
        }
    }
}

/// Returns `false` when the REPL should exit.
async fn run_command(session: &Session, command: &str) -> bool {
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, arg)| (name, arg.trim()));
    match name {
        "quit" => return false,
        "models" => match session.list_models().await {
            Ok(models) => {
                let selected = session.selected_model();
                for model in models {
                    let marker = if selected.as_deref() == Some(model.name.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{marker} {}", model.name);
                }
            }
            Err(err) => {
                error!("failed to list models: {err}");
                println!("{}", format!("Could not list models: {err}").bright_red());
            }
        },
        "model" if !arg.is_empty() => {
            session.select_model(arg);
            println!("Using model {}.", arg.bright_white().bold());
        }
        _ => println!("Commands: /models, /model <name>, /quit"),
    }
    true
}

async fn select_first_model(session: &Session) {
    match session.list_models().await {
        Ok(models) => match models.first() {
            Some(model) => {
                session.select_model(&model.name);
                println!("Using model {}.", model.name.bright_white().bold());
            }
            None => println!("{}", "No models available.".bright_yellow()),
        },
        Err(err) => {
            warn!("failed to list models: {err}");
            println!("{}", format!("Could not list models: {err}").bright_red());
        }
    }
}

#[inline]
fn stage_message(stage: TurnStage) -> &'static str {
    match stage {
        TurnStage::Submitting => "🔎 Recalling...",
        TurnStage::AwaitingModel => "🤔 Thinking...",
        TurnStage::ProcessingTools => "🛠️  Running tools...",
        TurnStage::Committing => "💾 Remembering...",
        TurnStage::Idle | TurnStage::Failed => "",
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
