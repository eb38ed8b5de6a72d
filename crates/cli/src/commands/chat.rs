//! `heartline chat` — Interactive or single-message empathetic chat.

use std::io::Write;

use heartline_agent::{EmpathyAgent, TurnOutcome};
use heartline_config::AppConfig;
use heartline_core::exemplar::ExemplarStore;
use heartline_core::session::SessionState;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::wiring;

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Clear,
    Status,
    Skip,
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Skip,
        "exit" | "quit" | "/exit" | "/quit" | ":q" => Input::Exit,
        "/clear" => Input::Clear,
        "/status" => Input::Status,
        other => Input::Message(other),
    }
}

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Fail early with setup instructions when no key is available
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENROUTER_API_KEY = 'sk-or-v1-...'   (recommended)");
        eprintln!("    OPENAI_API_KEY     = 'sk-...'         (for OpenAI direct)");
        eprintln!("    HEARTLINE_API_KEY  = 'sk-...'         (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = heartline_providers::build_from_config(&config);
    let generator = wiring::build_generator(&config, &router)?;
    let embedder = wiring::build_embedder(&config, &router)?;
    let store = wiring::open_for_chat(&config, embedder).await;
    let exemplars = store.count().await.ok();

    let agent = EmpathyAgent::from_config(generator, store, &config);
    let mut session = SessionState::new();

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = agent.process_turn(&mut session, &msg).await;
        eprint!("\r              \r");
        println!("{}", outcome.display_text());
        print_labels(&outcome);
        return Ok(());
    }

    print_banner(&config, exemplars);

    let mut lines = BufReader::new(io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Exit => break,
            Input::Skip => {}
            Input::Clear => {
                session.clear();
                println!("  Conversation cleared.");
                println!();
            }
            Input::Status => print_status(&session),
            Input::Message(text) => {
                eprint!("  ...");
                let outcome = agent.process_turn(&mut session, text).await;
                eprint!("\r     \r");
                println!();
                match &outcome.response {
                    Some(reply) => {
                        for line in reply.lines() {
                            println!("  Assistant > {line}");
                        }
                    }
                    None => eprintln!("  [Error] {}", outcome.display_text()),
                }
                print_labels(&outcome);
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Take care of yourself. Goodbye!");
    println!();

    Ok(())
}

fn store_label(config: &AppConfig) -> String {
    format!("{} ({})", config.index.backend, config.index.collection)
}

fn print_banner(config: &AppConfig, exemplars: Option<usize>) {
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║         Heartline — Empathetic Chat          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    match exemplars {
        Some(n) => println!("  Index:     {} — {n} exemplars", store_label(config)),
        None => println!("  Index:     {} — unavailable, replies use no exemplars", store_label(config)),
    }
    println!();
    println!("  Type your message and press Enter.");
    println!("  /status shows what I've picked up, /clear starts over.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();
}

fn print_labels(outcome: &TurnOutcome) {
    println!();
    println!("  Emotion: {}   Issue: {}", outcome.emotion, outcome.issue);
    if !outcome.activities.is_empty() {
        println!("  Things that might help:");
        for activity in &outcome.activities {
            println!("    • {activity}");
        }
    }
}

fn print_status(session: &SessionState) {
    println!();
    println!("  Emotion:   {}", session.current_emotion);
    println!("  Issue:     {}", session.current_issue);
    println!("  Turns:     {}", session.turns.len());
    let recent = session.recent_issues();
    if !recent.is_empty() {
        println!("  Recent:    {}", recent.join(", "));
    }
    if !session.summary.is_empty() {
        println!("  Summary:   {}", session.summary);
    }
    if !session.current_activities.is_empty() {
        println!("  Activities:");
        for activity in &session.current_activities {
            println!("    • {activity}");
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        for cmd in ["exit", "quit", "/exit", "/quit", ":q", "  exit  "] {
            assert_eq!(parse_input(cmd), Input::Exit);
        }
    }

    #[test]
    fn slash_commands_and_messages() {
        assert_eq!(parse_input("/clear"), Input::Clear);
        assert_eq!(parse_input("/status"), Input::Status);
        assert_eq!(parse_input("   "), Input::Skip);
        assert_eq!(parse_input("  I feel lost  "), Input::Message("I feel lost"));
    }
}
