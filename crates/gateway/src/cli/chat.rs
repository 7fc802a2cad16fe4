//! `chatmux chat`: interactive REPL.
//!
//! Each line is one turn in a single conversation. Slash commands switch
//! the mode, start a new conversation or show the current topic.

use std::sync::Arc;

use uuid::Uuid;

use cm_domain::config::Config;
use cm_domain::mode::Mode;
use cm_pipeline::{TurnCoordinator, TurnError, TurnRequest};
use cm_sessions::open_store;

use crate::bootstrap;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(config: &Config, mode: Option<&str>) -> anyhow::Result<()> {
    let mut mode = super::parse_mode_flag(mode)?;

    bootstrap::check_config(config)?;
    let store = open_store(&config.storage)?;
    let (coordinator, llm_enabled) = bootstrap::build_coordinator(config, store)?;
    let coordinator = Arc::new(coordinator);
    let mut conversation_id = coordinator.store().create_conversation(None).await?.id;

    // History lives next to the conversation state.
    let history_path = config.storage.state_path.join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    eprintln!("chatmux interactive chat");
    eprintln!(
        "Mode: {}  |  Model: {}  |  Type /help for commands, Ctrl+D to exit",
        mode_label(mode),
        if llm_enabled { "on" } else { "off (templates)" },
    );
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    match handle_slash_command(trimmed, &mut mode) {
                        Slash::Exit => break,
                        Slash::NewConversation => {
                            conversation_id =
                                coordinator.store().create_conversation(None).await?.id;
                            eprintln!("Started a new conversation.");
                        }
                        Slash::ShowTopic => {
                            let topic = coordinator.state().get_topic(conversation_id).await?;
                            eprintln!("Topic: {}", topic.as_deref().unwrap_or("(none)"));
                        }
                        Slash::Handled => {}
                    }
                    continue;
                }

                send_message(&coordinator, conversation_id, mode, trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, PartialEq, Eq)]
enum Slash {
    Handled,
    NewConversation,
    ShowTopic,
    Exit,
}

fn handle_slash_command(input: &str, mode: &mut Option<Mode>) -> Slash {
    let (cmd, arg) = match input.split_once(' ') {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (input, ""),
    };

    match cmd {
        "/exit" | "/quit" => return Slash::Exit,
        "/new" => return Slash::NewConversation,
        "/topic" => return Slash::ShowTopic,

        "/mode" => {
            if arg.is_empty() {
                eprintln!("Current mode: {}", mode_label(*mode));
                eprintln!("Usage: /mode <research|cinephile|game|chat|auto>");
            } else {
                match Mode::parse_selection(arg) {
                    Ok(selected) => {
                        *mode = selected;
                        eprintln!("Mode set to: {}", mode_label(*mode));
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
        }

        "/clear" => {
            eprint!("\x1B[2J\x1B[1;1H");
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /mode <name>     research, cinephile, game, chat or auto");
            eprintln!("  /new             Start a new conversation");
            eprintln!("  /topic           Show the current topic");
            eprintln!("  /clear           Clear the screen");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    Slash::Handled
}

fn mode_label(mode: Option<Mode>) -> &'static str {
    mode.map_or("auto", Mode::as_str)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn send_message(
    coordinator: &TurnCoordinator,
    conversation_id: Uuid,
    mode: Option<Mode>,
    message: &str,
) {
    let req = TurnRequest {
        conversation_id,
        message: message.to_string(),
        explicit_mode: mode,
    };

    match coordinator.handle_message(req).await {
        Ok(outcome) => print_reply(&outcome.reply),
        Err(TurnError::NotPersisted { reply, source }) => {
            print_reply(&reply);
            eprintln!("\x1B[33mwarning: reply not saved: {source}\x1B[0m");
        }
        Err(e) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
    }
}

fn print_reply(reply: &cm_pipeline::Reply) {
    eprintln!("\x1B[2m[{} · {}]\x1B[0m", reply.mode, reply.generation.as_str());
    println!("{}", reply.text);
    println!();
}
