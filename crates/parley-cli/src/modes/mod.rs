//! Interactive chat mode.
//!
//! The terminal adapter over the core session controller: it maps input
//! lines to controller operations and renders controller state and stream
//! events. Every operation error is converted to a transient `[!]` notice
//! here; nothing propagates out of the loop except I/O failures on
//! stdin/stdout.
//!
//! The loop is strictly sequential: while a reply streams, no input is
//! consumed, which is the strongest form of the disabled-send contract.
//! Orphaning of in-flight replies on switch/delete/sign-out is a core
//! controller concern and works regardless of which adapter drives it.

use std::io::Write;

use anyhow::Result;
use futures_util::StreamExt;
use parley_core::api::ChatApiClient;
use parley_core::config;
use parley_core::confirm::DeleteConfirmation;
use parley_core::error::{ClientError, ClientErrorKind};
use parley_core::reply::ReplyEvent;
use parley_core::session::{REPLY_FALLBACK_TEXT, Role, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

type InputLines = Lines<BufReader<Stdin>>;

/// Outcome of one signed-in chat loop.
enum LoopOutcome {
    Quit,
    SignedOut,
}

pub async fn run_interactive_chat(base_url: &str, user: Option<&str>) -> Result<()> {
    let api = ChatApiClient::new(base_url);
    let mut controller = SessionController::new(api);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("parley chat (type /help for commands, /quit to quit)");

    let mut preset_user = user.map(str::to_string);
    loop {
        let Some(user_id) = next_user_id(&mut preset_user, &mut input).await? else {
            // stdin closed before a user ID was provided
            return Ok(());
        };

        if let Err(err) = controller.login(&user_id).await {
            notify(&err);
            continue;
        }

        if let Err(err) = config::store_last_user(&user_id) {
            debug!("failed to store last user ID: {err:#}");
        }

        println!("Signed in as {user_id}.");
        render_conversations(&controller);
        if let Some(session) = controller.current_session() {
            println!("Started conversation {session}.");
        }

        match chat_loop(&mut controller, &mut input).await? {
            LoopOutcome::Quit => break,
            LoopOutcome::SignedOut => println!("Signed out."),
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Resolves the next user ID: the `--user` flag once, then the sign-in
/// prompt. The last-used ID prepopulates the prompt but is only submitted
/// when the user accepts it with an empty line.
async fn next_user_id(
    preset: &mut Option<String>,
    input: &mut InputLines,
) -> Result<Option<String>> {
    if let Some(user) = preset.take() {
        return Ok(Some(user));
    }

    let last = config::load_last_user();
    match &last {
        Some(last) => print!("User ID [{last}]: "),
        None => print!("User ID: "),
    }
    flush_stdout();

    let Some(line) = input.next_line().await? else {
        return Ok(None);
    };
    let trimmed = line.trim();
    if trimmed.is_empty()
        && let Some(last) = last
    {
        return Ok(Some(last));
    }
    Ok(Some(trimmed.to_string()))
}

async fn chat_loop(
    controller: &mut SessionController,
    input: &mut InputLines,
) -> Result<LoopOutcome> {
    let mut confirm = DeleteConfirmation::default();

    loop {
        let Some(line) = input.next_line().await? else {
            return Ok(LoopOutcome::Quit);
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            match handle_command(controller, &mut confirm, command).await {
                CommandOutcome::Continue => {}
                CommandOutcome::Quit => return Ok(LoopOutcome::Quit),
                CommandOutcome::SignedOut => return Ok(LoopOutcome::SignedOut),
            }
            continue;
        }

        send_and_render(controller, &line).await;
    }
}

enum CommandOutcome {
    Continue,
    Quit,
    SignedOut,
}

async fn handle_command(
    controller: &mut SessionController,
    confirm: &mut DeleteConfirmation,
    command: &str,
) -> CommandOutcome {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();

    match name {
        "help" => print_help(),
        "quit" | "q" => return CommandOutcome::Quit,
        "list" => render_conversations(controller),
        "new" => match controller.start_or_join("").await {
            Ok(()) => {
                if let Some(session) = controller.current_session() {
                    println!("Started conversation {session}.");
                }
            }
            Err(err) => notify(&err),
        },
        "switch" => match resolve_target(controller, arg) {
            Some(target) => match controller.switch_conversation(&target).await {
                Ok(()) => {
                    println!("Switched to conversation {target}.");
                    render_history(controller);
                }
                Err(err) => notify(&err),
            },
            None => println!("[!] Usage: /switch <number|session-id>"),
        },
        "delete" => match resolve_target(controller, arg) {
            Some(target) => {
                confirm.request_delete(target.clone());
                println!("Delete conversation {target}? Type /yes to confirm or /no to cancel.");
            }
            None => println!("[!] Usage: /delete <number|session-id>"),
        },
        "yes" => {
            if let Some(target) = confirm.confirm() {
                match controller.delete_conversation(&target).await {
                    Ok(()) => {
                        println!("Conversation deleted.");
                        render_conversations(controller);
                    }
                    Err(err) => notify(&err),
                }
            }
        }
        "no" => confirm.cancel(),
        "signout" => {
            controller.sign_out();
            return CommandOutcome::SignedOut;
        }
        other => println!("[!] Unknown command: /{other}"),
    }
    CommandOutcome::Continue
}

/// Sends one message and renders the streaming reply chunk by chunk.
async fn send_and_render(controller: &mut SessionController, text: &str) {
    let mut stream = match controller.send_message(text).await {
        Ok(stream) => stream,
        Err(err) => {
            notify(&err);
            if matches!(err.kind, ClientErrorKind::Remote | ClientErrorKind::Transport) {
                // The controller recorded the fallback line in place of a reply.
                println!("assistant: {REPLY_FALLBACK_TEXT}");
            }
            return;
        }
    };
    let ticket = stream.ticket();

    print!("assistant: ");
    flush_stdout();

    while let Some(event) = stream.next().await {
        match event {
            Ok(ReplyEvent::Delta { text }) => {
                print!("{text}");
                flush_stdout();
            }
            Ok(ReplyEvent::Completed { text }) => {
                println!();
                if let Err(err) = controller.complete_reply(ticket, &text).await {
                    notify(&err);
                }
                return;
            }
            Err(err) => {
                println!();
                controller.fail_reply(ticket);
                println!("assistant: {REPLY_FALLBACK_TEXT}");
                notify(&err);
                return;
            }
        }
    }

    // Ended without a terminal event: the stream was orphaned elsewhere.
    println!();
}

fn notify(err: &ClientError) {
    println!("[!] {err}");
    // Details stay out of the transcript; they are for diagnostics only.
    debug!(kind = %err.kind, details = ?err.details, "operation failed");
}

fn render_conversations(controller: &SessionController) {
    let conversations = controller.conversations();
    if conversations.is_empty() {
        println!("No conversations yet.");
        return;
    }

    println!("Conversations:");
    for (index, summary) in conversations.iter().enumerate() {
        let marker = if controller.current_session() == Some(summary.session_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}. {}  ({} messages)",
            index + 1,
            summary.session_id,
            summary.message_count
        );
    }
}

fn render_history(controller: &SessionController) {
    for message in controller.messages() {
        match message.role {
            Role::User => println!("you: {}", message.content),
            Role::Assistant => println!("assistant: {}", message.content),
        }
    }
}

/// Resolves a `/switch` or `/delete` argument: a 1-based listing index or a
/// raw session ID.
fn resolve_target(controller: &SessionController, arg: Option<&str>) -> Option<String> {
    let arg = arg?;
    if let Ok(index) = arg.parse::<usize>() {
        let conversations = controller.conversations();
        return index
            .checked_sub(1)
            .and_then(|i| conversations.get(i))
            .map(|summary| summary.session_id.clone());
    }
    Some(arg.to_string())
}

fn print_help() {
    println!("Commands:");
    println!("  /list              show your conversations");
    println!("  /new               start a new conversation");
    println!("  /switch <n|id>     switch to a conversation");
    println!("  /delete <n|id>     delete a conversation (asks for confirmation)");
    println!("  /yes, /no          confirm or cancel a pending delete");
    println!("  /signout           sign out and return to the user prompt");
    println!("  /quit              exit");
    println!("Anything else is sent as a message.");
}

fn flush_stdout() {
    let _ = std::io::stdout().flush();
}
