//! Interactive terminal client
//!
//! Three pieces run side by side: a reader task renders server frames,
//! a blocking thread owns the readline prompt, and a sender task turns
//! input lines into protocol messages. All three share a `ClientState`
//! tracking the pending session request and the active partner, so the
//! prompt always reflects the current mode.

use std::io::Write;
use std::sync::Arc;

use chrono::Local;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use crate::codec;
use crate::error::ChatError;
use crate::message::{ClientMessage, Login, ServerMessage};
use crate::time::clock_time;

/// Client-side view of the conversation
///
/// Session membership lives entirely here; the server only relays
/// notices. `partner` names the active private session peer and
/// `pending_request` the user whose request awaits a y/n answer.
pub struct ClientState {
    username: String,
    partner: Option<String>,
    pending_request: Option<String>,
}

/// What to do with one line of user input
#[derive(Debug)]
pub enum LineOutcome {
    /// Send a message to the server
    Send(ClientMessage),
    /// Send, then print a local note
    SendWithNote(ClientMessage, String),
    /// Print a local note only
    Note(String),
    /// Close the client
    Quit,
}

enum Command {
    Quit,
    Users,
    CloseSession,
    OpenSession(String),
    Private { target: String, message: String },
    Say(String),
}

fn parse_command(line: &str) -> Result<Command, &'static str> {
    match line.split_once(' ') {
        None => match line {
            "/quit" => Ok(Command::Quit),
            "/users" => Ok(Command::Users),
            "/exit" => Ok(Command::CloseSession),
            "/session" => Err("Usage: /session username"),
            "/private" => Err("Usage: /private username message"),
            _ => Ok(Command::Say(line.to_string())),
        },
        Some(("/session", rest)) => {
            let target = rest.trim();
            if target.is_empty() {
                Err("Usage: /session username")
            } else {
                Ok(Command::OpenSession(target.to_string()))
            }
        }
        Some(("/private", rest)) => match rest.split_once(' ') {
            Some((target, message)) => Ok(Command::Private {
                target: target.to_string(),
                message: message.to_string(),
            }),
            None => Err("Usage: /private username message"),
        },
        Some(_) => Ok(Command::Say(line.to_string())),
    }
}

impl ClientState {
    pub fn new(username: String) -> Self {
        Self {
            username,
            partner: None,
            pending_request: None,
        }
    }

    /// Prompt string reflecting the current mode
    pub fn prompt(&self) -> String {
        match &self.partner {
            Some(partner) => format!("[private with {}] ", partner),
            None => "> ".to_string(),
        }
    }

    /// Turn one line of input into an action
    ///
    /// Commands always win; only a plain line is taken as the y/n
    /// answer to a pending session request, or as a message to the
    /// active partner.
    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(usage) => return LineOutcome::Note(usage.to_string()),
        };
        match command {
            Command::Quit => LineOutcome::Quit,
            Command::Users => LineOutcome::Send(ClientMessage::Users),
            Command::CloseSession => match self.partner.take() {
                Some(partner) => LineOutcome::Note(format!(
                    "\nLeft the private session with {}\nMode: shared chat",
                    partner
                )),
                None => LineOutcome::Note("No active private session".to_string()),
            },
            Command::OpenSession(target) => {
                if target == self.username {
                    LineOutcome::Note("Cannot start a private session with yourself".to_string())
                } else {
                    LineOutcome::SendWithNote(
                        ClientMessage::SessionRequest {
                            target_username: target.clone(),
                        },
                        format!(
                            "\nPrivate session request sent to {}\nWaiting for a reply...",
                            target
                        ),
                    )
                }
            }
            Command::Private { target, message } => LineOutcome::SendWithNote(
                ClientMessage::Private {
                    target_username: target.clone(),
                    message,
                },
                format!("\nPrivate message sent to {}", target),
            ),
            Command::Say(text) => {
                if let Some(requester) = self.pending_request.take() {
                    let accepted = text == "y" || text == "Y";
                    let note = if accepted {
                        self.partner = Some(requester.clone());
                        format!(
                            "\nPrivate session with {} accepted!\nMode: private session with {}",
                            requester, requester
                        )
                    } else {
                        format!("\nPrivate session with {} declined", requester)
                    };
                    LineOutcome::SendWithNote(
                        ClientMessage::SessionResponse {
                            target_username: requester,
                            accepted,
                        },
                        note,
                    )
                } else if let Some(partner) = self.partner.clone() {
                    LineOutcome::SendWithNote(
                        ClientMessage::Private {
                            target_username: partner.clone(),
                            message: text,
                        },
                        format!("\nPrivate message sent to {}", partner),
                    )
                } else {
                    LineOutcome::Send(ClientMessage::Message { message: text })
                }
            }
        }
    }

    /// Render a server message for display, updating session state
    pub fn apply_server_message(&mut self, msg: &ServerMessage) -> String {
        match msg {
            ServerMessage::Message {
                username,
                message,
                timestamp,
            } => {
                format!("\n[{}] {}: {}", clock_time(timestamp), username, message)
            }
            ServerMessage::Private {
                from_username,
                message,
                timestamp,
            } => {
                format!(
                    "\n[{}] Private from {}: {}",
                    clock_time(timestamp),
                    from_username,
                    message
                )
            }
            ServerMessage::System {
                message,
                online_users,
                timestamp,
            } => {
                format!(
                    "\n[{}] {} (online: {})",
                    clock_time(timestamp),
                    message,
                    online_users
                )
            }
            ServerMessage::UserJoined {
                username,
                online_users,
                timestamp,
                ..
            } => {
                format!(
                    "\n[{}] {} joined the chat (online: {})",
                    clock_time(timestamp),
                    username,
                    online_users
                )
            }
            ServerMessage::UserLeft {
                username,
                online_users,
                timestamp,
                ..
            } => {
                format!(
                    "\n[{}] {} left the chat (online: {})",
                    clock_time(timestamp),
                    username,
                    online_users
                )
            }
            ServerMessage::UsersList { users, timestamp } => {
                let mut out = format!("\n[{}] Online users:", clock_time(timestamp));
                for (i, user) in users.iter().enumerate() {
                    out.push_str(&format!("\n   {}. {}", i + 1, user));
                }
                out.push_str(&format!("\nTotal: {} users", users.len()));
                out
            }
            ServerMessage::SessionRequest { from_username, .. } => {
                self.pending_request = Some(from_username.clone());
                format!(
                    "\n{} wants to start a private session with you\nAccept the private session with {}? (y/n): ",
                    from_username, from_username
                )
            }
            ServerMessage::SessionAccepted {
                from_username,
                to_username,
                message,
                timestamp,
            } => {
                // the notice names both sides; our partner is the other one
                let partner = if *from_username == self.username {
                    to_username.clone()
                } else {
                    from_username.clone()
                };
                let out = format!(
                    "\n[{}] {}\nMode: private session with {}",
                    clock_time(timestamp),
                    message,
                    partner
                );
                self.partner = Some(partner);
                out
            }
            ServerMessage::SessionRejected {
                message, timestamp, ..
            } => {
                let mut out = format!("\n[{}] {}", clock_time(timestamp), message);
                if let Some(partner) = self.partner.take() {
                    out.push_str(&format!(
                        "\nLeft the private session with {}\nMode: shared chat",
                        partner
                    ));
                }
                out
            }
            ServerMessage::Error { message, timestamp } => {
                format!("\n[{}] Error: {}", clock_time(timestamp), message)
            }
        }
    }
}

/// Connect to a server and run the interactive client until it exits
pub async fn run(addr: String, username: Option<String>) -> Result<(), ChatError> {
    println!("=== Multi-user chat client ===");
    println!("Connecting to server: {}", addr);

    let mut rl = DefaultEditor::new()?;
    let username = match username
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
    {
        Some(name) => name,
        None => {
            let entered = rl.readline("Enter your name: ")?;
            let entered = entered.trim().to_string();
            if entered.is_empty() {
                let name = format!("User_{}", Local::now().timestamp() % 10000);
                println!("Using default name: {}", name);
                name
            } else {
                entered
            }
        }
    };

    let stream = TcpStream::connect(&addr).await?;
    let (mut reader, mut writer) = stream.into_split();

    let login = codec::encode(&Login {
        username: username.clone(),
    })?;
    codec::write_frame(&mut writer, &login).await?;

    println!("Connected to the chat server!");
    println!("Your name: {}", username);
    println!("Commands:");
    println!("   /users - list online users");
    println!("   /session username - start a private session");
    println!("   /exit - leave the private session");
    println!("   /private username message - send a one-off private message");
    println!("   /quit - leave the chat");
    println!("\nMode: shared chat");
    println!("{}", "-".repeat(50));

    let state = Arc::new(Mutex::new(ClientState::new(username)));

    let read_state = state.clone();
    let mut read_task = tokio::spawn(async move {
        loop {
            match codec::read_frame(&mut reader).await {
                Ok(Some(frame)) => match codec::decode::<ServerMessage>(&frame) {
                    Ok(msg) => {
                        let rendered = read_state.lock().await.apply_server_message(&msg);
                        if matches!(msg, ServerMessage::SessionRequest { .. }) {
                            // leave the cursor on the y/n question
                            print!("{}", rendered);
                            let _ = std::io::stdout().flush();
                        } else {
                            println!("{}", rendered);
                        }
                    }
                    Err(e) => warn!("Unparseable frame from server: {}", e),
                },
                Ok(None) => {
                    println!("\nConnection closed by server");
                    break;
                }
                Err(e) => {
                    println!("\nConnection to server lost: {}", e);
                    break;
                }
            }
        }
    });

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let input_state = state.clone();
    std::thread::spawn(move || input_loop(rl, input_state, line_tx));

    let send_state = state.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(line) = line_rx.recv().await {
            let outcome = send_state.lock().await.handle_line(&line);
            match outcome {
                LineOutcome::Send(msg) => {
                    if let Err(e) = send_frame(&mut writer, &msg).await {
                        println!("Failed to send message: {}", e);
                        break;
                    }
                }
                LineOutcome::SendWithNote(msg, note) => {
                    if let Err(e) = send_frame(&mut writer, &msg).await {
                        println!("Failed to send message: {}", e);
                        break;
                    }
                    println!("{}", note);
                }
                LineOutcome::Note(note) => println!("{}", note),
                LineOutcome::Quit => {
                    println!("Leaving the chat...");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut read_task => send_task.abort(),
        _ = &mut send_task => read_task.abort(),
    }
    println!("Disconnected from server");
    Ok(())
}

/// Blocking readline loop on a plain thread, so the prompt can track
/// the session mode between lines
fn input_loop(
    mut rl: DefaultEditor,
    state: Arc<Mutex<ClientState>>,
    lines: mpsc::UnboundedSender<String>,
) {
    loop {
        let prompt = state.blocking_lock().prompt();
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                if lines.send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                warn!("Input error: {}", e);
                break;
            }
        }
    }
}

async fn send_frame<W>(writer: &mut W, msg: &ClientMessage) -> Result<(), ChatError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = codec::encode(msg)?;
    codec::write_frame(writer, &bytes).await?;
    Ok(())
}
