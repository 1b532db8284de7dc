//! CLI channel: stdin/stdout REPL that plays one quest session locally.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::quest::{QuestEngine, QuestRole, SessionState, SessionStore};

/// A parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Say(String),
    Hint,
    Email(String),
    Reset,
    Status,
    Quit,
    Empty,
}

impl CliCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        match command {
            "/quit" | "/exit" => Self::Quit,
            "/hint" => Self::Hint,
            "/reset" => Self::Reset,
            "/status" => Self::Status,
            "/email" => Self::Email(rest.to_string()),
            _ => Self::Say(line.to_string()),
        }
    }
}

/// Run the REPL on the process's stdin and stdout.
pub async fn run(engine: Arc<QuestEngine>, store: Arc<SessionStore>) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();
    run_with(engine, store, reader, &mut writer).await
}

/// Run the REPL over arbitrary streams until `/quit` or end of input.
pub async fn run_with<R, W>(
    engine: Arc<QuestEngine>,
    store: Arc<SessionStore>,
    reader: R,
    writer: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (id, session) = store.create(engine.new_session()).await;
    tracing::debug!(session_id = %id, "CLI session started");

    {
        let state = session.lock().await;
        print_from(writer, &state, 0).await?;
    }
    writer.write_all(b"> ").await?;
    writer.flush().await?;

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let command = CliCommand::parse(&line);
        let mut state = session.lock().await;
        let before = state.messages().len();

        match command {
            CliCommand::Quit => break,
            CliCommand::Empty => {}
            CliCommand::Say(text) => {
                engine.handle_input(&mut state, &text).await;
                print_from(writer, &state, before).await?;
            }
            CliCommand::Hint => {
                let hint = engine.hint(&mut state).await;
                if state.messages().len() == before {
                    write_block(writer, &hint).await?;
                } else {
                    print_from(writer, &state, before).await?;
                }
            }
            CliCommand::Email(address) => {
                let line = match engine.capture_email(&mut state, &address) {
                    Ok(()) => {
                        "✅ Email captured. Your badges and report card are on the way.".to_string()
                    }
                    Err(e) => format!("❌ {e}"),
                };
                write_block(writer, &line).await?;
            }
            CliCommand::Reset => {
                state.reset();
                print_from(writer, &state, 0).await?;
            }
            CliCommand::Status => {
                write_block(writer, &status_line(&state)).await?;
            }
        }

        writer.write_all(b"> ").await?;
        writer.flush().await?;
    }

    store.remove(id).await?;
    Ok(())
}

/// Print the assistant messages logged since index `from`.
async fn print_from<W>(writer: &mut W, state: &SessionState, from: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for message in &state.messages()[from..] {
        if message.role == QuestRole::Assistant {
            write_block(writer, &message.content).await?;
        }
    }
    Ok(())
}

async fn write_block<W>(writer: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(format!("\n{text}\n\n").as_bytes()).await?;
    Ok(())
}

fn status_line(state: &SessionState) -> String {
    let filled = usize::from(state.progress() / 10);
    let badges = if state.badges().is_empty() {
        "No badges yet".to_string()
    } else {
        state.badges().join(" • ")
    };
    format!(
        "Module {} [{}{}] {}% | {}",
        state.stage().module_index(),
        "#".repeat(filled),
        "-".repeat(10 - filled),
        state.progress(),
        badges
    )
}
