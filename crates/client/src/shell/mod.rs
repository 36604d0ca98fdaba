//! Line-oriented command shell over a running [`AppHandle`].
mod command;
mod render;

pub use command::{Command, CommandError, HELP};
pub use render::TerminalRenderer;

use anyhow::{Context, Result};
use client_bootstrap::AppHandle;
use client_core::{GuardState, Navigator, NewSimulation, SessionContext};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const PROMPT: &str = "riqa> ";

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

pub struct Shell {
    navigator: Navigator<TerminalRenderer>,
    session: SessionContext,
}

impl Shell {
    pub fn new(app: &AppHandle) -> Self {
        Self {
            navigator: app.navigator(TerminalRenderer::default()),
            session: app.session(),
        }
    }

    pub fn navigator(&self) -> &Navigator<TerminalRenderer> {
        &self.navigator
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// Command failures are reported on `output` and do not end the loop.
    pub async fn run<I, O>(&mut self, app: &mut AppHandle, input: I, mut output: O) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let reply = match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(command)) => self.execute(app, command).await,
                Err(err) => Err(err.into()),
            };

            let text = match reply {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue(text)) => text,
                Err(err) => {
                    tracing::warn!("Command failed: {:#}", err);
                    format!("error: {err:#}")
                }
            };

            if !text.is_empty() {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
        }

        output.flush().await?;
        Ok(())
    }

    pub async fn execute(&mut self, app: &mut AppHandle, command: Command) -> Result<Flow> {
        let text = match command {
            Command::Go(path) => {
                let navigation = self.navigator.navigate(&path)?;
                let mut lines = self.navigator.renderer_mut().drain();
                if navigation.state == GuardState::Redirected {
                    lines.insert(0, format!("{path} requires sign-in"));
                }
                lines.join("\n")
            }
            Command::Login { email, password } => {
                self.session.observe();
                let user = app.auth().sign_in_with_password(&email, &password).await?;
                self.session.changed().await;
                format!("signed in as {user}")
            }
            Command::Signup { email, password } => {
                self.session.observe();
                let user = app.auth().sign_up(&email, &password).await?;
                self.session.changed().await;
                format!("created account {user}")
            }
            Command::Logout => {
                self.session.observe();
                app.auth().sign_out().await?;
                self.session.changed().await;
                "signed out".to_string()
            }
            Command::Whoami => {
                let snapshot = self.session.snapshot();
                match (snapshot.current_user_id(), snapshot.user()) {
                    (Some(user_id), Some(user)) => match user.expires_at {
                        Some(at) => format!("{user_id} (token expires {})", at.to_rfc3339()),
                        None => user_id.to_string(),
                    },
                    (None, Some(_)) => "anonymous (token expired)".to_string(),
                    _ => "anonymous".to_string(),
                }
            }
            Command::Submit { endpoint, body } => {
                let response = app.api().submit(&endpoint, body).await?;
                format!(
                    "{} {}",
                    response.status,
                    serde_json::to_string_pretty(&response.body)?
                )
            }
            Command::Save(payload) => {
                let owner = self
                    .session
                    .current_user_id()
                    .context("sign in to save simulations")?;
                let id = app.store().save(NewSimulation::new(owner, payload)).await?;
                format!("saved {id}")
            }
            Command::List => {
                let owner = self
                    .session
                    .current_user_id()
                    .context("sign in to list simulations")?;
                let mut records = app.store().find_by_owner(&owner).await?;
                if records.is_empty() {
                    "no simulations".to_string()
                } else {
                    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                    records
                        .iter()
                        .map(|record| {
                            format!(
                                "{}  {}  {}",
                                record.id,
                                record.created_at.to_rfc3339(),
                                record.payload
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::Connect => {
                app.realtime_mut().connect().await?;
                format!("realtime connected to {}", app.realtime().url())
            }
            Command::Disconnect => {
                app.realtime_mut().disconnect();
                "realtime disconnected".to_string()
            }
            Command::Routes => self
                .navigator
                .routes()
                .routes()
                .iter()
                .map(|route| {
                    let access = if route.requires_auth {
                        "sign-in required"
                    } else {
                        "public"
                    };
                    format!("{:<10} {:<10} {}", route.path, route.view, access)
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Flow::Quit),
        };

        Ok(Flow::Continue(text))
    }
}
