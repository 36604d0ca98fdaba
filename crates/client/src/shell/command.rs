//! Parsing of shell input lines.

use serde_json::Value;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  go <path>                   navigate to a route
  login <email> <password>    sign in
  signup <email> <password>   create an account and sign in
  logout                      sign out
  whoami                      show the current session
  submit <endpoint> <json>    POST json to the backend
  save <json>                 store a simulation record
  list                        list your simulation records
  connect | disconnect        open or close the realtime channel
  routes                      list routes
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?}, try `help`")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid JSON: {0}")]
    Json(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Go(String),
    Login { email: String, password: String },
    Signup { email: String, password: String },
    Logout,
    Whoami,
    Submit { endpoint: String, body: Value },
    Save(Value),
    List,
    Connect,
    Disconnect,
    Routes,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "go" => Command::Go(single(rest, "go <path>")?),
            "login" => {
                let (email, password) = credentials(rest, "login <email> <password>")?;
                Command::Login { email, password }
            }
            "signup" => {
                let (email, password) = credentials(rest, "signup <email> <password>")?;
                Command::Signup { email, password }
            }
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "submit" => {
                let usage = "submit <endpoint> <json>";
                let (endpoint, body) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if endpoint.is_empty() {
                    return Err(CommandError::Usage(usage));
                }
                Command::Submit {
                    endpoint: endpoint.to_string(),
                    body: json_or_null(body)?,
                }
            }
            "save" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("save <json>"));
                }
                Command::Save(json_or_null(rest)?)
            }
            "list" => Command::List,
            "connect" => Command::Connect,
            "disconnect" => Command::Disconnect,
            "routes" => Command::Routes,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn single(rest: &str, usage: &'static str) -> Result<String, CommandError> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(word), None) => Ok(word.to_string()),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn credentials(rest: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(email), Some(password), None) => Ok((email.to_string(), password.to_string())),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn json_or_null(raw: &str) -> Result<Value, CommandError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).map_err(|err| CommandError::Json(err.to_string()))
}
