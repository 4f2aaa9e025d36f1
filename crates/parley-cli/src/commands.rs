use anyhow::{bail, Context, Result};
use parley_types::ProfileUpdate;

pub const HELP: &str = "\
Type a message and press enter to send it.

  /new                              start a new chat
  /threads                          list your threads
  /open <thread-id>                 open a thread
  /rename <thread-id> <title>       rename a thread
  /delete <thread-id>               delete a thread
  /history                          show the open conversation
  /edit <n> <text>                  rewrite message n and regenerate
  /regen <n>                        regenerate assistant reply n
  /login <email> <password>         sign in
  /signup <email> <password> <name> create an account
  /logout                           sign out
  /whoami                           show the signed-in user
  /profile name <full name>         change your display name
  /profile avatar <url>             change your avatar
  /password <new password>          change your password
  /help                             show this help
  /quit                             exit

Ctrl-C stops a reply that is streaming; at the prompt it exits.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    New,
    Threads,
    Open(String),
    Rename { thread_id: String, title: String },
    Delete(String),
    History,
    /// 1-based position in `/history`
    Edit { index: usize, text: String },
    Regenerate(usize),
    Login { email: String, password: String },
    Signup { email: String, password: String, full_name: String },
    Logout,
    WhoAmI,
    /// `/profile` and `/password` both land here
    Profile(ProfileUpdate),
    Help,
    Quit,
}

/// Parse one input line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Some(Command::Send(line.trim_end_matches(['\r', '\n']).to_string())));
    };

    let (name, args) = split_word(rest);
    let command = match name {
        "new" => Command::New,
        "threads" => Command::Threads,
        "history" => Command::History,
        "logout" => Command::Logout,
        "whoami" => Command::WhoAmI,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "open" => Command::Open(required(args, "/open <thread-id>")?.to_string()),
        "delete" => Command::Delete(required(args, "/delete <thread-id>")?.to_string()),
        "rename" => {
            let (thread_id, title) = split_word(args);
            Command::Rename {
                thread_id: required(thread_id, "/rename <thread-id> <title>")?.to_string(),
                title: required(title, "/rename <thread-id> <title>")?.to_string(),
            }
        }
        "edit" => {
            let (index, text) = split_word(args);
            Command::Edit {
                index: position(index, "/edit <n> <text>")?,
                text: required(text, "/edit <n> <text>")?.to_string(),
            }
        }
        "regen" => Command::Regenerate(position(args, "/regen <n>")?),
        "login" => {
            let (email, password) = split_word(args);
            Command::Login {
                email: required(email, "/login <email> <password>")?.to_string(),
                password: required(password, "/login <email> <password>")?.to_string(),
            }
        }
        "signup" => {
            let usage = "/signup <email> <password> <full name>";
            let (email, rest) = split_word(args);
            let (password, full_name) = split_word(rest);
            Command::Signup {
                email: required(email, usage)?.to_string(),
                password: required(password, usage)?.to_string(),
                full_name: required(full_name, usage)?.to_string(),
            }
        }
        "profile" => {
            let usage = "/profile name <full name> | /profile avatar <url>";
            let (field, value) = split_word(args);
            let value = required(value, usage)?;
            match field {
                "name" => Command::Profile(ProfileUpdate::new().full_name(value)),
                "avatar" => Command::Profile(ProfileUpdate::new().avatar_url(value)),
                _ => bail!("usage: {}", usage),
            }
        }
        "password" => Command::Profile(
            ProfileUpdate::new().password(required(args, "/password <new password>")?),
        ),
        other => bail!("unknown command /{} (try /help)", other),
    };

    Ok(Some(command))
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str> {
    if value.is_empty() {
        bail!("usage: {}", usage);
    }
    Ok(value)
}

fn position(value: &str, usage: &str) -> Result<usize> {
    let index: usize = required(value, usage)?
        .parse()
        .with_context(|| format!("usage: {}", usage))?;
    if index == 0 {
        bail!("messages are numbered from 1");
    }
    Ok(index)
}
