use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_client::{ApiClient, ChatBackend};
use parley_session::{Turn, TurnOutcome, Workspace};

mod commands;
mod config;
mod render;

use crate::commands::Command;
use crate::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = CliConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!(base_url = %config.api.base_url, "starting parley");

    let client = ApiClient::new(config.client_config())?;
    let backend: Arc<dyn ChatBackend> = Arc::new(client);
    let mut workspace = Workspace::new(backend);

    println!("parley: chatting with {} (/help for commands)", config.api.base_url);
    greet(&mut workspace).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        render::prompt()?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read input")?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else { break };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match execute(&mut workspace, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {:#}", e),
        }
    }

    tracing::info!("bye");
    Ok(())
}

async fn greet(workspace: &mut Workspace) {
    match workspace.profile().await {
        Ok(Some(user)) => println!("signed in as {}", user.display_name()),
        Ok(None) => println!("not signed in (/login or /signup)"),
        Err(e) => tracing::warn!(error = %e, "could not load profile"),
    }
}

/// Run one command; `Ok(false)` ends the session
async fn execute(workspace: &mut Workspace, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Send(prompt) => {
            if let Some(turn) = workspace.begin_send(&prompt) {
                drive(workspace, turn).await;
            }
        }
        Command::Edit { index, text } => {
            let target = message_at(workspace, index)?;
            match workspace.begin_edit(&target, &text) {
                Some(turn) => drive(workspace, turn).await,
                None => println!("message {} cannot be edited", index),
            }
        }
        Command::Regenerate(index) => {
            let target = message_at(workspace, index)?;
            match workspace.begin_regenerate(&target) {
                Some(turn) => drive(workspace, turn).await,
                None => println!("message {} is not an assistant reply", index),
            }
        }
        Command::New => {
            workspace.new_chat();
            println!("new chat");
        }
        Command::Threads => {
            let active = workspace.conversation().thread_id().map(str::to_string);
            let threads = workspace.threads().await?;
            render::threads(threads, active.as_deref());
        }
        Command::Open(thread_id) => {
            workspace.open_thread(&thread_id).await?;
            render::history(workspace.conversation().messages());
        }
        Command::Rename { thread_id, title } => {
            workspace.rename_thread(&thread_id, &title).await?;
            println!("renamed {}", thread_id);
        }
        Command::Delete(thread_id) => {
            workspace.delete_thread(&thread_id).await?;
            println!("deleted {}", thread_id);
        }
        Command::History => render::history(workspace.conversation().messages()),
        Command::Login { email, password } => {
            let user = workspace.login(&email, &password).await?;
            println!("signed in as {}", user.display_name());
        }
        Command::Signup {
            email,
            password,
            full_name,
        } => {
            let user = workspace.signup(&full_name, &email, &password).await?;
            println!("account created for {}; /login to continue", user.email);
        }
        Command::Logout => {
            workspace.logout().await;
            println!("signed out");
        }
        Command::WhoAmI => match workspace.profile().await? {
            Some(user) => println!("{} <{}>", user.display_name(), user.email),
            None => println!("not signed in"),
        },
        Command::Profile(update) => {
            let user = workspace.update_profile(update).await?;
            println!("profile updated for {}", user.display_name());
        }
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => return Ok(false),
    }

    Ok(true)
}

fn message_at(workspace: &Workspace, index: usize) -> anyhow::Result<parley_types::MessageId> {
    workspace
        .conversation()
        .messages()
        .get(index - 1)
        .map(|message| message.id.clone())
        .with_context(|| format!("no message {} (see /history)", index))
}

/// Stream one turn to the terminal; Ctrl-C cancels it
async fn drive(workspace: &mut Workspace, turn: Turn) {
    let cancel = turn.cancel_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut printer = render::Printer::default();
    let outcome = workspace.run_turn(turn, &mut printer).await;
    watcher.abort();

    printer.finish(&outcome);
    if let TurnOutcome::Failed(message) = &outcome {
        tracing::debug!(error = %message, "turn failed");
    }
}

fn init_logging(config: &CliConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
