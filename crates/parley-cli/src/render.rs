use std::io::{self, Write};

use parley_session::{TurnObserver, TurnOutcome};
use parley_types::{ChatSession, Message, Role};

/// Prints a reply as it streams in
#[derive(Default)]
pub struct Printer {
    started: bool,
}

impl Printer {
    fn begin(&mut self) {
        if !self.started {
            print!("assistant: ");
            self.started = true;
        }
    }

    /// Close the reply line and report how the turn ended
    pub fn finish(&mut self, outcome: &TurnOutcome) {
        if self.started {
            println!();
        }
        match outcome {
            TurnOutcome::Cancelled => println!("[stopped]"),
            TurnOutcome::Completed { reconciled: false } => {
                tracing::debug!("reply kept as streamed");
            }
            TurnOutcome::Completed { reconciled: true } | TurnOutcome::Failed(_) => {}
        }
    }
}

impl TurnObserver for Printer {
    fn on_delta(&mut self, content: &str) {
        self.begin();
        print!("{}", content);
        let _ = io::stdout().flush();
    }

    fn on_error(&mut self, message: &str) {
        if self.started {
            println!();
            self.started = false;
        }
        println!("Error: {}", message);
    }

    fn on_thread_created(&mut self, thread_id: &str) {
        tracing::debug!(thread_id, "new thread");
    }
}

pub fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}

pub fn history(messages: &[Message]) {
    if messages.is_empty() {
        println!("(no messages)");
        return;
    }
    for (index, message) in messages.iter().enumerate() {
        let role = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!("[{}] {}: {}", index + 1, role, message.content);
    }
}

pub fn threads(threads: &[ChatSession], active: Option<&str>) {
    if threads.is_empty() {
        println!("(no threads)");
        return;
    }
    for thread in threads {
        let marker = if Some(thread.id.as_str()) == active { "*" } else { " " };
        println!("{} {}  {}", marker, thread.id, thread.title);
    }
}
