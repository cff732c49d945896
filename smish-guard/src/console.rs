//! Line-oriented operator console
//!
//! Reads operator input from stdin and renders runtime events on stdout.
//! While verifications are pending, a plain line answers the oldest one.

use crate::classifier::Label;
use crate::error::{GuardError, Result};
use crate::export;
use crate::message::Message;
use crate::pipeline::Outcome;
use crate::runtime::{Event, EventReceiver, RuntimeHandle};
use crate::store::LogEntry;
use crate::verification::{Decision, PendingVerification, Ticket};
use std::collections::VecDeque;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a message and press Enter to classify it.
  /ocr <text>             classify text extracted from an image
  /net on|off             start or stop the network listener
  /list [label]           show the log, optionally one label only
  /remove <n>             delete entry n
  /save <path>            save all unique entries
  /save-one <n> <path>    save entry n
  /append <n> [path]      append entry n to the combined log
  /quit                   exit";

/// Parsed operator line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Classify(String),
    Ocr(String),
    Network(bool),
    List(Option<Label>),
    Remove(usize),
    Save(PathBuf),
    SaveOne(usize, PathBuf),
    Append(usize, Option<PathBuf>),
    Help,
    Quit,
    Invalid(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Classify(line.to_string());
        };

        let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let args = args.trim();
        let mut words = args.split_whitespace();

        match name {
            "ocr" => Self::Ocr(args.to_string()),
            "net" => match args {
                "on" => Self::Network(true),
                "off" => Self::Network(false),
                _ => Self::Invalid("usage: /net on|off".to_string()),
            },
            "list" => match args {
                "" | "all" | "All" => Self::List(None),
                label => Self::List(Some(Label::from_raw(label))),
            },
            "remove" => match parse_index(words.next()) {
                Some(n) => Self::Remove(n),
                None => Self::Invalid("usage: /remove <n>".to_string()),
            },
            "save" if !args.is_empty() => Self::Save(PathBuf::from(args)),
            "save" => Self::Invalid("usage: /save <path>".to_string()),
            "save-one" => match (parse_index(words.next()), words.next()) {
                (Some(n), Some(path)) => Self::SaveOne(n, PathBuf::from(path)),
                _ => Self::Invalid("usage: /save-one <n> <path>".to_string()),
            },
            "append" => match parse_index(words.next()) {
                Some(n) => Self::Append(n, words.next().map(PathBuf::from)),
                None => Self::Invalid("usage: /append <n> [path]".to_string()),
            },
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Invalid(format!("unknown command /{}", other)),
        }
    }
}

/// 1-based entry number
fn parse_index(word: Option<&str>) -> Option<usize> {
    word?.parse::<usize>().ok().filter(|n| *n > 0)
}

/// Operator front-end over a running pipeline
pub struct Console {
    handle: RuntimeHandle,
    events: EventReceiver,
    combined_log_path: PathBuf,
    pending: VecDeque<PendingVerification>,
    /// Highest ticket ever queued; tickets only grow
    newest_ticket: Ticket,
    unsaved: bool,
    quit_requested: bool,
}

impl Console {
    pub fn new(handle: RuntimeHandle, events: EventReceiver, combined_log_path: PathBuf) -> Self {
        Self {
            handle,
            events,
            combined_log_path,
            pending: VecDeque::new(),
            newest_ticket: 0,
            unsaved: false,
            quit_requested: false,
        }
    }

    /// Run until `/quit` or end of input, then shut the runtime down
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{}", HELP);

        loop {
            tokio::select! {
                biased;

                event = self.events.recv() => match event {
                    Some(event) => self.show_event(event),
                    None => break,
                },
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_line(&line).await {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        self.handle.shutdown().await
    }

    /// Returns `false` once the operator has quit
    async fn handle_line(&mut self, line: &str) -> bool {
        if !self.pending.is_empty() && !line.trim_start().starts_with('/') {
            self.answer_pending(line).await;
            return true;
        }

        let command = ConsoleCommand::parse(line);
        if command != ConsoleCommand::Quit {
            self.quit_requested = false;
        }

        match command {
            ConsoleCommand::Classify(text) => self.submit(Message::manual(text)).await,
            ConsoleCommand::Ocr(text) => self.submit(Message::ocr(text)).await,
            ConsoleCommand::Network(true) => match self.handle.start_network().await {
                Ok(addr) => println!("Network listener on {}", addr),
                Err(e) => println!("! {}", e),
            },
            ConsoleCommand::Network(false) => {
                if let Err(e) = self.handle.stop_network().await {
                    println!("! {}", e);
                }
            }
            ConsoleCommand::List(filter) => self.list(filter.as_ref()).await,
            ConsoleCommand::Remove(n) => match self.entry(n).await {
                Some(entry) => {
                    if let Err(e) = self.handle.remove(entry.id).await {
                        println!("! {}", e);
                    }
                }
                None => println!("! no entry {}", n),
            },
            ConsoleCommand::Save(path) => match export::export_all(self.handle.store(), &path).await {
                Ok(0) => println!("Nothing to save"),
                Ok(count) => {
                    self.unsaved = false;
                    println!("Saved {} entries to {}", count, path.display());
                }
                Err(e) => println!("! Failed to save logs: {}", e),
            },
            ConsoleCommand::SaveOne(n, path) => match self.entry(n).await {
                Some(entry) => match export::save_entry(&entry, &path).await {
                    Ok(()) => println!("Log saved to {}", path.display()),
                    Err(e) => println!("! Failed to save log: {}", e),
                },
                None => println!("! no entry {}", n),
            },
            ConsoleCommand::Append(n, path) => {
                let path = path.unwrap_or_else(|| self.combined_log_path.clone());
                match self.entry(n).await {
                    Some(entry) => match export::append_entry(&entry, &path).await {
                        Ok(()) => println!("Appended to {}", path.display()),
                        Err(e) => println!("! Failed to append log: {}", e),
                    },
                    None => println!("! no entry {}", n),
                }
            }
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => {
                if self.quit_requested || (!self.unsaved && self.pending.is_empty()) {
                    return false;
                }

                self.quit_requested = true;
                if !self.pending.is_empty() {
                    println!(
                        "{} message(s) still await verification and will not be logged.",
                        self.pending.len()
                    );
                }
                if self.unsaved {
                    println!("You have unsaved logs. Use /save <path> to keep them.");
                }
                println!("Type /quit again to exit anyway.");
            }
            ConsoleCommand::Invalid(reason) => println!("! {}", reason),
        }

        true
    }

    async fn submit(&mut self, message: Message) {
        match self.handle.submit(message).await {
            Ok(Outcome::PendingVerification(pending)) => self.enqueue(pending),
            Ok(Outcome::Logged(_)) => {}
            Err(GuardError::EmptyMessage) => println!("! Please enter a message first."),
            // announced through a Notice event
            Err(GuardError::ModelUnavailable) => {}
            Err(e) => println!("! {}", e),
        }
    }

    async fn answer_pending(&mut self, line: &str) {
        let decision = match Decision::parse(line) {
            Ok(decision) => decision,
            Err(e) => {
                println!("! {}", e);
                self.prompt();
                return;
            }
        };

        if let Some(pending) = self.pending.pop_front() {
            if let Err(e) = self.handle.resolve(pending.ticket, decision).await {
                println!("! {}", e);
            }
        }
        self.prompt();
    }

    async fn list(&self, filter: Option<&Label>) {
        let entries = self.handle.store().list(None).await;
        let mut shown = 0;

        for (i, entry) in entries.iter().enumerate() {
            if filter.map_or(true, |label| &entry.label == label) {
                print!("{:>3}. {}", i + 1, export::render_block(entry));
                shown += 1;
            }
        }

        if shown == 0 {
            println!("(no entries)");
        }
    }

    /// Entry by its 1-based position in the full log
    async fn entry(&self, n: usize) -> Option<LogEntry> {
        self.handle.store().list(None).await.into_iter().nth(n - 1)
    }

    fn show_event(&mut self, event: Event) {
        match event {
            Event::Logged(entry) => {
                if entry.label != Label::Info {
                    self.unsaved = true;
                }
                print!("{}", export::render_block(&entry));
            }
            Event::VerificationRequested(pending) => self.enqueue(pending),
            Event::Removed(entry) => {
                self.unsaved = true;
                println!("Deleted: [{}] {}", entry.label, entry.message);
            }
            Event::Notice(text) => println!("! {}", text),
        }
    }

    /// Queue a verification once, whether it arrives as a reply or an event
    fn enqueue(&mut self, pending: PendingVerification) {
        if pending.ticket <= self.newest_ticket {
            return;
        }

        self.newest_ticket = pending.ticket;
        self.pending.push_back(pending);
        if self.pending.len() == 1 {
            self.prompt();
        }
    }

    fn prompt(&self) {
        let Some(pending) = self.pending.front() else {
            return;
        };

        println!("Verify message #{}: {}", pending.ticket, pending.message.text());
        for warning in pending.evidence.warnings() {
            println!("    {}", warning);
        }
        println!(
            "Automated verdict: {}. Enter to accept, or type legit / spam / smishing:",
            pending.verdict
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, LinearModel, TfidfVectorizer};
    use crate::config::Config;
    use crate::runtime::Runtime;
    use crate::store::LogStore;
    use std::collections::HashMap;
    use tokio::task::JoinHandle;

    /// Binary model: any text containing "prize" is Smishing
    fn prize_classifier() -> Classifier {
        let vocabulary = HashMap::from([("prize".to_string(), 0)]);
        let vectorizer = TfidfVectorizer::new(vocabulary, vec![1.0]).unwrap();
        let model = LinearModel::new(vec![0, 1], vec![vec![5.0]], vec![-1.0]).unwrap();
        Classifier::new(vectorizer, model)
    }

    fn console() -> (Console, JoinHandle<()>) {
        let mut config = Config::default();
        config.listener.listen_addr = "127.0.0.1:0".to_string();

        let (runtime, handle, events) = Runtime::spawn(&config, prize_classifier(), LogStore::new());
        (Console::new(handle, events, PathBuf::from("combined_logs.txt")), runtime)
    }

    async fn labels(console: &Console) -> Vec<(String, Label)> {
        console
            .handle
            .store()
            .list(None)
            .await
            .into_iter()
            .map(|e| (e.message, e.label))
            .collect()
    }

    #[tokio::test]
    async fn test_next_line_answers_pending_verification() {
        let (mut console, runtime) = console();

        assert!(console.handle_line("Claim your prize").await);
        assert_eq!(console.pending.len(), 1);

        // answered before the event stream is drained
        assert!(console.handle_line("spam").await);
        assert!(console.pending.is_empty());
        assert_eq!(
            labels(&console).await,
            vec![("Claim your prize".to_string(), Label::Spam)]
        );

        // the late event for the same ticket is not queued again
        while let Ok(event) = console.events.try_recv() {
            console.show_event(event);
        }
        assert!(console.pending.is_empty());

        console.handle.shutdown().await.unwrap();
        runtime.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_answer_accepts_verdict() {
        let (mut console, runtime) = console();

        console.handle_line("Claim your prize").await;
        console.handle_line("").await;
        assert_eq!(
            labels(&console).await,
            vec![("Claim your prize".to_string(), Label::Smishing)]
        );

        console.handle.shutdown().await.unwrap();
        runtime.await.unwrap();
    }

    #[tokio::test]
    async fn test_quit_warns_about_pending_verification() {
        let (mut console, runtime) = console();

        console.handle_line("Claim your prize").await;
        assert!(console.handle_line("/quit").await);
        assert!(!console.handle_line("/quit").await);

        console.handle.shutdown().await.unwrap();
        runtime.await.unwrap();
    }

    #[tokio::test]
    async fn test_quit_without_pending_or_unsaved() {
        let (mut console, runtime) = console();
        assert!(!console.handle_line("/quit").await);

        console.handle.shutdown().await.unwrap();
        runtime.await.unwrap();
    }

    #[test]
    fn test_plain_text_is_classify() {
        assert_eq!(
            ConsoleCommand::parse("  Win a prize "),
            ConsoleCommand::Classify("Win a prize".to_string())
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ConsoleCommand::parse("/ocr FREE entry"),
            ConsoleCommand::Ocr("FREE entry".to_string())
        );
        assert_eq!(ConsoleCommand::parse("/net on"), ConsoleCommand::Network(true));
        assert_eq!(ConsoleCommand::parse("/net off"), ConsoleCommand::Network(false));
        assert_eq!(ConsoleCommand::parse("/list"), ConsoleCommand::List(None));
        assert_eq!(
            ConsoleCommand::parse("/list spam"),
            ConsoleCommand::List(Some(Label::Spam))
        );
        assert_eq!(ConsoleCommand::parse("/remove 2"), ConsoleCommand::Remove(2));
        assert_eq!(
            ConsoleCommand::parse("/save logs.txt"),
            ConsoleCommand::Save(PathBuf::from("logs.txt"))
        );
        assert_eq!(
            ConsoleCommand::parse("/save-one 1 one.txt"),
            ConsoleCommand::SaveOne(1, PathBuf::from("one.txt"))
        );
        assert_eq!(ConsoleCommand::parse("/append 3"), ConsoleCommand::Append(3, None));
        assert_eq!(ConsoleCommand::parse("/quit"), ConsoleCommand::Quit);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(ConsoleCommand::parse("/remove 0"), ConsoleCommand::Invalid(_)));
        assert!(matches!(ConsoleCommand::parse("/remove x"), ConsoleCommand::Invalid(_)));
        assert!(matches!(ConsoleCommand::parse("/net maybe"), ConsoleCommand::Invalid(_)));
        assert!(matches!(ConsoleCommand::parse("/save"), ConsoleCommand::Invalid(_)));
        assert!(matches!(ConsoleCommand::parse("/frobnicate"), ConsoleCommand::Invalid(_)));
    }
}
