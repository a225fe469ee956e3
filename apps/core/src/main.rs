// RSV Assistant terminal shell
// Loads the response bank, wires the classifier and drives one conversation over stdin.

use anyhow::Context;
use rsv_assistant_core::assistant::{Assistant, ChatMode, Conversation, Reply};
use rsv_assistant_core::navigation::{resolve_page, HOME_PAGE, NAV_ITEMS};
use rsv_assistant_core::{AppConfig, IntentClassifier, ResponseBank, StatusReport};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FORMAT_VAR: &str = "RSV_LOG_FORMAT";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var(LOG_FORMAT_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new("rsv-assistant".into(), std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_status(status: &StatusReport) {
    println!(
        "[{}] {} (checked {})",
        status.state,
        status.message,
        status.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

fn print_reply(assistant: &Assistant, conv: &Conversation, reply: &Reply) {
    println!("you> {}", reply.question);
    println!("bot> {}", reply.content);
    if let Some(notice) = reply.notice {
        println!("     ({})", notice.message());
    }
    if let Some(intent_id) = &reply.intent_id {
        for link in assistant.page_links(intent_id) {
            println!("     -> Go to {} [{}]", link.label, link.page);
        }
    }
    let suggestions = assistant.next_best(conv);
    if !suggestions.is_empty() {
        println!("Next best questions:");
        for (index, intent) in suggestions.iter().enumerate() {
            println!("  /pick {}  {}", index + 1, intent.question());
        }
    }
}

fn print_topics(bank: &ResponseBank) {
    for category in bank.categories() {
        println!("{}", category);
        for intent in bank.intents_by_category(category) {
            println!("  /topic {:<26} {}", intent.intent_id, intent.question());
        }
    }
}

fn print_help() {
    println!("Commands: /guided /free /page <name> /topics /topic <id> /pick <n> /status /quit");
    let pages: Vec<&str> = NAV_ITEMS.iter().map(|item| item.label).collect();
    println!("Pages: {}", pages.join(", "));
}

/// One line of shell input.
#[derive(Debug, PartialEq)]
enum Command<'a> {
    Empty,
    Quit,
    Help,
    Mode(ChatMode),
    Status,
    Topics,
    Page(&'a str),
    Topic(&'a str),
    Pick(&'a str),
    Unknown(&'a str),
    /// Anything not starting with `/`.
    Text(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return if line.is_empty() { Command::Empty } else { Command::Text(line) };
        }
        let (command, argument) = match line.split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };
        match command {
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            "/guided" => Command::Mode(ChatMode::Guided),
            "/free" => Command::Mode(ChatMode::FreeText),
            "/status" => Command::Status,
            "/topics" => Command::Topics,
            "/page" => Command::Page(argument),
            "/topic" => Command::Topic(argument),
            "/pick" => Command::Pick(argument),
            other => Command::Unknown(other),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first, so RUST_LOG and RSV_LOG_FORMAT from it reach the subscriber
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!("Starting RSV Assistant with {:?}", config.classifier);

    let bank = match ResponseBank::load_from_dir(&config.data_dir) {
        Ok(bank) => Arc::new(bank),
        Err(e) => {
            error!("Failed to load response bank from {:?}: {}", config.data_dir, e);
            return Err(e).context("cannot serve without a response bank");
        }
    };
    let classifier = Arc::new(IntentClassifier::new(bank.clone(), config.classifier));
    let assistant = Assistant::new(bank.clone(), classifier.clone());
    let mut conv = Conversation::new();

    println!(
        "RSV Assistant: {} intents, model {} (threshold {:.2})",
        bank.len(),
        classifier.model(),
        classifier.confidence_threshold()
    );
    print_status(&assistant.refresh_status(&mut conv, false).await);
    if !assistant.free_text_available() {
        println!("Free-text mode is disabled because OPENAI_API_KEY is not set. Guided questions remain available.");
    }
    print_help();
    if let Some(reply) = assistant.open_page(&mut conv, HOME_PAGE) {
        print_reply(&assistant, &conv, &reply);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Mode(requested) => {
                let mode = assistant.switch_mode(&mut conv, requested).await;
                println!("Mode: {}", mode);
                if let Some(status) = conv.status() {
                    print_status(status);
                }
            }
            Command::Status => print_status(&assistant.refresh_status(&mut conv, true).await),
            Command::Topics => print_topics(&bank),
            Command::Page(name) => match resolve_page(name) {
                Some(item) => match assistant.open_page(&mut conv, item.page) {
                    Some(reply) => print_reply(&assistant, &conv, &reply),
                    None => println!("Already showing the recommended question for {}.", item.label),
                },
                None => println!("Unknown page '{}'.", name),
            },
            Command::Topic(id) => match assistant.select_intent(&mut conv, id) {
                Some(reply) => print_reply(&assistant, &conv, &reply),
                None => println!("Unknown topic '{}'.", id),
            },
            Command::Pick(argument) => {
                let picked = argument
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| assistant.next_best(&conv).get(index).map(|i| i.intent_id.clone()));
                match picked.and_then(|id| assistant.select_intent(&mut conv, &id)) {
                    Some(reply) => print_reply(&assistant, &conv, &reply),
                    None => println!("No suggestion numbered '{}'.", argument),
                }
            }
            Command::Unknown(command) => {
                println!("Unknown command '{}'.", command);
                print_help();
            }
            Command::Text(text) if conv.mode() == ChatMode::FreeText => {
                if let Some(reply) = assistant.ask(&mut conv, text).await {
                    print_reply(&assistant, &conv, &reply);
                }
            }
            Command::Text(_) => {
                println!("Guided mode: use /topics, /topic <id> or /pick <n>, or switch with /free.")
            }
        }
    }

    info!("RSV Assistant stopped");
    Ok(())
}
