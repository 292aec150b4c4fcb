//! A terminal chat client built on `gemchat`.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use gemchat::core::{ChatSessionBuilder, Message};
use gemchat::render::render_message;
use gemchat_gemini::GeminiProvider;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::interval;

enum UiEvent {
    Message(Message),
    Typing(bool),
}

const TYPING_MESSAGE: &str = "Bot is typing...";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match gemchat::config_from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    let model = config.model().to_owned();
    let provider = GeminiProvider::new(config);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let session = ChatSessionBuilder::with_provider(provider)
        .on_message({
            let event_tx = event_tx.clone();
            move |msg| {
                event_tx.send(UiEvent::Message(msg.clone())).ok();
            }
        })
        .on_typing_changed(move |typing| {
            event_tx.send(UiEvent::Typing(typing)).ok();
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    println!("{} {}", "AI Chatbot".bold(), format!("({model})").dimmed());
    println!();
    prompt();

    let mut lines = spawn_line_reader();
    let mut ticker = interval(Duration::from_millis(100));
    let mut progress_bar: Option<ProgressBar> = None;
    let mut input_closed = false;

    loop {
        select! {
            line = lines.recv(), if !input_closed => {
                let Some(line) = line else {
                    debug!("input closed");
                    input_closed = true;
                    // Let the replies in flight land before quitting.
                    if !session.is_typing() {
                        break;
                    }
                    continue;
                };
                if session.send_message(&line).await.is_none() {
                    prompt();
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                match event {
                    UiEvent::Message(msg) => {
                        print_message(progress_bar.as_ref(), &msg);
                    }
                    UiEvent::Typing(true) => {
                        progress_bar.get_or_insert_with(|| {
                            let progress_bar = ProgressBar::new_spinner();
                            progress_bar.set_style(progress_style.clone());
                            progress_bar.set_message(TYPING_MESSAGE);
                            progress_bar
                        });
                    }
                    UiEvent::Typing(false) => {
                        // Finish the spinner before printing anything else.
                        if let Some(progress_bar) = progress_bar.take() {
                            progress_bar.finish_and_clear();
                        }
                        if input_closed {
                            break;
                        }
                        prompt();
                    }
                }
            }
            _ = ticker.tick() => {
                if let Some(progress_bar) = &progress_bar {
                    progress_bar.tick();
                }
            }
        }
    }
    println!();
}

fn print_message(progress_bar: Option<&ProgressBar>, msg: &Message) {
    let rendered = render_message(msg);
    match progress_bar {
        Some(progress_bar) => progress_bar.suspend(|| {
            println!("{rendered}\n");
        }),
        None => println!("{rendered}\n"),
    }
}

fn prompt() {
    print!("> ");
    std::io::stdout().flush().ok();
}

fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = io::BufReader::new(io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    error!("error reading input: {}", err);
                    break;
                }
            }
        }
    });
    line_rx
}
