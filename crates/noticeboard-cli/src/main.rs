mod command;
mod term;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use noticeboard_client::{
    ClientConfig, FileStore, HttpTransport, SyncEngine, SyncError, run_poll_loop,
};

use crate::command::{Command, HELP};
use crate::term::TerminalRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they do not interleave with the feed
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noticeboard=info,noticeboard_client=info".into()),
        )
        .init();

    let config = ClientConfig::from_env()?;
    info!(
        "Connecting to {} (state in {})",
        config.base_url,
        config.state_path.display()
    );

    let transport = HttpTransport::from_config(&config)?;
    let store = FileStore::open(&config.state_path);
    let renderer = TerminalRenderer::new(std::io::stdout());
    let engine = Arc::new(SyncEngine::new(transport, renderer, store));

    println!("Posting as {}. /help for commands.", engine.author_name());
    let restored = engine.restore();
    debug!("Restored {} cached notices", restored);

    let poller = tokio::spawn(run_poll_loop(engine.clone(), config.poll_interval));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match Command::parse(&line) {
            Command::Nothing => {}
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Unknown(word) => println!("Unknown command /{}. /help for commands.", word),
            Command::Poll => {
                // Failures are already shown to the user
                let _ = engine.poll().await;
            }
            Command::Rename(name) => {
                if engine.set_author_name(&name).is_ok() {
                    println!("Now posting as {}.", engine.author_name());
                }
            }
            Command::Post(content) => {
                let author = engine.author_name();
                if let Err(e) = engine.post_notice(&author, &content).await {
                    match e {
                        SyncError::Validation(_) | SyncError::Rejected(_) => {
                            debug!("Post refused: {}", e)
                        }
                        _ => info!("Post failed: {}", e),
                    }
                }
            }
        }
    }

    poller.abort();
    info!("Bye");
    Ok(())
}
