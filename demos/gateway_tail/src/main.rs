//! Gateway Tail
//!
//! Connects one Discord bot and prints every host event: lifecycle signals,
//! raw gateway dispatches and normalized sessions.
//!
//! # Usage
//!
//! ```bash
//! BRONZE_ADAPTERS__DISCORD__TOKEN=... cargo run --package gateway-tail
//! cargo run --package gateway-tail -- --config bronze.toml --sessions-only
//! ```

use std::path::PathBuf;

use anyhow::Result;
use bronze::discord::DiscordAdapter;
use bronze::prelude::*;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(about = "Print what a Discord gateway session reports")]
struct Args {
    /// Configuration file; searched in the current directory when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only print normalized sessions.
    #[arg(long)]
    sessions_only: bool,
}

fn print_event(event: &HostEvent, sessions_only: bool) {
    match event {
        HostEvent::Session(session) => {
            println!(
                "[{}] #{} <{}> {}",
                session.event_name(),
                session.channel_id,
                session.user_id.as_deref().unwrap_or("?"),
                session.content
            );
        }
        _ if sessions_only => {}
        HostEvent::Online { bot_id } => println!("[online] {bot_id}"),
        HostEvent::Offline { bot_id } => println!("[offline] {bot_id}"),
        HostEvent::Event { name, payload } => {
            let t = payload.get("t").and_then(serde_json::Value::as_str);
            println!("[{name}] {}", t.unwrap_or_default());
        }
        HostEvent::Sent(session) => println!("[sent] {}", session.message_id),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = match &args.config {
        Some(path) => BronzeRuntime::builder().config_file(path).build()?,
        None => BronzeRuntime::new(),
    };
    runtime.register_adapter::<DiscordAdapter>().await?;

    let mut events = runtime.subscribe();
    let sessions_only = args.sessions_only;
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event, sessions_only),
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "Printer fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    runtime.run().await?;
    Ok(())
}
