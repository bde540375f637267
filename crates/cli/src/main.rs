#![forbid(unsafe_code)]

mod cli;
mod commands;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use cli::{Command, EventsCommand};
use infrastructure::config::ViewerConfig;
use infrastructure::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    let config = ViewerConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("loading config from {}", cli.config))?;

    let level = cli.log_level.unwrap_or(config.log.level);
    let format = cli.log_format.unwrap_or(config.log.format);
    init_logging(level, format);

    let output = cli.output;

    match cli.command {
        Command::Version => {
            println!("dbaudit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }

        Command::Events(args) => {
            let addr = args
                .conn
                .addr
                .unwrap_or_else(|| config.service.addr.clone());
            let token = cli.token.or_else(|| config.service.token.clone());
            let now = now_ns();

            match args.command {
                EventsCommand::List { cluster, range, limit } => {
                    let feed = commands::build_feed(
                        &addr,
                        token,
                        config.service.timeout_secs,
                        limit.unwrap_or(config.service.page_limit),
                    )?;
                    commands::cmd_events_list(&feed, &cluster, range.to_range(now), output).await
                }
                EventsCommand::Dump { cluster, range } => {
                    let feed = commands::build_feed(
                        &addr,
                        token,
                        config.service.timeout_secs,
                        config.service.page_limit,
                    )?;
                    commands::cmd_events_dump(&feed, &cluster, range.to_range(now), output).await
                }
            }
        }
    }
}

/// Wall-clock time as nanoseconds since UNIX epoch.
fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
