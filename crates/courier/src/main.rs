// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier command-line client.

mod queue;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use courier::Courier;
use courier::shutdown::install_signal_handler;
use courier_config::CourierConfig;
use courier_core::{
    CourierError, DeliveryStrategy, RetryDiscipline, StrategyKind, SubmitRequest, Submission,
    Transport, UserOutcome, fetch_timeline,
};
use courier_transport::HttpTransport;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

/// Deliver posts to the remote service.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the remote timeline.
    Timeline,
    /// Submit one post.
    Submit {
        text: String,
        /// Override `[delivery] strategy`.
        #[arg(long)]
        strategy: Option<StrategyKind>,
        /// Retry discipline for level2.
        #[arg(long)]
        discipline: Option<RetryDiscipline>,
        /// Media file for level3.
        #[arg(long)]
        media: Option<PathBuf>,
    },
    /// Recover interrupted jobs and drain the durable queue.
    Queue,
    /// Show configuration and persisted delivery state.
    Status {
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => courier_config::load_and_validate_path(path),
        None => courier_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.client.log_level);

    let result = match cli.command {
        Commands::Timeline => run_timeline(&config).await,
        Commands::Submit {
            text,
            strategy,
            discipline,
            media,
        } => run_submit(&config, text, strategy, discipline, media).await,
        Commands::Queue => queue::run_queue(&config).await,
        Commands::Status { json } => status::run_status(&config, json).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("courier: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_timeline(config: &CourierConfig) -> Result<(), CourierError> {
    let transport = HttpTransport::from_config(&config.client)?;
    let items = fetch_timeline(&transport).await?;
    if items.is_empty() {
        println!("(timeline is empty)");
    }
    for item in items {
        println!("{}  [{}]  {}", item.id, item.level, item.text);
    }
    Ok(())
}

async fn run_submit(
    config: &CourierConfig,
    text: String,
    strategy: Option<StrategyKind>,
    discipline: Option<RetryDiscipline>,
    media: Option<PathBuf>,
) -> Result<(), CourierError> {
    let cancel = install_signal_handler();
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config.client)?);
    let kind = strategy.unwrap_or(config.delivery.strategy);
    let courier = Courier::build(config, kind, transport, cancel.clone()).await?;

    let mut request = SubmitRequest::new(text);
    request.discipline = discipline;
    request.media = media;

    let submission = loop {
        let result = courier.submit(request.clone()).await;
        match UserOutcome::from_result(&result) {
            UserOutcome::Success => break result?,
            UserOutcome::RetryPrompt { payload } => {
                if let Err(e) = &result {
                    eprintln!("courier: {e}");
                }
                if !confirm(&format!("retry \"{payload}\"? [y/N] ")).await? {
                    return Err(CourierError::Terminal("retry declined".into()));
                }
                request.text = payload;
            }
            UserOutcome::Error { .. } => return result.map(|_| ()),
        }
    };

    match submission {
        Submission::Delivered(item) => println!("delivered {} [{}]", item.id, item.level),
        Submission::Dropped => println!("dropped: the single attempt failed"),
        Submission::Queued { job_id } => {
            let outstanding = match courier.queue() {
                Some(queue) => queue::wait_for_queue(queue, &cancel).await?,
                None => 0,
            };
            println!("queued job {job_id}; {outstanding} outstanding");
        }
    }
    Ok(())
}

/// Asks a yes/no question on stdin. Anything but `y`/`yes` is a no.
async fn confirm(prompt: &str) -> Result<bool, CourierError> {
    eprint!("{prompt}");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Installs the global subscriber. `RUST_LOG` wins over `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
