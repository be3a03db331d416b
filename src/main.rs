use clap::Parser;
use log_harvester::{HarvestConfig, Harvester, HarvestStream, StartAt, DEFAULT_CAPACITY};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

/// Tail a log file and print one event per complete line.
#[derive(Parser, Debug)]
#[command(name = "log-harvester", version)]
struct Cli {
    /// File to harvest, or "-" for standard input
    path: PathBuf,

    /// Skip existing content and only emit lines appended from now on
    #[arg(long)]
    tail: bool,

    /// Resume at this byte offset (as printed by a previous run)
    #[arg(long)]
    offset: Option<u64>,

    /// Stop after the file has been idle for this many seconds
    #[arg(long, default_value_t = 86_400)]
    dead_time_secs: u64,

    /// How long one read waits at end of file before checking the dead time
    #[arg(long, default_value_t = 10_000)]
    eof_timeout_ms: u64,

    /// Tag attached to every event, as key=value (repeatable)
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,

    /// Print events as JSON lines instead of plain text
    #[arg(long)]
    json: bool,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

impl Cli {
    fn config(&self) -> HarvestConfig {
        let start_at = if self.tail { StartAt::End } else { StartAt::Beginning };
        let config = HarvestConfig::default()
            .with_start_at(start_at)
            .with_dead_time(Duration::from_secs(self.dead_time_secs))
            .with_eof_timeout(Duration::from_millis(self.eof_timeout_ms));

        self.fields
            .iter()
            .fold(config, |config, (key, value)| config.with_field(key, value))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut harvester = Harvester::new(&cli.path, cli.config());
    if let Some(offset) = cli.offset {
        harvester = harvester.resume_at(offset);
    }
    let source = harvester.path().display().to_string();

    let mut stream = HarvestStream::spawn(harvester, DEFAULT_CAPACITY);
    while let Some(event) = stream.next().await {
        if cli.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("{}", event.text);
        }
    }

    let finished = stream.finish().await;
    eprintln!("offset: {}", finished.offset);

    match finished.result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("Error harvesting {}: {}", source, e);
            Ok(ExitCode::FAILURE)
        }
    }
}
