use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use prodscrape_core::load_config;
use prodscrape_engine::{crawl_site, HttpProber, PageFetcher};

#[derive(Debug, Parser)]
#[command(name = "prodscrape")]
#[command(about = "Configuration-driven product scraper")]
struct Cli {
    /// Path to the site configuration JSON file.
    #[arg(short, long)]
    config: PathBuf,

    /// Write emitted records (JSON Lines) to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    tracing::info!(path = %cli.config.display(), "config loaded");

    let fetcher = PageFetcher::new(&config)?;
    let prober = HttpProber::new()?;

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut write_error = None;
    let summary = crawl_site(&fetcher, &config, &prober, |record| {
        if write_error.is_some() {
            return;
        }
        if let Err(e) = writeln!(writer, "{record}") {
            write_error = Some(e);
        }
    })
    .await?;

    if let Some(e) = write_error {
        return Err(e.into());
    }
    writer.flush()?;

    tracing::info!(
        pages = summary.pages_processed,
        emitted = summary.records_emitted,
        dropped = summary.records_dropped,
        "done"
    );
    Ok(())
}
