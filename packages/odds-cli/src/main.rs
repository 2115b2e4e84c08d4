//! One-shot odds page scraper.
//!
//! Starts a Chrome session through ChromeDriver, extracts a single value,
//! prints it, and exits non-zero when the extraction fails. Every flag can
//! also be set through its environment variable or a `.env` file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use odds_extraction::{
    presets, ExtractionFailure, ExtractionResult, FieldKind, ScrapeConfig, Scraper,
    WebDriverBrowser,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "odds-scrape")]
#[command(about = "Extract one value from a JavaScript-rendered odds page")]
struct Cli {
    /// Start from a compiled-in target (bovada-mlb, covers-mlb)
    #[arg(long, env = "ODDS_PRESET")]
    preset: Option<String>,

    /// Page to load
    #[arg(long, env = "ODDS_TARGET_URL")]
    target_url: Option<String>,

    /// Element locator: css:<selector>, id:<id>, class:<name>, or bare CSS
    #[arg(long, env = "ODDS_SELECTOR")]
    selector: Option<String>,

    /// How to read the element: event-count, last-updated, text
    #[arg(long, env = "ODDS_FIELD")]
    field: Option<FieldKind>,

    #[arg(long, env = "ODDS_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Seconds to let the page render (poll timeout when polling)
    #[arg(long, env = "ODDS_SETTLE_DELAY_SECONDS")]
    settle_delay_seconds: Option<u64>,

    /// Where page markup is saved when extraction fails
    #[arg(long, env = "ODDS_DIAGNOSTIC_DIR")]
    diagnostic_dir: Option<PathBuf>,

    /// IANA zone the page shows its timestamps in
    #[arg(long, env = "ODDS_SOURCE_TZ")]
    source_tz: Option<String>,

    /// IANA zone to report timestamps in
    #[arg(long, env = "ODDS_CANONICAL_TZ")]
    canonical_tz: Option<String>,

    /// Sleep the full settle delay instead of polling for the element
    #[arg(long, env = "ODDS_NO_POLL")]
    no_poll: bool,

    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    webdriver_url: String,

    /// Show the browser window
    #[arg(long, env = "ODDS_HEADED")]
    headed: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Preset (or defaults) first, then explicit flags on top.
    fn scrape_config(&self) -> Result<ScrapeConfig> {
        let mut config = match &self.preset {
            Some(name) => presets::by_name(name)
                .with_context(|| format!("Valid presets: {}", presets::NAMES.join(", ")))?,
            None => ScrapeConfig::default(),
        };

        if let Some(url) = &self.target_url {
            config.target_url = url.clone();
        }
        if let Some(selector) = &self.selector {
            config.selector = selector.clone();
        }
        if let Some(field) = self.field {
            config.field_kind = field;
        }
        if let Some(n) = self.max_attempts {
            config.max_attempts = n;
        }
        if let Some(secs) = self.settle_delay_seconds {
            config.settle_delay_seconds = secs;
        }
        if let Some(dir) = &self.diagnostic_dir {
            config.diagnostic_dir = dir.clone();
        }
        if let Some(tz) = &self.source_tz {
            config.source_time_zone = tz.clone();
        }
        if let Some(tz) = &self.canonical_tz {
            config.canonical_time_zone = tz.clone();
        }
        if self.no_poll {
            config.poll_for_element = false;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,odds_extraction=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let (target, extractor) = cli
        .scrape_config()?
        .into_parts()
        .context("Invalid scrape configuration")?;

    let browser = WebDriverBrowser::new(&cli.webdriver_url).with_headless(!cli.headed);
    let scraper = Scraper::new(browser, extractor).context("Invalid extractor configuration")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let outcome = scraper
        .run(&target, &cancel)
        .await
        .with_context(|| format!("Could not start a browser session at {}", cli.webdriver_url))?;

    match outcome {
        Ok(result) => {
            print_success(&result, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            print_failure(&failure, cli.json)?;
            // 130 is the shell convention for SIGINT
            Ok(if failure.is_cancelled() {
                ExitCode::from(130)
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn print_success(result: &ExtractionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{} {}", "✓".bright_green().bold(), result.value().to_string().bold());
    println!(
        "  {} {}",
        "attempts:".dimmed(),
        result.attempts()
    );
    println!("  {} {:?}", "raw:".dimmed(), result.raw_text());
    println!("  {} {}", "run:".dimmed(), result.run_id());
    Ok(())
}

fn print_failure(failure: &ExtractionFailure, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(failure)?);
        return Ok(());
    }

    eprintln!("{} {}", "✗".bright_red().bold(), failure.to_string().red());
    if !failure.last_raw_text.is_empty() {
        eprintln!("  {} {:?}", "last text:".dimmed(), failure.last_raw_text);
    }
    if let Some(path) = &failure.diagnostic_path {
        eprintln!("  {} {}", "page source:".dimmed(), path.display());
    }
    eprintln!("  {} {}", "run:".dimmed(), failure.run_id);
    Ok(())
}
