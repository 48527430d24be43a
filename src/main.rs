//! Dish Bot - Main Entry Point
//!
//! Posts a freshly composed dish name every configured period.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use dish_bot::config::{
    BotSettings, Credentials, DEFAULT_CONFIG_FILE, DEFAULT_VOCAB_FILE, VocabularySet,
};
use dish_bot::generator::{DishGenerator, RECENCY_WINDOW};
use dish_bot::scheduler::{DishScheduler, SchedulerMessage};
use dish_bot::twitter::{DryRunPublisher, Publisher, TwitterClient};

/// Bot that posts made-up dish names on a schedule.
#[derive(Parser, Debug)]
#[command(name = "dish_bot")]
#[command(about = "Post generated dish names on a fixed schedule")]
#[command(version)]
struct Args {
    /// Path to the YAML credentials file; the environment is used if it is missing.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Path to the vocabulary YAML file (overrides VOCAB_PATH).
    #[arg(long)]
    vocab: Option<PathBuf>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Seed for reproducible dish sequences.
    #[arg(long)]
    seed: Option<u64>,

    /// Log dishes instead of posting them.
    #[arg(long)]
    dry_run: bool,

    /// Post a single dish and exit.
    #[arg(long)]
    once: bool,

    /// Generate an example vocabulary file and exit.
    #[arg(long)]
    generate_vocab: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if args.generate_vocab {
        return generate_example_vocab();
    }

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let credentials = Credentials::load(&args.config).context("Failed to load credentials")?;
    let period = credentials.period().context("Invalid posting period")?;

    let mut settings = BotSettings::from_env().context("Failed to load bot settings")?;
    if let Some(vocab) = args.vocab.clone() {
        settings.vocab_path = vocab;
    }

    let vocab = VocabularySet::load_from_file(&settings.vocab_path).with_context(|| {
        format!("Failed to load vocabulary from {}", settings.vocab_path.display())
    })?;

    info!(
        "Loaded {} words and {} places from {} (variant: {})",
        vocab.word_count(),
        vocab.place.len(),
        settings.vocab_path.display(),
        settings.variant
    );

    if settings.generator.recency {
        vocab
            .validate_recency(RECENCY_WINDOW)
            .context("Vocabulary is too small for the recency filter")?;
    }

    let generator = DishGenerator::new(vocab, settings.generator);

    if args.dry_run {
        info!("Dry run: dishes are logged, not posted");
        run_bot(DryRunPublisher::new(), generator, period, &settings, &args).await
    } else {
        let client = TwitterClient::new(&credentials, settings.api_base_url.clone())
            .context("Failed to create API client")?;
        run_bot(client, generator, period, &settings, &args).await
    }
}

/// Runs the scheduler with the given publisher until Ctrl+C or a fatal error.
async fn run_bot<P: Publisher + 'static>(
    publisher: P,
    generator: DishGenerator,
    period: std::time::Duration,
    settings: &BotSettings,
    args: &Args,
) -> Result<()> {
    let mut scheduler = DishScheduler::new(publisher, generator, period)
        .with_max_post_length(settings.max_post_length)
        .with_retry_policy(settings.retry_policy());
    if let Some(seed) = args.seed {
        info!("Using seed {}", seed);
        scheduler = scheduler.with_seed(seed);
    }

    if args.once {
        let receipt = scheduler.cycle().await.context("Failed to post dish")?;
        info!("Posted: {}", receipt.text);
        return Ok(());
    }

    let (scheduler_tx, scheduler_rx) = mpsc::channel::<SchedulerMessage>(8);
    let mut scheduler_handle = tokio::spawn(async move { scheduler.run(scheduler_rx).await });

    #[cfg(unix)]
    spawn_post_now_trigger(scheduler_tx.clone())?;

    info!("Bot is running. Use Ctrl+C to stop.");

    tokio::select! {
        result = &mut scheduler_handle => {
            result
                .context("Scheduler task panicked")?
                .context("Scheduler stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            let _ = scheduler_tx.send(SchedulerMessage::Shutdown).await;
            scheduler_handle
                .await
                .context("Scheduler task panicked")?
                .context("Scheduler stopped")?;
        }
    }

    Ok(())
}

/// Forwards SIGUSR1 to the scheduler as an immediate post.
#[cfg(unix)]
fn spawn_post_now_trigger(tx: mpsc::Sender<SchedulerMessage>) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut usr1 =
        signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;

    tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            info!("Received SIGUSR1, posting now");
            if tx.send(SchedulerMessage::PostNow).await.is_err() {
                break;
            }
        }
    });

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Generates an example vocabulary file.
fn generate_example_vocab() -> Result<()> {
    let path = "vocab.example.yaml";
    VocabularySet::example().save_to_file(path)?;

    println!("✓ Example vocabulary written to: {path}");
    println!("\nTo use this bot:");
    println!("1. Copy {path} to {DEFAULT_VOCAB_FILE}");
    println!("2. Fill every word list for each number and gender");
    println!("3. Create {DEFAULT_CONFIG_FILE} or a .env file with the API keys and PERIOD");
    println!("4. Run: dish_bot --dry-run --once");

    Ok(())
}
