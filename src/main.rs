//! Telegram channel media downloader - main entry point
//!
//! Downloads media attachments from channel messages, addressed by
//! explicit ids or t.me share links.

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use telegram_downloader::config::{Config, DEFAULT_CONFIG_FILE};
use telegram_downloader::download::{run_batch, BatchOptions, DEFAULT_PARALLEL};
use telegram_downloader::session::{get_client, SessionLock};
use telegram_downloader::targets::{expand_targets, StdinPrompter, TargetSpec};
use telegram_downloader::telegram::GrammersFetcher;

#[derive(Parser)]
#[command(name = "telegram_downloader")]
#[command(
    about = "Download media from Telegram channel messages you are a member of",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Take ids from message links (semicolon separated); a bare --link
    /// prompts for one
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    link: Option<String>,

    /// The config filename
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// The channel ID or username
    #[arg(short = 'C', long)]
    channel_id: Option<String>,

    /// The message ID - a single id, a range (1639..1641) or a comma
    /// separated mix of both
    #[arg(short = 'M', long)]
    message_id: Option<String>,

    /// Message ID inside the channel's linked discussion group
    #[arg(short = 'D', long, visible_alias = "DM")]
    discussion_message_id: Option<String>,

    /// The output filename
    #[arg(short = 'O', long)]
    output: Option<String>,

    /// Append an extension matching the downloaded content
    #[arg(long, default_value_t = false)]
    infer_extension: bool,

    /// Embed channel and message ids in the output name
    #[arg(long, default_value_t = false)]
    detailed_name: bool,

    /// Plan the batch and print output paths without downloading
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Downloads to run at once
    #[arg(long, default_value_t = DEFAULT_PARALLEL)]
    parallel: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("telegram_downloader=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    let _lock = SessionLock::acquire(Path::new(&config.lock_file()))?;
    let client = get_client(&config).await?;
    let fetcher = GrammersFetcher::new(client.client.clone());

    let spec = TargetSpec {
        link: cli.link,
        channel_id: cli.channel_id,
        message_id: cli.message_id,
        discussion_message_id: cli.discussion_message_id,
        output: cli.output,
        detailed_name: cli.detailed_name,
        infer_extension: cli.infer_extension,
    };
    let targets = expand_targets(&spec, &mut StdinPrompter)?;

    let options = BatchOptions {
        parallel: cli.parallel,
        dry_run: cli.dry_run,
    };
    let results = run_batch(&fetcher, &targets, &options).await;

    for path in results.into_iter().flatten() {
        println!("{}", path.display());
    }

    Ok(())
}
