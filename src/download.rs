//! Download pipeline
//!
//! Runs download targets through channel resolution, message fetch,
//! media write and optional rename, a bounded number at a time. Every
//! failure is captured per target, so one bad message never aborts the
//! rest of the batch.

use std::fs::OpenOptions;
use std::path::PathBuf;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::ident::normalize_channel;
use crate::naming::{infer_extension, make_output_path};
use crate::telegram::MediaFetcher;

/// Workers running at once unless `--parallel` says otherwise.
pub const DEFAULT_PARALLEL: usize = 4;

/// One media download: where it comes from and where it lands.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    /// Channel exactly as the user typed it
    pub channel: String,
    pub message_id: i32,
    pub discussion_message_id: Option<i32>,
    /// Requested output path, before uniquification
    pub output_base: String,
    /// Extra stem suffix for `--detailed-name`
    pub detail: Option<String>,
    pub infer_extension: bool,
}

/// Batch-wide settings.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub parallel: usize,
    pub dry_run: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: DEFAULT_PARALLEL,
            dry_run: false,
        }
    }
}

/// Run every target, `parallel` at a time.
///
/// Returns one outcome per target, in the order the targets were given:
/// the final output path on success, `None` for targets that failed.
pub async fn run_batch<F: MediaFetcher>(
    fetcher: &F,
    targets: &[DownloadTarget],
    options: &BatchOptions,
) -> Vec<Option<PathBuf>> {
    let concurrency = options.parallel.max(1);

    stream::iter(targets.iter().map(|target| async move {
        match download_one(fetcher, target, options.dry_run).await {
            Ok(path) => Some(path),
            Err(e @ Error::NoMedia(_)) => {
                warn!(
                    "nothing to download (channel {}, message {}, output {:?}, infer {}): {}",
                    target.channel,
                    target.message_id,
                    target.output_base,
                    target.infer_extension,
                    e
                );
                None
            }
            Err(e) => {
                error!(
                    "download failed (channel {}, message {}, output {:?}, infer {}): {}",
                    target.channel,
                    target.message_id,
                    target.output_base,
                    target.infer_extension,
                    e
                );
                None
            }
        }
    }))
    .buffered(concurrency)
    .collect()
    .await
}

/// Run a single target to completion. Dry mode stops after planning the
/// output path.
async fn download_one<F: MediaFetcher>(
    fetcher: &F,
    target: &DownloadTarget,
    dry_run: bool,
) -> Result<PathBuf> {
    let channel = normalize_channel(&target.channel);
    let path = make_output_path(
        &target.output_base,
        target.detail.is_some(),
        target.detail.as_deref(),
    );

    if dry_run {
        info!(
            "dry run: message {} from {} would land at {}",
            target.message_id,
            target.channel,
            path.display()
        );
        return Ok(path);
    }

    info!(
        "downloading message {} from {}",
        target.message_id, target.channel
    );
    let source = fetcher
        .fetch_source(&channel, target.message_id, target.discussion_message_id)
        .await?;

    // create_new keeps concurrent workers from clobbering each other
    // when the uniqueness probe raced.
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)?;
    let bytes = fetcher.write_media(source, &mut file).await?;
    info!("downloaded {} bytes to {}", bytes, path.display());

    if target.infer_extension {
        return infer_extension(&path);
    }

    Ok(path)
}
