//! Telegram Channel Media Downloader Library
//!
//! This library provides tools to:
//! - Normalize channel ids, usernames and t.me share links
//! - Expand message id ranges into download batches
//! - Fetch channel messages (including discussion-thread redirects)
//! - Stream media attachments to collision-free output files
//! - Detect the downloaded content type and fix up extensions

pub mod config;
pub mod download;
pub mod error;
pub mod ident;
pub mod naming;
pub mod session;
pub mod targets;
pub mod telegram;

// Re-export common types
pub use config::{Config, DEFAULT_CONFIG_FILE};
pub use download::{run_batch, BatchOptions, DownloadTarget, DEFAULT_PARALLEL};
pub use error::{Error, Result};
pub use ident::{expand_ranges, normalize_channel, parse_message_id, parse_ranges, ChannelRef};
pub use session::{check_session_exists, get_client, SessionLock};
pub use targets::{expand_targets, Prompter, StdinPrompter, TargetSpec};
pub use telegram::{GrammersFetcher, MediaFetcher};
