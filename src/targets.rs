//! Target expansion
//!
//! Turns raw CLI input (explicit channel/message ids, or semicolon
//! separated share links) into the flat list of downloads to run.
//! Values missing from the command line are asked for through an
//! injected [`Prompter`], so non-interactive callers can supply canned
//! answers.

use std::io::{self, BufRead, Write};

use crate::download::DownloadTarget;
use crate::error::{Error, Result};
use crate::ident::{expand_ranges, parse_message_id, parse_ranges};

/// Delimiter between multiple share links in one `--link` value.
pub const LINK_DELIMITER: char = ';';

pub const CHANNEL_PROMPT: &str = "Channel ID: ";
pub const MESSAGE_PROMPT: &str = "Message ID: ";
pub const LINK_PROMPT: &str = "Message link: ";

/// Input provider for values missing from the command line.
pub trait Prompter {
    fn prompt(&mut self, message: &str) -> Result<String>;
}

/// Reads answers from the controlling terminal.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&mut self, message: &str) -> Result<String> {
        print!("{}", message);
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Raw download request as it came off the command line.
#[derive(Debug, Clone, Default)]
pub struct TargetSpec {
    /// `None` = flag absent, `Some("")` = bare `--link`, otherwise a
    /// semicolon-delimited list of share links
    pub link: Option<String>,
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
    pub discussion_message_id: Option<String>,
    pub output: Option<String>,
    pub detailed_name: bool,
    pub infer_extension: bool,
}

/// Expand a [`TargetSpec`] into concrete download targets.
///
/// Each (channel, message id) combination becomes one target; duplicate
/// ids across overlapping ranges are kept, each producing its own
/// download attempt. Channels are carried unresolved; normalization and
/// resolution happen per-target at download time.
pub fn expand_targets(
    spec: &TargetSpec,
    prompter: &mut dyn Prompter,
) -> Result<Vec<DownloadTarget>> {
    let discussion_message_id = spec
        .discussion_message_id
        .as_deref()
        .map(parse_message_id)
        .transpose()?;

    let sources = collect_sources(spec, prompter)?;

    let mut targets = Vec::new();
    for (channel, expression) in sources {
        let ranges = parse_ranges(&expression)?;
        for message_id in expand_ranges(&ranges) {
            let output_base = spec
                .output
                .clone()
                .unwrap_or_else(|| format!("file-{}-{}", channel, message_id));
            let detail = spec
                .detailed_name
                .then(|| format!("{}-{}", channel, message_id));

            targets.push(DownloadTarget {
                channel: channel.clone(),
                message_id,
                discussion_message_id,
                output_base,
                detail,
                infer_extension: spec.infer_extension,
            });
        }
    }

    Ok(targets)
}

/// Collect (channel, message-expression) pairs from flags or links,
/// prompting for whatever is missing.
fn collect_sources(
    spec: &TargetSpec,
    prompter: &mut dyn Prompter,
) -> Result<Vec<(String, String)>> {
    let link_list = match &spec.link {
        None => {
            let channel = match &spec.channel_id {
                Some(channel) => channel.clone(),
                None => prompter.prompt(CHANNEL_PROMPT)?,
            };
            let expression = match &spec.message_id {
                Some(expression) => expression.clone(),
                None => prompter.prompt(MESSAGE_PROMPT)?,
            };
            return Ok(vec![(channel, expression)]);
        }
        Some(list) if list.is_empty() => prompter.prompt(LINK_PROMPT)?,
        Some(list) => list.clone(),
    };

    link_list
        .split(LINK_DELIMITER)
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(link_parts)
        .collect()
}

/// Pull (channel, message-expression) out of a share link: the last two
/// path segments, with any `?query` suffix stripped from the message
/// part. `https://t.me/c/1234567/100` yields `("1234567", "100")`.
fn link_parts(link: &str) -> Result<(String, String)> {
    let cleaned = link.trim_end_matches('/');
    let mut segments = cleaned.rsplit('/');

    let message = segments
        .next()
        .and_then(|s| s.split('?').next())
        .unwrap_or_default();
    let channel = segments.next().unwrap_or_default();

    if channel.is_empty() || message.is_empty() {
        return Err(Error::FormatError(format!(
            "link carries no channel/message path: {:?}",
            link
        )));
    }

    Ok((channel.to_string(), message.to_string()))
}
