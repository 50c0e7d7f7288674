//! Channel and message identifier parsing
//!
//! Channel ids arrive as typed: numeric ids (a positive one gets the
//! Bot API `-100` channel prefix), or public handles with an optional
//! leading `@`. Message ids support a comma-separated range grammar,
//! e.g. `1638,1639..1641,1650..1650`.

use tracing::warn;

use crate::error::{Error, Result};

/// A channel reference after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Numeric channel id in the canonical negative form
    Id(i64),
    /// Public handle without the leading `@`
    Handle(String),
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "{}", id),
            ChannelRef::Handle(name) => write!(f, "{}", name),
        }
    }
}

/// Normalize a channel identifier.
///
/// Digit-only strings (optionally `-`-prefixed) are numeric ids; a
/// positive id is rewritten by prefixing `-100`, the convention for
/// broadcast channels. Negative ids pass through. Anything else is a
/// handle with exactly one leading `@` stripped. Never fails: a nonsense
/// handle simply will not resolve downstream.
pub fn normalize_channel(input: &str) -> ChannelRef {
    let trimmed = input.trim();
    if let Some(id) = parse_signed_digits(trimmed) {
        if id > 0 {
            return ChannelRef::Id(
                format!("-100{}", id).parse::<i64>().unwrap_or(id),
            );
        }
        return ChannelRef::Id(id);
    }

    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);
    ChannelRef::Handle(handle.to_string())
}

fn parse_signed_digits(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok()
}

/// Parse a single message id.
pub fn parse_message_id(input: &str) -> Result<i32> {
    input
        .trim()
        .parse::<i32>()
        .map_err(|_| Error::FormatError(format!("bad message id: {:?}", input)))
}

/// Parse a comma-separated list of message ids and inclusive ranges.
///
/// Each item is either a single id `N`, yielding `(N, N)`, or `A..B`,
/// yielding `(A, B)`. Order mirrors the input. `start <= end` is not
/// enforced here; see [`expand_ranges`].
pub fn parse_ranges(input: &str) -> Result<Vec<(i32, i32)>> {
    let mut ranges = Vec::new();
    for item in input.split(',') {
        let item = item.trim();
        if let Some((start, end)) = item.split_once("..") {
            ranges.push((parse_message_id(start)?, parse_message_id(end)?));
        } else {
            let id = parse_message_id(item)?;
            ranges.push((id, id));
        }
    }
    Ok(ranges)
}

/// Expand ranges into individual message ids, inclusive of both endpoints,
/// preserving range order and ascending within a range. A descending pair
/// expands to nothing and is reported, since it is almost always a typo.
pub fn expand_ranges(ranges: &[(i32, i32)]) -> Vec<i32> {
    let mut ids = Vec::new();
    for &(start, end) in ranges {
        if start > end {
            warn!("Range {}..{} is descending and expands to nothing", start, end);
            continue;
        }
        ids.extend(start..=end);
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_positive_number_gets_channel_prefix() {
        let result = normalize_channel("300020001000");
        assert_eq!(result, ChannelRef::Id(-100300020001000));
    }

    #[test]
    fn normalize_prefix_property_holds_for_various_ids() {
        for n in [1i64, 7, 44, 987, 1234567890] {
            let expected: i64 = format!("-100{}", n).parse().unwrap();
            assert_eq!(normalize_channel(&n.to_string()), ChannelRef::Id(expected));
            assert!(expected < 0);
        }
    }

    #[test]
    fn normalize_negative_number_passes_through() {
        assert_eq!(normalize_channel("-10001000"), ChannelRef::Id(-10001000));
    }

    #[test]
    fn normalize_negative_is_idempotent() {
        let first = normalize_channel("4003002001");
        let ChannelRef::Id(id) = first else {
            panic!("expected numeric id");
        };
        assert_eq!(normalize_channel(&id.to_string()), ChannelRef::Id(id));
    }

    #[test]
    fn normalize_handle_strips_sigil() {
        let result = normalize_channel("@qwerty");
        assert_eq!(result, ChannelRef::Handle("qwerty".to_string()));
    }

    #[test]
    fn normalize_handle_strips_exactly_one_sigil() {
        assert_eq!(
            normalize_channel("@@qwerty"),
            ChannelRef::Handle("@qwerty".to_string())
        );
    }

    #[test]
    fn normalize_handle_is_idempotent() {
        let ChannelRef::Handle(stripped) = normalize_channel("@qwerty") else {
            panic!("expected handle");
        };
        assert_eq!(
            normalize_channel(&stripped),
            ChannelRef::Handle("qwerty".to_string())
        );
    }

    #[test]
    fn channel_ref_display() {
        assert_eq!(ChannelRef::Id(-1001234).to_string(), "-1001234");
        assert_eq!(ChannelRef::Handle("durov".into()).to_string(), "durov");
    }

    #[test]
    fn parse_message_id_from_string() {
        assert_eq!(parse_message_id("1000").unwrap(), 1000);
    }

    #[test]
    fn parse_message_id_rejects_garbage() {
        let err = parse_message_id("200OK").unwrap_err();
        assert!(matches!(err, Error::FormatError(_)));
        assert!(err.to_string().contains("200OK"));
    }

    #[test]
    fn parse_solo_range() {
        let result = parse_ranges("344").unwrap();
        assert_eq!(result, vec![(344, 344)]);
    }

    #[test]
    fn parse_simple_range() {
        let result = parse_ranges("1639..1641").unwrap();
        assert_eq!(result, vec![(1639, 1641)]);
    }

    #[test]
    fn parse_complex_range() {
        let result = parse_ranges("1638,1639..1641,1650..1650").unwrap();
        assert_eq!(result, vec![(1638, 1638), (1639, 1641), (1650, 1650)]);
    }

    #[test]
    fn parse_ranges_tolerates_spacing() {
        let result = parse_ranges("1, 2..4").unwrap();
        assert_eq!(result, vec![(1, 1), (2, 4)]);
    }

    #[test]
    fn parse_ranges_rejects_bad_items() {
        assert!(parse_ranges("12..").is_err());
        assert!(parse_ranges("..12").is_err());
        assert!(parse_ranges("1,,2").is_err());
        assert!(parse_ranges("1..2..3").is_err());
        assert!(parse_ranges("abc").is_err());
        assert!(parse_ranges("").is_err());
    }

    #[test]
    fn expand_solo() {
        assert_eq!(expand_ranges(&[(344, 344)]), vec![344]);
    }

    #[test]
    fn expand_inclusive_and_ordered() {
        let ids = expand_ranges(&[(1638, 1638), (1639, 1641), (1650, 1650)]);
        assert_eq!(ids, vec![1638, 1639, 1640, 1641, 1650]);
    }

    #[test]
    fn expand_keeps_duplicate_occurrences() {
        let ids = expand_ranges(&[(5, 7), (6, 8)]);
        assert_eq!(ids, vec![5, 6, 7, 6, 7, 8]);
    }

    #[test]
    fn expand_descending_range_is_empty() {
        assert!(expand_ranges(&[(10, 5)]).is_empty());
    }
}
