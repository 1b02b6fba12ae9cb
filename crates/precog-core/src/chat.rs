//! # Chat Parsing
//!
//! Identifies the sender of a raw chat line and extracts its content.
//!
//! Two sender styles are recognised:
//! - `<Name> message` (vanilla)
//! - `[Tag] Name: message` (plugin formats); bracketed tags are dropped
//!   and the remaining prefix must be shorter than
//!   [`MAX_SENDER_NAME_LEN`]
//!
//! Anything else (server broadcasts, death messages) is not attributable
//! and yields `None`. That is filtering, not an error.

use crate::primitives::MAX_SENDER_NAME_LEN;

/// Sender and content of an attributable chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChat {
    pub sender: String,
    pub content: String,
}

/// Parse a raw chat line.
#[must_use]
pub fn parse_chat(raw: &str) -> Option<ParsedChat> {
    let sender = extract_sender(raw)?;
    let content = extract_content(raw, &sender);
    Some(ParsedChat { sender, content })
}

fn extract_sender(message: &str) -> Option<String> {
    if message.starts_with('<') {
        if let Some(close) = message.find('>') {
            let name = message[1..close].trim();
            return (!name.is_empty()).then(|| name.to_string());
        }
    }

    let (prefix, _) = message.split_once(':')?;
    let stripped = strip_bracket_tags(prefix);
    let name = stripped.trim();
    let fits = name.encode_utf16().count() < MAX_SENDER_NAME_LEN;
    (!name.is_empty() && fits).then(|| name.to_string())
}

fn extract_content(message: &str, sender: &str) -> String {
    let bracketed = format!("<{}>", sender);
    if let Some(rest) = message.strip_prefix(bracketed.as_str()) {
        return rest.trim().to_string();
    }

    let labelled = format!("{}:", sender);
    if let Some(at) = message.find(labelled.as_str()) {
        return message[at + labelled.len()..].trim().to_string();
    }

    message.to_string()
}

/// Remove `[...]` tags, shortest match first. A tag never spans a newline.
fn strip_bracket_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find([']', '\n']) {
            Some(close) if after[close..].starts_with(']') => {
                out.push_str(&rest[..open]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(sender: &str, content: &str) -> Option<ParsedChat> {
        Some(ParsedChat {
            sender: sender.to_string(),
            content: content.to_string(),
        })
    }

    #[test]
    fn angle_bracket_sender() {
        assert_eq!(parse_chat("<Steve> hello there"), parsed("Steve", "hello there"));
    }

    #[test]
    fn colon_sender_with_tags() {
        assert_eq!(
            parse_chat("[Admin][VIP] Alex: watch out!"),
            parsed("Alex", "watch out!")
        );
    }

    #[test]
    fn colon_in_message_body_is_kept() {
        assert_eq!(
            parse_chat("Alex: meet at 10:30"),
            parsed("Alex", "meet at 10:30")
        );
    }

    #[test]
    fn long_prefix_is_not_a_sender() {
        assert_eq!(parse_chat("Server will restart soon: save now"), None);
        // 15 chars is the longest accepted name
        assert!(parse_chat("ABCDEFGHIJKLMNO: hi").is_some());
        assert!(parse_chat("ABCDEFGHIJKLMNOP: hi").is_none());
    }

    #[test]
    fn prefix_length_counts_utf16_units() {
        // 14 chars, but the emoji takes two units: 15 total
        assert!(parse_chat("ABCDEFGHIJKLM\u{1F600}: hi").is_some());
        // 15 chars, 16 units
        assert!(parse_chat("ABCDEFGHIJKLMN\u{1F600}: hi").is_none());
        assert_eq!(parse_chat("Zoë: salut"), parsed("Zoë", "salut"));
    }

    #[test]
    fn unattributable_lines_are_ignored() {
        assert_eq!(parse_chat("Steve fell from a high place"), None);
        assert_eq!(parse_chat("[Server]: maintenance"), None);
        assert_eq!(parse_chat("<> empty"), None);
        assert_eq!(parse_chat(""), None);
    }

    #[test]
    fn padded_bracket_name_keeps_whole_message() {
        // the trimmed name no longer matches the literal prefix
        assert_eq!(parse_chat("<  Bob  > yo"), parsed("Bob", "<  Bob  > yo"));
    }

    #[test]
    fn unclosed_tag_is_kept() {
        assert_eq!(strip_bracket_tags("[a] b [c"), " b [c");
        assert_eq!(strip_bracket_tags("[a\n] x"), "[a\n] x");
        assert_eq!(strip_bracket_tags("no tags"), "no tags");
    }
}
