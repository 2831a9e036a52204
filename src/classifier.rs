//! Works out who wrote the last message in a captured chat transcript.
//!
//! The capture is whatever the chat UI puts on the clipboard for a drag
//! selection: message bodies, sender labels, clock times, read receipts and
//! sometimes the input box placeholder. Only the tail of the transcript matters.
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum MessageVerdict {
    SelfAuthored,
    CounterpartAuthored(String),
    /// Something was captured but no message text survived cleanup.
    Empty,
    /// Nothing printable was captured.
    Unparseable,
}

/// Where the chat UI puts the sender label relative to the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPosition {
    /// Label follows the message; only the last line is checked against the marker.
    #[default]
    Trailing,
    /// Label precedes the message; the nearest label above the last line decides.
    Leading,
}

#[derive(Debug, Clone)]
pub struct SenderClassifier {
    /// Lowercased labels, without a trailing colon.
    self_labels: Vec<String>,
    position: MarkerPosition,
    /// Lowercased input-area prefixes.
    placeholders: Vec<String>,
}

impl SenderClassifier {
    pub fn new(self_marker: &str) -> Self {
        Self {
            self_labels: vec![normalize_label(self_marker)],
            position: MarkerPosition::default(),
            placeholders: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.self_labels.extend(
            aliases
                .into_iter()
                .map(|a| normalize_label(a.as_ref()))
                .filter(|a| !a.is_empty()),
        );
        self
    }

    pub fn with_position(mut self, position: MarkerPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_input_placeholders<I, S>(mut self, placeholders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.placeholders = placeholders
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    pub fn from_run_config(config: &RunConfig) -> Self {
        Self::new(&config.self_marker)
            .with_aliases(&config.self_aliases)
            .with_position(config.marker_position)
            .with_input_placeholders(&config.input_placeholders)
    }

    pub fn classify(&self, raw: &str) -> MessageVerdict {
        let mut lines: Vec<&str> = raw.lines().map(clean_line).filter(|l| !l.is_empty()).collect();
        if lines.is_empty() {
            return MessageVerdict::Unparseable;
        }

        if let Some(cut) = lines.iter().rposition(|l| self.is_placeholder(l)) {
            lines.truncate(cut);
        }

        // Walk back over trailing chrome. A self label in trailing position wins
        // before anything else is looked at.
        let mut end = lines.len();
        while end > 0 {
            let line = lines[end - 1];
            if self.is_self_label(line) {
                return MessageVerdict::SelfAuthored;
            }
            if is_status_line(line) {
                end -= 1;
                continue;
            }
            break;
        }
        if end == 0 {
            return MessageVerdict::Empty;
        }

        let last = lines[end - 1];
        if self.has_inline_self_label(last) {
            return MessageVerdict::SelfAuthored;
        }

        if self.position == MarkerPosition::Leading {
            for i in (0..end - 1).rev() {
                let line = lines[i];
                if self.is_self_label(line) {
                    return MessageVerdict::SelfAuthored;
                }
                if self.looks_like_sender_label(line, lines[i + 1]) {
                    break;
                }
            }
        }

        let content = last.trim();
        if content.is_empty() {
            MessageVerdict::Empty
        } else {
            MessageVerdict::CounterpartAuthored(content.to_string())
        }
    }

    fn is_self_label(&self, line: &str) -> bool {
        let normalized = normalize_label(line);
        self.self_labels.iter().any(|label| *label == normalized)
    }

    /// `You sent: ok` style lines, where the label and body share a line.
    fn has_inline_self_label(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        self.self_labels.iter().any(|label| {
            lowered
                .strip_prefix(label.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
        })
    }

    /// The whole line must be the placeholder, optionally trailed by an
    /// ellipsis, or the placeholder plus a contact name and an ellipsis
    /// (`Write to Jane Doe…`). A message that merely starts with the same words
    /// is not input chrome.
    fn is_placeholder(&self, line: &str) -> bool {
        self.placeholders.iter().any(|p| {
            let Some(rest) = strip_prefix_ignore_case(line, p) else {
                return false;
            };
            let body = rest.trim_end_matches(|c: char| c == '.' || c == '…' || c.is_whitespace());
            if body.is_empty() {
                return true;
            }
            let has_ellipsis = rest.trim_end().ends_with('…') || rest.trim_end().ends_with("...");
            let name = body.trim();
            has_ellipsis
                && body.starts_with(char::is_whitespace)
                && name_re().is_match(name)
                && name
                    .split_whitespace()
                    .all(|word| word.chars().next().is_some_and(char::is_uppercase))
        })
    }

    /// A counterpart name line: one to three capitalised words followed by a
    /// message body.
    fn looks_like_sender_label(&self, line: &str, next: &str) -> bool {
        if is_status_line(line) || self.is_self_label(line) {
            return false;
        }
        if is_status_line(next) || self.is_self_label(next) {
            return false;
        }
        name_re().is_match(line)
            && line
                .split_whitespace()
                .all(|word| word.chars().next().is_some_and(char::is_uppercase))
    }
}

/// Classifies `raw` with default rules and `self_marker` as the only self label.
pub fn classify(raw: &str, self_marker: &str) -> MessageVerdict {
    SenderClassifier::new(self_marker).classify(raw)
}

/// `prefix` is already lowercased.
fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    (head.to_lowercase() == prefix).then(|| &line[prefix.len()..])
}

fn clean_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || is_invisible(c))
}

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}' | '\u{feff}')
}

fn normalize_label(label: &str) -> String {
    clean_line(label).trim_end_matches(':').trim_end().to_lowercase()
}

/// Clock times and read receipts rendered between messages.
pub fn is_status_line(line: &str) -> bool {
    time_re().is_match(line) || receipt_re().is_match(line)
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^((today|yesterday)\s+)?(at\s+)?\d{1,2}:\d{2}(\s?[ap]\.?m\.?)?$")
            .expect("time pattern is valid")
    })
}

fn receipt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(sent|delivered|seen|read)(\s+(by|at)\s+.+|\s+just now|\s+\d.*)?$")
            .expect("receipt pattern is valid")
    })
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z'’.-]*(\s+[A-Za-z][A-Za-z'’.-]*){0,2}$")
            .expect("name pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "You sent";

    fn counterpart(s: &str) -> MessageVerdict {
        MessageVerdict::CounterpartAuthored(s.to_string())
    }

    #[test]
    fn trailing_marker_is_self_authored() {
        assert_eq!(classify("Hello\nYou sent", MARKER), MessageVerdict::SelfAuthored);
        assert_eq!(classify("Hello\n  you sent  \n", MARKER), MessageVerdict::SelfAuthored);
        assert_eq!(classify("Hello\nYou sent\nSeen\n10:42 PM", MARKER), MessageVerdict::SelfAuthored);
    }

    #[test]
    fn earlier_markers_do_not_matter() {
        let raw = "You sent\nHi\nYou sent\nAre you there?\nYou sent";
        assert_eq!(classify(raw, MARKER), MessageVerdict::SelfAuthored);

        let raw = "Hello\nYou sent\nHi there!";
        assert_eq!(classify(raw, MARKER), counterpart("Hi there!"));
    }

    #[test]
    fn marker_inside_counterpart_text_is_not_a_label() {
        assert_eq!(
            classify("I think You sent it already", MARKER),
            counterpart("I think You sent it already")
        );
        assert_eq!(
            classify("You sent me the wrong file", MARKER),
            counterpart("You sent me the wrong file")
        );
    }

    #[test]
    fn inline_self_label() {
        assert_eq!(classify("Them: hey\nYou sent: on my way", MARKER), MessageVerdict::SelfAuthored);
    }

    #[test]
    fn counterpart_content_is_trimmed() {
        assert_eq!(classify("Hi there!", MARKER), counterpart("Hi there!"));
        assert_eq!(classify("  \t Hi there!  \r\n\n", MARKER), counterpart("Hi there!"));
        assert_eq!(classify("\u{200b}Hi there!\u{feff}", MARKER), counterpart("Hi there!"));
    }

    #[test]
    fn trailing_chrome_is_skipped() {
        assert_eq!(classify("Need a quote\n10:42\nDelivered", MARKER), counterpart("Need a quote"));
        assert_eq!(classify("Need a quote\nSeen by Alex", MARKER), counterpart("Need a quote"));
        assert_eq!(classify("Need a quote\nToday at 9:05 am", MARKER), counterpart("Need a quote"));
        assert_eq!(classify("Seen that movie?", MARKER), counterpart("Seen that movie?"));
    }

    #[test]
    fn empty_and_malformed_never_yield_counterpart() {
        assert_eq!(classify("", MARKER), MessageVerdict::Unparseable);
        assert_eq!(classify("   \n\t\n", MARKER), MessageVerdict::Unparseable);
        assert_eq!(classify("\u{200b}\n\u{feff}", MARKER), MessageVerdict::Unparseable);
        assert_eq!(classify("10:42 PM\nSeen", MARKER), MessageVerdict::Empty);
        for raw in ["", " ", "\n\n", "12:00", "Delivered", "Sent 2m ago"] {
            assert!(!matches!(classify(raw, MARKER), MessageVerdict::CounterpartAuthored(_)));
        }
    }

    #[test]
    fn input_placeholder_cuts_the_capture() {
        let classifier = SenderClassifier::new(MARKER).with_input_placeholders(["type a message"]);
        assert_eq!(
            classifier.classify("Hello\nYou sent\nType a message...\nAa"),
            MessageVerdict::SelfAuthored
        );
        assert_eq!(classifier.classify("Type a message..."), MessageVerdict::Empty);
        assert_eq!(
            classifier.classify("Type a messageboard link?"),
            counterpart("Type a messageboard link?")
        );
    }

    #[test]
    fn messages_starting_like_a_placeholder_are_kept() {
        let classifier = SenderClassifier::new(MARKER).with_input_placeholders(["type a message", "write to"]);
        assert_eq!(
            classifier.classify("Hello\nYou sent\nWrite to me when you're free"),
            counterpart("Write to me when you're free")
        );
        assert_eq!(
            classifier.classify("Type a message to my boss for me?"),
            counterpart("Type a message to my boss for me?")
        );
        assert_eq!(classifier.classify("Need a quote\nWrite to Jane Doe…"), counterpart("Need a quote"));
        assert_eq!(classifier.classify("Need a quote\nwrite to..."), counterpart("Need a quote"));
        assert_eq!(classifier.classify("Need a quote\nWrite to Jane"), counterpart("Write to Jane"));
    }

    #[test]
    fn aliases_act_like_the_marker() {
        let classifier = SenderClassifier::new(MARKER).with_aliases(["Me:", " "]);
        assert_eq!(classifier.classify("hi\nMe:"), MessageVerdict::SelfAuthored);
        assert_eq!(classifier.classify("hi\nMe: ok thanks"), MessageVerdict::SelfAuthored);
        assert_eq!(classifier.classify("Memo: tomorrow"), counterpart("Memo: tomorrow"));
    }

    #[test]
    fn leading_labels() {
        let classifier = SenderClassifier::new(MARKER).with_position(MarkerPosition::Leading);
        assert_eq!(classifier.classify("Jane Doe\nhi\nYou sent\nhello, how can I help?"), MessageVerdict::SelfAuthored);
        assert_eq!(
            classifier.classify("You sent\nhello, how can I help?\nJane Doe\nneed a quote"),
            counterpart("need a quote")
        );
        assert_eq!(classifier.classify("need a quote"), counterpart("need a quote"));
    }

    #[test]
    fn status_lines() {
        assert!(is_status_line("9:05"));
        assert!(is_status_line("10:42 PM"));
        assert!(is_status_line("Seen"));
        assert!(is_status_line("Sent 5m ago"));
        assert!(!is_status_line("Sent you the invoice"));
        assert!(!is_status_line("Read the docs please"));
    }
}
