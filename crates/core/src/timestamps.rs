//! Timestamp annotations from free-form video descriptions.
//!
//! Descriptions list chapters either as `0:00 Intro` (timestamp first) or as
//! `Intro 0:00` (label first). Both layouts are scanned in two ordered passes
//! over one map: the timestamp-first pass overwrites, the label-first pass only
//! fills keys that are still missing.

use std::{iter, sync::LazyLock};

use regex::Regex;

static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:\d+(?::\d+)?").expect("valid timestamp pattern"));

// Separator between a timestamp and its label; never spans a line break.
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\S\n]+").expect("valid separator pattern"));

// A label-first line: `Label 0:00`.
static TRAILING_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\S\n]\d+:\d+(?::\d+)?[^\S\n]*$").expect("valid trailing timestamp pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampEntry {
    pub timestamp: String,
    pub label: String,
}

/// Timestamp → label, unique keys, insertion ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampMap {
    entries: Vec<TimestampEntry>,
}

impl TimestampMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An overwritten key keeps its original position.
    pub fn insert(&mut self, timestamp: &str, label: &str) {
        match self.entries.iter_mut().find(|e| e.timestamp == timestamp) {
            Some(entry) => entry.label = label.to_string(),
            None => self.entries.push(TimestampEntry {
                timestamp: timestamp.to_string(),
                label: label.to_string(),
            }),
        }
    }

    /// Insert only when the key is not present yet. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, timestamp: &str, label: &str) -> bool {
        if self.contains(timestamp) {
            return false;
        }
        self.entries.push(TimestampEntry {
            timestamp: timestamp.to_string(),
            label: label.to_string(),
        });
        true
    }

    pub fn get(&self, timestamp: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.timestamp == timestamp)
            .map(|e| e.label.as_str())
    }

    pub fn contains(&self, timestamp: &str) -> bool {
        self.entries.iter().any(|e| e.timestamp == timestamp)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimestampEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a TimestampMap {
    type Item = &'a TimestampEntry;
    type IntoIter = std::slice::Iter<'a, TimestampEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Extract every timestamp annotation found in `text`.
///
/// Never fails: text without timestamps yields an empty map.
pub fn extract_timestamps(text: &str) -> TimestampMap {
    let mut map = TimestampMap::new();

    scan(text, match_timestamp_first, |timestamp, label| {
        map.insert(timestamp, label.trim());
    });

    scan(text, match_label_first, |timestamp, label| {
        map.insert_if_absent(timestamp, label.trim());
    });

    map
}

/// A single match: `(timestamp, raw label, end offset)`.
type Match<'t> = (&'t str, &'t str, usize);

/// Leftmost, non-overlapping scan. Resumes after each match, otherwise
/// advances one character.
fn scan<'t>(
    text: &'t str,
    matcher: fn(&'t str, usize) -> Option<Match<'t>>,
    mut on_match: impl FnMut(&'t str, &'t str),
) {
    let mut pos = 0;
    while pos < text.len() {
        match matcher(text, pos) {
            Some((timestamp, label, end)) => {
                on_match(timestamp, label);
                pos = end;
            }
            None => pos += text[pos..].chars().next().map_or(1, char::len_utf8),
        }
    }
}

/// `0:00 Label`, where the label line must be followed by another
/// timestamp line, a blank line, or the end of the text.
///
/// A timestamp alone on its line takes the next line as its label.
fn match_timestamp_first(text: &str, start: usize) -> Option<Match<'_>> {
    let timestamp = TIMESTAMP.find(&text[start..])?;
    let ts_end = start + timestamp.end();
    let after_separator = ts_end + SEPARATOR.find(&text[ts_end..]).map_or(0, |sep| sep.end());

    let label_start = if text[after_separator..].starts_with('\n') {
        stacked_label_start(text, start, after_separator)?
    } else if after_separator > ts_end {
        after_separator
    } else {
        return None;
    };
    let line_end = line_end(text, label_start);

    closes_entry(text, line_end)
        .then(|| (&text[start..ts_end], &text[label_start..line_end], line_end))
}

/// Start of the label line under a bare timestamp line. The label line must
/// not be a timestamp entry of its own, in either layout.
fn stacked_label_start(text: &str, ts_start: usize, newline: usize) -> Option<usize> {
    let at_line_start = ts_start == 0 || text[..ts_start].ends_with('\n');
    let label_start = newline + 1;
    let label = &text[label_start..line_end(text, label_start)];

    let is_label = !label.trim().is_empty()
        && !TIMESTAMP.is_match(label.trim_start())
        && !TRAILING_TIMESTAMP.is_match(label);

    (at_line_start && is_label).then_some(label_start)
}

/// `Label 0:00`, with the timestamp ending its line.
fn match_label_first(text: &str, start: usize) -> Option<Match<'_>> {
    let line_end = line_end(text, start);
    if line_end == start {
        return None;
    }
    // Labels are never empty.
    let label_ends = text[start..line_end]
        .char_indices()
        .skip(1)
        .map(|(i, _)| start + i)
        .chain(iter::once(line_end));

    for label_end in label_ends {
        let Some(separator) = SEPARATOR.find(&text[label_end..]) else {
            continue;
        };
        let ts_start = label_end + separator.end();
        let Some(timestamp) = TIMESTAMP.find(&text[ts_start..]) else {
            continue;
        };
        let ts_end = ts_start + timestamp.end();
        if ts_end == text.len() || text[ts_end..].starts_with('\n') {
            return Some((&text[ts_start..ts_end], &text[start..label_end], ts_end));
        }
    }

    None
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i)
}

fn closes_entry(text: &str, line_end: usize) -> bool {
    if line_end == text.len() {
        return true;
    }
    let next = &text[line_end + 1..];
    if next.starts_with('\n') {
        return true;
    }
    TIMESTAMP
        .find(next)
        .is_some_and(|ts| next[ts.end()..].starts_with(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(map: &TimestampMap) -> Vec<(&str, &str)> {
        map.iter()
            .map(|e| (e.timestamp.as_str(), e.label.as_str()))
            .collect()
    }

    #[test]
    fn empty_text_has_no_timestamps() {
        assert!(extract_timestamps("").is_empty());
        assert!(extract_timestamps("just a description\nwith no chapters").is_empty());
    }

    #[test]
    fn malformed_tokens_are_ignored() {
        let map = extract_timestamps("Intro 000\nOutro 1-30\n12 Anime");
        assert!(map.is_empty());
    }

    #[test]
    fn timestamp_first_lines() {
        let text = "0:00 Intro\n1:30 Frieren\n12:05 Dandadan";
        let map = extract_timestamps(text);
        assert_eq!(
            pairs(&map),
            vec![("0:00", "Intro"), ("1:30", "Frieren"), ("12:05", "Dandadan")]
        );
    }

    #[test]
    fn hour_timestamps() {
        let map = extract_timestamps("0:59:10 Almost there\n1:02:03 Outro");
        assert_eq!(map.get("0:59:10"), Some("Almost there"));
        assert_eq!(map.get("1:02:03"), Some("Outro"));
    }

    #[test]
    fn duplicate_timestamp_first_last_one_wins() {
        let text = "0:00 Intro\n1:30 First\n1:30 Second";
        let map = extract_timestamps(text);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("1:30"), Some("Second"));
        assert_eq!(map.iter().nth(1).map(|e| e.timestamp.as_str()), Some("1:30"));
    }

    #[test]
    fn timestamp_block_ends_at_blank_line() {
        let text = "Chapters:\n0:00 Intro\n2:10 Spy x Family\n\nFollow me on twitter";
        let map = extract_timestamps(text);
        assert_eq!(pairs(&map), vec![("0:00", "Intro"), ("2:10", "Spy x Family")]);
    }

    #[test]
    fn label_first_lines() {
        let text = "Intro 0:00\nChainsaw Man 3:45\nOutro 10:00";
        let map = extract_timestamps(text);
        assert_eq!(
            pairs(&map),
            vec![("0:00", "Intro"), ("3:45", "Chainsaw Man"), ("10:00", "Outro")]
        );
    }

    #[test]
    fn timestamp_first_takes_precedence() {
        let text = "1:00 Bocchi the Rock\n\nKaguya-sama 1:00";
        let map = extract_timestamps(text);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("1:00"), Some("Bocchi the Rock"));
    }

    #[test]
    fn labels_are_trimmed() {
        let map = extract_timestamps("0:00    Intro   \n1:00 \t Mob Psycho\t");
        assert_eq!(map.get("0:00"), Some("Intro"));
        assert_eq!(map.get("1:00"), Some("Mob Psycho"));
    }

    #[test]
    fn timestamp_first_line_not_followed_by_timestamp_is_skipped() {
        let text = "0:00 Intro\nsome prose here";
        let map = extract_timestamps(text);
        assert!(map.get("0:00").is_none());
    }

    #[test]
    fn mixed_layouts_fill_missing_keys() {
        let text = "0:00 Intro\n4:20 Oshi no Ko\n\nBonus clips:\nLycoris Recoil 15:00\nIntro again 0:00";
        let map = extract_timestamps(text);
        assert_eq!(
            pairs(&map),
            vec![("0:00", "Intro"), ("4:20", "Oshi no Ko"), ("15:00", "Lycoris Recoil")]
        );
    }

    #[test]
    fn timestamp_does_not_take_next_line_as_label() {
        let map = extract_timestamps("Cold open 0:00\nFrieren 3:45\nOutro 10:00");
        assert_eq!(map.get("3:45"), Some("Frieren"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn stacked_timestamp_and_label_lines() {
        let map = extract_timestamps("Chapters:\n0:00\nIntro\n1:30\nFrieren");
        assert_eq!(pairs(&map), vec![("0:00", "Intro"), ("1:30", "Frieren")]);
    }

    #[test]
    fn bare_timestamp_does_not_swallow_an_entry_line() {
        let map = extract_timestamps("3:45\nOutro 10:00");
        assert_eq!(pairs(&map), vec![("10:00", "Outro")]);

        let map = extract_timestamps("0:00\n1:30 Frieren");
        assert_eq!(pairs(&map), vec![("1:30", "Frieren")]);
    }

    #[test]
    fn timestamp_inside_a_line_never_stacks() {
        let map = extract_timestamps("see 2:00\nSpy x Family");
        assert_eq!(pairs(&map), vec![("2:00", "see")]);
    }

    #[test]
    fn insert_if_absent_keeps_first() {
        let mut map = TimestampMap::new();
        assert!(map.insert_if_absent("0:00", "a"));
        assert!(!map.insert_if_absent("0:00", "b"));
        assert_eq!(map.get("0:00"), Some("a"));
    }
}
