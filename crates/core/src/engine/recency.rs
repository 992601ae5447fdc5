//! Recency of clinical facts.
//!
//! Free-text entries carry their timing in prose. A relative phrase (`3 months ago`, `yesterday`)
//! is read as its own age and is anchored to the current encounter. An absolute date is measured
//! from the record's reference date, which is the most recent absolute date mentioned anywhere in
//! the snapshot. The two anchors are independent: in a record mixing both styles, the newest
//! absolute date has age 0 even when relative phrases describe later events. No wall clock is
//! read, so the same snapshot always yields the same ages.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid regex"));

static US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("valid regex"));

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d+|a|an|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s+(day|week|month|year)s?\s+ago\b",
    )
    .expect("valid regex")
});

static NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(today|current|this visit|now|yesterday|last week|last month|last year)\b")
        .expect("valid regex")
});

/// Timing phrase found inside a free-text entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DateMention {
    /// Phrase as written, for display.
    pub phrase: String,
    /// Byte range of the phrase in the source text.
    pub span: (usize, usize),
    pub when: When,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum When {
    On(NaiveDate),
    DaysAgo(u32),
}

/// Finds the first timing phrase in `text`.
pub(crate) fn find_mention(text: &str) -> Option<DateMention> {
    let mut candidates: Vec<DateMention> = Vec::new();

    if let Some(caps) = ISO_DATE.captures(text) {
        let date = ymd(&caps[1], &caps[2], &caps[3]);
        if let (Some(date), Some(m)) = (date, caps.get(0)) {
            candidates.push(mention(text, m.start(), m.end(), When::On(date)));
        }
    }
    if let Some(caps) = US_DATE.captures(text) {
        let date = ymd(&caps[3], &caps[1], &caps[2]);
        if let (Some(date), Some(m)) = (date, caps.get(0)) {
            candidates.push(mention(text, m.start(), m.end(), When::On(date)));
        }
    }
    if let Some(caps) = RELATIVE.captures(text) {
        if let (Some(count), Some(m)) = (count_word(&caps[1]), caps.get(0)) {
            let unit = match caps[2].to_ascii_lowercase().as_str() {
                "day" => 1,
                "week" => 7,
                "month" => 30,
                _ => 365,
            };
            let days = count.saturating_mul(unit);
            candidates.push(mention(text, m.start(), m.end(), When::DaysAgo(days)));
        }
    }
    if let Some(m) = NAMED.find(text) {
        let days = match m.as_str().to_ascii_lowercase().as_str() {
            "yesterday" => 1,
            "last week" => 7,
            "last month" => 30,
            "last year" => 365,
            _ => 0,
        };
        candidates.push(mention(text, m.start(), m.end(), When::DaysAgo(days)));
    }

    candidates.into_iter().min_by_key(|c| c.span.0)
}

fn mention(text: &str, start: usize, end: usize, when: When) -> DateMention {
    DateMention {
        phrase: text[start..end].to_string(),
        span: (start, end),
        when,
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn count_word(word: &str) -> Option<u32> {
    let n = match word.to_ascii_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => digits.parse().ok()?,
    };
    Some(n)
}

/// Reference point for turning absolute dates into ages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RecencyAnchor {
    reference: Option<NaiveDate>,
}

impl RecencyAnchor {
    /// Builds the anchor from every text of a snapshot.
    pub(crate) fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let reference = texts
            .into_iter()
            .flat_map(|text| {
                let iso = ISO_DATE
                    .captures_iter(text)
                    .filter_map(|c| ymd(&c[1], &c[2], &c[3]));
                let us = US_DATE
                    .captures_iter(text)
                    .filter_map(|c| ymd(&c[3], &c[1], &c[2]));
                iso.chain(us).collect::<Vec<_>>()
            })
            .max();
        Self { reference }
    }

    pub(crate) fn reference(&self) -> Option<NaiveDate> {
        self.reference
    }

    /// Age in days of a fact with the given mention. Undated facts belong to the current
    /// encounter and have age 0.
    pub(crate) fn age_days(&self, mention: Option<&DateMention>) -> u32 {
        match mention.map(|m| m.when) {
            None => 0,
            Some(When::DaysAgo(days)) => days,
            Some(When::On(date)) => {
                let reference = self.reference.unwrap_or(date);
                let days = (reference - date).num_days().max(0);
                u32::try_from(days).unwrap_or(u32::MAX)
            }
        }
    }
}

/// Removes the mention from `text`, along with enclosing brackets and dangling separators.
pub(crate) fn strip_mention(text: &str, mention: &DateMention) -> String {
    let (start, end) = mention.span;
    let before = text[..start].trim_end();
    let after = text[end..].trim_start();

    let (before, after) = match (before.strip_suffix('('), after.strip_prefix(')')) {
        (Some(b), Some(a)) => (b.trim_end(), a.trim_start()),
        _ => (before, after),
    };
    let before = before.trim_end_matches([',', ';', '-', ':', ' ']);
    let before = before
        .strip_suffix(" on")
        .or_else(|| before.strip_suffix(" from"))
        .unwrap_or(before);

    let joined = if after.is_empty() || after.starts_with([',', ';', '.', ')']) {
        format!("{before}{after}")
    } else {
        format!("{before} {after}")
    };
    joined
        .trim()
        .trim_end_matches([',', ';', '-', ':'])
        .trim()
        .to_string()
}
