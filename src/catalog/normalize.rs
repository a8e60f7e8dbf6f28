use super::types::{RawRow, Record};
use regex::Regex;
use std::sync::LazyLock;

const ARTIST_COLUMN: usize = 0;
const TITLE_COLUMN: usize = 2;

static LETTER_SPACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z] [A-Z] [A-Z]").expect("valid letter-spacing pattern"));
static SPACED_CAPITAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]) ").expect("valid spaced-capital pattern"));

/// Case-insensitive substring block-list applied to artist and title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionFilter {
    terms: Vec<String>,
}

impl ExclusionFilter {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { terms }
    }

    /// Parses a comma separated list, e.g. `"karaoke, tribute"`.
    pub fn from_csv(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_blocked(&self, value: &str) -> bool {
        if self.terms.is_empty() {
            return false;
        }
        let lowered = value.to_lowercase();
        self.terms.iter().any(|term| lowered.contains(term.as_str()))
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Collapses interleaved letter-spacing: `"W E S T, K A N Y E"` becomes `"WEST, KANYE"`.
///
/// Only values that open with three spaced capitals are touched, so ordinary
/// titles like `"A Day In The Life"` are left alone.
pub fn collapse_letter_spacing(value: &str) -> String {
    if LETTER_SPACED.is_match(value) {
        SPACED_CAPITAL.replace_all(value, "$1").into_owned()
    } else {
        value.to_string()
    }
}

/// Turns raw upstream rows into sorted, numbered records.
pub fn normalize_rows(rows: Vec<RawRow>, filter: &ExclusionFilter) -> Vec<Record> {
    let mut entries: Vec<(String, String)> = rows
        .iter()
        .filter_map(|row| {
            let artist = collapse_letter_spacing(cell(row, ARTIST_COLUMN)?);
            let title = collapse_letter_spacing(cell(row, TITLE_COLUMN)?);
            if filter.is_blocked(&artist) || filter.is_blocked(&title) {
                return None;
            }
            Some((artist, title))
        })
        .collect();

    // Stable sort, so rows equal under case-folding keep their upstream order.
    entries.sort_by_cached_key(|(artist, title)| (artist.to_lowercase(), title.to_lowercase()));

    entries
        .into_iter()
        .enumerate()
        .map(|(id, (artist, title))| Record { id, artist, title })
        .collect()
}

fn cell(row: &RawRow, column: usize) -> Option<&str> {
    row.get(column)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
