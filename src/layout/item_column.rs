use std::sync::OnceLock;

use regex::Regex;

use super::{Grid, ITEM_SAMPLE_ROWS, LayoutError, cell};
use crate::normalize::collapse_spaces;

fn number_or_pct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-+(]?\d+(?:[,\s]\d{3})*(?:\.\d+)?\)?\s*%?$")
            .expect("invalid number or percent regex")
    })
}

/// A non-empty cell that is not purely a number, percentage or dash.
pub fn is_label_like(value: &str) -> bool {
    let text = value.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        return false;
    }
    if matches!(text, "-" | "\u{2013}" | "\u{2014}") {
        return false;
    }
    !number_or_pct_re().is_match(text)
}

/// Chooses the item-label column among `candidates`.
///
/// Each candidate scores `2 × label-like cells + 3 × vocabulary hits` over up
/// to `ITEM_SAMPLE_ROWS` body rows; the first candidate wins ties.
pub fn select_item_column<F>(
    grid: &Grid,
    body_start: usize,
    candidates: &[usize],
    is_known_item: F,
) -> Result<usize, LayoutError>
where
    F: Fn(&str) -> bool,
{
    let mut best: Option<(usize, usize)> = None;

    for &column in candidates {
        let mut label_like = 0_usize;
        let mut vocabulary_hits = 0_usize;

        for row in grid.iter().skip(body_start).take(ITEM_SAMPLE_ROWS) {
            let value = cell(row, column);
            if is_label_like(value) {
                label_like += 1;
            }
            if !value.is_empty() && is_known_item(&collapse_spaces(value)) {
                vocabulary_hits += 1;
            }
        }

        let score = label_like * 2 + vocabulary_hits * 3;
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((column, score));
        }
    }

    best.map(|(column, _)| column)
        .ok_or(LayoutError::NoItemColumn)
}
