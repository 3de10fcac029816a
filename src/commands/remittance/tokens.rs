use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::{fix_o0_i1, normalize_docref_token};

pub const CROSS_DOCK_DOC: &str = "CROSS DOCK";
pub const CROSS_DOCK_REF: &str = "Crossdock";

fn token_candidate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9]{2,}-?[A-Za-z0-9]{2,}|[A-Za-z]{1,3}\s*-?\s*\d{4,}")
            .expect("invalid token candidate regex")
    })
}

fn token_last_resort_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9\-]{5,}").expect("invalid last resort token regex"))
}

fn fc_branch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"F\s*C[^0-9]*([0-9])[^0-9]*([0-9])?").expect("invalid fc branch regex")
    })
}

fn w_branch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"W[^0-9]*([0-9])[^0-9]*([0-9])[^0-9]*([0-9])").expect("invalid w branch regex")
    })
}

/// Picks the most plausible document token out of noisy OCR text: the
/// longest alphanumeric run (first wins on ties), then a last-resort pass
/// over runs of at least five characters.
pub fn extract_best_token(raw: &str) -> Option<String> {
    let candidate = longest_match(token_candidate_re(), raw)
        .or_else(|| longest_match(token_last_resort_re(), raw))?;
    let compact: String = candidate.chars().filter(|ch| !ch.is_whitespace()).collect();
    Some(normalize_docref_token(&compact))
}

fn longest_match<'h>(re: &Regex, text: &'h str) -> Option<&'h str> {
    re.find_iter(text)
        .map(|found| found.as_str())
        .fold(None, |best: Option<&'h str>, candidate| match best {
            Some(current) if current.len() >= candidate.len() => Some(current),
            _ => Some(candidate),
        })
}

/// Restores a reference number that OCR truncated or mangled when it is
/// evidently the document number. An empty string means "no token".
pub fn repair_ref_if_needed(doc: &str, reference: &str) -> String {
    if reference.is_empty() {
        return doc.to_string();
    }
    if doc.is_empty() {
        return reference.to_string();
    }

    let common = doc
        .chars()
        .zip(reference.chars())
        .take_while(|(left, right)| left == right)
        .count();
    if common >= 6 || (reference.chars().count() >= 6 && doc.starts_with(reference)) {
        return doc.to_string();
    }

    reference.to_string()
}

/// Canonical branch code: `0000`, `FC##`, `W###`, or the cleaned token.
pub fn normalize_branch(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }

    let cleaned: String = fix_o0_i1(token)
        .to_uppercase()
        .chars()
        .filter(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || *ch == ' ')
        .collect();

    if cleaned.contains("0000") {
        return "0000".to_string();
    }

    if let Some(caps) = fc_branch_re().captures(&cleaned) {
        return match caps.get(2) {
            Some(second) => format!("FC{}{}", &caps[1], second.as_str()),
            None => format!("FC0{}", &caps[1]),
        };
    }

    if let Some(caps) = w_branch_re().captures(&cleaned) {
        return format!("W{}{}{}", &caps[1], &caps[2], &caps[3]);
    }

    cleaned.trim().to_string()
}

fn compact_upper(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn is_cross_dock(value: &str) -> bool {
    matches!(compact_upper(value).as_str(), "CROSSDOCK" | "CROSS-DOCK")
}

/// Folds the many OCR spellings of a cross-dock line into one doc/ref pair.
pub fn fold_crossdock(doc: &str, reference: &str) -> (String, String) {
    let folded = (CROSS_DOCK_DOC.to_string(), CROSS_DOCK_REF.to_string());

    if is_cross_dock(doc) || is_cross_dock(reference) {
        return folded;
    }

    let doc_upper = compact_upper(doc);
    let ref_upper = compact_upper(reference);
    let is_half = |value: &str| matches!(value, "CROSS" | "DOCK");

    let split_pair = (doc_upper == "CROSS" && ref_upper == "DOCK")
        || (doc_upper == "DOCK" && ref_upper == "CROSS");
    let lone_half = (is_half(&doc_upper) && reference.trim().is_empty())
        || (is_half(&ref_upper) && doc.trim().is_empty());

    if split_pair || lone_half {
        return folded;
    }

    (doc.trim().to_string(), reference.trim().to_string())
}
