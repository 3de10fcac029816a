use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount cell is empty")]
    Empty,
    #[error("unparseable amount: {0:?}")]
    Invalid(String),
}

const DASH_PLACEHOLDERS: [&str; 4] = ["-", "\u{2013}", "\u{2014}", "\u{2212}"];

/// Parses a monetary or percentage cell into a float.
///
/// Thousands separators are dropped, parentheses mark a negative value and a
/// trailing `%` is removed while keeping the value in percent units. A lone
/// dash or a literal zero is `0.0`, never an error.
pub fn parse_amount(raw: &str) -> Result<f64, AmountError> {
    let cleaned = raw
        .replace(['\u{200b}', '\u{feff}'], "")
        .replace('\u{00a0}', " ");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if DASH_PLACEHOLDERS.contains(&trimmed) {
        return Ok(0.0);
    }

    let unified = trimmed.replace(['\u{2212}', '\u{2014}', '\u{2013}'], "-");
    let mut body = unified.trim();
    let mut negative = false;

    if body.starts_with('(') && body.ends_with(')') && body.len() >= 2 {
        negative = true;
        body = body[1..body.len() - 1].trim();
    }

    let body = body.trim_end_matches('%').trim();
    let compact: String = body.chars().filter(|ch| !ch.is_whitespace()).collect();

    let mut digits_part = compact.as_str();
    if let Some(rest) = digits_part.strip_prefix('-') {
        negative = !negative;
        digits_part = rest;
    } else if let Some(rest) = digits_part.strip_prefix('+') {
        digits_part = rest;
    }
    // stray OCR glyphs between digits
    let digits_part: String = digits_part
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == ',')
        .collect();

    if !digits_part.chars().any(|ch| ch.is_ascii_digit()) {
        if digits_part.is_empty() && compact.chars().all(|ch| ch == '-') {
            return Ok(0.0);
        }
        return Err(AmountError::Invalid(raw.to_string()));
    }

    let canonical = resolve_separators(&digits_part);
    let value = canonical
        .parse::<f64>()
        .map_err(|_| AmountError::Invalid(raw.to_string()))?;

    if value == 0.0 {
        return Ok(0.0);
    }
    Ok(if negative { -value } else { value })
}

/// Like [`parse_amount`], but maps empty or unparseable cells to `None`.
pub fn parse_amount_opt(raw: &str) -> Option<f64> {
    parse_amount(raw).ok()
}

/// Canonical text form of a parsed amount; parses back to the same value.
pub fn format_amount(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

fn resolve_separators(text: &str) -> String {
    let dots = text.matches('.').count();
    let commas = text.matches(',').count();

    match (dots, commas) {
        (_, 0) if dots >= 2 => keep_last_as_decimal(text, '.'),
        // Repeated separator of one kind: the last one is the decimal point.
        (0, _) if commas >= 2 => keep_last_as_decimal(text, ','),
        _ => text.replace(',', ""),
    }
}

fn keep_last_as_decimal(text: &str, separator: char) -> String {
    match text.rfind(separator) {
        Some(index) => {
            let (head, tail) = text.split_at(index);
            let head: String = head.chars().filter(|ch| *ch != separator).collect();
            format!("{head}.{}", &tail[separator.len_utf8()..])
        }
        None => text.to_string(),
    }
}
