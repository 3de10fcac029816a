//! OCR look-alike repair for document numbers and branch codes.

/// Repairs `O`/`I`/`l` look-alikes in the numeric tail of a token.
///
/// The leading run of ASCII letters is kept verbatim; the remainder is only
/// touched when it already carries a digit, so pure words pass through.
pub fn repair_numeric_tail(token: &str) -> String {
    let prefix_len = token
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_alphabetic())
        .map(|(index, _)| index)
        .unwrap_or(token.len());
    let (prefix, tail) = token.split_at(prefix_len);

    if !tail.chars().any(|ch| ch.is_ascii_digit()) {
        return token.to_string();
    }

    let repaired: String = tail
        .chars()
        .map(|ch| match ch {
            'O' | 'o' => '0',
            'I' | 'i' | 'l' | 'L' => '1',
            other => other,
        })
        .collect();
    format!("{prefix}{repaired}")
}

/// Whole-token `O`→`0`, `I`→`1` substitution for codes that are digits by
/// construction (branch and vendor codes).
pub fn fix_o0_i1(token: &str) -> String {
    token
        .chars()
        .map(|ch| match ch {
            'O' => '0',
            'I' => '1',
            other => other,
        })
        .collect()
}

/// Normalizes a remittance document or reference number.
pub fn normalize_docref_token(token: &str) -> String {
    let compact: String = token.chars().filter(|ch| !ch.is_whitespace()).collect();
    let compact = match compact.strip_prefix("1V") {
        Some(rest) => format!("IV{rest}"),
        None => compact,
    };
    repair_numeric_tail(&compact)
}
