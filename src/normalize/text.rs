use std::sync::OnceLock;

use regex::Regex;

fn boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?:^|\s)(?:",
            r"ปีที่ส่งงบการเงิน\s*:|กรรมการ\s*:|คณะกรรมการลงชื่อผูกพัน\s*:|ข้อควรทราบ|",
            r"DBD\s*DataWarehouse|URL\s*:|หน้า\b|ข้อมูล\b|วันที่สั่งพิมพ์\s*:|เวลา\s*:|",
            r"\b\d{1,2}:\d{2}(?::\d{2})?\b|",
            r"\b\d{1,2}/\d{1,2}/\d{2,4}\b|",
            r"บริษัท\s+.+?จำกัด",
            r")",
        ))
        .expect("invalid boundary regex")
    })
}

fn inline_numbered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s\d+\.\s").expect("invalid inline numbered regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("invalid url regex"))
}

fn tail_noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\d\s\u{0E48}-\u{0E4E}]+$").expect("invalid tail noise regex")
    })
}

fn spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("invalid spaces regex"))
}

/// Truncates a free-text field value where the next field, a page footer or
/// an inline numbered item begins, then strips trailing noise.
pub fn cut_at_boundaries(value: &str) -> String {
    let mut text = value.trim().to_string();
    if text.is_empty() {
        return text;
    }

    for re in [boundary_re(), inline_numbered_re(), url_re()] {
        if let Some(found) = re.find(&text) {
            text.truncate(found.start());
        }
    }

    let text = tail_noise_re().replace(&text, "");
    text.trim_matches(|ch| ch == ' ' || ch == '/')
        .trim()
        .to_string()
}

/// True when the text contains a next-section label or a page footer token.
pub fn has_boundary(text: &str) -> bool {
    boundary_re().is_match(text)
}

/// Removes zero-width characters and maps non-breaking spaces to spaces.
pub fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}'))
        .map(|ch| if ch == '\u{00a0}' { ' ' } else { ch })
        .collect()
}

/// Collapses every whitespace run to a single space.
pub fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses runs of spaces and tabs while keeping line breaks.
pub fn collapse_inline_spaces(text: &str) -> String {
    spaces_re().replace_all(text, " ").into_owned()
}
