use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::extract::pdf::RawPage;
use crate::model::{BusinessSection, CompanyProfile, Director, PrintedAt};
use crate::normalize::{collapse_spaces, cut_at_boundaries, has_boundary, parse_date};

const LATEST_SUFFIX: &str = "(มาจากงบการเงินปีล่าสุด)";
const DIRECTOR_NOISE: [&str; 5] = ["ข้อมูล", "URL", "หน้า", "DBD", "ปีที่ส่งงบการเงิน"];
const NOTICE_MARKER_REPAIR: (&str, &str) = ("คนใดคนหนึ", "คนใดคนหนึ่ง");

fn numbered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\s*[.)]\s*").expect("invalid numbered line regex"))
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{4}").expect("invalid year regex"))
}

fn coded_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<code>[0-9]{3,5})\s*:\s*(?P<desc>.+)").expect("invalid coded value regex")
    })
}

fn notice_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\sข้อควรทราบ\s*:?").expect("invalid notice regex"))
}

fn split_mark_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\S)\n([\u{0E48}-\u{0E4E}])").expect("invalid split mark regex")
    })
}

fn inline_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("invalid inline space regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("invalid blank lines regex"))
}

/// Re-joins Thai tone marks that the extractor pushed onto the next line and
/// collapses runs of spaces and blank lines.
pub fn clean_text(text: &str) -> String {
    let text = text.replace('\r', "\n");
    let text = split_mark_re().replace_all(&text, "$1$2");
    let text = inline_space_re().replace_all(&text, " ");
    let text = blank_lines_re().replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Whitespace-collapsed line with surrounding spaces and slashes removed.
pub fn norm_line(line: &str) -> String {
    collapse_spaces(line)
        .trim_matches(|ch| ch == ' ' || ch == '/')
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKey {
    BusinessAtRegistration,
    ObjectiveAtRegistration,
    BusinessLatest,
    ObjectiveLatest,
    FinancialYears,
    Address,
    Directors,
    BindingRule,
}

const ONE_LINE_KEYS: [(&str, SectionKey); 6] = [
    ("หมวดธุรกิจตอนจดทะเบียน", SectionKey::BusinessAtRegistration),
    ("วัตถุประสงค์ตอนจดทะเบียน", SectionKey::ObjectiveAtRegistration),
    ("ปีที่ส่งงบการเงิน", SectionKey::FinancialYears),
    ("ที่ตั้ง", SectionKey::Address),
    ("กรรมการ", SectionKey::Directors),
    ("คณะกรรมการลงชื่อผูกพัน", SectionKey::BindingRule),
];

const TWO_LINE_KEYS: [(&str, SectionKey); 2] = [
    ("หมวดธุรกิจ", SectionKey::BusinessLatest),
    ("วัตถุประสงค์", SectionKey::ObjectiveLatest),
];

impl SectionKey {
    /// Lines the key label occupies.
    pub fn span(self) -> usize {
        match self {
            Self::BusinessLatest | Self::ObjectiveLatest => 2,
            _ => 1,
        }
    }
}

/// `label :` with optional space before the colon.
fn label_of(line: &str) -> Option<&str> {
    line.strip_suffix(':').map(str::trim_end)
}

/// The section key starting at `index`, including the two-line
/// `... (มาจากงบการเงินปีล่าสุด) :` labels.
pub fn key_at(lines: &[String], index: usize) -> Option<SectionKey> {
    let current = lines.get(index)?;
    if let Some(label) = label_of(current)
        && let Some((_, key)) = ONE_LINE_KEYS.iter().find(|(name, _)| *name == label)
    {
        return Some(*key);
    }

    let next = lines.get(index + 1)?;
    if label_of(next) != Some(LATEST_SUFFIX) {
        return None;
    }
    TWO_LINE_KEYS
        .iter()
        .find(|(name, _)| *name == current.as_str())
        .map(|(_, key)| *key)
}

/// Name on a numbered director line (`1. name`, `2) name`), unless the line
/// is page furniture.
pub fn director_candidate(line: &str) -> Option<String> {
    let found = numbered_re().find(line)?;
    let name = line[found.end()..]
        .trim_matches(|ch| matches!(ch, ' ' | '/' | '-' | '•' | '.'))
        .to_string();
    if DIRECTOR_NOISE.iter().any(|noise| name.contains(noise)) {
        return None;
    }
    Some(name)
}

/// Numbers the names in order, dropping blanks and repeats.
pub fn to_directors<I>(names: I) -> Vec<Director>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: Vec<String> = Vec::new();
    for name in names {
        let name = name.trim().trim_end_matches('/').trim().to_string();
        if name.is_empty() || seen.contains(&name) {
            continue;
        }
        seen.push(name);
    }

    seen.into_iter()
        .zip(1..)
        .map(|(name, no)| Director { no, name })
        .collect()
}

/// Values collected by the section state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    pub business_section_at_registration: Option<BusinessSection>,
    pub objective_at_registration: Option<String>,
    pub business_section_latest: Option<BusinessSection>,
    pub objective_latest: Option<String>,
    pub financial_years: Option<Vec<String>>,
    pub address: Option<String>,
    pub directors: Option<Vec<Director>>,
    pub binding_rule: Option<String>,
}

impl Sections {
    fn emit(&mut self, key: SectionKey, raw: &str) {
        // tail-noise trimming would eat a value made only of years
        if key == SectionKey::FinancialYears {
            self.financial_years = Some(years_in(raw));
            return;
        }

        let value = cut_at_boundaries(raw);
        match key {
            SectionKey::Address => self.address = Some(value),
            SectionKey::BusinessAtRegistration => {
                if let Some(section) = business_section(&value) {
                    self.business_section_at_registration = Some(section);
                }
            }
            SectionKey::BusinessLatest => {
                if let Some(section) = business_section(&value) {
                    self.business_section_latest = Some(section);
                }
            }
            SectionKey::ObjectiveAtRegistration => {
                self.objective_at_registration = Some(objective(&value));
            }
            SectionKey::ObjectiveLatest => self.objective_latest = Some(objective(&value)),
            SectionKey::FinancialYears | SectionKey::Directors | SectionKey::BindingRule => {}
        }
    }
}

fn years_in(text: &str) -> Vec<String> {
    year_re()
        .find_iter(text)
        .map(|found| found.as_str().to_string())
        .collect()
}

fn business_section(value: &str) -> Option<BusinessSection> {
    if let Some(caps) = coded_re().captures(value) {
        return Some(BusinessSection {
            code: Some(caps["code"].to_string()),
            description: caps["desc"].to_string(),
        });
    }
    (!value.is_empty()).then(|| BusinessSection {
        code: None,
        description: value.to_string(),
    })
}

fn objective(value: &str) -> String {
    match coded_re().captures(value) {
        Some(caps) if caps.get(0).is_some_and(|found| found.start() == 0) => {
            caps["desc"].to_string()
        }
        _ => value.to_string(),
    }
}

fn doc_wide_directors(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| director_candidate(line))
        .collect()
}

/// Walks the normalized lines. A key line opens a section; directors and the
/// binding rule consume their own block, other keys queue up and receive the
/// following content lines in order.
pub fn parse_sections(lines: &[String]) -> Sections {
    let mut sections = Sections::default();
    let mut pending: Vec<SectionKey> = Vec::new();
    let mut buffers: Vec<(SectionKey, Vec<String>)> = Vec::new();

    let block_end = |start: usize| {
        let mut end = start;
        while end < lines.len() && key_at(lines, end).is_none() && !has_boundary(&lines[end]) {
            end += 1;
        }
        end
    };

    let mut index = 0;
    while index < lines.len() {
        if let Some(key) = key_at(lines, index) {
            match key {
                SectionKey::Directors => {
                    let end = block_end(index + 1);
                    let local = lines[index + 1..end]
                        .iter()
                        .filter_map(|line| director_candidate(line));
                    let names: Vec<String> = doc_wide_directors(lines)
                        .into_iter()
                        .chain(local)
                        .collect();
                    sections.directors = Some(to_directors(names));
                    index = end;
                }
                SectionKey::BindingRule => {
                    let end = block_end(index + 1);
                    let joined = collapse_spaces(&lines[index + 1..end].join(" "));
                    let joined = joined.trim_matches(|ch| ch == ' ' || ch == '/');
                    let rule = notice_re()
                        .split(joined)
                        .next()
                        .unwrap_or_default()
                        .trim()
                        .replace(NOTICE_MARKER_REPAIR.0, NOTICE_MARKER_REPAIR.1);
                    sections.binding_rule = Some(rule);
                    index = end;
                }
                _ => {
                    pending.push(key);
                    index += key.span();
                }
            }
            continue;
        }

        let line = &lines[index];
        index += 1;
        if has_boundary(line) || pending.is_empty() || numbered_re().is_match(line) {
            continue;
        }

        let target = pending
            .iter()
            .copied()
            .find(|key| buffers.iter().all(|(buffered, _)| buffered != key));
        match target {
            Some(key) => buffers.push((key, vec![line.clone()])),
            None => {
                let last = pending[pending.len() - 1];
                if let Some((_, buffer)) = buffers.iter_mut().find(|(key, _)| *key == last) {
                    buffer.push(line.clone());
                }
            }
        }
    }

    for key in &pending {
        let Some((_, buffer)) = buffers.iter().find(|(buffered, _)| buffered == key) else {
            continue;
        };
        let value = buffer.join(" ");
        let value = value.trim();
        if !value.is_empty() {
            sections.emit(*key, value);
        }
    }

    sections
}

/// Compiled patterns for the single-value fields of a registry profile.
pub struct ProfileParser {
    company_name: Vec<Regex>,
    registration_number: Regex,
    entity_type: Regex,
    incorporation_date: Vec<Regex>,
    status: Regex,
    capital: Regex,
    printed_date: Vec<Regex>,
    printed_time: Regex,
    source_url: Regex,
    financial_years: Regex,
}

fn compile(pattern: &str, what: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("failed to compile {what} regex"))
}

fn find_first(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .map(|caps| caps[1].trim().to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

impl ProfileParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            company_name: vec![
                compile(r"(?m)ข้อมูล\s*\n\s*(บริษัท[^\n]+)", "company name")?,
                compile(r"(?m)^\s*(บริษัท[^\n]+)", "company name")?,
            ],
            registration_number: compile(
                r"เลขทะเบียนนิติบุคคล\s*:\s*([0-9\-]+)",
                "registration number",
            )?,
            entity_type: compile(r"ประเภทนิติบุคคล\s*:\s*([^\n]+)", "entity type")?,
            incorporation_date: vec![
                compile(
                    r"วันที่จดทะเบียนจัดตั้ง\s*:\s*([0-9]{2}/[0-9]{2}/[0-9]{4})",
                    "incorporation date",
                )?,
                compile(
                    r"วันที\s*่จดทะเบียนจัดตั\s*้ง\s*:\s*([0-9/]{8,10})",
                    "incorporation date",
                )?,
            ],
            status: compile(r"สถานะนิติบุคคล\s*:\s*([^\n]+)", "status")?,
            capital: compile(r"ทุนจดทะเบียน\s*\(บาท\)\s*:\s*([0-9,.]+)", "capital")?,
            printed_date: vec![
                compile(
                    r"วันที่สั่งพิมพ์\s*:\s*([0-9]{2}/[0-9]{2}/[0-9]{4})",
                    "printed date",
                )?,
                compile(r"วันที\s*่สั\s*่งพิมพ์\s*:\s*([0-9/]{8,10})", "printed date")?,
            ],
            printed_time: compile(r"เวลา\s*:\s*([0-9]{2}:[0-9]{2}:[0-9]{2})", "printed time")?,
            source_url: compile(r"URL\s*:\s*(https?://\S+)", "source url")?,
            financial_years: compile(r"ปีที่ส่งงบการเงิน\s*:\s*([0-9\s,]+)", "filing years")?,
        })
    }

    /// Builds the structured profile from cleaned pages.
    pub fn parse(&self, pages: &[RawPage]) -> CompanyProfile {
        let full = clean_text(
            &pages
                .iter()
                .map(|page| page.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        );
        let field = |re: &Regex| find_first(&full, std::slice::from_ref(re));

        let lines: Vec<String> = pages
            .iter()
            .flat_map(|page| page.lines.iter())
            .map(|line| norm_line(line))
            .filter(|line| !line.is_empty())
            .collect();
        let sections = parse_sections(&lines);

        let financial_years = sections.financial_years.unwrap_or_else(|| {
            field(&self.financial_years)
                .map(|years| years_in(&years))
                .unwrap_or_default()
        });
        let directors = sections
            .directors
            .unwrap_or_else(|| to_directors(doc_wide_directors(&lines)));

        let incorporation_date = non_empty(find_first(&full, &self.incorporation_date))
            .map(|raw| parse_date(&raw).unwrap_or(raw));
        let registered_capital_baht = field(&self.capital)
            .map(|raw| raw.replace(',', ""))
            .and_then(|raw| raw.parse::<f64>().ok());

        let printed_date = non_empty(find_first(&full, &self.printed_date));
        let printed_time = non_empty(field(&self.printed_time));
        let printed_at = (printed_date.is_some() || printed_time.is_some()).then(|| PrintedAt {
            date: printed_date,
            time: printed_time,
        });

        CompanyProfile {
            company_name: non_empty(find_first(&full, &self.company_name)),
            registration_number: non_empty(field(&self.registration_number)),
            entity_type: non_empty(field(&self.entity_type)),
            incorporation_date_th: incorporation_date,
            status: non_empty(field(&self.status)),
            registered_capital_baht,
            address: non_empty(sections.address),
            business_section_at_registration: sections.business_section_at_registration,
            objective_at_registration: non_empty(sections.objective_at_registration),
            business_section_latest: sections.business_section_latest,
            objective_latest: non_empty(sections.objective_latest),
            financial_filing_years_th: financial_years,
            directors,
            binding_rule: non_empty(sections.binding_rule),
            printed_at,
            source_url: non_empty(field(&self.source_url)),
            registered_date: None,
            title_card: None,
        }
    }
}
