//! Remittance summary reports: one line per remittance in a text-layer PDF.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, info};

use crate::cli::RemittanceSummaryArgs;
use crate::extract::pdf::extract_text_layer;
use crate::model::RemittanceSummaryRecord;
use crate::normalize::{
    DateOrder, collapse_spaces, parse_amount_opt, parse_date, parse_datetime,
};
use crate::util::{
    discover_inputs, file_name_string, file_stem_string, has_extension, run_batch,
    write_json_pretty,
};

#[cfg(test)]
mod tests;

const DEFAULT_PATTERN: &str = "*.pdf";

pub fn run(args: RemittanceSummaryArgs) -> Result<()> {
    let inputs = discover_inputs(&args.input, DEFAULT_PATTERN)?;
    let parser = SummaryParser::new()?;

    run_batch("remittance summary", &inputs, |path| {
        convert_file(path, &args.out_dir, &parser)
    })?;
    Ok(())
}

fn convert_file(path: &Path, out_dir: &Path, parser: &SummaryParser) -> Result<()> {
    let text = if has_extension(path, "txt") {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read report text: {}", path.display()))?
    } else if has_extension(path, "pdf") {
        extract_text_layer(path, false)?.join("\n")
    } else {
        bail!("unsupported remittance summary input: {}", path.display());
    };

    let records = parser.parse(&text, &file_name_string(path));
    let out_path = out_dir.join(format!("{}.json", file_stem_string(path)));
    write_json_pretty(&out_path, &records)?;
    info!(
        path = %out_path.display(),
        records = records.len(),
        "wrote remittance summary json"
    );
    Ok(())
}

pub struct SummaryParser {
    record_start: Regex,
    has_date: Regex,
    glued_code: Regex,
    date: Regex,
    time: Regex,
    amount: Regex,
    record: Regex,
}

impl SummaryParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            record_start: Regex::new(r"^\d{10}").context("failed to compile record start regex")?,
            has_date: Regex::new(r"\d{2}/\d{2}/\d{4}").context("failed to compile date regex")?,
            glued_code: Regex::new(r"^(\d{10})(\S)").context("failed to compile code regex")?,
            date: Regex::new(r"(\d{2}/\d{2}/\d{4})").context("failed to compile date regex")?,
            time: Regex::new(r"(\d{2}:\d{2}:\d{2}\s+(?:AM|PM))")
                .context("failed to compile time regex")?,
            amount: Regex::new(r"([0-9,]+\.\d{2})").context("failed to compile amount regex")?,
            record: Regex::new(concat!(
                r"^(?P<remittance_no>\d{10})\s+",
                r"(?P<name_branch>.+?)\s+",
                r"(?P<remittance_date>\d{2}/\d{2}/\d{4})\s+",
                r"(?P<sent_date>\d{2}/\d{2}/\d{4})\s+",
                r"(?P<time>\d{2}:\d{2}:\d{2})\s+(?P<meridiem>AM|PM)\s+",
                r"(?P<amount>[0-9,]+\.\d{2})\s+",
                r"(?P<status>Open|Closed|OPEN|CLOSED|New|NEW)\s+",
                r"(?P<sequence>\d+)\s+",
                r"(?P<supplier_code>\d+)\s+",
                r"(?P<pay_date>\d{2}/\d{2}/\d{4})$",
            ))
            .context("failed to compile summary record regex")?,
        })
    }

    /// Pads dates, times and amounts with spaces so glued tokens split apart.
    pub fn normalize_line(&self, line: &str) -> String {
        let line = self.glued_code.replace(line, "${1} ${2}");
        let line = self.date.replace_all(&line, " ${1} ");
        let line = self.time.replace_all(&line, " ${1} ");
        let line = self.amount.replace_all(&line, " ${1} ");
        collapse_spaces(&line)
    }

    /// Records in report order. A line that starts with the remittance number
    /// but has no date continues on the next line.
    pub fn parse(&self, text: &str, source_pdf: &str) -> Vec<RemittanceSummaryRecord> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let mut records = Vec::new();
        let mut index = 0;
        while index < lines.len() {
            let line = lines[index];
            index += 1;
            if !self.record_start.is_match(line) {
                continue;
            }

            let joined;
            let candidate = if self.has_date.is_match(line) {
                line
            } else {
                let Some(next) = lines.get(index) else {
                    break;
                };
                index += 1;
                joined = format!("{line} {next}");
                joined.as_str()
            };

            match self.parse_record(candidate, source_pdf) {
                Some(record) => records.push(record),
                None => debug!(line = candidate, "unmatched summary line"),
            }
        }
        records
    }

    pub fn parse_record(&self, line: &str, source_pdf: &str) -> Option<RemittanceSummaryRecord> {
        let normalized = self.normalize_line(line);
        let caps = self.record.captures(&normalized)?;

        let name_branch = caps["name_branch"].trim();
        let (supplier_name, branch) = match name_branch.rsplit_once(' ') {
            Some((name, branch)) => (name.trim().to_string(), branch.to_string()),
            None => (name_branch.to_string(), String::new()),
        };

        Some(RemittanceSummaryRecord {
            supplier_code: caps["supplier_code"].to_string(),
            remittance_no: caps["remittance_no"].to_string(),
            supplier_name,
            branch,
            sent_date: parse_datetime(
                &format!(
                    "{} {} {}",
                    &caps["sent_date"], &caps["time"], &caps["meridiem"]
                ),
                DateOrder::DayFirst,
            )
            .ok(),
            remittance_date: parse_date(&caps["remittance_date"]).ok(),
            amount: parse_amount_opt(&caps["amount"]),
            status: caps["status"].to_string(),
            sequence: caps["sequence"].parse().ok()?,
            pay_date: parse_date(&caps["pay_date"]).ok(),
            source_pdf: source_pdf.to_string(),
        })
    }
}
