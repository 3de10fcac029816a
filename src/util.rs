use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{SecondsFormat, Utc};
use globwalk::GlobWalkerBuilder;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};


pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn read_text_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("output")
        .to_string()
}

pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .and_then(|value| value.to_str())
        .unwrap_or_default()
        .to_string()
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Expands a command input into the files to process: a single file, every
/// file in a folder whose name matches `pattern`, or a `*` glob in the last
/// path component. Results are sorted by path.
pub fn discover_inputs(input: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let (directory, pattern) = if input.is_dir() {
        (input.to_path_buf(), pattern.to_string())
    } else {
        let name = file_name_string(input);
        if !name.contains('*') && !name.contains('?') {
            bail!("input does not exist: {}", input.display());
        }
        let parent = input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (parent, name)
    };

    let walker = GlobWalkerBuilder::from_patterns(&directory, &[pattern.as_str()])
        .case_insensitive(false)
        .follow_links(false)
        .max_depth(1)
        .build()
        .map_err(|err| anyhow!("invalid input pattern {pattern:?}: {err}"))?;

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry
            .with_context(|| format!("failed to list directory: {}", directory.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();

    Ok(files)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub succeeded: usize,
    pub failed: usize,
}

/// Runs `process` over every input, logging failures and continuing. The
/// batch fails only when every input failed; an empty batch is a no-op.
pub fn run_batch<F>(label: &str, inputs: &[PathBuf], mut process: F) -> Result<BatchTally>
where
    F: FnMut(&Path) -> Result<()>,
{
    if inputs.is_empty() {
        warn!("no {label} inputs matched");
        return Ok(BatchTally::default());
    }

    let mut tally = BatchTally::default();
    for path in inputs {
        match process(path) {
            Ok(()) => tally.succeeded += 1,
            Err(err) => {
                tally.failed += 1;
                warn!(path = %path.display(), error = %err, "{label} input failed");
                for cause in err.chain().skip(1) {
                    warn!(cause = %cause, "caused by");
                }
            }
        }
    }

    info!(
        succeeded = tally.succeeded,
        failed = tally.failed,
        total = inputs.len(),
        "{label} batch complete"
    );

    if tally.succeeded == 0 {
        bail!("all {} {label} inputs failed", tally.failed);
    }

    Ok(tally)
}

/// Company tax id taken from a file name: the first 13-digit run, else the
/// leading digits before `_`, else empty.
pub fn tax_id_from_name(name: &str) -> String {
    if let Some(captures) = tax_id_re().captures(name) {
        return captures[1].to_string();
    }

    match name.split_once('_') {
        Some((head, _)) if !head.is_empty() && head.chars().all(|ch| ch.is_ascii_digit()) => {
            head.to_string()
        }
        _ => String::new(),
    }
}

fn tax_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{13})(?:\D|$)").expect("invalid tax id regex"))
}
