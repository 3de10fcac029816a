//! Sends structured profile JSON files to the supplier API.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::cli::PostArgs;
use crate::util::{discover_inputs, file_name_string, has_extension, run_batch};


const JURISTIC_ID_KEY: &str = "juristic_id";
const BODY_PREVIEW_CHARS: usize = 800;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostError {
    #[error("bad --extra pair (expected key=value): {0}")]
    BadExtra(String),
    #[error("api returned {status}: {preview}")]
    Rejected { status: u16, preview: String },
}

fn juristic_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{10,13})_").expect("invalid juristic id regex"))
}

pub fn run(args: PostArgs) -> Result<()> {
    let extra = parse_extra_pairs(&args.extra)?;
    let inputs: Vec<PathBuf> = discover_inputs(&args.input, &args.pattern)?
        .into_iter()
        .filter(|path| has_extension(path, "json"))
        .collect();

    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()
        .context("failed to build http client")?;

    info!(
        files = inputs.len(),
        api_url = %args.api_url,
        timeout_secs = args.timeout,
        extra = extra.len(),
        "posting structured json"
    );

    run_batch("post", &inputs, |path| {
        let payload = build_payload(path, !args.no_auto_id, &extra)?;
        post_payload(&client, &args.api_url, &payload)
            .with_context(|| format!("failed to post {}", file_name_string(path)))?;
        info!(path = %path.display(), "posted");
        Ok(())
    })?;
    Ok(())
}

/// Splits `key=value` pairs on the first `=`, trimming both sides.
pub fn parse_extra_pairs(pairs: &[String]) -> Result<Vec<(String, String)>, PostError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| PostError::BadExtra(pair.clone()))
        })
        .collect()
}

/// Juristic id from a `<10-13 digits>_...` file name.
pub fn juristic_id_from_name(path: &Path) -> Option<String> {
    juristic_id_re()
        .captures(&file_name_string(path))
        .map(|caps| caps[1].to_string())
}

/// Loads the JSON object and adds the juristic id and extra fields, never
/// overwriting keys the file already has.
pub fn build_payload(
    path: &Path,
    auto_id: bool,
    extra: &[(String, String)],
) -> Result<Map<String, Value>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read json: {}", path.display()))?;
    let value: Value = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse json: {}", path.display()))?;
    let Value::Object(mut payload) = value else {
        bail!("payload is not a json object: {}", path.display());
    };

    if auto_id && let Some(id) = juristic_id_from_name(path) {
        payload
            .entry(JURISTIC_ID_KEY)
            .or_insert_with(|| Value::String(id));
    }
    for (key, value) in extra {
        payload
            .entry(key.clone())
            .or_insert_with(|| Value::String(value.clone()));
    }

    debug!(path = %path.display(), keys = payload.len(), "built payload");
    Ok(payload)
}

/// POSTs the payload as a JSON body. Any non-2xx status is an error carrying
/// a preview of the response body.
pub fn post_payload(client: &Client, api_url: &str, payload: &Map<String, Value>) -> Result<()> {
    let response = client
        .post(api_url)
        .json(payload)
        .send()
        .with_context(|| format!("request to {api_url} failed"))?;

    let status = response.status();
    let body = response
        .text()
        .with_context(|| format!("failed to read response body from {api_url}"))?;
    let preview = body_preview(&body);
    if !status.is_success() {
        return Err(PostError::Rejected {
            status: status.as_u16(),
            preview,
        }
        .into());
    }

    info!(status = status.as_u16(), response = %preview, "api accepted payload");
    Ok(())
}

pub fn body_preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
