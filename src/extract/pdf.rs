use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One page of extracted text with its non-empty lines.
#[derive(Debug, Clone, Serialize)]
pub struct RawPage {
    #[serde(rename = "page")]
    pub page_number: usize,
    pub text: String,
    pub lines: Vec<String>,
}

impl RawPage {
    pub fn new(page_number: usize, text: String) -> Self {
        let lines = split_lines(&text);
        Self {
            page_number,
            text,
            lines,
        }
    }
}

/// A single tesseract pass over a rendered page.
#[derive(Debug, Clone, Copy)]
pub struct OcrPass {
    pub psm: u8,
    pub monochrome: bool,
}

#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub lang: String,
    pub dpi: u32,
    pub passes: Vec<OcrPass>,
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn command_available(program: &str) -> bool {
    Command::new(program).arg("--version").output().is_ok()
}

pub fn ensure_ocr_tools() -> Result<()> {
    for program in ["pdftoppm", "tesseract"] {
        if !command_available(program) {
            bail!("{program} is required for OCR but was not found on PATH");
        }
    }
    Ok(())
}

/// Reads the PDF text layer, one string per page. `layout` keeps the
/// physical column arrangement of each line.
pub fn extract_text_layer(pdf_path: &Path, layout: bool) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8");
    if layout {
        command.arg("-layout");
    }
    command.arg("-f").arg("1").arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    // pdftotext ends with a form feed, which leaves an empty trailing chunk
    if pages.last().is_some_and(|page| page.is_empty()) {
        pages.pop();
    }

    Ok(pages)
}

pub fn text_layer_is_empty(pages: &[String]) -> bool {
    pages.iter().all(|page| page.trim().is_empty())
}

/// OCRs every page, merging the distinct outputs of all configured passes.
pub fn ocr_pages(pdf_path: &Path, settings: &OcrSettings) -> Result<Vec<String>> {
    ensure_ocr_tools()?;

    let page_count = extract_text_layer(pdf_path, false)?.len();
    if page_count == 0 {
        bail!("pdf has no pages: {}", pdf_path.display());
    }

    let mut pages = Vec::with_capacity(page_count);
    for page_number in 1..=page_count {
        let mut texts: Vec<String> = Vec::new();
        for pass in &settings.passes {
            let text = ocr_page(pdf_path, page_number, settings, *pass)?;
            if !text.is_empty() && !texts.contains(&text) {
                texts.push(text);
            }
        }
        debug!(
            page = page_number,
            passes = texts.len(),
            "ocr page complete"
        );
        pages.push(texts.join("\n"));
    }

    Ok(pages)
}

fn ocr_page(
    pdf_path: &Path,
    page_number: usize,
    settings: &OcrSettings,
    pass: OcrPass,
) -> Result<String> {
    let pdf_stem = pdf_path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("pdf");
    let safe_stem = pdf_stem
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect::<String>();

    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let output_root = std::env::temp_dir().join(format!(
        "credit_prep_ocr_{}_{}_{}_{}",
        safe_stem,
        std::process::id(),
        page_number,
        stamp
    ));
    let png_path = PathBuf::from(format!("{}.png", output_root.display()));

    let mut render = Command::new("pdftoppm");
    render
        .arg("-f")
        .arg(page_number.to_string())
        .arg("-l")
        .arg(page_number.to_string())
        .arg("-r")
        .arg(settings.dpi.to_string())
        .arg(if pass.monochrome { "-mono" } else { "-gray" })
        .arg("-singlefile")
        .arg("-png")
        .arg(pdf_path)
        .arg(&output_root);

    let pdftoppm_output = render
        .output()
        .with_context(|| format!("failed to execute pdftoppm for {}", pdf_path.display()))?;

    if !pdftoppm_output.status.success() {
        let stderr = String::from_utf8_lossy(&pdftoppm_output.stderr);
        bail!(
            "pdftoppm returned non-zero exit status for {} page {}: {}",
            pdf_path.display(),
            page_number,
            stderr.trim()
        );
    }

    if !png_path.exists() {
        bail!(
            "pdftoppm did not produce expected image for {} page {}",
            pdf_path.display(),
            page_number
        );
    }

    let mut recognize = Command::new("tesseract");
    recognize
        .arg(&png_path)
        .arg("stdout")
        .arg("-l")
        .arg(&settings.lang)
        .arg("--oem")
        .arg("1")
        .arg("--psm")
        .arg(pass.psm.to_string());
    let tesseract_output = output_then_remove(&mut recognize, &png_path)?;

    if !tesseract_output.status.success() {
        let stderr = String::from_utf8_lossy(&tesseract_output.stderr);
        bail!(
            "tesseract returned non-zero exit status for {} page {}: {}",
            pdf_path.display(),
            page_number,
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&tesseract_output.stdout)
        .replace('\u{0000}', "")
        .trim()
        .to_string())
}

/// Runs `command` over a rendered page image and deletes the image whether
/// or not the command could be launched.
pub(crate) fn output_then_remove(command: &mut Command, image: &Path) -> Result<Output> {
    let output = command.output();
    let _ = fs::remove_file(image);
    output.with_context(|| {
        format!(
            "failed to execute {} for {}",
            command.get_program().to_string_lossy(),
            image.display()
        )
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PagesDocument {
    Wrapped { pages: Vec<PageEntry> },
    Bare(Vec<PageEntry>),
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    #[serde(default, alias = "page")]
    page_number: Option<usize>,
    #[serde(default)]
    text: String,
}

/// Loads pre-extracted pages: `{"pages": [{"page_number", "text"}]}` or a
/// bare array of the same objects.
pub fn load_json_pages(path: &Path) -> Result<Vec<RawPage>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read pages json: {}", path.display()))?;
    parse_json_pages(&data)
        .with_context(|| format!("failed to parse pages json: {}", path.display()))
}

pub fn parse_json_pages(data: &str) -> Result<Vec<RawPage>> {
    let document: PagesDocument =
        serde_json::from_str(data).context("pages json has an unexpected shape")?;
    let entries = match document {
        PagesDocument::Wrapped { pages } => pages,
        PagesDocument::Bare(pages) => pages,
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| RawPage::new(entry.page_number.unwrap_or(index + 1), entry.text))
        .collect())
}
