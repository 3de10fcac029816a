//! Company registry profile PDFs: a page dump plus a structured profile.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cli::ProfileArgs;
use crate::extract::pdf::{
    OcrPass, OcrSettings, RawPage, extract_text_layer, ocr_pages, text_layer_is_empty,
};
use crate::model::{CompanyProfile, CompanyTitleCard, PageDump};
use crate::util::{
    discover_inputs, file_stem_string, has_extension, now_utc_string, read_text_lossy, run_batch,
    sha256_file, write_json_pretty,
};

pub mod parse;

#[cfg(test)]
mod tests;

pub use parse::{ProfileParser, clean_text};

const OCR_PSM: u8 = 3;

/// Where the page text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEngine {
    Pdftotext,
    Tesseract,
    PlainText,
}

impl TextEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdftotext => "pdftotext",
            Self::Tesseract => "tesseract-ocr",
            Self::PlainText => "text",
        }
    }
}

pub fn run(args: ProfileArgs) -> Result<()> {
    let pattern = args.pattern.clone().unwrap_or_else(|| "*.pdf".to_string());
    let inputs = discover_inputs(&args.input, &pattern)?;
    let parser = ProfileParser::new()?;

    run_batch("profile", &inputs, |path| convert_file(path, &args, &parser))?;
    Ok(())
}

fn convert_file(path: &Path, args: &ProfileArgs, parser: &ProfileParser) -> Result<()> {
    let (engine, texts) = extract_profile_text(path, args)?;
    let pages: Vec<RawPage> = texts
        .iter()
        .enumerate()
        .map(|(index, text)| RawPage::new(index + 1, clean_text(text)))
        .collect();
    info!(
        path = %path.display(),
        engine = engine.as_str(),
        pages = pages.len(),
        "extracted profile text"
    );

    let input_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let out_dir = args.out_dir.clone().unwrap_or_else(|| input_dir.clone());
    let stem = file_stem_string(path);

    if !args.structured_only {
        let dump = page_dump(path, engine, pages.clone())?;
        let dump_path = out_dir.join(format!("{stem}.json"));
        write_json_pretty(&dump_path, &dump)?;
        info!(path = %dump_path.display(), "wrote page dump");
    }

    if !args.text_only {
        let mut profile = parser.parse(&pages);
        merge_title_card(&mut profile, &input_dir, &stem);

        let structured_path = out_dir.join(format!("{stem}_structured.json"));
        write_json_pretty(&structured_path, &profile)?;
        info!(
            path = %structured_path.display(),
            registration_number = profile.registration_number.as_deref().unwrap_or(""),
            directors = profile.directors.len(),
            "wrote structured profile"
        );
    }

    Ok(())
}

/// Page texts of a profile: the PDF text layer, OCR when the layer is empty
/// or OCR is forced, or a plain text file split on form feeds.
pub fn extract_profile_text(path: &Path, args: &ProfileArgs) -> Result<(TextEngine, Vec<String>)> {
    if has_extension(path, "txt") {
        let text = read_text_lossy(path)?;
        let pages = text.split('\u{000C}').map(str::to_string).collect();
        return Ok((TextEngine::PlainText, pages));
    }
    if !has_extension(path, "pdf") {
        bail!("unsupported profile input: {}", path.display());
    }

    if !args.force_ocr {
        match extract_text_layer(path, false) {
            Ok(pages) if !text_layer_is_empty(&pages) => {
                return Ok((TextEngine::Pdftotext, pages));
            }
            Ok(_) => debug!(path = %path.display(), "text layer is empty"),
            Err(err) => warn!(
                path = %path.display(),
                error = %err,
                "text layer extraction failed"
            ),
        }
    }

    let settings = OcrSettings {
        lang: args.lang.clone(),
        dpi: args.dpi,
        passes: vec![OcrPass {
            psm: OCR_PSM,
            monochrome: false,
        }],
    };
    let pages = ocr_pages(path, &settings)?;
    Ok((TextEngine::Tesseract, pages))
}

fn page_dump(path: &Path, engine: TextEngine, pages: Vec<RawPage>) -> Result<PageDump> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to stat input: {}", path.display()))?;
    let source = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    Ok(PageDump {
        source_file: source.display().to_string(),
        file_size_bytes: metadata.len(),
        file_sha256: sha256_file(path)?,
        created_at: now_utc_string(),
        engine: engine.as_str().to_string(),
        num_pages: pages.len(),
        pages,
    })
}

/// Path of the registry title card saved for a profile. The juristic id is
/// the registration number, or the file stem up to the first `_`.
pub fn title_card_path(profile: &CompanyProfile, dir: &Path, stem: &str) -> PathBuf {
    let juristic_id = profile
        .registration_number
        .clone()
        .unwrap_or_else(|| stem.split('_').next().unwrap_or(stem).to_string());
    dir.join(format!("{juristic_id}_company_title.json"))
}

/// Attaches the title card when one exists, filling the registered date and
/// an empty address from it. An unreadable card is logged and skipped.
pub fn merge_title_card(profile: &mut CompanyProfile, dir: &Path, stem: &str) {
    let path = title_card_path(profile, dir, stem);
    if !path.is_file() {
        return;
    }

    let card = match read_title_card(&path) {
        Ok(card) => card,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "skipping unreadable title card");
            return;
        }
    };

    let fields: CompanyTitleCard = serde_json::from_value(card.clone()).unwrap_or_default();
    if profile.registered_date.is_none() {
        profile.registered_date = fields.registered_date.filter(|date| !date.is_empty());
    }
    if profile.address.as_deref().is_none_or(str::is_empty)
        && let Some(address) = fields.head_office_address.filter(|text| !text.is_empty())
    {
        profile.address = Some(address);
    }
    profile.title_card = Some(card);
    debug!(path = %path.display(), "merged title card");
}

fn read_title_card(path: &Path) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read title card: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse title card: {}", path.display()))
}
