use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "credit-prep",
    version,
    about = "Batch converters for company registry and trading partner documents"
)]
pub struct Cli {
    /// Debug logging, and unmatched lines kept in remittance output.
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Remittance(RemittanceArgs),
    RemittanceSummary(RemittanceSummaryArgs),
    RemDetail(RemDetailArgs),
    Statement(StatementArgs),
    Invoice(InvoiceArgs),
    PoCsv(PoCsvArgs),
    SaleReport(SaleReportArgs),
    Supplier(SupplierArgs),
    Profile(ProfileArgs),
    Post(PostArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RemittanceArgs {
    /// Remittance advice PDF, or a JSON file of pre-extracted pages.
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = OcrMode::Slow)]
    pub ocr_mode: OcrMode,

    #[arg(long, default_value = "processed_data")]
    pub out_dir: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OcrMode {
    Slow,
    Fast,
}

impl OcrMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Fast => "fast",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RemittanceSummaryArgs {
    /// Summary report PDF (or extracted .txt), folder or glob.
    pub input: PathBuf,

    #[arg(long, default_value = "processed_data")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RemDetailArgs {
    /// Remittance detail workbook named after its supplier code, folder or
    /// glob.
    pub input: PathBuf,

    #[arg(long, default_value = "*.xls*")]
    pub pattern: String,

    #[arg(long, default_value = "processed_data/rm")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct StatementArgs {
    /// Statement CSV/XLS(X) file, folder or glob.
    pub input: PathBuf,

    #[arg(long, value_enum)]
    pub kind: StatementKind,

    #[arg(long)]
    pub sheet: Option<String>,

    /// File pattern inside a folder; defaults to `*_<kind>.*`.
    #[arg(long)]
    pub pattern: Option<String>,

    #[arg(long, default_value = "processed_data")]
    pub out_dir: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatementKind {
    Balance,
    Income,
    Ratios,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Income => "income",
            Self::Ratios => "ratios",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InvoiceArgs {
    /// Invoice or PO table (CSV, XLS(X) or JSON), folder or glob.
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = InvoiceKind::Invoice)]
    pub kind: InvoiceKind,

    #[arg(long)]
    pub sheet: Option<String>,

    #[arg(long)]
    pub pattern: Option<String>,

    /// Keep only rows with a letters+digits document number and a numeric
    /// supplier code.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Repair O/0 and I/1 look-alikes in document numbers.
    #[arg(long, default_value_t = false)]
    pub fix_lookalikes: bool,

    /// Write the bare records array instead of `{mode, records}`.
    #[arg(long, default_value_t = false)]
    pub records_only: bool,

    #[arg(long)]
    pub sort_by: Option<String>,

    #[arg(long, default_value_t = false)]
    pub sort_desc: bool,

    /// Defaults to `processed_data/<kind>`.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum InvoiceKind {
    Invoice,
    Po,
}

impl InvoiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Po => "po",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PoCsvArgs {
    /// PO detail report CSV, folder or glob.
    pub input: PathBuf,

    #[arg(long, default_value = "*.csv")]
    pub pattern: String,

    #[arg(long, default_value = "processed_data/po")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SaleReportArgs {
    /// Saved OCR response (.json) or HTML, folder or glob.
    pub input: PathBuf,

    #[arg(long, value_enum)]
    pub kind: SaleReportKind,

    #[arg(long)]
    pub pattern: Option<String>,

    /// Defaults to `processed_data/sale_<kind>`.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SaleReportKind {
    Invoice,
    Supplier,
}

impl SaleReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "sale-invoice",
            Self::Supplier => "sale-supplier",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SupplierArgs {
    /// Supplier master workbook, folder or glob.
    pub input: PathBuf,

    #[arg(long, default_value = "*.xls*")]
    pub pattern: String,

    #[arg(long, default_value = "processed_data/supplier")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Registry profile PDF (or extracted .txt), folder or glob.
    pub input: PathBuf,

    #[arg(long)]
    pub pattern: Option<String>,

    #[arg(long, default_value = "tha+eng")]
    pub lang: String,

    #[arg(long, default_value_t = 300)]
    pub dpi: u32,

    /// OCR even when the PDF has a text layer.
    #[arg(long, default_value_t = false)]
    pub force_ocr: bool,

    #[arg(long, default_value_t = false, conflicts_with = "text_only")]
    pub structured_only: bool,

    #[arg(long, default_value_t = false)]
    pub text_only: bool,

    /// Defaults to the input's folder.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PostArgs {
    /// Structured JSON file, folder or glob.
    pub input: PathBuf,

    #[arg(long, default_value = "*_company_info_structured.json")]
    pub pattern: String,

    #[arg(
        long,
        default_value = "http://localhost:8000/api/public/dbd-company-supplier"
    )]
    pub api_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Extra `key=value` fields; existing keys are kept.
    #[arg(long, num_args = 1..)]
    pub extra: Vec<String>,

    /// Do not add `juristic_id` from the file name.
    #[arg(long, default_value_t = false)]
    pub no_auto_id: bool,
}
