use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Range, Reader, Xls, Xlsx, open_workbook};
use chrono::NaiveTime;

use crate::layout::Grid;
use crate::util::file_stem_string;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Csv,
}

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Detects the real spreadsheet format from magic bytes, falling back to the
/// file extension. Registry downloads often carry the wrong extension.
pub fn sniff_format(path: &Path) -> Result<SheetFormat> {
    let mut head = [0_u8; 4];
    let mut file = File::open(path)
        .with_context(|| format!("failed to open spreadsheet: {}", path.display()))?;
    let count = file
        .read(&mut head)
        .with_context(|| format!("failed to read spreadsheet header: {}", path.display()))?;

    if count == head.len() {
        if head == ZIP_MAGIC {
            return Ok(SheetFormat::Xlsx);
        }
        if head == OLE_MAGIC {
            return Ok(SheetFormat::Xls);
        }
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" => Ok(SheetFormat::Xlsx),
        "xls" => Ok(SheetFormat::Xls),
        "csv" | "txt" => Ok(SheetFormat::Csv),
        other => bail!("unsupported spreadsheet extension {other:?}: {}", path.display()),
    }
}

/// Reads a CSV, XLS or XLSX file into a string grid. `sheet` picks a
/// worksheet by name; the first sheet is used otherwise.
pub fn read_grid(path: &Path, sheet: Option<&str>) -> Result<Grid> {
    match sniff_format(path)? {
        SheetFormat::Csv => read_csv_file(path),
        SheetFormat::Xlsx => read_sheet(open_xlsx(path)?, path, sheet),
        SheetFormat::Xls => read_sheet(open_xls(path)?, path, sheet),
    }
}

/// Reads every worksheet in workbook order. A CSV file is a single sheet
/// named after the file.
pub fn read_sheets(path: &Path) -> Result<Vec<(String, Grid)>> {
    match sniff_format(path)? {
        SheetFormat::Csv => Ok(vec![(file_stem_string(path), read_csv_file(path)?)]),
        SheetFormat::Xlsx => read_all_sheets(open_xlsx(path)?),
        SheetFormat::Xls => read_all_sheets(open_xls(path)?),
    }
}

fn read_csv_file(path: &Path) -> Result<Grid> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read csv: {}", path.display()))?;
    parse_csv(&bytes).with_context(|| format!("failed to parse csv: {}", path.display()))
}

fn open_xlsx(path: &Path) -> Result<Xlsx<BufReader<File>>> {
    open_workbook(path)
        .map_err(|err| anyhow!("failed to open xlsx workbook: {}: {err}", path.display()))
}

fn open_xls(path: &Path) -> Result<Xls<BufReader<File>>> {
    open_workbook(path)
        .map_err(|err| anyhow!("failed to open xls workbook: {}: {err}", path.display()))
}

/// Parses CSV bytes without treating any row as a header. Rows may have
/// different lengths.
pub fn parse_csv(bytes: &[u8]) -> Result<Grid> {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    let text = String::from_utf8_lossy(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut grid = Grid::new();
    for record in reader.records() {
        let record = record.context("malformed csv record")?;
        grid.push(record.iter().map(|value| value.trim().to_string()).collect());
    }
    Ok(grid)
}

fn read_sheet<R>(mut workbook: R, path: &Path, sheet: Option<&str>) -> Result<Grid>
where
    R: Reader<BufReader<File>>,
    R::Error: std::fmt::Display,
{
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("workbook has no sheets: {}", path.display()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| anyhow!("failed to read sheet {sheet_name:?}: {err}"))?;
    Ok(range_grid(&range))
}

fn read_all_sheets<R>(mut workbook: R) -> Result<Vec<(String, Grid)>>
where
    R: Reader<BufReader<File>>,
    R::Error: std::fmt::Display,
{
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|err| anyhow!("failed to read sheet {name:?}: {err}"))?;
        sheets.push((name, range_grid(&range)));
    }
    Ok(sheets)
}

fn range_grid(range: &Range<Data>) -> Grid {
    range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

/// Renders a cell as trimmed text. Date cells become `YYYY-MM-DD`, with the
/// time appended only when it is not midnight.
pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::DateTime(value) if value.is_datetime() => match value.as_datetime() {
            Some(moment) if moment.time() == NaiveTime::MIN => {
                moment.format("%Y-%m-%d").to_string()
            }
            Some(moment) => moment.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => value.as_f64().to_string(),
        },
        Data::DateTimeIso(value) => value.trim().trim_end_matches("T00:00:00").to_string(),
        other => other.to_string().trim().to_string(),
    }
}
