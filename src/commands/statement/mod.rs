//! Registry financial statements (balance sheet, income statement, ratios)
//! from spreadsheet grids to per-year item lists.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{StatementArgs, StatementKind};
use crate::extract::grid::read_grid;
use crate::layout::{Grid, cell, find_year_header_row, select_item_column, year_columns};
use crate::model::{StatementItem, YearBuckets};
use crate::normalize::{collapse_spaces, parse_amount, strip_invisible};
use crate::util::{
    discover_inputs, file_name_string, file_stem_string, run_batch, tax_id_from_name,
    write_json_pretty,
};
use crate::vocab::{BALANCE_ITEMS, INCOME_ITEMS, ItemVocabulary, RATIO_ITEMS};


const NOISE_LABELS: [&str; 4] = ["nan", "หน่วย : บาท", "%เปลี่ยนแปลง", "จำนวนเงิน"];
const NOISE_PREFIXES: [&str; 2] = ["หน่วย", "หมายเหตุ"];

/// How a kind treats cells that are empty or not numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmptyCellPolicy {
    ZeroFill,
    Skip,
}

impl StatementKind {
    pub fn vocabulary(self) -> &'static ItemVocabulary {
        match self {
            Self::Balance => &BALANCE_ITEMS,
            Self::Income => &INCOME_ITEMS,
            Self::Ratios => &RATIO_ITEMS,
        }
    }

    fn empty_cell_policy(self) -> EmptyCellPolicy {
        match self {
            Self::Balance => EmptyCellPolicy::ZeroFill,
            Self::Income | Self::Ratios => EmptyCellPolicy::Skip,
        }
    }
}

pub fn run(args: StatementArgs) -> Result<()> {
    let pattern = args
        .pattern
        .clone()
        .unwrap_or_else(|| format!("*_{}.*", args.kind.as_str()));
    let inputs = discover_inputs(&args.input, &pattern)?;

    run_batch("statement", &inputs, |path| convert_file(path, &args))?;
    Ok(())
}

fn convert_file(path: &Path, args: &StatementArgs) -> Result<()> {
    let grid = read_grid(path, args.sheet.as_deref())?;
    let tax_id = tax_id_from_name(&file_name_string(path));

    let buckets = statement_to_buckets(&grid, args.kind, &tax_id)
        .with_context(|| format!("failed to read statement table: {}", path.display()))?;

    let file_key = if tax_id.is_empty() {
        file_stem_string(path)
    } else {
        tax_id.clone()
    };
    let out_path = args
        .out_dir
        .join(format!("{file_key}_{}.json", args.kind.as_str()));
    write_json_pretty(&out_path, &buckets)?;

    info!(
        path = %out_path.display(),
        kind = args.kind.as_str(),
        tax_id = %tax_id,
        years = buckets.len(),
        items = buckets.values().map(Vec::len).sum::<usize>(),
        "wrote statement json"
    );
    Ok(())
}

pub fn is_noise_label(label: &str) -> bool {
    label.is_empty()
        || NOISE_LABELS.contains(&label)
        || NOISE_PREFIXES
            .iter()
            .any(|prefix| label.starts_with(prefix))
}

fn normalize_label(raw: &str) -> String {
    collapse_spaces(&strip_invisible(raw))
}

/// Converts a statement grid into year buckets, keeping source row order.
pub fn statement_to_buckets(grid: &Grid, kind: StatementKind, tax_id: &str) -> Result<YearBuckets> {
    let header_index = find_year_header_row(grid)?;
    let header = &grid[header_index];
    let years = year_columns(header);

    let value_columns: HashSet<usize> = years
        .iter()
        .flat_map(|column| std::iter::once(column.index).chain(column.pct_index))
        .collect();
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let candidates: Vec<usize> = (0..width)
        .filter(|index| !value_columns.contains(index))
        .collect();

    let vocabulary = kind.vocabulary();
    let body_start = header_index + 1;
    let item_column = select_item_column(grid, body_start, &candidates, |text| {
        vocabulary.contains(text)
    })?;
    debug!(
        header_row = header_index,
        item_column,
        years = years.len(),
        "statement layout"
    );

    let policy = kind.empty_cell_policy();
    let mut buckets: YearBuckets = years
        .iter()
        .map(|column| (column.year.to_string(), Vec::new()))
        .collect();
    let mut carried_label = String::new();

    for row in grid.iter().skip(body_start) {
        let raw_label = normalize_label(cell(row, item_column));
        if !raw_label.is_empty() {
            carried_label = raw_label;
        }
        let label = carried_label.as_str();
        if is_noise_label(label) {
            continue;
        }

        let has_any_value = years.iter().any(|column| {
            !cell(row, column.index).is_empty()
                || column
                    .pct_index
                    .is_some_and(|pct| !cell(row, pct).is_empty())
        });
        if !has_any_value {
            continue;
        }

        let item_en = vocabulary.translate(label);
        for column in &years {
            let amount = parse_amount(cell(row, column.index)).ok();
            let (amount, pct_change) = match policy {
                EmptyCellPolicy::ZeroFill => {
                    let pct = column
                        .pct_index
                        .and_then(|pct| parse_amount(cell(row, pct)).ok())
                        .unwrap_or(0.0);
                    (amount.unwrap_or(0.0), Some(pct))
                }
                EmptyCellPolicy::Skip => match amount {
                    Some(amount) => (amount, None),
                    None => continue,
                },
            };

            if let Some(bucket) = buckets.get_mut(&column.year.to_string()) {
                bucket.push(StatementItem {
                    item: label.to_string(),
                    item_en: item_en.to_string(),
                    amount,
                    pct_change,
                    tax_id: tax_id.to_string(),
                });
            }
        }
    }

    Ok(buckets)
}
