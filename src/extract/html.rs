use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};

use crate::layout::Grid;
use crate::normalize::collapse_spaces;

fn table_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("table").expect("invalid table selector"))
}

fn tr_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("tr").expect("invalid tr selector"))
}

/// Every `<table>` in the document as a grid of trimmed cell texts, rows in
/// document order. `th` and `td` cells are treated alike.
pub fn parse_tables(html: &str) -> Vec<Grid> {
    let document = Html::parse_document(html);
    document
        .select(table_selector())
        .map(|table| {
            table
                .select(tr_selector())
                .filter(|tr| closest_table(*tr).is_some_and(|owner| owner == table))
                .map(|tr| {
                    tr.children()
                        .filter_map(ElementRef::wrap)
                        .filter(|cell| {
                            let name = cell.value().name();
                            name.eq_ignore_ascii_case("td") || name.eq_ignore_ascii_case("th")
                        })
                        .map(|cell| collapse_spaces(&cell.text().collect::<Vec<_>>().join(" ")))
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Text of the document outside any table, one entry per non-empty line.
pub fn text_outside_tables(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let excluded = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().is_some_and(|element| {
                matches!(element.name(), "table" | "script" | "style")
            })
        });
        if excluded {
            continue;
        }
        for line in text.lines() {
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
    }

    lines
}

fn closest_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "table")
}
