//! Fixed vocabularies: Thai statement items, month names and the canonical
//! column labels of partner reports.

use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::{collapse_spaces, strip_invisible};

/// An ordered substring rule: every needle must occur in the item title.
pub type FallbackRule = (&'static [&'static str], &'static str);

pub struct ItemVocabulary {
    pub items: &'static [(&'static str, &'static str)],
    pub fallbacks: &'static [FallbackRule],
}

pub const UNKNOWN_ITEM: &str = "unknown";

pub static BALANCE_ITEMS: ItemVocabulary = ItemVocabulary {
    items: &[
        ("ลูกหนี้การค้าสุทธิ", "accounts_receivable_net"),
        ("ลูกหนี้การค้า", "accounts_receivable"),
        ("สินค้าคงเหลือ", "inventories"),
        ("สินทรัพย์หมุนเวียน", "current_assets"),
        ("ที่ดิน อาคารและอุปกรณ์", "property_plant_equipment"),
        ("สินทรัพย์ไม่หมุนเวียน", "non_current_assets"),
        ("สินทรัพย์รวม", "total_assets"),
        ("หนี้สินหมุนเวียน", "current_liabilities"),
        ("หนี้สินไม่หมุนเวียน", "non_current_liabilities"),
        ("หนี้สินรวม", "total_liabilities"),
        ("ส่วนของผู้ถือหุ้น", "shareholders_equity"),
        (
            "หนี้สินรวมและส่วนของผู้ถือหุ้น",
            "total_liabilities_and_shareholder_equity",
        ),
    ],
    fallbacks: &[
        (&["หนี้สินไม่หมุนเวียน"], "non_current_liabilities"),
        (&["ลูกหนี้การค้า"], "trade_receivables"),
        (&["สินค้าคงเหลือ"], "inventories"),
        (&["สินทรัพย์หมุนเวียน"], "current_assets"),
        (&["สินทรัพย์ไม่หมุนเวียน"], "non_current_assets"),
        (&["สินทรัพย์รวม"], "total_assets"),
        (&["หนี้สินหมุนเวียน"], "current_liabilities"),
        (&["หนี้สินรวมและส่วนของผู้ถือหุ้น"], "total_equity_and_liabilities"),
        (&["หนี้สินรวม"], "total_liabilities"),
        (&["ผู้ถือหุ้น"], "shareholders_equity"),
    ],
};

pub static INCOME_ITEMS: ItemVocabulary = ItemVocabulary {
    items: &[
        ("รายได้หลัก", "net_revenue"),
        ("รายได้รวม", "total_revenue"),
        ("ต้นทุนขาย", "cost_of_goods_sold"),
        ("ค่าใช้จ่ายในการขายและบริหาร", "operating_expenses"),
        ("รายจ่ายรวม", "total_expenses"),
        ("ดอกเบี้ยจ่าย", "interest_expenses"),
        ("ภาษีเงินได้", "income_tax_expenses"),
        ("กำไร(ขาดทุน) ขั้นต้น", "gross_profit"),
        ("กำไร(ขาดทุน) ก่อนภาษี", "income_before_tax"),
        ("กำไร(ขาดทุน) สุทธิ", "net_income"),
    ],
    fallbacks: &[
        (&["กำไร(ขาดทุน)", "ขั้นต้น"], "gross_profit"),
        (&["กำไร(ขาดทุน)", "ก่อนภาษี"], "profit_before_tax"),
        (&["กำไร(ขาดทุน)", "สุทธิ"], "net_profit"),
    ],
};

pub static RATIO_ITEMS: ItemVocabulary = ItemVocabulary {
    items: &[
        (
            "อัตราผลตอบแทนจากสินทรัพย์รวม(ROA) (%)",
            "return_on_assets_percent",
        ),
        (
            "อัตราผลตอบแทนจากส่วนของผู้ถือหุ้น(ROE) (%)",
            "return_on_equity_percent",
        ),
        (
            "ผลตอบแทนจากกำไรขั้นต้นต่อรายได้รวม (%)",
            "gross_profit_margin_percent",
        ),
        (
            "ผลตอบแทนจากกำไรการดำเนินงานต่อรายได้รวม (%)",
            "operating_profit_margin_percent",
        ),
        (
            "ผลตอบแทนจากกำไรสุทธิต่อรายได้รวม (%)",
            "net_profit_margin_percent",
        ),
        ("อัตราส่วนทุนหมุนเวียน(เท่า)", "current_ratio_times"),
        (
            "อัตราการหมุนเวียนของลูกหนี้ (เท่า)",
            "accounts_receivable_turnover_times",
        ),
        (
            "อัตราการหมุนเวียนของสินค้าคงเหลือ (เท่า)",
            "inventory_turnover_times",
        ),
        (
            "อัตราการหมุนเวียนของเจ้าหนี้ (เท่า)",
            "accounts_payable_turnover_times",
        ),
        (
            "อัตราการหมุนเวียนของสินทรัพย์รวม (เท่า)",
            "total_asset_turnover_times",
        ),
        (
            "อัตราค่าใช้จ่ายการดำเนินงานต่อรายได้รวม (%)",
            "operating_expense_ratio_percent",
        ),
        (
            "อัตราส่วนสินทรัพย์รวมต่อส่วนของผู้ถือหุ้น (เท่า)",
            "total_assets_to_shareholders_equity_ratio_times",
        ),
        (
            "อัตราส่วนหนี้สินรวมต่อสินทรัพย์รวม (เท่า)",
            "total_liabilities_to_total_assets_ratio_times",
        ),
        (
            "อัตราส่วนหนี้สินรวมต่อส่วนของผู้ถือหุ้น (เท่า)",
            "debt_to_equity_ratio_times",
        ),
        (
            "อัตราส่วนหนี้สินรวมต่อทุนดำเนินงาน (เท่า)",
            "debt_to_working_capital_ratio_times",
        ),
    ],
    fallbacks: &[
        (&["ROA"], "return_on_assets_roa_percent"),
        (&["ROE"], "return_on_equity_roe_percent"),
        (&["กำไรขั้นต้น"], "gross_profit_margin_percent"),
        (&["กำไรการดำเนินงาน"], "operating_profit_margin_percent"),
        (&["กำไรจากการดำเนินงาน"], "operating_profit_margin_percent"),
        (&["กำไรสุทธิ"], "net_profit_margin_percent"),
        (&["ทุนหมุนเวียน"], "current_ratio_times"),
        (&["ลูกหนี้"], "accounts_receivable_turnover_times"),
        (&["สินค้าคงเหลือ"], "inventory_turnover_times"),
        (&["เจ้าหนี้"], "accounts_payable_turnover_times"),
        (&["สินทรัพย์รวม", "หมุนเวียน"], "total_asset_turnover_times"),
        (
            &["ค่าใช้จ่ายการดำเนินงานต่อรายได้รวม"],
            "operating_expense_ratio_percent",
        ),
        (
            &["สินทรัพย์รวมต่อส่วนของผู้ถือหุ้น"],
            "total_assets_to_shareholders_equity_ratio_times",
        ),
        (
            &["หนี้สินรวมต่อสินทรัพย์รวม"],
            "total_liabilities_to_total_assets_ratio_times",
        ),
        (&["หนี้สินรวมต่อส่วนของผู้ถือหุ้น"], "debt_to_equity_ratio_times"),
        (
            &["หนี้สินรวมต่อทุนดำเนินงาน"],
            "debt_to_working_capital_ratio_times",
        ),
    ],
};

impl ItemVocabulary {
    /// Maps a Thai item title to its English key, or `"unknown"`.
    pub fn translate(&self, title: &str) -> &'static str {
        let canonical = canonical_title(title);
        if canonical.is_empty() || canonical.eq_ignore_ascii_case("nan") {
            return UNKNOWN_ITEM;
        }

        if let Some(english) = self.exact(&canonical) {
            return english;
        }

        let bare = strip_brackets(&canonical);
        if let Some((_, english)) = self
            .items
            .iter()
            .find(|(thai, _)| strip_brackets(&canonical_title(thai)) == bare)
        {
            return *english;
        }

        let upper = canonical.to_uppercase();
        self.fallbacks
            .iter()
            .find(|(needles, _)| needles.iter().all(|needle| upper.contains(needle)))
            .map(|(_, english)| *english)
            .unwrap_or(UNKNOWN_ITEM)
    }

    /// True when the title is an exact vocabulary entry after canonicalization.
    pub fn contains(&self, title: &str) -> bool {
        self.exact(&canonical_title(title)).is_some()
    }

    fn exact(&self, canonical: &str) -> Option<&'static str> {
        self.items
            .iter()
            .find(|(thai, _)| canonical_title(thai) == canonical)
            .map(|(_, english)| *english)
    }
}

fn open_bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(\s*").expect("invalid open bracket regex"))
}

fn close_bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\)\s*").expect("invalid close bracket regex"))
}

fn profit_loss_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"กำไร\s*ขาดทุน").expect("invalid profit loss regex"))
}

/// Canonical form of a statement item title: invisible characters removed,
/// full-width brackets folded, spaces around brackets dropped and
/// "กำไร ขาดทุน" spelled "กำไร(ขาดทุน)".
pub fn canonical_title(title: &str) -> String {
    let text = strip_invisible(title)
        .replace('\u{2060}', "")
        .replace('（', "(")
        .replace('）', ")");
    let text = profit_loss_re().replace_all(&text, "กำไร(ขาดทุน)");
    let text = open_bracket_re().replace_all(&text, "(");
    let text = close_bracket_re().replace_all(&text, ")");
    collapse_spaces(&text)
}

fn strip_brackets(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|ch| !matches!(ch, '(' | ')' | '[' | ']' | '{' | '}'))
        .collect();
    collapse_spaces(&stripped)
}

/// Thai month names (full and common OCR shortenings) to month numbers.
pub const THAI_MONTHS: &[(&str, u32)] = &[
    ("มกราคม", 1),
    ("กุมภาพันธ์", 2),
    ("มีนาคม", 3),
    ("เมษายน", 4),
    ("พฤษภาคม", 5),
    ("มิถุนายน", 6),
    ("กรกฎาคม", 7),
    ("สิงหาคม", 8),
    ("กันยายน", 9),
    ("ตุลาคม", 10),
    ("พฤศจิกายน", 11),
    ("ธันวาคม", 12),
    ("กุมภา", 2),
    ("มีค", 3),
    ("เมย", 4),
    ("มิย", 6),
    ("กค", 7),
    ("สค", 8),
    ("กย", 9),
    ("ตค", 10),
    ("พย", 11),
    ("ธค", 12),
];

pub fn thai_month_number(name: &str) -> Option<u32> {
    let name = name.trim().replace('.', "");
    THAI_MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, number)| *number)
}

/// Compacted header spelling to canonical invoice column label.
pub const INVOICE_HEADERS: &[(&str, &str)] = &[
    ("no", "No"),
    ("invoice#", "Invoice No."),
    ("invoiceno", "Invoice No."),
    ("invoicenumber", "Invoice No."),
    ("taxinvoiceno", "Invoice No."),
    ("suppliercode", "Supplier Code"),
    ("suppliername", "Supplier Name"),
    ("invoicedate", "Invoice Date"),
    ("invoicereceiveddate", "Invoice Received Date"),
    ("receiveddate", "Invoice Received Date"),
    ("relateddocument", "Related Document"),
    ("po", "Related Document"),
    ("amount", "Amount"),
    ("amountincvat", "Amount"),
    ("amountincludevat", "Amount"),
    ("status", "Status"),
];

/// Compacted header spelling to canonical purchase-order column label.
pub const PO_HEADERS: &[(&str, &str)] = &[
    ("no", "No"),
    ("pono", "PO No."),
    ("suppliercode", "Supplier Code"),
    ("suppliername", "Supplier Name"),
    ("orderdate", "Order Date"),
    ("senddate", "Send Date"),
    ("deliverydate", "Delivery Date"),
    ("amount", "Amount Include VAT"),
    ("amountincludevat", "Amount Include VAT"),
    ("amountpoincludevat", "Amount Include VAT"),
    ("status", "Status"),
];

/// Lowercases a header and drops spaces and `._-:()` before lookup.
pub fn compact_header(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(|ch| !ch.is_whitespace() && !matches!(ch, '.' | '_' | '-' | ':' | '(' | ')'))
        .collect()
}

pub fn canonical_header(map: &[(&str, &'static str)], header: &str) -> Option<&'static str> {
    let key = compact_header(header);
    map.iter()
        .find(|(spelling, _)| *spelling == key)
        .map(|(_, label)| *label)
}
