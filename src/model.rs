use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extract::pdf::RawPage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub date: String,
    pub doc_date: Option<String>,
    pub pay_date: Option<String>,
    pub vendor_code: Option<String>,
    pub branch_code: String,
    pub doc_type: String,
    pub doc_no: String,
    pub ref_no: String,
    pub amount: Option<f64>,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrandTotal {
    pub grand_total_amount: f64,
    pub page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemittanceDocument {
    pub file: String,
    pub grand_totals: Vec<GrandTotal>,
    pub transactions: Vec<TransactionRecord>,
    #[serde(rename = "_unmatched", skip_serializing_if = "Option::is_none")]
    pub unmatched: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemittanceSummaryRecord {
    pub supplier_code: String,
    pub remittance_no: String,
    pub supplier_name: String,
    pub branch: String,
    pub sent_date: Option<String>,
    pub remittance_date: Option<String>,
    pub amount: Option<f64>,
    pub status: String,
    pub sequence: u32,
    pub pay_date: Option<String>,
    pub source_pdf: String,
}

/// A remittance detail workbook: every sheet's rows keyed by its header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemittanceDetailDocument {
    pub file_name: String,
    pub supplier_code: String,
    pub sheets: Vec<RemittanceDetailSheet>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemittanceDetailSheet {
    pub sheet_name: String,
    pub rows: Vec<Map<String, Value>>,
}

/// One purchase order from a PO detail CSV report. Every key is written,
/// null when the source cell is empty or unparseable.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PurchaseOrderRecord {
    #[serde(rename = "PO No.")]
    pub po_no: Option<String>,
    #[serde(rename = "Buyer Code")]
    pub buyer_code: Option<String>,
    #[serde(rename = "Buyer Name")]
    pub buyer_name: Option<String>,
    #[serde(rename = "Supplier Code")]
    pub supplier_code: Option<String>,
    #[serde(rename = "Supplier Name")]
    pub supplier_name: Option<String>,
    #[serde(rename = "Order Date")]
    pub order_date: Option<String>,
    #[serde(rename = "Send Date")]
    pub send_date: Option<String>,
    #[serde(rename = "Delivery Date")]
    pub delivery_date: Option<String>,
    #[serde(rename = "PO Received From Date")]
    pub received_from_date: Option<String>,
    #[serde(rename = "PO Received To Date")]
    pub received_to_date: Option<String>,
    #[serde(rename = "Amount (PO Include VAT)")]
    pub amount: Option<f64>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementItem {
    pub item: String,
    pub item_en: String,
    pub amount: f64,
    pub pct_change: Option<f64>,
    pub tax_id: String,
}

/// Statement rows grouped by Gregorian year.
pub type YearBuckets = BTreeMap<String, Vec<StatementItem>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessSection {
    pub code: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Director {
    pub no: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PrintedAt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// Structured company profile. Absent values are left out of the output.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompanyProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorporation_date_th: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_capital_baht: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_section_at_registration: Option<BusinessSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_at_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_section_latest: Option<BusinessSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_latest: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub financial_filing_years_th: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directors: Vec<Director>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printed_at: Option<PrintedAt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_card: Option<serde_json::Value>,
}

/// Registry title card saved beside a profile PDF.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyTitleCard {
    #[serde(default)]
    pub registered_date: Option<String>,
    #[serde(default)]
    pub head_office_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageDump {
    pub source_file: String,
    pub file_size_bytes: u64,
    pub file_sha256: String,
    pub created_at: String,
    pub engine: String,
    pub num_pages: usize,
    pub pages: Vec<RawPage>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SaleReportMetadata {
    pub topic: Option<String>,
    pub start_round_date: Option<String>,
    pub end_round_date: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_num: Option<String>,
}
