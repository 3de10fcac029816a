pub mod invoice;
pub mod po_csv;
pub mod post;
pub mod profile;
pub mod rem_detail;
pub mod remittance;
pub mod remittance_summary;
pub mod sale_report;
pub mod statement;
pub mod supplier;
