pub mod amount;
pub mod date;
pub mod lookalike;
pub mod text;


pub use amount::{AmountError, format_amount, parse_amount, parse_amount_opt, round_to};
pub use date::{
    DateError, DateOrder, excel_serial_date, find_date, gregorian_year, parse_date,
    parse_date_with_order, parse_datetime, parse_sheet_date, parse_year_cell,
};
pub use lookalike::{fix_o0_i1, normalize_docref_token, repair_numeric_tail};
pub use text::{
    collapse_inline_spaces, collapse_spaces, cut_at_boundaries, has_boundary, strip_invisible,
};
