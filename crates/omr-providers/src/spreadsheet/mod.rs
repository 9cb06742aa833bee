//! Result spreadsheet providers.

mod xlsx;

pub use xlsx::XlsxResultSheetWriter;
