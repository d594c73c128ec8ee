pub mod snapshot;
pub mod workbook;

pub use snapshot::{decode, encode, from_workbook, to_workbook};
pub use snapshot::{ARCHIVED_SHEET, CATEGORIES_SHEET, TASKS_SHEET};
pub use workbook::{Cell, CodecError, Record, Sheet, Workbook};
