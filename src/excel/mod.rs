//! Workbook model and xlsx codec.
//!
//! `package` handles the zip container, `workbook` the part registry and
//! save orchestration, `sheet` the in-memory worksheet model, `style` the
//! resolved style table, and `writer` the worksheet serialization.

pub mod addr;
pub mod package;
pub mod sheet;
pub mod style;
pub mod workbook;

mod writer;
mod xml;

pub use addr::{CellRange, CellRef};
pub use sheet::{Cell, CellValue, Worksheet};
pub use workbook::Workbook;
