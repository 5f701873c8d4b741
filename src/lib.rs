//! Formpress - roster-to-Excel form press
//!
//! This library reads a JSON array of student records, derives a classroom
//! code per record, and presses the values into pre-styled xlsx templates:
//! either filling fixed cells of a single-entry template, or cloning a form
//! worksheet once per record with merges, styles, and page layout intact.
//!
//! # Example
//!
//! ```no_run
//! use formpress::core::TemplateFiller;
//! use formpress::records::load_records;
//! use std::path::Path;
//!
//! let records = load_records(Path::new("data2.json"))?;
//!
//! let filler = TemplateFiller::new().with_template("template3.xlsx");
//! let path = filler.fill(&records[0], Path::new("out"), "filled.xlsx")?;
//!
//! println!("written: {}", path.display());
//! # Ok::<(), formpress::error::FormpressError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod records;
pub mod types;

// Re-export commonly used types
pub use error::{FormpressError, FormpressResult};
pub use types::Record;
