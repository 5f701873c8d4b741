//! Template Filler: single-record variant.
//!
//! Opens the single-entry template, writes six record fields into fixed
//! cell addresses of the data sheet (resolving merge masters), and saves a
//! new workbook.

use crate::error::FormpressResult;
use crate::excel::{CellRef, Workbook};
use crate::types::Record;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Target addresses on the data sheet and the record field each receives.
const TARGETS: [(&str, &str); 6] = [
    ("C3", "name"),
    ("C4", "year"),
    ("C5", "school"),
    ("C6", "address"),
    ("C7", "address2"),
    ("C8", "name2"),
];

pub struct TemplateFiller {
    template: PathBuf,
    sheet: String,
}

impl TemplateFiller {
    pub const DEFAULT_TEMPLATE: &'static str = "template3.xlsx";
    pub const DEFAULT_SHEET: &'static str = "data";

    pub fn new() -> Self {
        Self {
            template: PathBuf::from(Self::DEFAULT_TEMPLATE),
            sheet: Self::DEFAULT_SHEET.to_string(),
        }
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = sheet.into();
        self
    }

    /// Fill the template from one record and persist to
    /// `<out_dir>/<out_file>`, creating the directory as needed. Returns
    /// the resolved output path.
    pub fn fill(
        &self,
        record: &Record,
        out_dir: &Path,
        out_file: &str,
    ) -> FormpressResult<PathBuf> {
        let mut workbook = Workbook::open(&self.template)?;
        let mut sheet = workbook.worksheet(&self.sheet)?;

        for (addr, field) in TARGETS {
            let at = CellRef::parse(addr)?;
            sheet.set_text(at, &record.text(field));
            debug!(cell = addr, field, "filled");
        }

        workbook.replace_sheet(sheet)?;
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join(out_file);
        workbook.save(&path)?;
        Ok(path)
    }
}

impl Default for TemplateFiller {
    fn default() -> Self {
        Self::new()
    }
}
