//! Sheet Cloner: batch variant.
//!
//! For every input record, replicates the form worksheet (columns, rows,
//! master cells with deep-copied styles, merged ranges, page layout,
//! headers/footers) under a per-index name, then overwrites the
//! record-specific cells. The whole batch lands in one output workbook.

use crate::error::FormpressResult;
use crate::excel::{CellRange, CellRef, Workbook, Worksheet};
use crate::types::Record;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Record-specific overwrites on each clone. The year cell falls back to
/// the name when the record has no year.
const TARGETS: [(&str, &str); 5] = [
    ("C6", "name"),
    ("C7", "year"),
    ("C8", "school"),
    ("C9", "address"),
    ("C10", "address2"),
];

/// Cell carrying the derived classroom label.
const CLASSCODE_CELL: &str = "F6";

/// A merge range the cloner could not re-apply; the clone itself still
/// completes.
#[derive(Debug, Clone)]
pub struct SkippedMerge {
    pub sheet: String,
    pub range: CellRange,
    pub reason: String,
}

/// Outcome of a batch clone.
#[derive(Debug)]
pub struct CloneReport {
    /// Resolved output path.
    pub path: PathBuf,
    /// Created sheet names, in record order.
    pub sheets: Vec<String>,
    /// Per-range skip diagnostics across all clones.
    pub skipped: Vec<SkippedMerge>,
}

pub struct SheetCloner {
    template: PathBuf,
    sheet: String,
}

impl SheetCloner {
    pub const DEFAULT_TEMPLATE: &'static str = "template-all.xlsx";
    pub const DEFAULT_SHEET: &'static str = "form";

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

    /// Clone the form sheet once per record and persist the assembled
    /// workbook to `<out_dir>/<out_file>`.
    pub fn clone_all(
        &self,
        records: &[Record],
        out_dir: &Path,
        out_file: &str,
    ) -> FormpressResult<CloneReport> {
        let mut workbook = Workbook::open(&self.template)?;
        let source = workbook.worksheet(&self.sheet)?;
        let merges: Vec<CellRange> = source.merges().to_vec();

        let mut sheets = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for (i, record) in records.iter().enumerate() {
            let name = format!("STT-{i}");
            // Clone creation is idempotent per index: a sheet left over from
            // a prior run merged into the same file is replaced.
            if workbook.remove_sheet(&name) {
                debug!(sheet = %name, "replacing existing clone");
            }

            let mut clone = replicate(&source, &name);

            for range in &merges {
                if let Err(err) = clone.merge(*range) {
                    warn!(sheet = %name, range = %range, %err, "skipping merge range");
                    skipped.push(SkippedMerge {
                        sheet: name.clone(),
                        range: *range,
                        reason: err.to_string(),
                    });
                }
            }

            overwrite(&mut clone, record)?;

            // Re-apply after the overwrites; merging an already-applied
            // range is a no-op.
            for range in &merges {
                if let Err(err) = clone.merge(*range) {
                    debug!(sheet = %name, range = %range, %err, "second merge pass");
                }
            }

            workbook.add_sheet(clone)?;
            sheets.push(name);
        }

        fs::create_dir_all(out_dir)?;
        let path = out_dir.join(out_file);
        workbook.save(&path)?;
        Ok(CloneReport {
            path,
            sheets,
            skipped,
        })
    }
}

impl Default for SheetCloner {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a copy of the source sheet under a new name: layout metadata,
/// column definitions, every row (including empty ones, preserving row
/// numbering), and only merge-master cells; member cells are reconstructed
/// when the ranges are re-applied. Cell values and style bundles are owned
/// deep copies.
fn replicate(source: &Worksheet, name: &str) -> Worksheet {
    let mut clone = Worksheet::new(name);
    clone.props = source.props.clone();
    clone.view = source.view.clone();
    clone.format = source.format.clone();
    clone.cols = source.cols.clone();
    for (row, info) in &source.rows {
        clone.rows.insert(*row, info.clone());
    }
    for (at, cell) in &source.cells {
        if source.master_of(*at) == *at {
            clone.cells.insert(*at, cell.clone());
        }
    }
    clone.margins = source.margins.clone();
    clone.page_setup = source.page_setup.clone();
    clone.header_footer = source.header_footer.clone();
    clone
}

fn overwrite(sheet: &mut Worksheet, record: &Record) -> FormpressResult<()> {
    for (addr, field) in TARGETS {
        let at = CellRef::parse(addr)?;
        let mut value = record.text(field);
        if field == "year" && value.is_empty() {
            value = record.text("name");
        }
        sheet.set_text(at, &value);
    }
    let label = format!("Mã lớp: {}", record.text("classcode"));
    sheet.set_text(CellRef::parse(CLASSCODE_CELL)?, &label);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::sheet::{Cell, CellValue};
    use crate::excel::style::CellStyle;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => Record::new(map),
            _ => panic!("test record must be an object"),
        }
    }

    fn at(a1: &str) -> CellRef {
        CellRef::parse(a1).unwrap()
    }

    fn source_sheet() -> Worksheet {
        let mut ws = Worksheet::new("form");
        ws.cells.insert(
            at("A1"),
            Cell {
                value: CellValue::Text("PHIẾU".into()),
                xf_id: Some(1),
                style: Some(CellStyle::default()),
            },
        );
        ws.cells.insert(
            at("B1"),
            Cell {
                value: CellValue::Text("member".into()),
                xf_id: None,
                style: None,
            },
        );
        ws.merge(CellRange::parse("A1:C1").unwrap()).unwrap();
        ws.rows.insert(4, Default::default());
        ws
    }

    #[test]
    fn test_replicate_copies_masters_only() {
        let source = source_sheet();
        let clone = replicate(&source, "STT-0");
        assert_eq!(clone.name, "STT-0");
        assert!(clone.cells.contains_key(&at("A1")));
        assert!(
            !clone.cells.contains_key(&at("B1")),
            "merge members are not copied"
        );
        assert!(clone.rows.contains_key(&4));
        assert!(clone.merges().is_empty(), "merges are re-applied separately");
    }

    #[test]
    fn test_replicate_deep_copies_styles() {
        let source = source_sheet();
        let mut clone = replicate(&source, "STT-0");
        clone
            .cells
            .get_mut(&at("A1"))
            .unwrap()
            .style
            .as_mut()
            .unwrap()
            .font
            .bold = true;
        assert!(
            !source.cells[&at("A1")].style.as_ref().unwrap().font.bold,
            "mutating a clone's style must not affect the source"
        );
    }

    #[test]
    fn test_overwrite_year_falls_back_to_name() {
        let mut ws = Worksheet::new("STT-0");
        overwrite(&mut ws, &record(json!({"name": "An", "classcode": 18}))).unwrap();
        assert_eq!(ws.value(at("C6")), CellValue::Text("An".into()));
        assert_eq!(ws.value(at("C7")), CellValue::Text("An".into()));
        assert_eq!(ws.value(at("F6")), CellValue::Text("Mã lớp: 18".into()));
    }

    #[test]
    fn test_overwrite_resolves_merge_master() {
        let mut ws = Worksheet::new("STT-0");
        ws.merge(CellRange::parse("C6:E6").unwrap()).unwrap();
        overwrite(&mut ws, &record(json!({"name": "B"}))).unwrap();
        assert_eq!(ws.value(at("E6")), CellValue::Text("B".into()));
        assert!(!ws.cells.contains_key(&at("E6")));
    }
}
