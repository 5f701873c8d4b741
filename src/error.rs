use std::path::PathBuf;
use thiserror::Error;

pub type FormpressResult<T> = Result<T, FormpressError>;

#[derive(Error, Debug)]
pub enum FormpressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbook archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("workbook XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("workbook XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("record data must be a JSON array: {0}")]
    Shape(String),

    #[error("worksheet '{0}' not found in workbook")]
    MissingSheet(String),

    #[error("workbook part missing: {0}")]
    MissingPart(String),

    #[error("invalid cell reference: {0}")]
    CellRef(String),

    #[error("merge range {0} overlaps existing range {1}")]
    MergeConflict(String, String),

    #[error("worksheet '{0}' already exists")]
    DuplicateSheet(String),

    #[error("no records to process")]
    NoRecords,

    #[error("record index {0} out of range ({1} records)")]
    IndexOutOfRange(usize, usize),
}
