use crate::error::{FormpressError, FormpressResult};
use crate::types::Record;
use serde_json::Value;
use std::io;
use std::path::Path;

/// First classroom code handed out.
pub const CLASSCODE_BASE: u32 = 18;

/// Records per classroom; the code steps up after each full block.
pub const CLASSCODE_BLOCK: usize = 20;

/// Classroom code for the record at `index` in the full input sequence.
pub fn classcode(index: usize) -> u32 {
    CLASSCODE_BASE + (index / CLASSCODE_BLOCK) as u32
}

/// Stamp every record with its positional classroom code.
///
/// Positions are taken from the slice as given, so this must run on the full
/// loaded sequence before any slicing.
pub fn assign_classcodes(records: &mut [Record]) {
    for (index, record) in records.iter_mut().enumerate() {
        record.set_classcode(classcode(index));
    }
}

/// Load the roster from a JSON file.
///
/// The top-level value must be an array of objects. Records come back in
/// input order with `classcode` already assigned.
pub fn load_records(path: &Path) -> FormpressResult<Vec<Record>> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FormpressError::NotFound(path.to_path_buf()),
        _ => FormpressError::Io(e),
    })?;
    let parsed: Value = serde_json::from_str(&content)?;

    let items = match parsed {
        Value::Array(items) => items,
        other => return Err(FormpressError::Shape(format!("got {}", kind_of(&other)))),
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(fields) => records.push(Record::new(fields)),
            other => {
                return Err(FormpressError::Shape(format!(
                    "element {} is {}, expected an object",
                    index,
                    kind_of(&other)
                )))
            }
        }
    }

    assign_classcodes(&mut records);
    Ok(records)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
