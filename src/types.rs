use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One roster entry as loaded from the JSON input array.
///
/// Fields are free-form (`name`, `year`, `school`, `address`, `address2`,
/// `name2`, `code`, ...) and kept as raw JSON so unknown fields survive
/// untouched. The loader appends a numeric `classcode` after reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Text form of a field for cell writing.
    ///
    /// Absent and `null` map to the empty string; strings pass through
    /// verbatim; numbers, booleans, and nested values use their JSON text.
    pub fn text(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// The derived classroom code, when present.
    pub fn classcode(&self) -> Option<u32> {
        self.fields
            .get("classcode")
            .and_then(Value::as_u64)
            .map(|c| c as u32)
    }

    pub fn set_classcode(&mut self, code: u32) {
        self.fields.insert("classcode".to_string(), Value::from(code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record::new(map),
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_text_passes_strings_through() {
        let r = record(json!({"name": "Nguyễn Văn A"}));
        assert_eq!(r.text("name"), "Nguyễn Văn A");
    }

    #[test]
    fn test_text_maps_null_and_absent_to_empty() {
        let r = record(json!({"address": null}));
        assert_eq!(r.text("address"), "");
        assert_eq!(r.text("school"), "");
    }

    #[test]
    fn test_text_uses_json_form_for_non_strings() {
        let r = record(json!({"year": 2008, "active": true, "tags": ["a", "b"]}));
        assert_eq!(r.text("year"), "2008");
        assert_eq!(r.text("active"), "true");
        assert_eq!(r.text("tags"), "[\"a\",\"b\"]");
    }

    #[test]
    fn test_classcode_roundtrip() {
        let mut r = record(json!({"name": "A"}));
        assert_eq!(r.classcode(), None);
        r.set_classcode(19);
        assert_eq!(r.classcode(), Some(19));
        assert_eq!(r.text("classcode"), "19");
    }
}
