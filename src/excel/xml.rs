//! Small quick-xml helpers shared by the part parsers.

use crate::error::FormpressResult;
use quick_xml::events::BytesStart;

/// Unescaped value of an attribute, if present.
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> FormpressResult<Option<String>> {
    for a in e.attributes().with_checks(false) {
        let a = a?;
        if a.key.as_ref() == key {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// OOXML boolean attribute: absent and "0"/"false" are false.
pub(crate) fn attr_bool(e: &BytesStart<'_>, key: &[u8]) -> FormpressResult<bool> {
    Ok(matches!(
        attr(e, key)?.as_deref(),
        Some("1") | Some("true")
    ))
}

pub(crate) fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> FormpressResult<Option<u32>> {
    Ok(attr(e, key)?.and_then(|v| v.parse().ok()))
}

pub(crate) fn attr_f64(e: &BytesStart<'_>, key: &[u8]) -> FormpressResult<Option<f64>> {
    Ok(attr(e, key)?.and_then(|v| v.parse().ok()))
}
