//! Workbook registry over the package: sheet name to part mapping, shared
//! strings, the style table, and sheet add/remove/replace with save
//! orchestration.
//!
//! Saving regenerates the `<sheets>` block of `xl/workbook.xml` in place and
//! rebuilds the workbook relationships and `[Content_Types].xml` from the
//! entry list, preserving every non-worksheet entry. Shared strings and the
//! style part are never rewritten.

use crate::error::{FormpressError, FormpressResult};
use crate::excel::package::Package;
use crate::excel::sheet::{CellValue, RichRun, Worksheet};
use crate::excel::style::{Font, StyleTable};
use crate::excel::writer;
use crate::excel::xml::attr;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const WORKSHEET_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const WORKSHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// One `<sheet>` entry of `xl/workbook.xml`.
#[derive(Debug, Clone)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub rel_id: u32,
    /// Part path inside the package, e.g. `xl/worksheets/sheet1.xml`.
    pub path: String,
}

/// A workbook relationship kept verbatim through the rels rebuild.
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
}

#[derive(Debug)]
pub struct Workbook {
    package: Package,
    entries: Vec<SheetEntry>,
    other_rels: Vec<Relationship>,
    shared: Vec<CellValue>,
    styles: StyleTable,
    /// Parsed sheets pending serialization, keyed by part path.
    dirty: BTreeMap<String, Worksheet>,
}

impl Workbook {
    pub fn open(path: &Path) -> FormpressResult<Self> {
        let package = Package::open(path)?;

        let rels_xml = package.read(WORKBOOK_RELS_PART)?;
        let rels = parse_relationships(&rels_xml)?;
        let workbook_xml = package.read(WORKBOOK_PART)?;
        let entries = parse_sheet_entries(&workbook_xml, &rels)?;
        let other_rels = rels
            .into_iter()
            .filter(|r| r.kind != WORKSHEET_REL_TYPE && !r.kind.ends_with("/calcChain"))
            .collect();

        let shared = if package.has(SHARED_STRINGS_PART) {
            parse_shared_strings(&package.read(SHARED_STRINGS_PART)?)?
        } else {
            Vec::new()
        };
        let styles = if package.has(STYLES_PART) {
            StyleTable::parse(&package.read(STYLES_PART)?)?
        } else {
            StyleTable::default()
        };

        Ok(Self {
            package,
            entries,
            other_rels,
            shared,
            styles,
            dirty: BTreeMap::new(),
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Parse (or fetch the pending copy of) a worksheet by name.
    pub fn worksheet(&self, name: &str) -> FormpressResult<Worksheet> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| FormpressError::MissingSheet(name.to_string()))?;
        if let Some(ws) = self.dirty.get(&entry.path) {
            return Ok(ws.clone());
        }
        let xml = self.package.read(&entry.path)?;
        Worksheet::parse(name, &xml, &self.shared, &self.styles)
    }

    /// Queue an updated copy of an existing sheet for the next save.
    pub fn replace_sheet(&mut self, ws: Worksheet) -> FormpressResult<()> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == ws.name)
            .ok_or_else(|| FormpressError::MissingSheet(ws.name.clone()))?;
        self.dirty.insert(entry.path.clone(), ws);
        Ok(())
    }

    /// Register a new sheet, allocating its sheet id, relationship id, and
    /// part path.
    pub fn add_sheet(&mut self, ws: Worksheet) -> FormpressResult<()> {
        if self.has_sheet(&ws.name) {
            return Err(FormpressError::DuplicateSheet(ws.name.clone()));
        }
        let sheet_id = self.entries.iter().map(|e| e.sheet_id).max().unwrap_or(0) + 1;
        let rel_id = self
            .entries
            .iter()
            .map(|e| e.rel_id)
            .chain(self.other_rels.iter().filter_map(|r| rel_id_number(&r.id)))
            .max()
            .unwrap_or(0)
            + 1;
        let path = self.next_sheet_path();
        debug!(sheet = %ws.name, path = %path, "adding worksheet");
        self.entries.push(SheetEntry {
            name: ws.name.clone(),
            sheet_id,
            rel_id,
            path: path.clone(),
        });
        self.dirty.insert(path, ws);
        Ok(())
    }

    /// Drop a sheet from the workbook; returns whether one was removed.
    pub fn remove_sheet(&mut self, name: &str) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.name == name) else {
            return false;
        };
        let entry = self.entries.remove(pos);
        self.dirty.remove(&entry.path);
        self.package.remove(&entry.path);
        true
    }

    /// Serialize pending sheets and write the assembled package to `dest`.
    pub fn save(&mut self, dest: &Path) -> FormpressResult<()> {
        for (path, ws) in &self.dirty {
            let xml = writer::worksheet_xml(ws)?;
            self.package.add(path, xml);
        }
        self.dirty.clear();

        let workbook_xml = self.package.read(WORKBOOK_PART)?;
        self.package
            .replace(WORKBOOK_PART, splice_sheets_block(&workbook_xml, &self.entries)?);
        self.package
            .replace(WORKBOOK_RELS_PART, self.rels_xml());
        let content_types = self.package.read(CONTENT_TYPES_PART)?;
        self.package.replace(
            CONTENT_TYPES_PART,
            rebuild_content_types(&content_types, &self.entries)?,
        );

        self.package.save(dest)
    }

    /// First unused `xl/worksheets/sheetN.xml` slot, counting parts still in
    /// the source archive so a removed-then-readded sheet gets a fresh part.
    fn next_sheet_path(&self) -> String {
        let mut max = 0usize;
        let numbered = |p: &str| {
            p.strip_prefix("xl/worksheets/sheet")
                .and_then(|s| s.strip_suffix(".xml"))
                .and_then(|s| s.parse::<usize>().ok())
        };
        for entry in &self.entries {
            if let Some(n) = numbered(&entry.path) {
                max = max.max(n);
            }
        }
        let mut n = max + 1;
        while self.package.in_source(&format!("xl/worksheets/sheet{n}.xml")) {
            n += 1;
        }
        format!("xl/worksheets/sheet{n}.xml")
    }

    fn rels_xml(&self) -> Vec<u8> {
        let mut out = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for entry in &self.entries {
            let target = entry.path.strip_prefix("xl/").unwrap_or(&entry.path);
            out.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}" Target="{}"/>"#,
                entry.rel_id, WORKSHEET_REL_TYPE, target
            ));
        }
        for rel in &self.other_rels {
            out.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                escape(&rel.id),
                escape(&rel.kind),
                escape(&rel.target)
            ));
        }
        out.push_str("</Relationships>");
        out.into_bytes()
    }
}

fn rel_id_number(id: &str) -> Option<u32> {
    id.strip_prefix("rId").and_then(|n| n.parse().ok())
}

fn parse_relationships(xml: &[u8]) -> FormpressResult<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut rels = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(kind), Some(target)) =
                    (attr(e, b"Id")?, attr(e, b"Type")?, attr(e, b"Target")?)
                {
                    rels.push(Relationship { id, kind, target });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rels)
}

fn parse_sheet_entries(xml: &[u8], rels: &[Relationship]) -> FormpressResult<Vec<SheetEntry>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut entries = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"sheet" => {
                let name = attr(e, b"name")?.unwrap_or_default();
                let sheet_id = attr(e, b"sheetId")?
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let rid = attr(e, b"r:id")?.unwrap_or_default();
                let rel = rels.iter().find(|r| r.id == rid).ok_or_else(|| {
                    FormpressError::MissingPart(format!("relationship {rid} for sheet {name}"))
                })?;
                entries.push(SheetEntry {
                    name,
                    sheet_id,
                    rel_id: rel_id_number(&rid).unwrap_or(0),
                    path: resolve_target(&rel.target),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

/// Resolve a workbook-relative relationship target to a package part path.
fn resolve_target(target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        abs.to_string()
    } else {
        format!("xl/{target}")
    }
}

/// Parse `xl/sharedStrings.xml` into owned values: plain items become text,
/// rich items keep their styled runs.
fn parse_shared_strings(xml: &[u8]) -> FormpressResult<Vec<CellValue>> {
    // No trim_text; `xml:space="preserve"` items carry significant padding.
    let mut reader = Reader::from_reader(xml);

    let mut items = Vec::new();
    let mut in_si = false;
    let mut runs: Vec<RichRun> = Vec::new();
    let mut plain: Option<String> = None;
    let mut in_run = false;
    let mut in_rpr = false;
    let mut in_t = false;
    let mut run_font: Option<Font> = None;

    loop {
        let ev = reader.read_event()?;
        match ev {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(ev, Event::Empty(_));
                let tag = e.name().as_ref().to_vec();
                match tag.as_slice() {
                    b"si" => {
                        in_si = true;
                        runs.clear();
                        plain = None;
                        if empty {
                            items.push(CellValue::Text(String::new()));
                            in_si = false;
                        }
                    }
                    b"r" if in_si => {
                        in_run = true;
                        run_font = None;
                    }
                    b"rPr" if in_run => {
                        in_rpr = !empty;
                        run_font = Some(Font::default());
                    }
                    b"t" if in_si => {
                        if in_run {
                            runs.push(RichRun {
                                text: String::new(),
                                font: run_font.clone(),
                            });
                        } else {
                            plain = Some(String::new());
                        }
                        in_t = !empty;
                    }
                    other if in_rpr => {
                        if let Some(f) = run_font.as_mut() {
                            f.apply(other, e)?;
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref t) if in_t => {
                let text = t.unescape()?.into_owned();
                if in_run {
                    if let Some(run) = runs.last_mut() {
                        run.text = text;
                    }
                } else {
                    plain = Some(text);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"si" => {
                    in_si = false;
                    if !runs.is_empty() {
                        items.push(CellValue::RichText(std::mem::take(&mut runs)));
                    } else {
                        items.push(CellValue::Text(plain.take().unwrap_or_default()));
                    }
                }
                b"r" => in_run = false,
                b"rPr" => in_rpr = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(items)
}

/// Replace the `<sheets>...</sheets>` block of `xl/workbook.xml` with one
/// regenerated from the entry list, leaving the rest of the part untouched.
fn splice_sheets_block(workbook_xml: &[u8], entries: &[SheetEntry]) -> FormpressResult<Vec<u8>> {
    let start = find_bytes(workbook_xml, b"<sheets")
        .ok_or_else(|| FormpressError::MissingPart("<sheets> in xl/workbook.xml".into()))?;
    let end_tag = b"</sheets>";
    let end = find_bytes_from(workbook_xml, end_tag, start)
        .ok_or_else(|| FormpressError::MissingPart("</sheets> in xl/workbook.xml".into()))?
        + end_tag.len();

    let mut block = String::from("<sheets>");
    for entry in entries {
        block.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(&entry.name),
            entry.sheet_id,
            entry.rel_id
        ));
    }
    block.push_str("</sheets>");

    let mut out = Vec::with_capacity(workbook_xml.len() + block.len());
    out.extend_from_slice(&workbook_xml[..start]);
    out.extend_from_slice(block.as_bytes());
    out.extend_from_slice(&workbook_xml[end..]);
    Ok(out)
}

/// Rebuild `[Content_Types].xml`: keep every `Default` and every `Override`
/// that is not a worksheet part or the calculation chain, then declare one
/// `Override` per current sheet entry.
fn rebuild_content_types(xml: &[u8], entries: &[SheetEntry]) -> FormpressResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"Default" => {
                    if let (Some(ext), Some(ct)) =
                        (attr(e, b"Extension")?, attr(e, b"ContentType")?)
                    {
                        out.push_str(&format!(
                            r#"<Default Extension="{}" ContentType="{}"/>"#,
                            escape(&ext),
                            escape(&ct)
                        ));
                    }
                }
                b"Override" => {
                    if let (Some(part), Some(ct)) =
                        (attr(e, b"PartName")?, attr(e, b"ContentType")?)
                    {
                        if part.starts_with("/xl/worksheets/") || part == "/xl/calcChain.xml" {
                            continue;
                        }
                        out.push_str(&format!(
                            r#"<Override PartName="{}" ContentType="{}"/>"#,
                            escape(&part),
                            escape(&ct)
                        ));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    for entry in entries {
        out.push_str(&format!(
            r#"<Override PartName="/{}" ContentType="{}"/>"#,
            entry.path, WORKSHEET_CONTENT_TYPE
        ));
    }
    out.push_str("</Types>");
    Ok(out.into_bytes())
}

fn find_bytes(hay: &[u8], needle: &[u8]) -> Option<usize> {
    hay.windows(needle.len()).position(|w| w == needle)
}

fn find_bytes_from(hay: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    hay[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + start)
}
