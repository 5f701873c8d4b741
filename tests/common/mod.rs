//! Shared fixture builders for integration tests.
//!
//! Templates are assembled by hand at the package level so each test
//! controls the exact XML the reader sees: styles, merged ranges, rich
//! text, shared strings and print layout parts.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Style part used by every fixture workbook: one custom number format,
/// two fonts, three fills, two borders and three cell formats. xf 1 is the
/// "decorated" format (bold red Times, yellow solid fill, thin border,
/// centered wrapping alignment); xf 2 carries the custom number format.
pub const STYLES_XML: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="#,##0.00&quot;d&quot;"/></numFmts>
<fonts count="2">
<font><sz val="11"/><name val="Calibri"/></font>
<font><b/><sz val="14"/><color rgb="FFFF0000"/><name val="Times New Roman"/></font>
</fonts>
<fills count="3">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
<fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
</fills>
<borders count="2">
<border><left/><right/><top/><bottom/><diagonal/></border>
<border><left style="thin"><color indexed="64"/></left><right style="thin"/><top style="medium"/><bottom style="thin"/><diagonal/></border>
</borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="3">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0" applyAlignment="1"><alignment horizontal="center" vertical="center" wrapText="1"/></xf>
<xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0"/>
</cellXfs>
</styleSheet>"##;

/// Shared string table with one plain item and one rich-text item.
pub const SHARED_STRINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
<si><t>Student name</t></si>
<si><r><rPr><b/><sz val="12"/><rFont val="Arial"/></rPr><t>Bold part</t></r><r><t xml:space="preserve"> plain tail</t></r></si>
</sst>"#;

const WORKSHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// Write a complete xlsx package at `path` with the given worksheets.
///
/// Sheets are `(name, sheet XML)` pairs mapped to `xl/worksheets/sheetN.xml`
/// in order. The package always carries the fixture style part and a
/// `xl/calcChain.xml` entry so tests can observe the chain being dropped on
/// save; the shared string table is optional.
pub fn write_xlsx(path: &Path, sheets: &[(&str, &str)], shared: Option<&str>) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let opt: FileOptions<'_, ()> = FileOptions::default();

    let mut part = |name: &str, content: &str| {
        zip.start_file(name, opt).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    };

    let mut overrides = String::new();
    for i in 1..=sheets.len() {
        overrides.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/sheet{i}.xml\" ContentType=\"{WORKSHEET_CONTENT_TYPE}\"/>"
        ));
    }
    if shared.is_some() {
        overrides.push_str("<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>");
    }
    part(
        "[Content_Types].xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>
{overrides}</Types>"#
        ),
    );

    part(
        "_rels/.rels",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
    );

    let mut sheet_entries = String::new();
    let mut sheet_rels = String::new();
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        sheet_entries.push_str(&format!(
            "<sheet name=\"{name}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>"
        ));
        sheet_rels.push_str(&format!(
            "<Relationship Id=\"rId{n}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{n}.xml\"/>"
        ));
    }
    part(
        "xl/workbook.xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>{sheet_entries}</sheets>
</workbook>"#
        ),
    );

    let styles_rid = sheets.len() + 1;
    let chain_rid = sheets.len() + 2;
    let mut rels = sheet_rels;
    rels.push_str(&format!(
        "<Relationship Id=\"rId{styles_rid}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>"
    ));
    rels.push_str(&format!(
        "<Relationship Id=\"rId{chain_rid}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain\" Target=\"calcChain.xml\"/>"
    ));
    if shared.is_some() {
        let rid = sheets.len() + 3;
        rels.push_str(&format!(
            "<Relationship Id=\"rId{rid}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\" Target=\"sharedStrings.xml\"/>"
        ));
    }
    part(
        "xl/_rels/workbook.xml.rels",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
        ),
    );

    part("xl/styles.xml", STYLES_XML);
    part(
        "xl/calcChain.xml",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><c r="B2" i="1"/></calcChain>"#,
    );
    if let Some(sst) = shared {
        part("xl/sharedStrings.xml", sst);
    }
    for (i, (_, xml)) in sheets.iter().enumerate() {
        part(&format!("xl/worksheets/sheet{}.xml", i + 1), xml);
    }

    zip.finish().unwrap();
}

/// Sheet XML in the shape of the single-entry template's "data" sheet:
/// labels in column B, styled blank target cells in C3..C8, with C3 and C6
/// sitting on merged ranges so writes must resolve through the master.
pub fn data_sheet_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="3"><c r="B3" t="inlineStr"><is><t>Name</t></is></c><c r="C3" s="1"/></row>
<row r="4"><c r="B4" t="inlineStr"><is><t>Year</t></is></c><c r="C4" s="1"/></row>
<row r="5"><c r="B5" t="inlineStr"><is><t>School</t></is></c><c r="C5" s="1"/></row>
<row r="6"><c r="B6" t="inlineStr"><is><t>Address</t></is></c><c r="C6" s="1"/></row>
<row r="7"><c r="B7" t="inlineStr"><is><t>Address 2</t></is></c><c r="C7" s="1"/></row>
<row r="8"><c r="B8" t="inlineStr"><is><t>Guardian</t></is></c><c r="C8" s="1"/></row>
</sheetData>
<mergeCells count="2"><mergeCell ref="C3:E3"/><mergeCell ref="C6:E6"/></mergeCells>
</worksheet>"#
        .to_string()
}

/// Sheet XML in the shape of the multi-entry template's "form" sheet: column
/// widths, a tab color, a frozen pane, rich text and formula cells, styled
/// blank targets in C6..C10 plus F6, merged ranges covering the targets, and
/// full print layout (margins, page setup, header and footer).
pub fn form_sheet_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetPr><tabColor rgb="FF92D050"/><pageSetUpPr fitToPage="1"/></sheetPr>
<sheetViews><sheetView showGridLines="0" zoomScale="85" workbookViewId="0"><pane xSplit="1" ySplit="2" topLeftCell="B3" state="frozen"/></sheetView></sheetViews>
<sheetFormatPr defaultRowHeight="16.5"/>
<cols><col min="1" max="1" width="4.5" customWidth="1"/><col min="2" max="2" width="22" customWidth="1"/><col min="3" max="5" width="14" customWidth="1"/></cols>
<sheetData>
<row r="1" ht="28" customHeight="1"><c r="A1" s="1" t="inlineStr"><is><t>REGISTRATION FORM</t></is></c></row>
<row r="2"><c r="A2" t="s"><v>1</v></c><c r="E2"><f>SUM(1,2)</f><v>3</v></c></row>
<row r="6"><c r="B6" t="s"><v>0</v></c><c r="C6" s="1"/><c r="F6" s="1"/></row>
<row r="7"><c r="B7" t="inlineStr"><is><t>Year</t></is></c><c r="C7" s="1"/></row>
<row r="8"><c r="B8" t="inlineStr"><is><t>School</t></is></c><c r="C8" s="1"/></row>
<row r="9"><c r="B9" t="inlineStr"><is><t>Address</t></is></c><c r="C9" s="1"/></row>
<row r="10"><c r="B10" t="inlineStr"><is><t>Address 2</t></is></c><c r="C10" s="2"><v>12000.5</v></c></row>
</sheetData>
<mergeCells count="3"><mergeCell ref="A1:F1"/><mergeCell ref="C6:E6"/><mergeCell ref="C9:E9"/></mergeCells>
<pageMargins left="0.25" right="0.25" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
<pageSetup paperSize="9" orientation="portrait" scale="95"/>
<headerFooter><oddHeader>&amp;CEnrollment</oddHeader><oddFooter>&amp;CPage &amp;P</oddFooter></headerFooter>
</worksheet>"#
        .to_string()
}

/// Minimal sheet with nothing but two cells, for tests that only need a
/// second sheet alongside the form.
pub fn plain_sheet_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>notes</t></is></c><c r="B1"><v>7</v></c></row></sheetData>
</worksheet>"#
        .to_string()
}

/// Write a fill-template fixture (single "data" sheet) and return nothing;
/// callers open it through the library.
pub fn write_fill_template(path: &Path) {
    write_xlsx(path, &[("data", &data_sheet_xml())], None);
}

/// Write a clone-template fixture: the "form" sheet plus a "notes" sheet
/// that must survive cloning untouched.
pub fn write_clone_template(path: &Path) {
    write_xlsx(
        path,
        &[("form", &form_sheet_xml()), ("notes", &plain_sheet_xml())],
        Some(SHARED_STRINGS_XML),
    );
}

/// Write a roster JSON file with one object per name, in input order.
pub fn write_roster(path: &Path, names: &[&str]) {
    let items: Vec<String> = names
        .iter()
        .map(|n| {
            format!(
                r#"{{"name":"{n}","year":"2013","school":"TH Kim Dong","address":"12 Ly Thuong Kiet","address2":"Hai Chau, Da Nang","name2":"Guardian of {n}"}}"#
            )
        })
        .collect();
    std::fs::write(path, format!("[{}]", items.join(","))).unwrap();
}
