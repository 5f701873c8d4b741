//! Worksheet part serialization.
//!
//! Emits schema-ordered worksheet XML: sheetPr, dimension, sheetViews,
//! sheetFormatPr, cols, sheetData, mergeCells, pageMargins, pageSetup,
//! headerFooter. Text is written as inline strings; rich text as runs with
//! run properties; formulas with their cached results. Cells keep their
//! format-record index so template styling survives at the part level.
//! Serialized sheets carry no relationship ids, so they need no rels part.

use crate::error::FormpressResult;
use crate::excel::addr::CellRef;
use crate::excel::sheet::{Cell, CellValue, PageMargins, RichRun, Worksheet};
use crate::excel::style::{Color, Font};
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use std::collections::BTreeSet;
use std::io::Cursor;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

pub(crate) fn worksheet_xml(ws: &Worksheet) -> FormpressResult<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    writer
        .create_element("worksheet")
        .with_attribute((
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        ))
        .write_inner_content(|w| {
            write_sheet_pr(w, ws)?;
            w.create_element("dimension")
                .with_attribute(("ref", format!("A1:{}", ws.extent()).as_str()))
                .write_empty()?;
            write_sheet_views(w, ws)?;
            write_format_pr(w, ws)?;
            write_cols(w, ws)?;
            write_sheet_data(w, ws)?;
            write_merges(w, ws)?;
            write_page(w, ws)?;
            Ok::<(), std::io::Error>(())
        })?;

    Ok(writer.into_inner().into_inner())
}

fn write_sheet_pr(w: &mut XmlWriter, ws: &Worksheet) -> std::io::Result<()> {
    if ws.props.tab_color.is_none() && !ws.props.fit_to_page {
        return Ok(());
    }
    w.create_element("sheetPr").write_inner_content(|w| {
        if let Some(color) = &ws.props.tab_color {
            let e = w.create_element("tabColor");
            with_color(e, color).write_empty()?;
        }
        if ws.props.fit_to_page {
            w.create_element("pageSetUpPr")
                .with_attribute(("fitToPage", "1"))
                .write_empty()?;
        }
        Ok::<(), std::io::Error>(())
    })?;
    Ok(())
}

fn write_sheet_views(w: &mut XmlWriter, ws: &Worksheet) -> std::io::Result<()> {
    let Some(view) = &ws.view else {
        return Ok(());
    };
    w.create_element("sheetViews").write_inner_content(|w| {
        let mut e = w
            .create_element("sheetView")
            .with_attribute(("workbookViewId", "0"));
        if !view.show_grid_lines {
            e = e.with_attribute(("showGridLines", "0"));
        }
        if view.tab_selected {
            e = e.with_attribute(("tabSelected", "1"));
        }
        if let Some(zoom) = view.zoom_scale {
            e = e.with_attribute(("zoomScale", zoom.to_string().as_str()));
        }
        match &view.frozen {
            Some(pane) => {
                e.write_inner_content(|w| {
                    let mut p = w
                        .create_element("pane")
                        .with_attribute(("xSplit", pane.x_split.to_string().as_str()))
                        .with_attribute(("ySplit", pane.y_split.to_string().as_str()))
                        .with_attribute(("state", "frozen"));
                    if let Some(top_left) = pane.top_left {
                        p = p.with_attribute(("topLeftCell", top_left.to_string().as_str()));
                    }
                    p.write_empty()?;
                    Ok::<(), std::io::Error>(())
                })?;
            }
            None => {
                e.write_empty()?;
            }
        }
        Ok::<(), std::io::Error>(())
    })?;
    Ok(())
}

fn write_format_pr(w: &mut XmlWriter, ws: &Worksheet) -> std::io::Result<()> {
    let fmt = &ws.format;
    if fmt.default_row_height.is_none()
        && fmt.default_col_width.is_none()
        && fmt.base_col_width.is_none()
    {
        return Ok(());
    }
    let mut e = w.create_element("sheetFormatPr");
    if let Some(width) = fmt.base_col_width {
        e = e.with_attribute(("baseColWidth", width.to_string().as_str()));
    }
    if let Some(width) = fmt.default_col_width {
        e = e.with_attribute(("defaultColWidth", trim_float(width).as_str()));
    }
    let height = fmt.default_row_height.unwrap_or(15.0);
    e = e.with_attribute(("defaultRowHeight", trim_float(height).as_str()));
    e.write_empty()?;
    Ok(())
}

fn write_cols(w: &mut XmlWriter, ws: &Worksheet) -> std::io::Result<()> {
    if ws.cols.is_empty() {
        return Ok(());
    }
    w.create_element("cols").write_inner_content(|w| {
        for col in &ws.cols {
            let mut e = w
                .create_element("col")
                .with_attribute(("min", col.min.to_string().as_str()))
                .with_attribute(("max", col.max.to_string().as_str()));
            if let Some(width) = col.width {
                e = e.with_attribute(("width", trim_float(width).as_str()));
            }
            if let Some(style) = col.xf_id {
                e = e.with_attribute(("style", style.to_string().as_str()));
            }
            if col.custom_width {
                e = e.with_attribute(("customWidth", "1"));
            }
            if col.hidden {
                e = e.with_attribute(("hidden", "1"));
            }
            if col.best_fit {
                e = e.with_attribute(("bestFit", "1"));
            }
            if col.outline_level > 0 {
                e = e.with_attribute(("outlineLevel", col.outline_level.to_string().as_str()));
            }
            e.write_empty()?;
        }
        Ok::<(), std::io::Error>(())
    })?;
    Ok(())
}

fn write_sheet_data(w: &mut XmlWriter, ws: &Worksheet) -> std::io::Result<()> {
    let mut row_numbers: BTreeSet<u32> = ws.rows.keys().copied().collect();
    row_numbers.extend(ws.cells.keys().map(|at| at.row));

    w.create_element("sheetData").write_inner_content(|w| {
        for row in row_numbers {
            let mut e = w
                .create_element("row")
                .with_attribute(("r", row.to_string().as_str()));
            let info = ws.rows.get(&row).cloned().unwrap_or_default();
            if let Some(height) = info.height {
                e = e.with_attribute(("ht", trim_float(height).as_str()));
            }
            if info.custom_height {
                e = e.with_attribute(("customHeight", "1"));
            }
            if info.hidden {
                e = e.with_attribute(("hidden", "1"));
            }
            if info.outline_level > 0 {
                e = e.with_attribute(("outlineLevel", info.outline_level.to_string().as_str()));
            }
            if let Some(style) = info.xf_id {
                e = e
                    .with_attribute(("s", style.to_string().as_str()))
                    .with_attribute(("customFormat", "1"));
            }

            let cells: Vec<(&CellRef, &Cell)> =
                ws.cells.range(CellRef::new(row, 1)..=CellRef::new(row, u32::MAX)).collect();
            if cells.is_empty() {
                e.write_empty()?;
            } else {
                e.write_inner_content(|w| {
                    for (at, cell) in &cells {
                        write_cell(w, **at, *cell)?;
                    }
                    Ok::<(), std::io::Error>(())
                })?;
            }
        }
        Ok::<(), std::io::Error>(())
    })?;
    Ok(())
}

fn write_cell(w: &mut XmlWriter, at: CellRef, cell: &Cell) -> std::io::Result<()> {
    let coord = at.to_string();
    let mut e = w.create_element("c").with_attribute(("r", coord.as_str()));
    if let Some(style) = cell.xf_id {
        e = e.with_attribute(("s", style.to_string().as_str()));
    }
    match &cell.value {
        CellValue::Empty => {
            e.write_empty()?;
        }
        CellValue::Number(n) => {
            let text = trim_float(*n);
            e.write_inner_content(|w| {
                w.create_element("v")
                    .write_text_content(BytesText::new(&text))?;
                Ok::<(), std::io::Error>(())
            })?;
        }
        CellValue::Bool(b) => {
            let text = if *b { "1" } else { "0" };
            e.with_attribute(("t", "b")).write_inner_content(|w| {
                w.create_element("v").write_text_content(BytesText::new(text))?;
                Ok::<(), std::io::Error>(())
            })?;
        }
        CellValue::Text(s) => {
            e.with_attribute(("t", "inlineStr")).write_inner_content(|w| {
                w.create_element("is").write_inner_content(|w| {
                    write_text_element(w, s)?;
                    Ok::<(), std::io::Error>(())
                })?;
                Ok::<(), std::io::Error>(())
            })?;
        }
        CellValue::RichText(runs) => {
            e.with_attribute(("t", "inlineStr")).write_inner_content(|w| {
                w.create_element("is").write_inner_content(|w| {
                    for run in runs {
                        write_run(w, run)?;
                    }
                    Ok::<(), std::io::Error>(())
                })?;
                Ok::<(), std::io::Error>(())
            })?;
        }
        CellValue::Formula {
            expr,
            cached,
            text_result,
        } => {
            if *text_result {
                e = e.with_attribute(("t", "str"));
            }
            e.write_inner_content(|w| {
                w.create_element("f")
                    .write_text_content(BytesText::new(expr))?;
                if let Some(cached) = cached {
                    w.create_element("v")
                        .write_text_content(BytesText::new(cached))?;
                }
                Ok::<(), std::io::Error>(())
            })?;
        }
        CellValue::Error(code) => {
            e.with_attribute(("t", "e")).write_inner_content(|w| {
                w.create_element("v")
                    .write_text_content(BytesText::new(code))?;
                Ok::<(), std::io::Error>(())
            })?;
        }
    }
    Ok(())
}

fn write_run(w: &mut XmlWriter, run: &RichRun) -> std::io::Result<()> {
    w.create_element("r").write_inner_content(|w| {
        if let Some(font) = &run.font {
            write_run_props(w, font)?;
        }
        write_text_element(w, &run.text)?;
        Ok::<(), std::io::Error>(())
    })?;
    Ok(())
}

fn write_run_props(w: &mut XmlWriter, font: &Font) -> std::io::Result<()> {
    w.create_element("rPr").write_inner_content(|w| {
        if let Some(name) = &font.name {
            w.create_element("rFont")
                .with_attribute(("val", name.as_str()))
                .write_empty()?;
        }
        if let Some(size) = font.size {
            w.create_element("sz")
                .with_attribute(("val", trim_float(size).as_str()))
                .write_empty()?;
        }
        if font.bold {
            w.create_element("b").write_empty()?;
        }
        if font.italic {
            w.create_element("i").write_empty()?;
        }
        if font.strike {
            w.create_element("strike").write_empty()?;
        }
        if let Some(u) = &font.underline {
            w.create_element("u")
                .with_attribute(("val", u.as_str()))
                .write_empty()?;
        }
        if let Some(color) = &font.color {
            with_color(w.create_element("color"), color).write_empty()?;
        }
        Ok::<(), std::io::Error>(())
    })?;
    Ok(())
}

fn write_text_element(w: &mut XmlWriter, text: &str) -> std::io::Result<()> {
    let mut e = w.create_element("t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        e = e.with_attribute(("xml:space", "preserve"));
    }
    e.write_text_content(BytesText::new(text))?;
    Ok(())
}

fn write_merges(w: &mut XmlWriter, ws: &Worksheet) -> std::io::Result<()> {
    let merges = ws.merges();
    if merges.is_empty() {
        return Ok(());
    }
    w.create_element("mergeCells")
        .with_attribute(("count", merges.len().to_string().as_str()))
        .write_inner_content(|w| {
            for range in merges {
                w.create_element("mergeCell")
                    .with_attribute(("ref", range.to_string().as_str()))
                    .write_empty()?;
            }
            Ok::<(), std::io::Error>(())
        })?;
    Ok(())
}

fn write_page(w: &mut XmlWriter, ws: &Worksheet) -> std::io::Result<()> {
    // pageMargins must precede pageSetup; emit defaults when only the
    // latter is present.
    let margins = match (&ws.margins, &ws.page_setup, &ws.header_footer) {
        (Some(m), _, _) => Some(m.clone()),
        (None, Some(_), _) | (None, _, Some(_)) => Some(PageMargins::default()),
        _ => None,
    };
    if let Some(m) = margins {
        w.create_element("pageMargins")
            .with_attribute(("left", trim_float(m.left).as_str()))
            .with_attribute(("right", trim_float(m.right).as_str()))
            .with_attribute(("top", trim_float(m.top).as_str()))
            .with_attribute(("bottom", trim_float(m.bottom).as_str()))
            .with_attribute(("header", trim_float(m.header).as_str()))
            .with_attribute(("footer", trim_float(m.footer).as_str()))
            .write_empty()?;
    }
    if let Some(setup) = &ws.page_setup {
        let mut e = w.create_element("pageSetup");
        if let Some(size) = setup.paper_size {
            e = e.with_attribute(("paperSize", size.to_string().as_str()));
        }
        if let Some(scale) = setup.scale {
            e = e.with_attribute(("scale", scale.to_string().as_str()));
        }
        if let Some(width) = setup.fit_to_width {
            e = e.with_attribute(("fitToWidth", width.to_string().as_str()));
        }
        if let Some(height) = setup.fit_to_height {
            e = e.with_attribute(("fitToHeight", height.to_string().as_str()));
        }
        if let Some(orientation) = &setup.orientation {
            e = e.with_attribute(("orientation", orientation.as_str()));
        }
        e.write_empty()?;
    }
    if let Some(hf) = &ws.header_footer {
        let mut e = w.create_element("headerFooter");
        if hf.different_odd_even {
            e = e.with_attribute(("differentOddEven", "1"));
        }
        if hf.different_first {
            e = e.with_attribute(("differentFirst", "1"));
        }
        e.write_inner_content(|w| {
            let slots = [
                ("oddHeader", &hf.odd_header),
                ("oddFooter", &hf.odd_footer),
                ("evenHeader", &hf.even_header),
                ("evenFooter", &hf.even_footer),
                ("firstHeader", &hf.first_header),
                ("firstFooter", &hf.first_footer),
            ];
            for (tag, content) in slots {
                if let Some(text) = content {
                    w.create_element(tag)
                        .write_text_content(BytesText::new(text))?;
                }
            }
            Ok::<(), std::io::Error>(())
        })?;
    }
    Ok(())
}

fn with_color<'a, W: std::io::Write>(
    e: quick_xml::writer::ElementWriter<'a, W>,
    color: &Color,
) -> quick_xml::writer::ElementWriter<'a, W> {
    match color {
        Color::Rgb(rgb) => e.with_attribute(("rgb", rgb.as_str())),
        Color::Indexed(i) => e.with_attribute(("indexed", i.to_string().as_str())),
        Color::Theme { theme, tint } => {
            let e = e.with_attribute(("theme", theme.to_string().as_str()));
            match tint {
                Some(t) => e.with_attribute(("tint", t.to_string().as_str())),
                None => e,
            }
        }
        Color::Auto => e.with_attribute(("auto", "1")),
    }
}

/// Format a float the way sheet parts usually carry them: no trailing
/// zeros, integers without a decimal point.
fn trim_float(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
