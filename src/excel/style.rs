//! Workbook style table.
//!
//! Styles are resolved once at load into independent value objects (font,
//! fill, border, alignment, number format, protection), so cloning a cell
//! never aliases the source sheet's styling. The originating format-record
//! index (`xf_id`) stays on each cell for serialization; `xl/styles.xml`
//! itself is never rewritten.

use crate::error::FormpressResult;
use crate::excel::xml::{attr, attr_bool, attr_f64, attr_u32};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    Rgb(String),
    Indexed(u32),
    Theme { theme: u32, tint: Option<f64> },
    Auto,
}

impl Color {
    /// Read a `<color>`/`<fgColor>`/`<bgColor>`/`<tabColor>` element.
    pub(crate) fn from_element(e: &BytesStart<'_>) -> FormpressResult<Option<Self>> {
        if let Some(rgb) = attr(e, b"rgb")? {
            return Ok(Some(Color::Rgb(rgb)));
        }
        if let Some(indexed) = attr_u32(e, b"indexed")? {
            return Ok(Some(Color::Indexed(indexed)));
        }
        if let Some(theme) = attr_u32(e, b"theme")? {
            let tint = attr_f64(e, b"tint")?;
            return Ok(Some(Color::Theme { theme, tint }));
        }
        if attr_bool(e, b"auto")? {
            return Ok(Some(Color::Auto));
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: Option<String>,
    pub color: Option<Color>,
}

impl Font {
    /// Apply one child element of a `<font>` or `<rPr>` block. The two
    /// blocks share every property; only the name tag differs (`name` vs
    /// `rFont`).
    pub(crate) fn apply(&mut self, tag: &[u8], e: &BytesStart<'_>) -> FormpressResult<()> {
        match tag {
            b"name" | b"rFont" => self.name = attr(e, b"val")?,
            b"sz" => self.size = attr_f64(e, b"val")?,
            b"b" => self.bold = attr(e, b"val")?.as_deref() != Some("0"),
            b"i" => self.italic = attr(e, b"val")?.as_deref() != Some("0"),
            b"strike" => self.strike = attr(e, b"val")?.as_deref() != Some("0"),
            b"u" => self.underline = Some(attr(e, b"val")?.unwrap_or_else(|| "single".into())),
            b"color" => self.color = Color::from_element(e)?,
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub pattern: String,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Default for Fill {
    fn default() -> Self {
        Self {
            pattern: "none".to_string(),
            fg: None,
            bg: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderEdge {
    pub style: Option<String>,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Border {
    pub left: BorderEdge,
    pub right: BorderEdge,
    pub top: BorderEdge,
    pub bottom: BorderEdge,
    pub diagonal: BorderEdge,
    pub diagonal_up: bool,
    pub diagonal_down: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: bool,
    pub text_rotation: Option<i32>,
    pub indent: Option<u32>,
    pub shrink_to_fit: bool,
}

impl Alignment {
    fn from_element(e: &BytesStart<'_>) -> FormpressResult<Self> {
        Ok(Self {
            horizontal: attr(e, b"horizontal")?,
            vertical: attr(e, b"vertical")?,
            wrap_text: attr_bool(e, b"wrapText")?,
            text_rotation: attr(e, b"textRotation")?.and_then(|v| v.parse().ok()),
            indent: attr_u32(e, b"indent")?,
            shrink_to_fit: attr_bool(e, b"shrinkToFit")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Protection {
    pub locked: Option<bool>,
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    pub id: u32,
    pub code: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            id: 0,
            code: "General".to_string(),
        }
    }
}

/// One cell's resolved style bundle. Every field is an owned value, so
/// `Clone` is a structural deep copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub number_format: NumberFormat,
    pub font: Font,
    pub fill: Fill,
    pub border: Border,
    pub alignment: Option<Alignment>,
    pub protection: Option<Protection>,
}

/// One `<xf>` record from `cellXfs`.
#[derive(Debug, Clone, Default)]
struct Xf {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    alignment: Option<Alignment>,
    protection: Option<Protection>,
}

/// Parsed `xl/styles.xml`.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    num_fmts: BTreeMap<u32, String>,
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    xfs: Vec<Xf>,
}

/// Which collection the parser is currently inside.
#[derive(PartialEq)]
enum Section {
    None,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    CellStyleXfs,
}

impl StyleTable {
    pub fn parse(xml: &[u8]) -> FormpressResult<Self> {
        let mut table = StyleTable::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut section = Section::None;
        let mut font: Option<Font> = None;
        let mut fill: Option<Fill> = None;
        let mut in_pattern = false;
        let mut border: Option<Border> = None;
        let mut edge: Vec<u8> = Vec::new();
        let mut xf: Option<Xf> = None;

        loop {
            let ev = reader.read_event()?;
            match ev {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let empty = matches!(ev, Event::Empty(_));
                    let tag = e.name().as_ref().to_vec();
                    match tag.as_slice() {
                        b"fonts" => section = Section::Fonts,
                        b"fills" => section = Section::Fills,
                        b"borders" => section = Section::Borders,
                        b"cellXfs" => section = Section::CellXfs,
                        b"cellStyleXfs" => section = Section::CellStyleXfs,
                        b"numFmt" => {
                            if let (Some(id), Some(code)) =
                                (attr_u32(e, b"numFmtId")?, attr(e, b"formatCode")?)
                            {
                                table.num_fmts.insert(id, code);
                            }
                        }
                        b"font" if section == Section::Fonts => {
                            if empty {
                                table.fonts.push(Font::default());
                            } else {
                                font = Some(Font::default());
                            }
                        }
                        b"fill" if section == Section::Fills => {
                            if empty {
                                table.fills.push(Fill::default());
                            } else {
                                fill = Some(Fill::default());
                            }
                        }
                        b"patternFill" if fill.is_some() => {
                            in_pattern = true;
                            if let Some(f) = fill.as_mut() {
                                if let Some(p) = attr(e, b"patternType")? {
                                    f.pattern = p;
                                }
                            }
                            if empty {
                                in_pattern = false;
                            }
                        }
                        b"fgColor" if in_pattern => {
                            if let Some(f) = fill.as_mut() {
                                f.fg = Color::from_element(e)?;
                            }
                        }
                        b"bgColor" if in_pattern => {
                            if let Some(f) = fill.as_mut() {
                                f.bg = Color::from_element(e)?;
                            }
                        }
                        b"border" if section == Section::Borders => {
                            let mut b = Border {
                                diagonal_up: attr_bool(e, b"diagonalUp")?,
                                diagonal_down: attr_bool(e, b"diagonalDown")?,
                                ..Border::default()
                            };
                            if empty {
                                table.borders.push(std::mem::take(&mut b));
                            } else {
                                border = Some(b);
                            }
                        }
                        b"left" | b"right" | b"top" | b"bottom" | b"diagonal"
                            if border.is_some() =>
                        {
                            edge = tag.clone();
                            if let (Some(b), Some(style)) = (border.as_mut(), attr(e, b"style")?) {
                                b.edge_mut(&tag).style = Some(style);
                            }
                            if empty {
                                edge.clear();
                            }
                        }
                        b"color" if border.is_some() && !edge.is_empty() => {
                            if let Some(b) = border.as_mut() {
                                b.edge_mut(&edge).color = Color::from_element(e)?;
                            }
                        }
                        b"xf" if section == Section::CellXfs => {
                            let mut record = Xf {
                                num_fmt_id: attr_u32(e, b"numFmtId")?.unwrap_or(0),
                                font_id: attr_u32(e, b"fontId")?.unwrap_or(0) as usize,
                                fill_id: attr_u32(e, b"fillId")?.unwrap_or(0) as usize,
                                border_id: attr_u32(e, b"borderId")?.unwrap_or(0) as usize,
                                alignment: None,
                                protection: None,
                            };
                            if empty {
                                table.xfs.push(std::mem::take(&mut record));
                            } else {
                                xf = Some(record);
                            }
                        }
                        b"alignment" if xf.is_some() => {
                            if let Some(x) = xf.as_mut() {
                                x.alignment = Some(Alignment::from_element(e)?);
                            }
                        }
                        b"protection" if xf.is_some() => {
                            if let Some(x) = xf.as_mut() {
                                x.protection = Some(Protection {
                                    locked: attr(e, b"locked")?.map(|v| v != "0"),
                                    hidden: attr(e, b"hidden")?.map(|v| v != "0"),
                                });
                            }
                        }
                        other => {
                            if let Some(f) = font.as_mut() {
                                f.apply(other, e)?;
                            }
                        }
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"fonts" | b"fills" | b"borders" | b"cellXfs" | b"cellStyleXfs" => {
                        section = Section::None
                    }
                    b"font" => {
                        if let Some(f) = font.take() {
                            table.fonts.push(f);
                        }
                    }
                    b"fill" => {
                        if let Some(f) = fill.take() {
                            table.fills.push(f);
                        }
                    }
                    b"patternFill" => in_pattern = false,
                    b"border" => {
                        if let Some(b) = border.take() {
                            table.borders.push(b);
                        }
                    }
                    b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => edge.clear(),
                    b"xf" => {
                        if let Some(x) = xf.take() {
                            if section == Section::CellXfs {
                                table.xfs.push(x);
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(table)
    }

    /// Resolve a cell's format-record index into an independent style
    /// bundle. Out-of-range ids resolve to the defaults.
    pub fn resolve(&self, xf_id: u32) -> CellStyle {
        let Some(xf) = self.xfs.get(xf_id as usize) else {
            return CellStyle::default();
        };
        CellStyle {
            number_format: NumberFormat {
                id: xf.num_fmt_id,
                code: self.format_code(xf.num_fmt_id),
            },
            font: self.fonts.get(xf.font_id).cloned().unwrap_or_default(),
            fill: self.fills.get(xf.fill_id).cloned().unwrap_or_default(),
            border: self.borders.get(xf.border_id).cloned().unwrap_or_default(),
            alignment: xf.alignment.clone(),
            protection: xf.protection.clone(),
        }
    }

    fn format_code(&self, id: u32) -> String {
        if let Some(code) = self.num_fmts.get(&id) {
            return code.clone();
        }
        builtin_format_code(id).unwrap_or("General").to_string()
    }
}

impl Border {
    fn edge_mut(&mut self, tag: &[u8]) -> &mut BorderEdge {
        match tag {
            b"left" => &mut self.left,
            b"right" => &mut self.right,
            b"top" => &mut self.top,
            b"bottom" => &mut self.bottom,
            _ => &mut self.diagonal,
        }
    }
}

/// Codes for the builtin number-format ids templates commonly reference.
fn builtin_format_code(id: u32) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        14 => "mm-dd-yy",
        49 => "@",
        _ => return None,
    })
}
