//! In-memory worksheet model.
//!
//! The model owns everything the template fill/clone pipeline needs from a
//! sheet part: cells with resolved styles, row and column definitions,
//! merged ranges with their master map, and the sheet-level layout metadata
//! (properties, views, format defaults, margins, page setup, header/footer).
//!
//! Merge semantics follow the master-cell invariant: every address resolves
//! to a master address (itself when unmerged), the map is built once at load
//! and refreshed when ranges are added, and all reads and writes go through
//! it.

use crate::error::{FormpressError, FormpressResult};
use crate::excel::addr::{CellRange, CellRef};
use crate::excel::style::{CellStyle, Color, Font, StyleTable};
use crate::excel::xml::{attr, attr_bool, attr_f64, attr_u32};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// One styled run of a rich-text value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichRun {
    pub text: String,
    pub font: Option<Font>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    RichText(Vec<RichRun>),
    Formula {
        expr: String,
        cached: Option<String>,
        /// Cached result is text (`t="str"`), not a number.
        text_result: bool,
    },
    Error(String),
}

impl CellValue {
    /// Plain-text rendering, used by tests and diagnostics.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::RichText(runs) => runs.iter().map(|r| r.text.as_str()).collect(),
            CellValue::Formula { cached, .. } => cached.clone().unwrap_or_default(),
            CellValue::Error(e) => e.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    /// Format-record index into the workbook style table, kept so the
    /// serialized cell references the template's styling at the part level.
    pub xf_id: Option<u32>,
    /// Resolved style bundle, an independent copy per cell.
    pub style: Option<CellStyle>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowInfo {
    pub height: Option<f64>,
    pub custom_height: bool,
    pub hidden: bool,
    pub outline_level: u8,
    pub xf_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub custom_width: bool,
    pub hidden: bool,
    pub outline_level: u8,
    pub best_fit: bool,
    pub xf_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetProperties {
    pub tab_color: Option<Color>,
    pub fit_to_page: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrozenPane {
    pub x_split: u32,
    pub y_split: u32,
    pub top_left: Option<CellRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetView {
    pub show_grid_lines: bool,
    pub zoom_scale: Option<u32>,
    pub tab_selected: bool,
    pub frozen: Option<FrozenPane>,
}

impl Default for SheetView {
    fn default() -> Self {
        Self {
            show_grid_lines: true,
            zoom_scale: None,
            tab_selected: false,
            frozen: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetFormat {
    pub default_row_height: Option<f64>,
    pub default_col_width: Option<f64>,
    pub base_col_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSetup {
    pub paper_size: Option<u32>,
    pub orientation: Option<String>,
    pub scale: Option<u32>,
    pub fit_to_width: Option<u32>,
    pub fit_to_height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderFooter {
    pub odd_header: Option<String>,
    pub odd_footer: Option<String>,
    pub even_header: Option<String>,
    pub even_footer: Option<String>,
    pub first_header: Option<String>,
    pub first_footer: Option<String>,
    pub different_odd_even: bool,
    pub different_first: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    pub name: String,
    pub cells: BTreeMap<CellRef, Cell>,
    pub rows: BTreeMap<u32, RowInfo>,
    pub cols: Vec<ColumnInfo>,
    pub props: SheetProperties,
    pub view: Option<SheetView>,
    pub format: SheetFormat,
    pub margins: Option<PageMargins>,
    pub page_setup: Option<PageSetup>,
    pub header_footer: Option<HeaderFooter>,
    merges: Vec<CellRange>,
    masters: HashMap<CellRef, CellRef>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declared merge ranges, in declaration order.
    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// The master address for `at`: the top-left of the merged range
    /// containing it, or `at` itself when unmerged.
    pub fn master_of(&self, at: CellRef) -> CellRef {
        self.masters.get(&at).copied().unwrap_or(at)
    }

    /// Add a merged range.
    ///
    /// Re-applying a range that is already declared is a no-op. A range that
    /// overlaps a different declared range is rejected with `MergeConflict`.
    pub fn merge(&mut self, range: CellRange) -> FormpressResult<()> {
        for existing in &self.merges {
            if *existing == range {
                return Ok(());
            }
            if existing.intersects(&range) {
                return Err(FormpressError::MergeConflict(
                    range.to_string(),
                    existing.to_string(),
                ));
            }
        }
        self.push_merge_unchecked(range);
        Ok(())
    }

    /// Record a declared range without conflict enforcement; the master map
    /// keeps the first declaration for any contested cell. Used by the
    /// parser, which is a permissive collector.
    fn push_merge_unchecked(&mut self, range: CellRange) {
        let master = range.master();
        for cell in range.cells() {
            self.masters.entry(cell).or_insert(master);
        }
        self.merges.push(range);
    }

    /// The cell holding the value for `at`, following the master map.
    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        self.cells.get(&self.master_of(at))
    }

    /// The value visible at `at`, following the master map.
    pub fn value(&self, at: CellRef) -> CellValue {
        self.cell(at).map(|c| c.value.clone()).unwrap_or_default()
    }

    /// Set a text value at `at`, resolving to the merge master. The target
    /// cell keeps its style bundle and format-record index.
    pub fn set_text(&mut self, at: CellRef, text: &str) {
        let master = self.master_of(at);
        let cell = self.cells.entry(master).or_default();
        cell.value = CellValue::Text(text.to_string());
    }

    /// Largest referenced row/column, for the dimension record.
    pub(crate) fn extent(&self) -> CellRef {
        let mut max = CellRef::new(1, 1);
        for at in self.cells.keys() {
            max.row = max.row.max(at.row);
            max.col = max.col.max(at.col);
        }
        for row in self.rows.keys() {
            max.row = max.row.max(*row);
        }
        for range in &self.merges {
            max.row = max.row.max(range.end.row);
            max.col = max.col.max(range.end.col);
        }
        max
    }

    /// Parse a worksheet part. Shared-string references are resolved into
    /// owned values; cell styles are resolved from the workbook style table.
    /// Unparsable merge refs are skipped with a warning.
    pub(crate) fn parse(
        name: &str,
        xml: &[u8],
        shared: &[CellValue],
        styles: &StyleTable,
    ) -> FormpressResult<Self> {
        let mut ws = Worksheet::new(name);
        // No trim_text: padded cell text is significant, and stray
        // inter-element whitespace never reaches a value (text events are
        // only consumed inside v/f/t and header/footer slots).
        let mut reader = Reader::from_reader(xml);

        let mut in_sheet_pr = false;
        let mut in_sheet_view = false;
        let mut view = SheetView::default();
        let mut saw_view = false;
        let mut in_header_footer = false;
        let mut hf = HeaderFooter::default();
        let mut saw_hf = false;
        let mut hf_slot: Vec<u8> = Vec::new();

        let mut cell: Option<PendingCell> = None;
        let mut in_v = false;
        let mut in_f = false;
        let mut in_is = false;
        let mut in_run = false;
        let mut in_rph = false;
        let mut in_t = false;
        let mut run_font: Option<Font> = None;

        loop {
            let ev = reader.read_event()?;
            match ev {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let empty = matches!(ev, Event::Empty(_));
                    let tag = e.name().as_ref().to_vec();
                    match tag.as_slice() {
                        b"sheetPr" => {
                            in_sheet_pr = true;
                            if empty {
                                in_sheet_pr = false;
                            }
                        }
                        b"tabColor" if in_sheet_pr => {
                            ws.props.tab_color = Color::from_element(e)?;
                        }
                        b"pageSetUpPr" if in_sheet_pr => {
                            ws.props.fit_to_page = attr_bool(e, b"fitToPage")?;
                        }
                        b"sheetView" => {
                            saw_view = true;
                            view.show_grid_lines =
                                attr(e, b"showGridLines")?.as_deref() != Some("0");
                            view.zoom_scale = attr_u32(e, b"zoomScale")?;
                            view.tab_selected = attr_bool(e, b"tabSelected")?;
                            if !empty {
                                in_sheet_view = true;
                            }
                        }
                        b"pane" if in_sheet_view => {
                            if attr(e, b"state")?.as_deref() == Some("frozen") {
                                view.frozen = Some(FrozenPane {
                                    x_split: attr_u32(e, b"xSplit")?.unwrap_or(0),
                                    y_split: attr_u32(e, b"ySplit")?.unwrap_or(0),
                                    top_left: attr(e, b"topLeftCell")?
                                        .and_then(|r| CellRef::parse(&r).ok()),
                                });
                            }
                        }
                        b"sheetFormatPr" => {
                            ws.format = SheetFormat {
                                default_row_height: attr_f64(e, b"defaultRowHeight")?,
                                default_col_width: attr_f64(e, b"defaultColWidth")?,
                                base_col_width: attr_u32(e, b"baseColWidth")?,
                            };
                        }
                        b"col" => {
                            let min = attr_u32(e, b"min")?.unwrap_or(1);
                            ws.cols.push(ColumnInfo {
                                min,
                                max: attr_u32(e, b"max")?.unwrap_or(min),
                                width: attr_f64(e, b"width")?,
                                custom_width: attr_bool(e, b"customWidth")?,
                                hidden: attr_bool(e, b"hidden")?,
                                outline_level: attr_u32(e, b"outlineLevel")?.unwrap_or(0) as u8,
                                best_fit: attr_bool(e, b"bestFit")?,
                                xf_id: attr_u32(e, b"style")?,
                            });
                        }
                        b"row" => {
                            if let Some(r) = attr_u32(e, b"r")? {
                                let info = RowInfo {
                                    height: attr_f64(e, b"ht")?,
                                    custom_height: attr_bool(e, b"customHeight")?,
                                    hidden: attr_bool(e, b"hidden")?,
                                    outline_level: attr_u32(e, b"outlineLevel")?.unwrap_or(0)
                                        as u8,
                                    xf_id: if attr_bool(e, b"customFormat")? {
                                        attr_u32(e, b"s")?
                                    } else {
                                        None
                                    },
                                };
                                if info != RowInfo::default() {
                                    ws.rows.insert(r, info);
                                } else {
                                    ws.rows.entry(r).or_default();
                                }
                            }
                        }
                        b"c" => {
                            let at = match attr(e, b"r")? {
                                Some(r) => CellRef::parse(&r)?,
                                None => continue,
                            };
                            let pending = PendingCell {
                                at,
                                kind: attr(e, b"t")?.unwrap_or_else(|| "n".into()),
                                xf_id: attr_u32(e, b"s")?,
                                v: None,
                                f: None,
                                inline: Vec::new(),
                                inline_plain: None,
                            };
                            if empty {
                                ws.insert_parsed(pending, shared, styles);
                            } else {
                                cell = Some(pending);
                            }
                        }
                        b"v" if cell.is_some() => in_v = !empty,
                        b"f" if cell.is_some() => {
                            if let Some(c) = cell.as_mut() {
                                c.f = Some(String::new());
                            }
                            in_f = !empty;
                        }
                        b"is" if cell.is_some() => in_is = !empty,
                        b"r" if in_is => {
                            in_run = true;
                            run_font = None;
                        }
                        b"rPr" if in_run => {
                            in_rph = !empty;
                            run_font = Some(Font::default());
                        }
                        b"t" if in_is => {
                            if in_run {
                                if let Some(c) = cell.as_mut() {
                                    c.inline.push(RichRun {
                                        text: String::new(),
                                        font: run_font.clone(),
                                    });
                                }
                            } else if let Some(c) = cell.as_mut() {
                                c.inline_plain = Some(String::new());
                            }
                            in_t = !empty;
                        }
                        b"mergeCell" => {
                            if let Some(r) = attr(e, b"ref")? {
                                match CellRange::parse(&r) {
                                    Ok(range) => ws.push_merge_unchecked(range),
                                    Err(_) => {
                                        warn!(sheet = name, range = %r, "skipping malformed merge ref");
                                    }
                                }
                            }
                        }
                        b"pageMargins" => {
                            let defaults = PageMargins::default();
                            ws.margins = Some(PageMargins {
                                left: attr_f64(e, b"left")?.unwrap_or(defaults.left),
                                right: attr_f64(e, b"right")?.unwrap_or(defaults.right),
                                top: attr_f64(e, b"top")?.unwrap_or(defaults.top),
                                bottom: attr_f64(e, b"bottom")?.unwrap_or(defaults.bottom),
                                header: attr_f64(e, b"header")?.unwrap_or(defaults.header),
                                footer: attr_f64(e, b"footer")?.unwrap_or(defaults.footer),
                            });
                        }
                        b"pageSetup" => {
                            ws.page_setup = Some(PageSetup {
                                paper_size: attr_u32(e, b"paperSize")?,
                                orientation: attr(e, b"orientation")?,
                                scale: attr_u32(e, b"scale")?,
                                fit_to_width: attr_u32(e, b"fitToWidth")?,
                                fit_to_height: attr_u32(e, b"fitToHeight")?,
                            });
                        }
                        b"headerFooter" => {
                            saw_hf = true;
                            hf.different_odd_even = attr_bool(e, b"differentOddEven")?;
                            hf.different_first = attr_bool(e, b"differentFirst")?;
                            if !empty {
                                in_header_footer = true;
                            }
                        }
                        b"oddHeader" | b"oddFooter" | b"evenHeader" | b"evenFooter"
                        | b"firstHeader" | b"firstFooter"
                            if in_header_footer =>
                        {
                            if !empty {
                                hf_slot = tag.clone();
                            }
                        }
                        other if in_rph => {
                            if let Some(f) = run_font.as_mut() {
                                f.apply(other, e)?;
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(ref t) => {
                    let text = t.unescape()?.into_owned();
                    if in_v {
                        if let Some(c) = cell.as_mut() {
                            c.v = Some(text);
                        }
                    } else if in_f {
                        if let Some(c) = cell.as_mut() {
                            c.f = Some(text);
                        }
                    } else if in_t {
                        if let Some(c) = cell.as_mut() {
                            if in_run {
                                if let Some(run) = c.inline.last_mut() {
                                    run.text = text;
                                }
                            } else {
                                c.inline_plain = Some(text);
                            }
                        }
                    } else if in_header_footer && !hf_slot.is_empty() {
                        *hf.slot_mut(&hf_slot) = Some(text);
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"sheetPr" => in_sheet_pr = false,
                    b"sheetView" => in_sheet_view = false,
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            ws.insert_parsed(pending, shared, styles);
                        }
                    }
                    b"v" => in_v = false,
                    b"f" => in_f = false,
                    b"is" => in_is = false,
                    b"r" => in_run = false,
                    b"rPr" => in_rph = false,
                    b"t" => in_t = false,
                    b"headerFooter" => in_header_footer = false,
                    b"oddHeader" | b"oddFooter" | b"evenHeader" | b"evenFooter"
                    | b"firstHeader" | b"firstFooter" => hf_slot.clear(),
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if saw_view {
            ws.view = Some(view);
        }
        if saw_hf {
            ws.header_footer = Some(hf);
        }
        Ok(ws)
    }

    fn insert_parsed(&mut self, pending: PendingCell, shared: &[CellValue], styles: &StyleTable) {
        let PendingCell {
            at,
            kind,
            xf_id,
            v,
            f,
            inline,
            inline_plain,
        } = pending;

        // A shared-formula dependent carries an empty <f/>; it degrades to
        // its cached value.
        let value = if let Some(expr) = f.filter(|expr| !expr.is_empty()) {
            CellValue::Formula {
                expr,
                cached: v,
                text_result: kind == "str",
            }
        } else {
            match kind.as_str() {
                "s" => {
                    let idx = v.and_then(|s| s.parse::<usize>().ok());
                    idx.and_then(|i| shared.get(i).cloned())
                        .unwrap_or(CellValue::Empty)
                }
                "inlineStr" => {
                    if !inline.is_empty() {
                        CellValue::RichText(inline)
                    } else {
                        CellValue::Text(inline_plain.unwrap_or_default())
                    }
                }
                "str" => CellValue::Text(v.unwrap_or_default()),
                "b" => CellValue::Bool(v.as_deref() == Some("1")),
                "e" => CellValue::Error(v.unwrap_or_default()),
                _ => match v.and_then(|s| s.parse::<f64>().ok()) {
                    Some(n) => CellValue::Number(n),
                    None => CellValue::Empty,
                },
            }
        };

        if value == CellValue::Empty && xf_id.is_none() {
            return;
        }
        let style = xf_id.map(|id| styles.resolve(id));
        self.cells.insert(
            at,
            Cell {
                value,
                xf_id,
                style,
            },
        );
    }
}

impl HeaderFooter {
    fn slot_mut(&mut self, tag: &[u8]) -> &mut Option<String> {
        match tag {
            b"oddHeader" => &mut self.odd_header,
            b"oddFooter" => &mut self.odd_footer,
            b"evenHeader" => &mut self.even_header,
            b"evenFooter" => &mut self.even_footer,
            b"firstHeader" => &mut self.first_header,
            _ => &mut self.first_footer,
        }
    }
}

/// Cell under construction during the sheetData walk.
struct PendingCell {
    at: CellRef,
    kind: String,
    xf_id: Option<u32>,
    v: Option<String>,
    f: Option<String>,
    inline: Vec<RichRun>,
    inline_plain: Option<String>,
}
