//! Turns an `Invoice` into a PDF document.
//!
//! Rendering happens in two steps. `layout_invoice` computes every piece of text and every cell
//! border on A4 pages, measured in millimetres from the top-left corner. `pdf::write_pdf` then
//! draws that layout with printpdf. Only the second step depends on printpdf, so the page
//! geometry can be checked without parsing PDF output.

mod pdf;

use crate::error::{ErrorType, IntoResult};
use crate::model::{as_given, fixed2, Invoice};
use crate::Result;
use serde::Serialize;
use std::path::Path;

pub use pdf::{write_pdf, FONT_BOLD, FONT_ITALIC, FONT_REGULAR};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
/// Content that would end below this line moves to a new page.
const BREAK_AT: f32 = PAGE_HEIGHT - 20.0;
/// Horizontal padding inside a cell.
const CELL_PADDING: f32 = 1.0;

const TITLE_SIZE: f32 = 14.0;
const TEXT_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;

const TITLE: &str = "Facture de Fermage";
const TABLE_HEADERS: [&str; 6] = [
    "N° parcelle",
    "Surface (ha)",
    "Quantité (qx)",
    "Prix ajusté (€)",
    "Impôts (%)",
    "Total HT (€)",
];
const COLUMN_WIDTHS: [f32; 6] = [35.0, 30.0, 30.0, 30.0, 30.0, 30.0];
const ROW_HEIGHT: f32 = 10.0;

/// Builtin font family variant, or the matching DejaVu file when fonts are configured.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum Style {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Align {
    Left,
    Center,
    Right,
}

/// One drawing instruction. `y` grows downwards from the top of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Op {
    /// Text whose baseline starts at `(x, y)`.
    Text {
        x: f32,
        y: f32,
        size: f32,
        style: Style,
        text: String,
    },
    /// The border of a cell whose top-left corner is `(x, y)`.
    Rect { x: f32, y: f32, w: f32, h: f32 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub ops: Vec<Op>,
}

impl Page {
    /// The text of the page, one entry per text op, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            Op::Text { text, .. } => Some(text.as_str()),
            Op::Rect { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub pages: Vec<Page>,
}

/// Lays out and writes the invoice as PDF bytes. When `fonts_dir` is given, the DejaVu fonts in it
/// are embedded, otherwise the builtin Helvetica fonts are used.
pub fn render_pdf(invoice: &Invoice, fonts_dir: Option<&Path>) -> Result<Vec<u8>> {
    let layout = layout_invoice(invoice);
    write_pdf(&layout, fonts_dir).pub_result(ErrorType::Render)
}

/// Computes the pages of the invoice.
pub fn layout_invoice(invoice: &Invoice) -> Layout {
    let date = invoice.issued_on().format("%d/%m/%Y").to_string();
    let mut w = Writer::new(date.clone());

    // Owner and tenant side by side.
    let (owner, tenant) = (invoice.owner(), invoice.tenant());
    let half = 100.0;
    w.cell(half, 8.0, "PROPRIÉTAIRE :", Style::Bold, Align::Left, false);
    w.cell(0.0, 8.0, "FERMIER :", Style::Bold, Align::Left, false);
    w.ln(8.0);
    for (left, right) in [
        (&owner.name, &tenant.name),
        (&owner.address, &tenant.address),
        (&owner.city, &tenant.city),
    ] {
        w.cell(half, 8.0, left, Style::Regular, Align::Left, false);
        w.cell(0.0, 8.0, right, Style::Regular, Align::Left, false);
        w.ln(8.0);
    }
    w.ln(20.0);

    let place = format!("{}, le {date}", owner.town());
    w.cell(0.0, 8.0, &place, Style::Regular, Align::Left, false);
    w.ln(8.0);
    w.ln(10.0);

    let parcels = invoice
        .parcels()
        .iter()
        .map(|p| p.parcel.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let areas = invoice
        .parcels()
        .iter()
        .map(|p| as_given(p.area))
        .collect::<Vec<_>>()
        .join(", ");
    w.write(
        10.0,
        Style::Regular,
        &format!(
            "{} doit le fermage de l'année {} pour les parcelles {parcels} de surface respective \
            {areas} ha.\n",
            tenant.name,
            invoice.year()
        ),
    );
    w.write(
        10.0,
        Style::Regular,
        "Le tarif est calculé par rapport au prix du quintal de référence : ",
    );
    w.write(
        10.0,
        Style::Bold,
        &format!("{} € ", fixed2(invoice.reference_price())),
    );
    w.write(
        10.0,
        Style::Regular,
        "ajusté par l'indice actuel d'ajustement de ",
    );
    w.write(
        10.0,
        Style::Bold,
        &format!("{}%\n", as_given(invoice.adjustment_index())),
    );

    if w.needs_break(2.0 * ROW_HEIGHT) {
        w.new_page();
    }
    w.table_header();
    for line in invoice.lines() {
        if w.needs_break(ROW_HEIGHT) {
            w.new_page();
            w.table_header();
        }
        let cells = [
            line.parcel.clone(),
            fixed2(line.area),
            fixed2(line.quantity),
            fixed2(line.adjusted_price),
            as_given(line.tax_rate),
            line.amount_ht.to_string(),
        ];
        for (text, width) in cells.iter().zip(COLUMN_WIDTHS) {
            w.cell(width, ROW_HEIGHT, text, Style::Regular, Align::Center, true);
        }
        w.ln(ROW_HEIGHT);
    }

    let label_width = COLUMN_WIDTHS[4];
    let value_width = COLUMN_WIDTHS[5];
    let offset: f32 = COLUMN_WIDTHS[..4].iter().sum();
    for (label, value) in [
        ("Total HT (€)", invoice.total_ht()),
        ("Total TTC (€)", invoice.total_ttc()),
    ] {
        if w.needs_break(ROW_HEIGHT) {
            w.new_page();
        }
        w.cell(offset, ROW_HEIGHT, "", Style::Bold, Align::Center, false);
        w.cell(label_width, ROW_HEIGHT, label, Style::Bold, Align::Right, true);
        let value = value.to_string();
        w.cell(value_width, ROW_HEIGHT, &value, Style::Bold, Align::Center, true);
        w.ln(ROW_HEIGHT);
    }

    w.finish()
}

/// Keeps the current position and font size on the current page, the way a flowing PDF writer
/// does.
struct Writer {
    date: String,
    done: Vec<Page>,
    page: Page,
    x: f32,
    y: f32,
    size: f32,
}

impl Writer {
    fn new(date: String) -> Self {
        let mut writer = Self {
            date,
            done: Vec::new(),
            page: Page::default(),
            x: MARGIN,
            y: MARGIN,
            size: TEXT_SIZE,
        };
        writer.start_page();
        writer
    }

    fn start_page(&mut self) {
        self.x = MARGIN;
        self.y = MARGIN;
        self.size = TITLE_SIZE;
        self.cell(0.0, 10.0, TITLE, Style::Bold, Align::Center, false);
        self.ln(10.0);
        self.size = TEXT_SIZE;
        let date = format!("Date : {}", self.date);
        self.cell(0.0, 10.0, &date, Style::Regular, Align::Center, false);
        self.ln(10.0);
        self.ln(10.0);
    }

    fn finish_page(&mut self) {
        let number = self.done.len() + 1;
        self.x = MARGIN;
        self.y = PAGE_HEIGHT - 15.0;
        self.size = FOOTER_SIZE;
        self.cell(0.0, 10.0, &format!("Page {number}"), Style::Italic, Align::Center, false);
        self.size = TEXT_SIZE;
        self.done.push(std::mem::take(&mut self.page));
    }

    fn new_page(&mut self) {
        self.finish_page();
        self.start_page();
    }

    fn finish(mut self) -> Layout {
        self.finish_page();
        Layout {
            title: TITLE.to_string(),
            pages: self.done,
        }
    }

    fn needs_break(&self, h: f32) -> bool {
        self.y + h > BREAK_AT
    }

    fn ln(&mut self, h: f32) {
        self.x = MARGIN;
        self.y += h;
    }

    /// Draws a cell at the current position and moves right. A width of zero extends the cell to
    /// the right margin. Text is centered vertically and padded horizontally.
    fn cell(&mut self, w: f32, h: f32, text: &str, style: Style, align: Align, border: bool) {
        let w = if w <= 0.0 {
            PAGE_WIDTH - MARGIN - self.x
        } else {
            w
        };
        let (x, y) = (self.x, self.y);
        if border {
            self.page.ops.push(Op::Rect { x, y, w, h });
        }
        if !text.is_empty() {
            let width = text_width(text, self.size, style);
            let text_x = match align {
                Align::Left => x + CELL_PADDING,
                Align::Center => x + (w - width) / 2.0,
                Align::Right => x + w - CELL_PADDING - width,
            };
            self.page.ops.push(Op::Text {
                x: text_x,
                y: self.baseline(h),
                size: self.size,
                style,
                text: text.to_string(),
            });
        }
        self.x += w;
    }

    fn baseline(&self, h: f32) -> f32 {
        self.y + h / 2.0 + 0.3 * pt_to_mm(self.size)
    }

    /// Flowing text: words are placed from the current position and wrap at the right margin.
    /// A `\n` moves to the start of the next line.
    fn write(&mut self, h: f32, style: Style, text: &str) {
        let right = PAGE_WIDTH - MARGIN;
        let mut run = String::new();
        let mut run_x = self.x;

        for (ix, paragraph) in text.split('\n').enumerate() {
            if ix > 0 {
                self.flush_run(&mut run, run_x, h, style);
                self.ln(h);
                if self.needs_break(h) {
                    self.new_page();
                }
                run_x = self.x;
            }
            for word in split_keep_spaces(paragraph) {
                let width = text_width(word, self.size, style);
                if self.x + width > right && self.x > MARGIN {
                    self.flush_run(&mut run, run_x, h, style);
                    self.ln(h);
                    if self.needs_break(h) {
                        self.new_page();
                    }
                    run_x = self.x;
                    if word.trim().is_empty() {
                        continue;
                    }
                }
                run.push_str(word);
                self.x += width;
            }
        }
        self.flush_run(&mut run, run_x, h, style);
    }

    fn flush_run(&mut self, run: &mut String, x: f32, h: f32, style: Style) {
        let text = run.trim_end();
        if !text.is_empty() {
            let op = Op::Text {
                x,
                y: self.baseline(h),
                size: self.size,
                style,
                text: text.to_string(),
            };
            self.page.ops.push(op);
        }
        run.clear();
    }

    fn table_header(&mut self) {
        for (text, width) in TABLE_HEADERS.iter().zip(COLUMN_WIDTHS) {
            self.cell(width, ROW_HEIGHT, text, Style::Bold, Align::Center, true);
        }
        self.ln(ROW_HEIGHT);
    }
}

/// Splits `s` into words, each keeping the spaces that follow it.
fn split_keep_spaces(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    for (i, c) in s.char_indices() {
        if c == ' ' {
            in_space = true;
        } else if in_space {
            words.push(&s[start..i]);
            start = i;
            in_space = false;
        }
    }
    if start < s.len() {
        words.push(&s[start..]);
    }
    words
}

fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

/// Approximate width in millimetres of `text` in Helvetica, from its per-character advance widths.
fn text_width(text: &str, size: f32, style: Style) -> f32 {
    let units: u32 = text.chars().map(char_width).sum();
    let bold = if style == Style::Bold { 1.05 } else { 1.0 };
    units as f32 / 1000.0 * pt_to_mm(size) * bold
}

fn char_width(c: char) -> u32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' => 222,
        ' ' | '.' | ',' | ':' | ';' | '/' | 'f' | 't' | 'I' | '!' => 278,
        'r' | '(' | ')' | '-' | '°' => 333,
        'm' | 'M' => 833,
        'w' | 'C' | 'D' | 'G' | 'H' | 'N' | 'O' | 'Q' | 'R' | 'U' => 722,
        'W' => 944,
        '%' => 889,
        'A'..='Z' => 667,
        _ => 556,
    }
}
