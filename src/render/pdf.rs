//! Draws a `Layout` with printpdf.

use crate::error::Res;
use crate::render::{Layout, Op, Style, PAGE_HEIGHT, PAGE_WIDTH};
use anyhow::{anyhow, Context};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

pub const FONT_REGULAR: &str = "DejaVuSans.ttf";
pub const FONT_BOLD: &str = "DejaVuSans-Bold.ttf";
pub const FONT_ITALIC: &str = "DejaVuSans-Oblique.ttf";

const LAYER: &str = "Layer 1";
/// Border width in points.
const BORDER_WIDTH: f32 = 0.5;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn builtin(doc: &PdfDocumentReference) -> Res<Self> {
        let add = |font: BuiltinFont| {
            doc.add_builtin_font(font)
                .map_err(|e| anyhow!("Unable to add a builtin font: {e}"))
        };
        Ok(Self {
            regular: add(BuiltinFont::Helvetica)?,
            bold: add(BuiltinFont::HelveticaBold)?,
            italic: add(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn external(doc: &PdfDocumentReference, dir: &Path) -> Res<Self> {
        let add = |name: &str| -> Res<IndirectFontRef> {
            let path = dir.join(name);
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Unable to read the font {}", path.display()))?;
            doc.add_external_font(bytes.as_slice())
                .map_err(|e| anyhow!("Unable to load the font {}: {e}", path.display()))
        };
        Ok(Self {
            regular: add(FONT_REGULAR)?,
            bold: add(FONT_BOLD)?,
            italic: add(FONT_ITALIC)?,
        })
    }

    fn get(&self, style: Style) -> &IndirectFontRef {
        match style {
            Style::Regular => &self.regular,
            Style::Bold => &self.bold,
            Style::Italic => &self.italic,
        }
    }
}

/// Draws `layout` and returns the bytes of the PDF file. The DejaVu fonts are read from
/// `fonts_dir` when it is given.
pub fn write_pdf(layout: &Layout, fonts_dir: Option<&Path>) -> Res<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(&layout.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);

    let fonts = match fonts_dir {
        Some(dir) => Fonts::external(&doc, dir)?,
        None => Fonts::builtin(&doc)?,
    };

    for (ix, page) in layout.pages.iter().enumerate() {
        let (page_index, layer_index) = if ix == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER)
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        layer.set_outline_thickness(BORDER_WIDTH);
        for op in &page.ops {
            draw(&layer, &fonts, op);
        }
    }
    debug!("Drew {} page(s)", layout.pages.len());

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|e| anyhow!("Unable to write the PDF document: {e}"))?;
    writer
        .into_inner()
        .map_err(|e| anyhow!("Unable to flush the PDF document: {e}"))
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, op: &Op) {
    match op {
        Op::Text {
            x,
            y,
            size,
            style,
            text,
        } => {
            layer.use_text(
                text.as_str(),
                *size,
                Mm(*x),
                Mm(PAGE_HEIGHT - y),
                fonts.get(*style),
            );
        }
        Op::Rect { x, y, w, h } => {
            let (top, bottom) = (PAGE_HEIGHT - y, PAGE_HEIGHT - y - h);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x), Mm(top)), false),
                    (Point::new(Mm(x + w), Mm(top)), false),
                    (Point::new(Mm(x + w), Mm(bottom)), false),
                    (Point::new(Mm(*x), Mm(bottom)), false),
                ],
                is_closed: true,
            });
        }
    }
}
