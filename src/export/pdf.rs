//! PDF export
//!
//! A4 landscape pages with the table title, a header row repeated on every
//! page and a page footer. Uses the builtin Helvetica fonts so no font file
//! is embedded.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::reports::ReportTable;

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const TITLE_SIZE: f32 = 14.0;
const TEXT_SIZE: f32 = 8.0;
const ROW_HEIGHT: f32 = 5.5;

/// Rough Helvetica advance at `TEXT_SIZE`, in millimetres per character
const CHAR_WIDTH: f32 = 1.6;

fn pdf_error(e: impl std::fmt::Display) -> CheckdeskError {
    CheckdeskError::Export(format!("PDF: {}", e))
}

/// Width of each column, proportional to its longest cell
fn column_widths(table: &ReportTable) -> Vec<f32> {
    let available = PAGE_WIDTH - 2.0 * MARGIN;
    let lengths: Vec<f32> = table
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(1)
                .clamp(4, 40) as f32
        })
        .collect();
    let total: f32 = lengths.iter().sum();
    lengths.iter().map(|len| available * len / total).collect()
}

/// Cut `text` so it fits `width` millimetres
fn fit(text: &str, width: f32) -> String {
    let max_chars = ((width / CHAR_WIDTH) as usize).max(2);
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars - 1).collect();
        cut.push('~');
        cut
    }
}

struct PageWriter<'a> {
    table: &'a ReportTable,
    widths: Vec<f32>,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PageWriter<'_> {
    fn row(&self, layer: &PdfLayerReference, cells: &[String], y: f32, font: &IndirectFontRef) {
        let mut x = MARGIN;
        for (col, width) in self.widths.iter().enumerate() {
            let cell = cells.get(col).map(String::as_str).unwrap_or("");
            let text = fit(cell, *width);
            let text_x = if self.table.is_numeric(col) {
                // Right-align numbers within the column
                x + width - 1.0 - text.chars().count() as f32 * CHAR_WIDTH
            } else {
                x
            };
            layer.use_text(text, TEXT_SIZE, Mm(text_x.max(x)), Mm(y), font);
            x += width;
        }
    }

    fn header(&self, layer: &PdfLayerReference, page: usize, pages: usize) -> f32 {
        let mut y = PAGE_HEIGHT - MARGIN;
        layer.use_text(self.table.title.clone(), TITLE_SIZE, Mm(MARGIN), Mm(y), &self.bold);
        y -= ROW_HEIGHT * 2.0;
        self.row(layer, &self.table.headers, y, &self.bold);
        layer.use_text(
            format!("Page {} of {}", page, pages),
            TEXT_SIZE,
            Mm(PAGE_WIDTH - MARGIN - 25.0),
            Mm(MARGIN / 2.0),
            &self.regular,
        );
        y - ROW_HEIGHT * 1.5
    }
}

/// Rows that fit under the title and header of one page
fn rows_per_page() -> usize {
    let usable = PAGE_HEIGHT - 2.0 * MARGIN - ROW_HEIGHT * 3.5;
    (usable / ROW_HEIGHT) as usize
}

/// Write `table` to a paginated PDF at `path`
pub fn write_table_pdf(table: &ReportTable, path: &Path) -> CheckdeskResult<()> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(table.title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
    let writer = PageWriter {
        table,
        widths: column_widths(table),
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
    };

    let per_page = rows_per_page();
    let chunks: Vec<&[Vec<String>]> = if table.rows.is_empty() {
        vec![&table.rows[..0]]
    } else {
        table.rows.chunks(per_page).collect()
    };
    let pages = chunks.len();

    for (idx, chunk) in chunks.into_iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
            doc.get_page(page).get_layer(layer)
        };

        let mut y = writer.header(&layer, idx + 1, pages);
        if chunk.is_empty() {
            layer.use_text("No data.", TEXT_SIZE, Mm(MARGIN), Mm(y), &writer.regular);
        }
        for row in chunk {
            writer.row(&layer, row, y, &writer.regular);
            y -= ROW_HEIGHT;
        }
    }

    let file = File::create(path)
        .map_err(|e| CheckdeskError::Export(format!("Cannot create {}: {}", path.display(), e)))?;
    doc.save(&mut BufWriter::new(file)).map_err(pdf_error)?;
    Ok(())
}
