//! Report renderers: paginated PDF tables and plain text.

use crate::report::{DateSection, Report, ReportError};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub const REPORT_TITLE: &str = "Attendance Report";

/// Writes a [`Report`] to a file.
pub trait ReportRenderer {
    fn render(&self, report: &Report, path: &Path) -> Result<(), ReportError>;
}

// A4 portrait, millimetres.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const LINE_HEIGHT: f32 = 10.0;
const CELL_WIDTH: f32 = 90.0;
const CELL_TEXT_INSET: f32 = 2.0;
const CELL_BASELINE: f32 = 3.5;
const PT_TO_MM: f32 = 0.3528;
const HELVETICA_AVG_ADVANCE: f32 = 0.55;

/// PDF output: a centred title, then per date a heading and a bordered
/// two-column (Name, Time) table. Pages break automatically.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReportRenderer;

impl ReportRenderer for PdfReportRenderer {
    fn render(&self, report: &Report, path: &Path) -> Result<(), ReportError> {
        let (doc, page, layer) = PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;

        {
            let mut pen = Pen {
                layer: doc.get_page(page).get_layer(layer),
                doc: &doc,
                top: MARGIN,
            };

            pen.centered(REPORT_TITLE, 16.0, &bold);
            pen.advance(LINE_HEIGHT);

            for section in &report.sections {
                pen.table(section, &regular, &bold);
                pen.advance(LINE_HEIGHT);
            }
        }

        let file = File::create(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        doc.save(&mut BufWriter::new(file)).map_err(pdf_error)?;
        Ok(())
    }
}

fn pdf_error(e: printpdf::Error) -> ReportError {
    ReportError::Pdf(e.to_string())
}

/// Layout cursor. `top` is the distance from the top edge of the page.
struct Pen<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    top: f32,
}

impl Pen<'_> {
    fn advance(&mut self, by: f32) {
        self.top += by;
    }

    /// Start a new page unless `needed` millimetres still fit.
    fn reserve(&mut self, needed: f32) {
        if self.top + needed > PAGE_HEIGHT - MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.top = MARGIN;
        }
    }

    fn baseline(&self) -> f32 {
        PAGE_HEIGHT - self.top - LINE_HEIGHT + CELL_BASELINE
    }

    fn centered(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        let width = text.chars().count() as f32 * size * HELVETICA_AVG_ADVANCE * PT_TO_MM;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
        self.layer.use_text(text, size, Mm(x), Mm(self.baseline()), font);
        self.advance(LINE_HEIGHT);
    }

    fn text_line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.baseline()), font);
        self.advance(LINE_HEIGHT);
    }

    fn row(&mut self, cells: [&str; 2], size: f32, font: &IndirectFontRef) {
        let bottom = PAGE_HEIGHT - self.top - LINE_HEIGHT;
        for (i, text) in cells.iter().enumerate() {
            let left = MARGIN + i as f32 * CELL_WIDTH;
            self.layer.add_line(cell_border(left, bottom));
            self.layer.use_text(*text, size, Mm(left + CELL_TEXT_INSET), Mm(bottom + CELL_BASELINE), font);
        }
        self.advance(LINE_HEIGHT);
    }

    fn table(&mut self, section: &DateSection, regular: &IndirectFontRef, bold: &IndirectFontRef) {
        // Heading, header row and at least one data row stay together.
        self.reserve(3.0 * LINE_HEIGHT);
        self.text_line(&format!("Date: {}", section.date), 12.0, bold);
        self.row(["Name", "Time"], 10.0, bold);

        for r in &section.rows {
            self.reserve(LINE_HEIGHT);
            self.row([&r.name, &r.time], 10.0, regular);
        }
    }
}

fn cell_border(left: f32, bottom: f32) -> Line {
    let corner = |x: f32, y: f32| (Point::new(Mm(x), Mm(y)), false);
    Line {
        points: vec![
            corner(left, bottom),
            corner(left + CELL_WIDTH, bottom),
            corner(left + CELL_WIDTH, bottom + LINE_HEIGHT),
            corner(left, bottom + LINE_HEIGHT),
        ],
        is_closed: true,
    }
}

/// Plain-text tables, for terminals and quick checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportRenderer;

impl TextReportRenderer {
    pub fn format(report: &Report) -> String {
        let mut out = format!("{REPORT_TITLE}\n");
        for section in &report.sections {
            let width = section
                .rows
                .iter()
                .map(|r| r.name.chars().count())
                .max()
                .unwrap_or(0)
                .max("Name".len())
                + 2;
            out.push_str(&format!("\nDate: {}\n", section.date));
            out.push_str(&format!("{:<width$}{}\n", "Name", "Time"));
            for r in &section.rows {
                out.push_str(&format!("{:<width$}{}\n", r.name, r.time));
            }
        }
        out
    }
}

impl ReportRenderer for TextReportRenderer {
    fn render(&self, report: &Report, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, Self::format(report)).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportRow;

    fn sample() -> Report {
        Report {
            sections: vec![DateSection {
                date: "2024-01-01".into(),
                rows: vec![
                    ReportRow { name: "Alice".into(), time: "09:00:00".into() },
                    ReportRow { name: "Bob".into(), time: "09:10:00".into() },
                ],
            }],
        }
    }

    #[test]
    fn test_text_format() {
        let text = TextReportRenderer::format(&sample());
        assert_eq!(
            text,
            "Attendance Report\n\nDate: 2024-01-01\nName   Time\nAlice  09:00:00\nBob    09:10:00\n"
        );
    }

    #[test]
    fn test_pdf_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        PdfReportRenderer.render(&sample(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_paginates_long_tables() {
        let rows = (0..120)
            .map(|i| ReportRow { name: format!("Student {i:03}"), time: "09:00:00".into() })
            .collect();
        let report = Report { sections: vec![DateSection { date: "2024-01-01".into(), rows }] };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.pdf");
        PdfReportRenderer.render(&report, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_cell_border_is_closed_rectangle() {
        let line = cell_border(10.0, 20.0);
        assert!(line.is_closed);
        assert_eq!(line.points.len(), 4);
    }
}
