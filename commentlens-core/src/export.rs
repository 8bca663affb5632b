//! Result table export
//!
//! CSV, XLSX and a plain PDF report share the column layout of
//! [`ResultTable::headers`]. Each format is written independently: a failure
//! in one (typically a missing PDF font) never stops the others.

use crate::errors::{AnalyzerError, AnalyzerResult};
use crate::table::{Cell, ResultTable};
use printpdf::{Mm, PdfDocument};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_FONT_FILE: &str = "DejaVuSans.ttf";

// A4 portrait, in millimetres
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 5.0;
/// Characters per report line before wrapping
const WRAP_WIDTH: usize = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Pdf];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn to_csv_bytes(table: &ResultTable) -> AnalyzerResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.headers())
        .map_err(|e| AnalyzerError::export("csv", e))?;
    for row in table.rows() {
        writer
            .write_record(table.row_cells(row).iter().map(Cell::to_string))
            .map_err(|e| AnalyzerError::export("csv", e))?;
    }
    writer
        .into_inner()
        .map_err(|e| AnalyzerError::export("csv", e.error()))
}

pub fn to_xlsx_bytes(table: &ResultTable) -> AnalyzerResult<Vec<u8>> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| AnalyzerError::export("xlsx", e);

    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME).map_err(xlsx_err)?;

        let bold = Format::new().set_bold();
        for (col, header) in table.headers().iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, header, &bold)
                .map_err(xlsx_err)?;
        }

        for (index, row) in table.rows().iter().enumerate() {
            let row_num = (index + 1) as u32;
            for (col, cell) in table.row_cells(row).into_iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row_num, col, text).map_err(xlsx_err)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row_num, col, n).map_err(xlsx_err)?;
                    }
                    Cell::Blank => {}
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}

/// Lines of the textual report, before wrapping and pagination
pub fn report_lines(table: &ResultTable) -> Vec<String> {
    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(table.headers().join(" | "));
    for row in table.rows() {
        let cells: Vec<String> = table
            .row_cells(row)
            .into_iter()
            .map(|cell| match cell {
                Cell::Number(n) => format!("{n:.4}"),
                other => other.to_string(),
            })
            .collect();
        lines.push(cells.join(" | "));
    }
    lines
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Render the report as a PDF. The font file must exist; it is embedded so
/// that non-Latin comments survive.
pub fn to_pdf_bytes(table: &ResultTable, title: &str, font_path: &Path) -> AnalyzerResult<Vec<u8>> {
    if !font_path.is_file() {
        return Err(AnalyzerError::ResourceMissing {
            resource: "PDF font".to_string(),
            path: font_path.to_path_buf(),
        });
    }
    let font_bytes = std::fs::read(font_path)?;

    let heading = format!("{title} Comments");
    let (doc, first_page, first_layer) =
        PdfDocument::new(&heading, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_external_font(font_bytes.as_slice())
        .map_err(|e| AnalyzerError::export("pdf", e))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.use_text(heading.clone(), TITLE_SIZE, Mm(MARGIN), Mm(PAGE_HEIGHT - MARGIN), &font);
    let mut y = PAGE_HEIGHT - MARGIN - 2.0 * LINE_HEIGHT;

    for (index, line) in report_lines(table).iter().enumerate() {
        for chunk in wrap_line(line, WRAP_WIDTH) {
            if y < MARGIN {
                let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                layer = doc.get_page(page).get_layer(page_layer);
                y = PAGE_HEIGHT - MARGIN;
            }
            layer.use_text(chunk, BODY_SIZE, Mm(MARGIN), Mm(y), &font);
            y -= LINE_HEIGHT;
        }
        // Gap after the header and between rows
        y -= if index == 0 { LINE_HEIGHT / 2.0 } else { LINE_HEIGHT / 5.0 };
    }

    doc.save_to_bytes()
        .map_err(|e| AnalyzerError::export("pdf", e))
}

/// Result of writing one format
#[derive(Debug)]
pub struct ExportOutcome {
    pub format: ExportFormat,
    pub result: AnalyzerResult<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportReport {
    pub fn written(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(PathBuf::as_path))
            .collect()
    }

    pub fn failures(&self) -> Vec<(ExportFormat, &AnalyzerError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.format, e)))
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Where and how to write exports
#[derive(Debug, Clone)]
pub struct ExportTarget<'a> {
    pub output_dir: &'a Path,
    pub file_name: &'a str,
    pub font_path: Option<&'a Path>,
}

impl ExportTarget<'_> {
    pub fn path_for(&self, format: ExportFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.file_name, format.extension()))
    }
}

fn export_one(table: &ResultTable, format: ExportFormat, target: &ExportTarget) -> AnalyzerResult<PathBuf> {
    let bytes = match format {
        ExportFormat::Csv => to_csv_bytes(table)?,
        ExportFormat::Xlsx => to_xlsx_bytes(table)?,
        ExportFormat::Pdf => {
            let font_path = target
                .font_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_FILE));
            to_pdf_bytes(table, target.file_name, &font_path)?
        }
    };

    let path = target.path_for(format);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Write every requested format. Never short-circuits.
pub fn export_all(table: &ResultTable, formats: &[ExportFormat], target: &ExportTarget) -> ExportReport {
    if let Err(e) = std::fs::create_dir_all(target.output_dir) {
        tracing::warn!(
            "⚠️  Could not create output directory {}: {e}",
            target.output_dir.display()
        );
    }

    let mut report = ExportReport::default();
    for format in formats {
        let result = export_one(table, *format, target);
        match &result {
            Ok(path) => tracing::info!("💾 {} written to {}", format, path.display()),
            Err(e) => tracing::warn!("⚠️  {} export skipped: {e}", format),
        }
        report.outcomes.push(ExportOutcome {
            format: *format,
            result,
        });
    }
    report
}
