use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column header of the text column
pub const MESSAGE_COLUMN: &str = "Message";
pub const CATEGORY_COLUMN: &str = "Category";
pub const POSITIVE_PCT_COLUMN: &str = "Positive %";
pub const NEGATIVE_PCT_COLUMN: &str = "Negative %";

/// Typed cell value shared by every exporter and the console renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Blank => Ok(()),
        }
    }
}

/// Ordered classification results: the unit of display and export.
///
/// Views (`positive`, `negative`, `needs_attention`, partitions) borrow rows
/// from the table and never reorder or copy them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTable {
    dimensions: Vec<ClassifierKind>,
    rows: Vec<ClassificationResult>,
}

impl ResultTable {
    pub fn new(dimensions: Vec<ClassifierKind>) -> Self {
        Self {
            dimensions,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ClassificationResult) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ClassificationResult] {
        &self.rows
    }

    pub fn dimensions(&self) -> &[ClassifierKind] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_sentiment(&self) -> bool {
        self.dimensions.contains(&ClassifierKind::Sentiment)
    }

    /// Primary category: the first dimension's label in title case, or
    /// `ERROR` for failed rows.
    pub fn category(&self, row: &ClassificationResult) -> String {
        let primary = match self.dimensions.first() {
            Some(kind) => *kind,
            None => return ERROR_LABEL.to_string(),
        };
        match row.prediction(primary) {
            Some(prediction) if prediction.is_sentinel() => ERROR_LABEL.to_string(),
            Some(prediction) => title_case(&prediction.label),
            None => ERROR_LABEL.to_string(),
        }
    }

    fn with_label(&self, kind: ClassifierKind, label: &str) -> Vec<&ClassificationResult> {
        self.rows
            .iter()
            .filter(|row| {
                !row.is_failed()
                    && row
                        .prediction(kind)
                        .map(|p| p.has_label(label))
                        .unwrap_or(false)
            })
            .collect()
    }

    pub fn positive(&self) -> Vec<&ClassificationResult> {
        self.with_label(ClassifierKind::Sentiment, "POSITIVE")
    }

    pub fn negative(&self) -> Vec<&ClassificationResult> {
        self.with_label(ClassifierKind::Sentiment, "NEGATIVE")
    }

    pub fn toxic(&self) -> Vec<&ClassificationResult> {
        self.with_label(ClassifierKind::Toxicity, "toxic")
    }

    pub fn failed(&self) -> Vec<&ClassificationResult> {
        self.rows.iter().filter(|row| row.is_failed()).collect()
    }

    /// Rows with negative sentiment OR a toxic label, in table order
    pub fn needs_attention(&self) -> Vec<&ClassificationResult> {
        self.rows
            .iter()
            .filter(|row| {
                !row.is_failed()
                    && (row
                        .prediction(ClassifierKind::Sentiment)
                        .map(|p| p.has_label("NEGATIVE"))
                        .unwrap_or(false)
                        || row
                            .prediction(ClassifierKind::Toxicity)
                            .map(|p| p.has_label("toxic"))
                            .unwrap_or(false))
            })
            .collect()
    }

    /// Disjoint cover of the table by category, categories in first-seen order
    pub fn partition_by_category(&self) -> Vec<(String, Vec<&ClassificationResult>)> {
        let mut partitions: Vec<(String, Vec<&ClassificationResult>)> = Vec::new();
        for row in &self.rows {
            let category = self.category(row);
            match partitions.iter_mut().find(|(name, _)| *name == category) {
                Some((_, members)) => members.push(row),
                None => partitions.push((category, vec![row])),
            }
        }
        partitions
    }

    pub fn category_counts(&self) -> Vec<(String, usize)> {
        self.partition_by_category()
            .into_iter()
            .map(|(category, rows)| (category, rows.len()))
            .collect()
    }

    // ===== COLUMN LAYOUT =====

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![MESSAGE_COLUMN.to_string()];
        for kind in &self.dimensions {
            headers.push(kind.display_name().to_string());
            headers.push(format!("{}_Score", kind.display_name()));
        }
        if self.has_sentiment() {
            headers.push(POSITIVE_PCT_COLUMN.to_string());
            headers.push(NEGATIVE_PCT_COLUMN.to_string());
        }
        headers.push(CATEGORY_COLUMN.to_string());
        headers
    }

    /// Cells of `row`, aligned with [`ResultTable::headers`]
    pub fn row_cells(&self, row: &ClassificationResult) -> Vec<Cell> {
        let mut cells = vec![Cell::Text(row.text.clone())];
        for kind in &self.dimensions {
            match row.prediction(*kind) {
                Some(prediction) => {
                    cells.push(Cell::Text(prediction.label));
                    cells.push(Cell::Number(prediction.score));
                }
                None => {
                    cells.push(Cell::Blank);
                    cells.push(Cell::Blank);
                }
            }
        }
        if self.has_sentiment() {
            match row.sentiment_split() {
                Some(split) => {
                    cells.push(Cell::Number(split.positive_pct));
                    cells.push(Cell::Number(split.negative_pct));
                }
                None => {
                    cells.push(Cell::Blank);
                    cells.push(Cell::Blank);
                }
            }
        }
        cells.push(Cell::Text(self.category(row)));
        cells
    }

    /// Fixed-width text rendering of `rows` for the console
    pub fn render(&self, rows: &[&ClassificationResult], max_text_width: usize) -> String {
        let headers = self.headers();
        let body: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                self.row_cells(row)
                    .into_iter()
                    .enumerate()
                    .map(|(i, cell)| match (i, cell) {
                        (0, cell) => truncate(&cell.to_string(), max_text_width),
                        (_, Cell::Number(n)) => format!("{n:.4}"),
                        (_, cell) => cell.to_string(),
                    })
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for line in &body {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let format_line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| pad(cell, *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = format_line(&headers);
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for line in &body {
            out.push('\n');
            out.push_str(&format_line(line));
        }
        out
    }
}

/// `POSITIVE` → `Positive`, `non-toxic` → `Non-toxic`
pub fn title_case(label: &str) -> String {
    let lower = label.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}
