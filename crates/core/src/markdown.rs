//! Markdown tables as emitted by a text-generation model, and their CSV form.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnimerefError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownTable {
    pub header: Vec<String>,
    /// Rows are kept as parsed; their length may differ from the header's.
    pub rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    /// Rows whose cell count differs from the header's.
    pub fn ragged_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.len() != self.header.len())
            .count()
    }

    /// Serialize as CSV: the header first (when present), then each row.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if !self.header.is_empty() {
            writer.write_record(&self.header)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Parse the first pipe-delimited table in `text`.
///
/// Prose before the table is skipped. The first pipe-bearing line is the
/// header and the second one is always dropped as the separator row, by
/// position, whatever it contains. Every later pipe-bearing line is a row.
pub fn parse_markdown_table(text: &str) -> Result<MarkdownTable> {
    let lines = text.trim().split('\n').collect::<Vec<_>>();
    let Some(start) = lines.iter().position(|line| line.contains('|')) else {
        return Err(AnimerefError::NoTableFound);
    };

    let mut table = MarkdownTable::default();
    let table_lines = lines[start..].iter().filter(|line| line.contains('|'));

    for (i, line) in table_lines.enumerate() {
        let cells = split_cells(line);
        match i {
            0 => table.header = cells,
            1 => {
                if !is_separator(&cells) {
                    warn!(?cells, "second table line is not a separator row, dropping it anyway");
                }
            }
            _ => table.rows.push(cells),
        }
    }

    Ok(table)
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(String::from)
        .collect()
}

fn is_separator(cells: &[String]) -> bool {
    cells.iter().all(|cell| cell.contains('-'))
}
