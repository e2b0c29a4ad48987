//! Browsing a saved reference table: search, excitement filter and sorting.

use std::{cmp::Ordering, path::Path};

use tokio::fs;

use crate::{error::Result, markdown::MarkdownTable};

const TITLE_COLUMN: &str = "Anime Title";
const TIMESTAMP_COLUMN: &str = "Timestamp";
const NOTES_COLUMN: &str = "Notes";
const EXCITED_MARKER: &str = "Excited";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Title,
    Timestamp,
    Excited,
}

#[derive(Debug, Clone, Default)]
pub struct TableQuery {
    /// Case-insensitive match against the title or notes.
    pub search: Option<String>,
    /// Case-insensitive match against the excitement column, e.g. `yes`.
    pub excited: Option<String>,
    pub sort: Option<SortColumn>,
    pub descending: bool,
}

/// Load a CSV written by [`MarkdownTable::to_csv`]. The first record is the header.
pub async fn read_csv_table(path: &Path) -> Result<MarkdownTable> {
    let content = fs::read_to_string(path).await?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader
        .records()
        .map(|record| -> Result<Vec<String>> {
            Ok(record?.iter().map(String::from).collect())
        });

    let header = records.next().transpose()?.unwrap_or_default();
    let rows = records.collect::<Result<Vec<_>>>()?;
    Ok(MarkdownTable { header, rows })
}

/// Seconds in `m:ss` or `h:mm:ss`; anything else counts as zero.
pub fn timestamp_to_seconds(timestamp: &str) -> u64 {
    let parts = timestamp
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match parts.as_deref() {
        Ok([minutes, seconds]) => minutes * 60 + seconds,
        Ok([hours, minutes, seconds]) => hours * 3600 + minutes * 60 + seconds,
        _ => 0,
    }
}

impl TableQuery {
    /// Matching rows of `table`, sorted when asked. The header is kept.
    pub fn apply(&self, table: &MarkdownTable) -> MarkdownTable {
        let column = |name: &str| table.header.iter().position(|h| h.contains(name));
        let title = column(TITLE_COLUMN);
        let timestamp = column(TIMESTAMP_COLUMN);
        let notes = column(NOTES_COLUMN);
        let excited = column(EXCITED_MARKER);

        let search = self.search.as_deref().map(str::to_lowercase);
        let wanted = self.excited.as_deref().map(str::to_lowercase);

        let mut rows = table
            .rows
            .iter()
            .filter(|row| {
                let matches_search = search.as_deref().is_none_or(|term| {
                    [title, notes]
                        .into_iter()
                        .any(|i| cell(row, i).to_lowercase().contains(term))
                });
                let matches_excited = wanted
                    .as_deref()
                    .is_none_or(|level| cell(row, excited).to_lowercase().contains(level));
                matches_search && matches_excited
            })
            .cloned()
            .collect::<Vec<_>>();

        if let Some(sort) = self.sort {
            rows.sort_by(|a, b| {
                let ordering = match sort {
                    SortColumn::Timestamp => timestamp_to_seconds(cell(a, timestamp))
                        .cmp(&timestamp_to_seconds(cell(b, timestamp))),
                    SortColumn::Title => compare_text(cell(a, title), cell(b, title)),
                    SortColumn::Excited => compare_text(cell(a, excited), cell(b, excited)),
                };
                if self.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        MarkdownTable {
            header: table.header.clone(),
            rows,
        }
    }
}

fn cell(row: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
