use crate::{markdown::MarkdownTable, timestamps::TimestampMap};

/// One `"<timestamp> - <label>"` line per entry, in map order.
pub fn format_timestamps(timestamps: &TimestampMap) -> String {
    timestamps
        .iter()
        .map(|e| format!("{} - {}\n", e.timestamp, e.label))
        .collect()
}

/// Render a table as aligned plain-text columns for the terminal.
pub fn format_table_readable(table: &MarkdownTable) -> String {
    let columns = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.header.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0; columns];
    for row in std::iter::once(&table.header).chain(&table.rows) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render = |row: &[String]| {
        row.iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut output = String::new();
    if !table.header.is_empty() {
        output.push_str(&render(table.header.as_slice()));
        output.push('\n');
        let rule = widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1);
        output.push_str(&"─".repeat(rule));
        output.push('\n');
    }
    for row in &table.rows {
        output.push_str(&render(row.as_slice()));
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamps::extract_timestamps;

    #[test]
    fn timestamps_block_keeps_map_order() {
        let map = extract_timestamps("0:00 Intro\n3:10 Frieren\n1:00 Callback");
        assert_eq!(
            format_timestamps(&map),
            "0:00 - Intro\n3:10 - Frieren\n1:00 - Callback\n"
        );
        assert_eq!(format_timestamps(&TimestampMap::new()), "");
    }

    #[test]
    fn readable_table_aligns_columns() {
        let table = MarkdownTable {
            header: vec!["Title".into(), "At".into()],
            rows: vec![
                vec!["Gintama".into(), "1:00".into()],
                vec!["K-On!".into()],
            ],
        };
        assert_eq!(
            format_table_readable(&table),
            "Title    At\n─────────────\nGintama  1:00\nK-On!\n"
        );
    }
}
