//! Boxed text tables for terminal output.

use crate::analysis::Tabular;
use crate::config::DisplayConfig;
use std::fmt;

/// A text table with a `shape: (rows, cols)` header.
///
/// Long tables are cut to their head and tail around an ellipsis row, and
/// long cells are truncated with an ellipsis.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    max_rows: usize,
    max_cell_width: usize,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            max_rows: DisplayConfig::MAX_ROWS,
            max_cell_width: DisplayConfig::MAX_CELL_WIDTH,
        }
    }

    /// Build a table from analysis rows.
    pub fn from_rows<T: Tabular>(rows: &[T]) -> Self {
        let mut table = Self::new(T::headers().iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(row.cells());
        }
        table
    }

    /// Append a row. Missing cells render empty; extra cells are dropped.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_max_cell_width(mut self, max_cell_width: usize) -> Self {
        self.max_cell_width = max_cell_width.max(1);
        self
    }

    /// `(rows, columns)` of the full table, before truncation.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    fn truncate(&self, cell: &str) -> String {
        if cell.chars().count() <= self.max_cell_width {
            return cell.to_string();
        }
        let kept: String = cell.chars().take(self.max_cell_width - 1).collect();
        format!("{}{}", kept, DisplayConfig::ELLIPSIS)
    }

    /// Rows to print; `None` marks the elided middle.
    fn visible_rows(&self) -> Vec<Option<Vec<String>>> {
        let render = |row: &Vec<String>| Some(row.iter().map(|c| self.truncate(c)).collect());

        if self.rows.len() <= self.max_rows {
            return self.rows.iter().map(render).collect();
        }
        let tail = self.max_rows / 2;
        let head = self.max_rows - tail;
        let mut visible: Vec<_> = self.rows[..head].iter().map(render).collect();
        visible.push(None);
        visible.extend(self.rows[self.rows.len() - tail..].iter().map(render));
        visible
    }
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{}{}", cell, " ".repeat(width.saturating_sub(len)))
}

fn border(widths: &[usize], left: &str, fill: &str, join: &str, right: &str) -> String {
    let segments: Vec<String> = widths.iter().map(|w| fill.repeat(w + 2)).collect();
    format!("{}{}{}", left, segments.join(join), right)
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!(" {} ", pad(cell, *width)))
        .collect();
    format!("│{}│", padded.join("┆"))
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape();
        writeln!(f, "shape: ({}, {})", rows, cols)?;

        let headers: Vec<String> = self.headers.iter().map(|h| self.truncate(h)).collect();
        let visible = self.visible_rows();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in visible.iter().flatten() {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        writeln!(f, "{}", border(&widths, "┌", "─", "┬", "┐"))?;
        writeln!(f, "{}", line(&headers, &widths))?;
        writeln!(f, "{}", border(&widths, "╞", "═", "╪", "╡"))?;
        for row in &visible {
            match row {
                Some(cells) => writeln!(f, "{}", line(cells, &widths))?,
                None => {
                    let dots = vec![DisplayConfig::ELLIPSIS.to_string(); widths.len()];
                    writeln!(f, "{}", line(&dots, &widths))?
                }
            }
        }
        write!(f, "{}", border(&widths, "└", "─", "┴", "┘"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SpeciesPopulation;

    fn population(n: usize) -> Vec<SpeciesPopulation> {
        (0..n)
            .map(|i| SpeciesPopulation {
                name: format!("s{}", i),
                population: i as u64,
            })
            .collect()
    }

    #[test]
    fn test_renders_box_with_shape() {
        let table = Table::from_rows(&population(2));
        let rendered = table.to_string();
        let expected = "\
shape: (2, 2)
┌──────┬────────────┐
│ name ┆ population │
╞══════╪════════════╡
│ s0   ┆ 0          │
│ s1   ┆ 1          │
└──────┴────────────┘";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::from_rows::<SpeciesPopulation>(&[]);
        assert_eq!(table.shape(), (0, 2));
        assert!(table.to_string().starts_with("shape: (0, 2)\n"));
    }

    #[test]
    fn test_long_tables_are_elided() {
        let table = Table::from_rows(&population(10)).with_max_rows(4);
        let rendered = table.to_string();
        assert!(rendered.starts_with("shape: (10, 2)"));
        assert!(rendered.contains("│ s0 "));
        assert!(rendered.contains("│ s1 "));
        assert!(!rendered.contains("│ s2 "));
        assert!(rendered.contains("│ …  "));
        assert!(rendered.contains("│ s8 "));
        assert!(rendered.contains("│ s9 "));
    }

    #[test]
    fn test_cells_are_truncated() {
        let mut table = Table::new(vec!["text".into()]).with_max_cell_width(4);
        table.push_row(vec!["abcdefgh".into()]);
        assert!(table.to_string().contains("│ abc… │"));
    }

    #[test]
    fn test_rows_are_padded_to_header_count() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec!["only".into()]);
        assert_eq!(table.shape(), (1, 2));
        assert!(table.to_string().contains("│ only ┆   │"));
    }
}
