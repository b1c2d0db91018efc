use std::fmt;

use crate::error::DbError;

/// Narrowest a rendered column is allowed to be.
const MIN_COLUMN_WIDTH: usize = 15;

/// Represents the result of a successful `SELECT` or `JOIN`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// The names of the columns included in the result set.
    pub columns: Vec<String>,
    /// One vector of stored values per record, in column order.
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain([name.chars().count(), MIN_COLUMN_WIDTH])
                    .max()
                    .unwrap_or(MIN_COLUMN_WIDTH)
            })
            .collect()
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::new();
    for (cell, width) in cells.zip(widths) {
        line.push_str(&format!("| {cell:<width$} "));
    }
    line.trim_end().to_string()
}

/// Renders a pipe-delimited table preceded by a blank line:
///
/// ```text
///
/// | id              | name
/// ========================
/// | 1               | Alice
/// ```
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();
        let header = format_line(self.columns.iter().map(String::as_str), &widths);

        writeln!(f)?;
        writeln!(f, "{header}")?;
        writeln!(f, "{}", "=".repeat(header.chars().count()))?;
        for row in &self.rows {
            writeln!(f, "{}", format_line(row.iter().map(String::as_str), &widths))?;
        }
        Ok(())
    }
}

/// The outcome of one successful command.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok,
    Rows(QueryResult),
}

impl Response {
    /// The text sent back for this response.
    pub fn render(&self) -> String {
        match self {
            Response::Ok => "[OK]".to_string(),
            Response::Rows(result) => format!("[OK]\n{result}"),
        }
    }

    /// The text sent back for a failed command.
    pub fn render_error(error: &DbError) -> String {
        format!("[ERROR]: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(columns: &[&str], rows: &[&[&str]]) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_render_ok() {
        assert_eq!(Response::Ok.render(), "[OK]");
    }

    #[test]
    fn test_render_table() {
        let rows = result(&["id", "name"], &[&["1", "Alice"], &["2", ""]]);
        let expected = "[OK]\n\n\
            | id              | name\n\
            ========================\n\
            | 1               | Alice\n\
            | 2               |\n";

        assert_eq!(Response::Rows(rows).render(), expected);
    }

    #[test]
    fn test_wide_cells_widen_their_column() {
        let wide = "a".repeat(20);
        let rows = result(&["id", "text", "x"], &[&["1", wide.as_str(), "y"]]);
        let rendered = rows.to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "");
        assert_eq!(lines[1].find("| x"), lines[3].find("| y"));
        assert_eq!(lines[2].len(), lines[1].len());
    }

    #[test]
    fn test_empty_result_keeps_header() {
        let rows = result(&["id"], &[]);
        assert_eq!(rows.to_string(), "\n| id\n====\n");
    }

    #[test]
    fn test_render_error() {
        let err = DbError::TableNotFound {
            name: "people".into(),
        };
        assert_eq!(
            Response::render_error(&err),
            "[ERROR]: Table \"people\" doesn't exist"
        );
    }
}
