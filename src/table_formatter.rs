/// One named sheet of string cells; rows may be ragged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Width of the widest row
    pub fn max_cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Ordered sheets of a workbook, as handed over by a spreadsheet parser
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadsheetGrid {
    pub sheets: Vec<Sheet>,
}

impl SpreadsheetGrid {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }
}

/// Render every non-empty sheet as a `## 📊 name` heading followed by a pipe table
pub fn grid_to_markdown(grid: &SpreadsheetGrid) -> String {
    let mut markdown = String::new();

    for sheet in &grid.sheets {
        if sheet.rows.is_empty() || sheet.max_cols() == 0 {
            log::debug!("Skipping empty sheet '{}'", sheet.name);
            continue;
        }

        markdown.push_str(&format!("\n## 📊 {}\n\n", sheet.name));
        markdown.push_str(&rows_to_markdown_table(&sheet.rows));
        markdown.push('\n');
    }

    markdown
}

/// Convert rows to a markdown pipe table, normalizing every row to the widest one.
/// Returns an empty string when there is nothing to lay out.
pub fn rows_to_markdown_table(rows: &[Vec<String>]) -> String {
    let max_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };
    if max_cols == 0 {
        return String::new();
    }

    let mut table = String::new();

    // Header row
    let header_cells: Vec<String> = (0..max_cols)
        .map(|col| header_cell(header.get(col).map(String::as_str), col))
        .collect();
    push_row(&mut table, &header_cells);

    // Separator row
    push_row(&mut table, &vec!["---".to_string(); max_cols]);

    // Data rows
    for row in body {
        let cells: Vec<String> = (0..max_cols)
            .map(|col| body_cell(row.get(col).map(String::as_str)))
            .collect();
        push_row(&mut table, &cells);
    }

    table
}

fn push_row(table: &mut String, cells: &[String]) {
    table.push_str("| ");
    table.push_str(&cells.join(" | "));
    table.push_str(" |\n");
}

fn escape_pipes(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Header cells never render blank: an empty one gets a 1-based column label
fn header_cell(value: Option<&str>, col: usize) -> String {
    let escaped = escape_pipes(value.unwrap_or_default());
    if escaped.trim().is_empty() {
        format!("列{}", col + 1)
    } else {
        escaped
    }
}

fn body_cell(value: Option<&str>) -> String {
    escape_pipes(value.unwrap_or_default()).replace('\n', " ")
}
