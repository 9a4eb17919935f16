use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use tokio::sync::OnceCell;

use crate::docx_markdown::DocxMarkdownConverter;
use crate::table_formatter::{Sheet, SpreadsheetGrid};

/// Converts a word-processing document to Markdown
pub trait RichDocumentConverter: Send + Sync {
    fn convert(&self, bytes: &[u8]) -> Result<String>;
}

/// Parses a workbook into named sheets of string cells.
/// Empty cells are `""` and the first row of each sheet is its header.
pub trait SpreadsheetParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<SpreadsheetGrid>;
}

/// The conversion libraries the decoders delegate to
#[derive(Clone)]
pub struct Toolkit {
    pub rich_documents: Arc<dyn RichDocumentConverter>,
    pub spreadsheets: Arc<dyn SpreadsheetParser>,
}

impl Toolkit {
    pub fn new(
        rich_documents: Arc<dyn RichDocumentConverter>,
        spreadsheets: Arc<dyn SpreadsheetParser>,
    ) -> Self {
        Self {
            rich_documents,
            spreadsheets,
        }
    }

    /// Toolkit backed by docx-rs and calamine
    pub fn load_default() -> Self {
        Self::new(
            Arc::new(DocxMarkdownConverter::default()),
            Arc::new(CalamineSpreadsheetParser),
        )
    }
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit").finish_non_exhaustive()
    }
}

static SHARED_TOOLKIT: OnceCell<Toolkit> = OnceCell::const_new();

/// Process-wide toolkit, loaded on first use and never reloaded.
/// Concurrent first callers wait on the same initialization.
pub async fn shared_toolkit() -> &'static Toolkit {
    SHARED_TOOLKIT
        .get_or_init(|| async {
            log::debug!("Loading default conversion toolkit");
            Toolkit::load_default()
        })
        .await
}

/// Spreadsheet parser built on calamine's XLSX reader
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineSpreadsheetParser;

impl SpreadsheetParser for CalamineSpreadsheetParser {
    fn parse(&self, bytes: &[u8]) -> Result<SpreadsheetGrid> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
            .context("Failed to open Excel workbook")?;

        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names().to_owned() {
            match workbook.worksheet_range(&sheet_name) {
                Ok(range) => sheets.push(Sheet::new(sheet_name, range_to_rows(&range))),
                Err(e) => log::warn!("Skipping unreadable sheet '{}': {}", sheet_name, e),
            }
        }

        Ok(SpreadsheetGrid::new(sheets))
    }
}

/// Lay a calamine range out from A1, so leading empty rows and columns are kept
fn range_to_rows(range: &calamine::Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let width = start_col as usize + range.width();

    let mut rows: Vec<Vec<String>> = (0..start_row).map(|_| vec![String::new(); width]).collect();
    for cells in range.rows() {
        let mut row = vec![String::new(); start_col as usize];
        row.extend(cells.iter().map(cell_to_string));
        rows.push(row);
    }
    rows
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_to_rows_keeps_offset_from_a1() {
        let mut range: calamine::Range<Data> = calamine::Range::new((1, 1), (2, 2));
        range.set_value((1, 1), Data::String("Name".to_string()));
        range.set_value((1, 2), Data::Float(30.0));
        range.set_value((2, 1), Data::Bool(true));

        let rows = range_to_rows(&range);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["", "", ""]);
        assert_eq!(rows[1], vec!["", "Name", "30"]);
        assert_eq!(rows[2], vec!["", "true", ""]);
    }

    #[test]
    fn test_empty_range_has_no_rows() {
        let range: calamine::Range<Data> = calamine::Range::empty();
        assert!(range_to_rows(&range).is_empty());
    }

    #[test]
    fn test_invalid_workbook_bytes_fail() {
        let result = CalamineSpreadsheetParser.parse(b"definitely not a workbook");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_shared_toolkit_is_loaded_once() {
        let (first, second) = tokio::join!(shared_toolkit(), shared_toolkit());
        assert!(std::ptr::eq(first, second));
        assert!(Arc::ptr_eq(&first.rich_documents, &second.rich_documents));
    }
}
