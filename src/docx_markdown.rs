use std::collections::HashMap;

use anyhow::{Result, anyhow};
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Style, Styles, Table,
    TableCellContent, TableChild, TableRowChild,
};

use crate::table_formatter::rows_to_markdown_table;
use crate::toolkit::RichDocumentConverter;

/// Word-processing document to Markdown converter built on docx-rs.
///
/// Headings come from paragraph styles named `heading 1`..`heading 6` or `title`; the style
/// id is used only when the style table has no name for it. Numbered paragraphs become
/// list items, bold runs are wrapped in `__` and italic runs in `*`.
/// Tables are laid out as pipe tables.
#[derive(Debug, Clone, Default)]
pub struct DocxMarkdownConverter;

impl RichDocumentConverter for DocxMarkdownConverter {
    fn convert(&self, bytes: &[u8]) -> Result<String> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| anyhow!("Failed to parse DOCX content: {}", e))?;

        let style_names = style_names(&docx.styles);
        let mut blocks = Vec::new();
        for child in &docx.document.children {
            match child {
                DocumentChild::Paragraph(paragraph) => {
                    let block = paragraph_to_markdown(paragraph, &style_names);
                    if !block.is_empty() {
                        blocks.push(block);
                    }
                }
                DocumentChild::Table(table) => {
                    let block = table_to_markdown(table);
                    if !block.is_empty() {
                        blocks.push(block.trim_end().to_string());
                    }
                }
                _ => {}
            }
        }

        if blocks.is_empty() {
            return Ok(String::new());
        }
        Ok(blocks.join("\n\n") + "\n\n")
    }
}

/// Style id to lower-cased style name. Localized Word writes ids like "1" or "a3"
/// for the built-in headings, but keeps the English names.
fn style_names(styles: &Styles) -> HashMap<String, String> {
    styles
        .styles
        .iter()
        .filter_map(|style| Some((style.style_id.clone(), style_name(style)?.to_lowercase())))
        .collect()
}

// docx-rs keeps the name private and serializes it as a plain string
fn style_name(style: &Style) -> Option<String> {
    let name = serde_json::to_value(&style.name).ok()?;
    name.as_str()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn heading_level(paragraph: &Paragraph, style_names: &HashMap<String, String>) -> Option<usize> {
    let style_id = &paragraph.property.style.as_ref()?.val;
    let label = style_names
        .get(style_id)
        .cloned()
        .unwrap_or_else(|| style_id.to_lowercase());
    if label == "title" {
        return Some(1);
    }
    let level: usize = label.strip_prefix("heading")?.trim().parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn paragraph_to_markdown(paragraph: &Paragraph, style_names: &HashMap<String, String>) -> String {
    let text = inline_text(&paragraph.children);
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    if let Some(level) = heading_level(paragraph, style_names) {
        return format!("{} {}", "#".repeat(level), text);
    }
    if paragraph.property.numbering_property.is_some() {
        return format!("- {}", text);
    }
    text.to_string()
}

fn inline_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    for child in children {
        match child {
            ParagraphChild::Run(run) => text.push_str(&run_to_markdown(run)),
            ParagraphChild::Hyperlink(link) => text.push_str(&inline_text(&link.children)),
            _ => {}
        }
    }
    text
}

fn run_to_markdown(run: &Run) -> String {
    let mut text = String::new();
    for child in &run.children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }

    if text.trim().is_empty() {
        return text;
    }
    let mut wrapped = text;
    if run.run_property.italic.is_some() {
        wrapped = format!("*{}*", wrapped);
    }
    if run.run_property.bold.is_some() {
        wrapped = format!("__{}__", wrapped);
    }
    wrapped
}

fn cell_text(content: &[TableCellContent]) -> String {
    let mut parts = Vec::new();
    for item in content {
        if let TableCellContent::Paragraph(paragraph) = item {
            let text = inline_text(&paragraph.children);
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
    }
    parts.join(" ")
}

#[allow(irrefutable_let_patterns)]
fn table_to_markdown(table: &Table) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for child in &table.rows {
        if let TableChild::TableRow(row) = child {
            let mut cells = Vec::new();
            for cell in &row.cells {
                if let TableRowChild::TableCell(cell) = cell {
                    cells.push(cell_text(&cell.children));
                }
            }
            rows.push(cells);
        }
    }

    rows_to_markdown_table(&rows)
}
