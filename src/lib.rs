/// Office to Markdown conversion pipeline
/// Decodes DOCX, DOC, XLSX and PPTX bytes into Markdown, plus the glue to store converted notes

pub mod outcome;
pub mod table_formatter;
pub mod text_scanner;
pub mod docx_markdown;
pub mod toolkit;
pub mod document_parser;
pub mod powerpoint_parser;
pub mod dispatcher;
pub mod config;
pub mod logging;
pub mod vault;

/// Re-export the conversion entry points
pub use dispatcher::{Converter, DocumentSource, InMemorySource, convert_file};

/// Re-export the outcome model
pub use outcome::{ConversionError, ConversionOutcome, DocumentFormat, RawDocument};

/// Re-export the decoders
pub use document_parser::{decode_document, decode_doc, decode_docx, decode_xlsx};
pub use powerpoint_parser::decode_pptx;

/// Re-export table and text extraction
pub use table_formatter::{Sheet, SpreadsheetGrid, grid_to_markdown, rows_to_markdown_table};
pub use text_scanner::{FRAGMENTS_PER_PAGE, paginate_fragments, scan_text_runs, scan_to_outcome};

/// Re-export the collaborators
pub use toolkit::{
    CalamineSpreadsheetParser, RichDocumentConverter, SpreadsheetParser, Toolkit, shared_toolkit,
};
pub use docx_markdown::DocxMarkdownConverter;
