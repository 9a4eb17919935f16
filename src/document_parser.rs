use crate::outcome::{ConversionError, ConversionOutcome, DocumentFormat, RawDocument};
use crate::powerpoint_parser::decode_pptx;
use crate::table_formatter::grid_to_markdown;
use crate::toolkit::Toolkit;

pub const DOC_EMPTY_CAVEAT: &str =
    "> ⚠️ .doc 旧版格式解析内容为空，建议先用 Word 另存为 .docx 再转换。";

const DOC_RESAVE_ADVICE: &str = "> 建议先用 Word 另存为 .docx 再转换。";

/// Run the decoder matching the document's format
pub fn decode_document(toolkit: &Toolkit, document: &RawDocument) -> ConversionOutcome {
    log::debug!(
        "Decoding {} document ({} bytes)",
        document.format,
        document.bytes.len()
    );
    match document.format {
        DocumentFormat::Docx => decode_docx(toolkit, &document.bytes),
        DocumentFormat::Xlsx => decode_xlsx(toolkit, &document.bytes),
        DocumentFormat::Doc => decode_doc(toolkit, &document.bytes),
        DocumentFormat::Pptx => decode_pptx(&document.bytes),
    }
}

/// Convert a DOCX document; empty output is returned as-is
pub fn decode_docx(toolkit: &Toolkit, bytes: &[u8]) -> ConversionOutcome {
    match toolkit.rich_documents.convert(bytes) {
        Ok(markdown) => ConversionOutcome::Converted(markdown),
        Err(e) => ConversionOutcome::Failure(ConversionError::Decode {
            format: DocumentFormat::Docx,
            message: e.to_string(),
        }),
    }
}

/// Best-effort conversion of a legacy DOC document.
/// Blank output turns into advice to re-save the file as DOCX.
pub fn decode_doc(toolkit: &Toolkit, bytes: &[u8]) -> ConversionOutcome {
    match toolkit.rich_documents.convert(bytes) {
        Ok(markdown) if !markdown.trim().is_empty() => ConversionOutcome::Converted(markdown),
        Ok(_) => ConversionOutcome::Caveat(DOC_EMPTY_CAVEAT.to_string()),
        Err(e) => {
            log::warn!("Legacy DOC conversion failed: {}", e);
            ConversionOutcome::Failure(ConversionError::Decode {
                format: DocumentFormat::Doc,
                message: format!("> ⚠️ .doc 旧版格式解析失败：{}\n{}", e, DOC_RESAVE_ADVICE),
            })
        }
    }
}

/// Convert an XLSX workbook into one pipe table per sheet
pub fn decode_xlsx(toolkit: &Toolkit, bytes: &[u8]) -> ConversionOutcome {
    match toolkit.spreadsheets.parse(bytes) {
        Ok(grid) => ConversionOutcome::Converted(grid_to_markdown(&grid)),
        Err(e) => ConversionOutcome::Failure(ConversionError::Decode {
            format: DocumentFormat::Xlsx,
            message: format!("{:#}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_formatter::{Sheet, SpreadsheetGrid};
    use crate::toolkit::{RichDocumentConverter, SpreadsheetParser};
    use anyhow::{Result, anyhow};
    use std::sync::Arc;

    struct FixedConverter(Result<String, String>);

    impl RichDocumentConverter for FixedConverter {
        fn convert(&self, _bytes: &[u8]) -> Result<String> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    struct FixedParser(Result<SpreadsheetGrid, String>);

    impl SpreadsheetParser for FixedParser {
        fn parse(&self, _bytes: &[u8]) -> Result<SpreadsheetGrid> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    fn toolkit_with(
        converted: Result<String, String>,
        parsed: Result<SpreadsheetGrid, String>,
    ) -> Toolkit {
        Toolkit::new(
            Arc::new(FixedConverter(converted)),
            Arc::new(FixedParser(parsed)),
        )
    }

    fn rich(converted: Result<&str, &str>) -> Toolkit {
        toolkit_with(
            converted.map(String::from).map_err(String::from),
            Ok(SpreadsheetGrid::default()),
        )
    }

    #[test]
    fn test_docx_returns_converter_output_verbatim() {
        let toolkit = rich(Ok("# Title\n\nBody\n"));
        assert_eq!(
            decode_docx(&toolkit, b"bytes"),
            ConversionOutcome::Converted("# Title\n\nBody\n".to_string())
        );
    }

    #[test]
    fn test_docx_empty_output_is_still_success() {
        let toolkit = rich(Ok(""));
        assert_eq!(
            decode_docx(&toolkit, b"bytes"),
            ConversionOutcome::Converted(String::new())
        );
    }

    #[test]
    fn test_docx_converter_fault_is_failure() {
        let toolkit = rich(Err("corrupt zip"));
        let outcome = decode_docx(&toolkit, b"bytes");
        assert_eq!(
            outcome,
            ConversionOutcome::Failure(ConversionError::Decode {
                format: DocumentFormat::Docx,
                message: "corrupt zip".to_string(),
            })
        );
    }

    #[test]
    fn test_doc_whitespace_output_becomes_caveat() {
        let toolkit = rich(Ok("  \n\t "));
        assert_eq!(
            decode_doc(&toolkit, b"bytes"),
            ConversionOutcome::Caveat(DOC_EMPTY_CAVEAT.to_string())
        );
    }

    #[test]
    fn test_doc_with_text_is_converted() {
        let toolkit = rich(Ok("legacy text"));
        assert_eq!(
            decode_doc(&toolkit, b"bytes"),
            ConversionOutcome::Converted("legacy text".to_string())
        );
    }

    #[test]
    fn test_doc_fault_carries_message_and_advice() {
        let toolkit = rich(Err("not a zip archive"));
        let outcome = decode_doc(&toolkit, b"bytes");
        let message = outcome.error().unwrap().to_string();
        assert_eq!(
            message,
            "> ⚠️ .doc 旧版格式解析失败：not a zip archive\n> 建议先用 Word 另存为 .docx 再转换。"
        );
    }

    #[test]
    fn test_xlsx_renders_sheets() {
        let grid = SpreadsheetGrid::new(vec![Sheet::new(
            "Sheet1",
            vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Ann".to_string(), "30".to_string()],
                vec!["Bo".to_string(), String::new()],
            ],
        )]);
        let toolkit = toolkit_with(Ok(String::new()), Ok(grid));

        let markdown = decode_xlsx(&toolkit, b"bytes").into_markdown().unwrap();
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(
            lines,
            vec![
                "",
                "## 📊 Sheet1",
                "",
                "| Name | Age |",
                "| --- | --- |",
                "| Ann | 30 |",
                "| Bo |  |",
                "",
            ]
        );
    }

    #[test]
    fn test_xlsx_parse_fault_is_failure() {
        let toolkit = toolkit_with(Ok(String::new()), Err("bad workbook".to_string()));
        let outcome = decode_xlsx(&toolkit, b"bytes");
        assert_eq!(
            outcome.error(),
            Some(&ConversionError::Decode {
                format: DocumentFormat::Xlsx,
                message: "bad workbook".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_document_routes_by_format() {
        let toolkit = rich(Ok(""));
        let document = RawDocument::new(DocumentFormat::Pptx, b"<a:t>Hello</a:t>".to_vec());
        let markdown = decode_document(&toolkit, &document).into_markdown().unwrap();
        assert!(markdown.contains("## 幻灯片 1\n\nHello"));

        let document = RawDocument::new(DocumentFormat::Doc, Vec::new());
        assert!(decode_document(&toolkit, &document).is_caveat());
    }
}
