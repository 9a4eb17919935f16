use std::fmt;

/// Office formats the pipeline knows how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Docx,
    Xlsx,
    Doc,
    Pptx,
}

impl DocumentFormat {
    /// Resolve a file extension (with or without the leading dot, any case)
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "xlsx" => Some(DocumentFormat::Xlsx),
            "doc" => Some(DocumentFormat::Doc),
            "pptx" => Some(DocumentFormat::Pptx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Pptx => "pptx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// Bytes of one document, owned for the duration of a single conversion
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }
}

/// Reasons a conversion could not produce any content
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("不支持的格式：.{0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document bytes: {0}")]
    Read(String),

    #[error("{message}")]
    Decode {
        format: DocumentFormat,
        message: String,
    },

    #[error("Conversion task failed: {0}")]
    Task(String),
}

/// Tagged result of one conversion attempt.
///
/// `Converted` and `Caveat` both carry Markdown that callers persist and display;
/// `Caveat` marks text that explains why little or nothing could be extracted.
/// `Failure` must short-circuit persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted(String),
    Caveat(String),
    Failure(ConversionError),
}

impl ConversionOutcome {
    /// Markdown to persist or display, if any
    pub fn markdown(&self) -> Option<&str> {
        match self {
            ConversionOutcome::Converted(text) | ConversionOutcome::Caveat(text) => Some(text),
            ConversionOutcome::Failure(_) => None,
        }
    }

    pub fn into_markdown(self) -> Result<String, ConversionError> {
        match self {
            ConversionOutcome::Converted(text) | ConversionOutcome::Caveat(text) => Ok(text),
            ConversionOutcome::Failure(error) => Err(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ConversionOutcome::Failure(_))
    }

    pub fn is_caveat(&self) -> bool {
        matches!(self, ConversionOutcome::Caveat(_))
    }

    pub fn error(&self) -> Option<&ConversionError> {
        match self {
            ConversionOutcome::Failure(error) => Some(error),
            _ => None,
        }
    }
}
